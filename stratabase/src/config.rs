// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Store configuration.

/// Configuration for a [`Stratabase`](crate::Stratabase).
///
/// # Example
///
/// ```rust
/// use stratabase::StratabaseConfigBuilder;
///
/// let config = StratabaseConfigBuilder::new()
///     .override_layer_limit(4)
///     .discard_idle_managers(false)
///     .build();
///
/// assert_eq!(config.override_layer_limit(), Some(4));
/// assert!(!config.discard_idle_managers());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StratabaseConfig {
    override_layer_limit: Option<usize>,
    discard_idle_managers: bool,
}

impl StratabaseConfig {
    /// Returns the number of addressable override layers, if limited.
    ///
    /// With a limit of `n`, override indices `0..n` are accepted and writes
    /// to any higher index are rejected.
    #[must_use]
    #[inline]
    pub fn override_layer_limit(&self) -> Option<usize> {
        self.override_layer_limit
    }

    /// Returns whether object managers are dropped from the object table as
    /// soon as their last accessor is released.
    #[must_use]
    #[inline]
    pub fn discard_idle_managers(&self) -> bool {
        self.discard_idle_managers
    }

    /// Returns `true` if `layer` may be written under this configuration.
    #[must_use]
    #[inline]
    pub fn accepts_override(&self, layer: usize) -> bool {
        self.override_layer_limit.is_none_or(|limit| layer < limit)
    }
}

impl Default for StratabaseConfig {
    fn default() -> Self {
        StratabaseConfigBuilder::new().build()
    }
}

/// Builder for [`StratabaseConfig`].
#[derive(Copy, Clone, Debug)]
pub struct StratabaseConfigBuilder {
    override_layer_limit: Option<usize>,
    discard_idle_managers: bool,
}

impl StratabaseConfigBuilder {
    /// Creates a builder with the defaults: unlimited override layers, idle
    /// managers discarded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            override_layer_limit: None,
            discard_idle_managers: true,
        }
    }

    /// Limits the number of override layers.
    #[must_use]
    pub fn override_layer_limit(mut self, limit: usize) -> Self {
        self.override_layer_limit = Some(limit);
        self
    }

    /// Sets whether idle object managers are discarded eagerly.
    ///
    /// When `false`, idle managers stay cached until
    /// [`Stratabase::discard_idle_managers`](crate::Stratabase::discard_idle_managers)
    /// is called.
    #[must_use]
    pub fn discard_idle_managers(mut self, discard: bool) -> Self {
        self.discard_idle_managers = discard;
        self
    }

    /// Builds the [`StratabaseConfig`].
    #[must_use]
    pub fn build(self) -> StratabaseConfig {
        StratabaseConfig {
            override_layer_limit: self.override_layer_limit,
            discard_idle_managers: self.discard_idle_managers,
        }
    }
}

impl Default for StratabaseConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StratabaseConfig::default();
        assert_eq!(config.override_layer_limit(), None);
        assert!(config.discard_idle_managers());
        assert!(config.accepts_override(usize::MAX));
    }

    #[test]
    fn limit_bounds_override_indices() {
        let config = StratabaseConfigBuilder::new().override_layer_limit(2).build();
        assert!(config.accepts_override(0));
        assert!(config.accepts_override(1));
        assert!(!config.accepts_override(2));
    }
}
