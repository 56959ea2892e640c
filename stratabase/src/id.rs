// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object identity and layer addressing.
//!
//! This module provides [`ObjectId`] for identifying tracked objects and
//! [`Layer`] for addressing the baseline or one of the numbered override layers.

use core::fmt;
use uuid::Uuid;

/// A globally unique identifier for an object tracked by a
/// [`Stratabase`](crate::Stratabase).
///
/// All storage is keyed first by this id, then by property name.
///
/// # Example
///
/// ```rust
/// use stratabase::ObjectId;
///
/// let id = ObjectId::from_u128(7);
/// assert_eq!(id.as_uuid().as_u128(), 7);
/// assert_ne!(ObjectId::new(), ObjectId::new());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Creates a new random (v4) object id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates an id from a raw 128-bit value.
    ///
    /// Mostly useful for deterministic ids in tests and fixtures.
    #[must_use]
    #[inline]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the underlying UUID.
    #[must_use]
    #[inline]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.0).finish()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Addresses one storage scope for a property.
///
/// Layers are totally ordered by priority: the baseline sorts below every
/// override layer, and a higher override index sorts above a lower one. The
/// "unset" state of an active layer is expressed as `Option<Layer>::None`,
/// which in turn sorts below `Some(Layer::Baseline)`.
///
/// ```rust
/// use stratabase::Layer;
///
/// assert!(Layer::Baseline < Layer::Override(0));
/// assert!(Layer::Override(2) < Layer::Override(5));
/// assert!(None < Some(Layer::Baseline));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// The lowest-priority fallback layer.
    Baseline,
    /// A numbered override layer; higher indices win.
    Override(usize),
}

impl Layer {
    /// Returns `true` for [`Layer::Baseline`].
    #[must_use]
    #[inline]
    pub const fn is_baseline(self) -> bool {
        matches!(self, Self::Baseline)
    }

    /// Returns the override index, or `None` for the baseline.
    #[must_use]
    #[inline]
    pub const fn override_index(self) -> Option<usize> {
        match self {
            Self::Baseline => None,
            Self::Override(index) => Some(index),
        }
    }

    /// Returns the next layer down in priority, or `None` below the baseline.
    #[must_use]
    #[inline]
    pub const fn below(self) -> Option<Self> {
        match self {
            Self::Baseline => None,
            Self::Override(0) => Some(Self::Baseline),
            Self::Override(index) => Some(Self::Override(index - 1)),
        }
    }

    /// Iterates from this layer down to the baseline, inclusive.
    pub fn descending(self) -> impl Iterator<Item = Self> {
        core::iter::successors(Some(self), |layer| layer.below())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Override(index) => write!(f, "override[{index}]"),
        }
    }
}
