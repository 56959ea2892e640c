// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

use crate::id::Layer;

/// Why a read or write against a [`Stratabase`](crate::Stratabase) did not succeed.
///
/// Most of the public surface reports failure through `bool` or `Option`
/// returns. The `get_*` family on [`Stratabase`](crate::Stratabase) returns this
/// type instead, so that a missing value can be told apart from a value stored
/// under a different type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StrataError {
    /// Nothing is stored at the requested scope.
    #[error("no value stored at {layer} for property '{property}'")]
    Absent {
        /// The scope that was read.
        layer: Layer,
        /// The property that was read.
        property: alloc::string::String,
    },
    /// A value is stored but it is not of the requested type.
    #[error("value of property '{property}' at {layer} is not a `{expected}`")]
    TypeMismatch {
        /// The scope that was read.
        layer: Layer,
        /// The property that was read.
        property: alloc::string::String,
        /// Name of the requested type.
        expected: &'static str,
    },
    /// A list index was outside the materialized list.
    #[error("list index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the list at the addressed scope.
        len: usize,
    },
    /// An override layer beyond the configured limit was addressed.
    #[error("override layer {layer} exceeds the configured limit of {limit}")]
    LayerLimitExceeded {
        /// The requested override index.
        layer: usize,
        /// The configured number of override layers.
        limit: usize,
    },
}
