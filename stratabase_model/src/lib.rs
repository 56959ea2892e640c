// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stratabase Model: domain models backed by layered property storage.
//!
//! A [`StratabaseBackedModel`] binds named properties of one object to
//! [`stratabase`] accessors and funnels every change into a single
//! [`property_changed`](StratabaseBackedModel::property_changed) event keyed
//! by property name.
//!
//! ## Bound Properties
//!
//! | Generator | Returns | Stored as | Exposed as |
//! |-----------|---------|-----------|------------|
//! | `generate_property` | [`BoundProperty<T>`] | `T` | `T` |
//! | `generate_list_property` | [`BoundListProperty<T>`] | list of `T` | `Vec<T>` |
//! | `generate_adapted_property` | [`StrataPropertyAdapter<T, U>`] | `T` | `U` |
//! | `generate_adapted_list_property` | [`StrataListPropertyAdapter<T, U>`] | list of `T` | `Vec<U>` |
//!
//! Scalar properties are seeded with their default at the baseline when the
//! baseline is unset, so a model property is never silently absent.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use stratabase::Stratabase;
//! use stratabase_model::StratabaseBackedModel;
//!
//! let strata = Stratabase::new();
//! let model = StratabaseBackedModel::with_new_id(&strata);
//!
//! let changed = Rc::new(RefCell::new(Vec::new()));
//! let sink = changed.clone();
//! model
//!     .property_changed()
//!     .subscribe(move |name: &str| sink.borrow_mut().push(name.to_owned()));
//!
//! let width = model.generate_property("Width", 10.0_f64);
//! assert_eq!(width.get(), Some(10.0));
//!
//! width.set_override(0, 25.0);
//! assert_eq!(width.get(), Some(25.0));
//! assert_eq!(*changed.borrow(), ["Width"]);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod adapter;
mod model;

pub use adapter::{StrataListPropertyAdapter, StrataPropertyAdapter};
pub use model::{BoundListProperty, BoundProperty, StratabaseBackedModel};
