// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stratabase: layered property storage with cached accessors.
//!
//! Every property of every object can hold a **baseline** value and any
//! number of **override layers**. The override with the highest index that
//! holds a value wins; the baseline is the fallback. Removing the winning
//! override reveals whatever is below it.
//!
//! ## Core Concepts
//!
//! ### Storage
//!
//! [`Stratabase`] owns a [`LayerStorage`]: one scope for the baseline plus a
//! growable stack of override scopes, each keyed by [`ObjectId`] and property
//! name. Values are type-erased ([`ErasedValue`]) and read back through typed
//! accessors. Override layers come into existence the first time they are
//! written.
//!
//! ### Lists
//!
//! An override layer records its list edits (insertions, appends, removals)
//! on top of the layers below it. The list seen from a layer is the baseline
//! list with the edits of every set layer up to it applied in order, so an
//! edit to a lower layer still shows through the layers above. Emptying a
//! layer's list or copying a list into a layer makes that layer hold a
//! complete list that hides the ones below.
//!
//! ### Accessors
//!
//! [`StrataPropertyValueAccess`] and [`StrataPropertyListAccess`] track the
//! active layer of one `(object, property)` pair and raise [`Event`]s when it
//! changes. Accessors for one object share an [`ObjectDataAccessManager`],
//! which routes storage changes to them.
//!
//! ## Quick Start
//!
//! ```rust
//! use stratabase::{Layer, ObjectId, Stratabase};
//!
//! let strata = Stratabase::new();
//! let id = ObjectId::new();
//!
//! let count = strata.property_access::<i32>(id, "Count");
//! count.set_baseline_value(10);
//! count.set_override_value(0, 20);
//! count.set_override_value(1, 30);
//! assert_eq!(count.get_value(), Some(30));
//!
//! count.clear_override_value(1);
//! assert_eq!(count.active_layer(), Some(Layer::Override(0)));
//! assert_eq!(count.get_value(), Some(20));
//!
//! let tags = strata.list_access::<&str>(id, "Tags");
//! tags.add_element_to_baseline("a");
//! tags.add_element_to_baseline("b");
//! tags.remove_element_at_override_layer(0, 0);
//! assert_eq!(tags.elements(), ["b"]);
//! assert_eq!(tags.baseline_elements(), Some(vec!["a", "b"]));
//! ```
//!
//! ## Threading and Re-entrancy
//!
//! A store is single-threaded: its handle is neither `Send` nor `Sync`.
//!
//! Handlers may write back into the store. The write is applied at once, and
//! its notification is queued behind the one being delivered, so every
//! subscriber sees changes in the order they happened and no handler runs
//! nested inside another handler's notification. If a handler panics, the
//! notifications still queued at that point are discarded.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `debug` for manager and accessor
//! lifecycle and bulk removal, `trace` for individual writes, and `warn` for
//! writes rejected by the configured layer limit. No subscriber is installed.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod access;
mod config;
mod error;
mod event;
mod id;
mod manager;
mod storage;
mod stratabase;
mod value;

pub use access::{LayerValueChange, ListChange, StrataPropertyListAccess, StrataPropertyValueAccess};
pub use config::{StratabaseConfig, StratabaseConfigBuilder};
pub use error::StrataError;
pub use event::{Event, HandlerId};
pub use id::{Layer, ObjectId};
pub use manager::ObjectDataAccessManager;
pub use storage::{
    LayerChange, LayerChangeKind, LayerStorage, ListElement, ListElementChange, MaterializedList,
    StoredList,
};
pub use stratabase::Stratabase;
pub use value::{ErasedValue, StrataValue};
