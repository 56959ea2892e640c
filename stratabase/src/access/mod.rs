// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed accessors onto one property of one object.
//!
//! An accessor caches the active layer of its property and keeps it current
//! from the change notifications routed through the object's
//! [`ObjectDataAccessManager`]. Reads resolve from the cached layer downward;
//! writes go straight to storage and come back as notifications.
//!
//! Every accessor raises three events in common:
//!
//! - `value_changed` when the effective value may have changed,
//! - `is_set_changed` when the property gains or loses its last value,
//! - `is_baseline_set_changed` when the baseline gains or loses its value.
//!
//! Accessors are released explicitly with `release` or implicitly on drop.
//! A released accessor never raises events again.

mod list;
mod value;

pub use list::{ListChange, StrataPropertyListAccess};
pub use value::{LayerValueChange, StrataPropertyValueAccess};

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::Cell;

use crate::event::Event;
use crate::id::Layer;
use crate::manager::{LayerChangeSink, ObjectDataAccessManager, SinkId};

/// Active-layer state shared by scalar and list accessors.
#[derive(Debug)]
struct LayerTracking {
    active_layer: Cell<Option<Layer>>,
    is_baseline_set: Cell<bool>,
    value_changed: Event<()>,
    is_set_changed: Event<bool>,
    is_baseline_set_changed: Event<bool>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
struct Flags {
    is_set: bool,
    is_baseline_set: bool,
}

impl LayerTracking {
    fn new(active_layer: Option<Layer>, is_baseline_set: bool) -> Self {
        Self {
            active_layer: Cell::new(active_layer),
            is_baseline_set: Cell::new(is_baseline_set),
            value_changed: Event::new(),
            is_set_changed: Event::new(),
            is_baseline_set_changed: Event::new(),
        }
    }

    fn active_layer(&self) -> Option<Layer> {
        self.active_layer.get()
    }

    fn flags(&self) -> Flags {
        Flags {
            is_set: self.active_layer.get().is_some(),
            is_baseline_set: self.is_baseline_set.get(),
        }
    }

    /// Raises the flag events whose value differs from `before`.
    fn raise_flag_changes(&self, before: Flags) {
        let after = self.flags();
        if after.is_set != before.is_set {
            self.is_set_changed.raise(&after.is_set);
        }
        if after.is_baseline_set != before.is_baseline_set {
            self.is_baseline_set_changed.raise(&after.is_baseline_set);
        }
    }

    /// Forces the unset state after the whole object was cleared.
    fn reset(&self) {
        let before = self.flags();
        self.active_layer.set(None);
        self.is_baseline_set.set(false);
        self.raise_flag_changes(before);
    }

    fn clear_handlers(&self) {
        self.value_changed.clear();
        self.is_set_changed.clear();
        self.is_baseline_set_changed.clear();
    }
}

/// Ties an accessor to its manager for as long as it is live.
struct AccessRegistration {
    manager: Rc<ObjectDataAccessManager>,
    property: String,
    sink: Cell<Option<SinkId>>,
}

impl AccessRegistration {
    fn new(
        manager: Rc<ObjectDataAccessManager>,
        property: &str,
        sink: Weak<dyn LayerChangeSink>,
    ) -> Self {
        manager.handle_access_granted();
        let id = manager.register_sink(property, sink);
        tracing::debug!(id = %manager.id(), property, "accessor registered");
        Self {
            manager,
            property: String::from(property),
            sink: Cell::new(Some(id)),
        }
    }

    fn is_released(&self) -> bool {
        self.sink.get().is_none()
    }

    /// The manager, unless released.
    fn live(&self) -> Option<&ObjectDataAccessManager> {
        (!self.is_released()).then_some(&*self.manager)
    }

    /// Returns `true` the first time only.
    fn release(&self) -> bool {
        let Some(id) = self.sink.take() else {
            return false;
        };
        self.manager.unregister_sink(&self.property, id);
        self.manager.handle_access_withdrawn();
        tracing::debug!(id = %self.manager.id(), property = %self.property, "accessor released");
        true
    }
}
