// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use core::fmt;

use super::{AccessRegistration, LayerTracking};
use crate::event::Event;
use crate::id::{Layer, ObjectId};
use crate::manager::{LayerChangeSink, ObjectDataAccessManager};
use crate::storage::{LayerChange, LayerChangeKind};
use crate::value::{ErasedValue, StrataValue};

/// Old and new value at one layer, as seen by a typed accessor.
///
/// A value stored under another type shows up as `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerValueChange<T> {
    /// The layer that changed.
    pub layer: Layer,
    /// The value stored at `layer` before the change.
    pub old: Option<T>,
    /// The value stored at `layer` after the change.
    pub new: Option<T>,
}

struct ValueAccessState<T> {
    tracking: LayerTracking,
    baseline_changed: Event<LayerValueChange<T>>,
    override_layer_changed: Event<LayerValueChange<T>>,
}

impl<T: StrataValue> ValueAccessState<T> {
    fn clear_handlers(&self) {
        self.tracking.clear_handlers();
        self.baseline_changed.clear();
        self.override_layer_changed.clear();
    }
}

impl<T: StrataValue> LayerChangeSink for ValueAccessState<T> {
    fn on_layer_change(&self, manager: &ObjectDataAccessManager, change: &LayerChange) {
        let (old, new, removed) = match &change.kind {
            LayerChangeKind::ValueSet { old, new } => (
                old.as_ref().and_then(ErasedValue::downcast::<T>),
                new.downcast::<T>(),
                false,
            ),
            LayerChangeKind::ValueRemoved { old } => (old.downcast::<T>(), None, true),
            LayerChangeKind::ListChanged { .. } | LayerChangeKind::ListRemoved => return,
        };

        let tracking = &self.tracking;
        let before = tracking.flags();
        let previous = tracking.active_layer();
        if change.layer.is_baseline() {
            tracking.is_baseline_set.set(!removed);
        }

        let value_changed = if removed {
            if change.layer.is_baseline() || previous == Some(change.layer) {
                tracking
                    .active_layer
                    .set(manager.try_find_active_layer(&change.property));
            }
            tracking.active_layer() != previous
        } else if previous.is_none_or(|active| change.layer >= active) {
            tracking.active_layer.set(Some(change.layer));
            true
        } else {
            false
        };

        tracking.raise_flag_changes(before);
        let hook = LayerValueChange {
            layer: change.layer,
            old,
            new,
        };
        if change.layer.is_baseline() {
            self.baseline_changed.raise(&hook);
        } else {
            self.override_layer_changed.raise(&hook);
        }
        if value_changed {
            tracking.value_changed.raise(&());
        }
    }

    fn on_cleared(&self, _manager: &ObjectDataAccessManager) {
        self.tracking.reset();
        self.tracking.value_changed.raise(&());
    }
}

/// Typed access to one scalar property of one object.
///
/// The accessor tracks the active layer of the property: the highest
/// override layer holding a value, else the baseline. [`get_value`] resolves
/// from that layer downward and skips values stored under another type.
///
/// Obtained from [`Stratabase::property_access`](crate::Stratabase::property_access).
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use stratabase::{Layer, ObjectId, Stratabase};
///
/// let strata = Stratabase::new();
/// let id = ObjectId::new();
/// let count = strata.property_access::<i32>(id, "Count");
///
/// let notified = Rc::new(Cell::new(0));
/// let sink = notified.clone();
/// count.value_changed().subscribe(move |()| sink.set(sink.get() + 1));
///
/// count.set_baseline_value(10);
/// count.set_override_value(0, 20);
/// assert_eq!(count.active_layer(), Some(Layer::Override(0)));
/// assert_eq!(count.get_value(), Some(20));
/// assert_eq!(notified.get(), 2);
/// ```
///
/// [`get_value`]: Self::get_value
pub struct StrataPropertyValueAccess<T: StrataValue> {
    registration: AccessRegistration,
    state: Rc<ValueAccessState<T>>,
}

impl<T: StrataValue> StrataPropertyValueAccess<T> {
    pub(crate) fn new(manager: Rc<ObjectDataAccessManager>, property: &str) -> Self {
        let state = Rc::new(ValueAccessState {
            tracking: LayerTracking::new(
                manager.try_find_active_layer(property),
                manager.has_value(Layer::Baseline, property),
            ),
            baseline_changed: Event::new(),
            override_layer_changed: Event::new(),
        });
        let sink: Rc<dyn LayerChangeSink> = state.clone();
        let registration = AccessRegistration::new(manager, property, Rc::downgrade(&sink));
        Self {
            registration,
            state,
        }
    }

    /// The object this accessor reads.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.registration.manager.id()
    }

    /// The property this accessor reads.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.registration.property
    }

    /// The highest layer holding a value, or `None` while unset.
    #[must_use]
    pub fn active_layer(&self) -> Option<Layer> {
        self.state.tracking.active_layer()
    }

    /// Returns `true` if any layer holds a value.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.active_layer().is_some()
    }

    /// Returns `true` if the baseline holds a value.
    #[must_use]
    pub fn is_baseline_set(&self) -> bool {
        self.state.tracking.is_baseline_set.get()
    }

    /// Returns `true` once [`release`](Self::release) has run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.registration.is_released()
    }

    /// The effective value: the first `T` found from the active layer down.
    ///
    /// `None` while unset or after release.
    #[must_use]
    pub fn get_value(&self) -> Option<T> {
        let manager = self.registration.live()?;
        let layer = self.active_layer()?;
        manager.search_for_first_set_value(layer, self.property())
    }

    /// The effective value, or `T::default()` while unset.
    #[must_use]
    pub fn value_or_default(&self) -> T
    where
        T: Default,
    {
        self.get_value().unwrap_or_default()
    }

    /// The value stored at exactly the baseline.
    #[must_use]
    pub fn baseline_value(&self) -> Option<T> {
        self.registration
            .live()?
            .value(Layer::Baseline, self.property())
    }

    /// The value stored at exactly override `layer`.
    #[must_use]
    pub fn override_value(&self, layer: usize) -> Option<T> {
        self.registration
            .live()?
            .value(Layer::Override(layer), self.property())
    }

    /// Writes the baseline. Returns `true` if storage changed.
    pub fn set_baseline_value(&self, value: T) -> bool {
        self.set_value_at(Layer::Baseline, value)
    }

    /// Writes override `layer`. Returns `true` if storage changed.
    pub fn set_override_value(&self, layer: usize, value: T) -> bool {
        self.set_value_at(Layer::Override(layer), value)
    }

    /// Writes the given layer. Returns `true` if storage changed.
    pub fn set_value_at(&self, layer: Layer, value: T) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.set_value(layer, self.property(), value))
    }

    /// Removes the baseline value. Returns `true` if one was stored.
    pub fn clear_baseline_value(&self) -> bool {
        self.clear_value_at(Layer::Baseline)
    }

    /// Removes the value at override `layer`. Returns `true` if one was stored.
    pub fn clear_override_value(&self, layer: usize) -> bool {
        self.clear_value_at(Layer::Override(layer))
    }

    /// Removes the value at the given layer. Returns `true` if one was stored.
    pub fn clear_value_at(&self, layer: Layer) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.remove_value(layer, self.property()))
    }

    /// Raised when the effective value may have changed.
    pub fn value_changed(&self) -> &Event<()> {
        &self.state.tracking.value_changed
    }

    /// Raised with the new state when the property becomes set or unset.
    pub fn is_set_changed(&self) -> &Event<bool> {
        &self.state.tracking.is_set_changed
    }

    /// Raised with the new state when the baseline becomes set or unset.
    pub fn is_baseline_set_changed(&self) -> &Event<bool> {
        &self.state.tracking.is_baseline_set_changed
    }

    /// Raised for every write or removal at the baseline.
    pub fn baseline_changed(&self) -> &Event<LayerValueChange<T>> {
        &self.state.baseline_changed
    }

    /// Raised for every write or removal at an override layer, whether or
    /// not that layer is active.
    pub fn override_layer_changed(&self) -> &Event<LayerValueChange<T>> {
        &self.state.override_layer_changed
    }

    /// Detaches the accessor from its manager and drops every handler.
    ///
    /// Idempotent; also runs on drop.
    pub fn release(&self) {
        if self.registration.release() {
            self.state.clear_handlers();
        }
    }
}

impl<T: StrataValue> Drop for StrataPropertyValueAccess<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: StrataValue> fmt::Debug for StrataPropertyValueAccess<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrataPropertyValueAccess")
            .field("id", &self.id())
            .field("property", &self.property())
            .field("active_layer", &self.active_layer())
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
