// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object routing of storage changes.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::event::Event;
use crate::id::{Layer, ObjectId};
use crate::storage::{LayerChange, LayerChangeKind, LayerStorage};
use crate::stratabase::{Notification, StrataCore};
use crate::value::{ErasedValue, StrataValue};

/// Receives the storage changes of one `(object, property)` pair.
pub(crate) trait LayerChangeSink {
    /// A scalar or list scope of the property changed.
    fn on_layer_change(&self, manager: &ObjectDataAccessManager, change: &LayerChange);

    /// Every scope of the object was removed at once.
    fn on_cleared(&self, manager: &ObjectDataAccessManager);
}

/// Identifies a sink registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct SinkId(u64);

/// A typed copy of a materialized list, as loaded by a list cache.
#[derive(Debug)]
pub(crate) struct ListSnapshot<T> {
    pub(crate) values: Vec<T>,
    /// Store revision the snapshot reflects.
    pub(crate) revision: u64,
    /// The list also holds elements that are not a `T`.
    pub(crate) mixed: bool,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            revision: 0,
            mixed: false,
        }
    }
}

struct SinkEntry {
    id: SinkId,
    sink: Weak<dyn LayerChangeSink>,
}

/// The per-object hub between storage and accessors.
///
/// A manager exists for an object while at least one accessor for that
/// object is alive (or until idle managers are swept, depending on
/// configuration). It answers active-layer queries for the object's
/// properties and fans storage changes out to the accessors registered for
/// the changed property.
///
/// Object-level observers can subscribe to [`layer_data_set`],
/// [`layer_data_removed`], [`layer_list_elements_changed`] and [`cleared`].
///
/// [`layer_data_set`]: Self::layer_data_set
/// [`layer_data_removed`]: Self::layer_data_removed
/// [`layer_list_elements_changed`]: Self::layer_list_elements_changed
/// [`cleared`]: Self::cleared
pub struct ObjectDataAccessManager {
    id: ObjectId,
    core: Weak<StrataCore>,
    access_count: Cell<usize>,
    sinks: RefCell<HashMap<String, SmallVec<[SinkEntry; 2]>>>,
    next_sink: Cell<u64>,
    layer_data_set: Event<LayerChange>,
    layer_data_removed: Event<LayerChange>,
    layer_list_elements_changed: Event<LayerChange>,
    cleared: Event<ObjectId>,
}

impl ObjectDataAccessManager {
    pub(crate) fn new(id: ObjectId, core: Weak<StrataCore>) -> Self {
        Self {
            id,
            core,
            access_count: Cell::new(0),
            sinks: RefCell::new(HashMap::new()),
            next_sink: Cell::new(0),
            layer_data_set: Event::new(),
            layer_data_removed: Event::new(),
            layer_list_elements_changed: Event::new(),
            cleared: Event::new(),
        }
    }

    /// The object this manager serves.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Number of live accessors using this manager.
    #[must_use]
    pub fn access_count(&self) -> usize {
        self.access_count.get()
    }

    /// Raised after a scalar value of this object was set at some layer.
    pub fn layer_data_set(&self) -> &Event<LayerChange> {
        &self.layer_data_set
    }

    /// Raised after a scalar value or a whole list of this object was
    /// removed from some layer.
    pub fn layer_data_removed(&self) -> &Event<LayerChange> {
        &self.layer_data_removed
    }

    /// Raised after list elements of this object changed at some layer.
    pub fn layer_list_elements_changed(&self) -> &Event<LayerChange> {
        &self.layer_list_elements_changed
    }

    /// Raised after every scope of this object was removed at once.
    pub fn cleared(&self) -> &Event<ObjectId> {
        &self.cleared
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Highest layer holding a scalar value for `property`.
    #[must_use]
    pub fn try_find_active_layer(&self, property: &str) -> Option<Layer> {
        let core = self.core.upgrade()?;
        core.storage().highest_value_layer(self.id, property)
    }

    /// Highest layer holding a list for `property`.
    #[must_use]
    pub fn try_find_active_list_layer(&self, property: &str) -> Option<Layer> {
        let core = self.core.upgrade()?;
        core.storage().highest_list_layer(self.id, property)
    }

    /// Returns `true` if a scalar value for `property` is stored at exactly
    /// `layer`.
    #[must_use]
    pub fn has_value(&self, layer: Layer, property: &str) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.storage().has_value(layer, self.id, property))
    }

    /// Returns `true` if a list for `property` is stored at exactly `layer`.
    #[must_use]
    pub fn has_list(&self, layer: Layer, property: &str) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.storage().has_list(layer, self.id, property))
    }

    /// Reads the value stored at exactly `layer` as a `T`.
    #[must_use]
    pub fn value<T: StrataValue>(&self, layer: Layer, property: &str) -> Option<T> {
        let core = self.core.upgrade()?;
        let storage = core.storage();
        storage.value(layer, self.id, property)?.downcast()
    }

    /// Walks from `start` down to the baseline and returns the first stored
    /// value that is a `T`.
    ///
    /// Values of other types are skipped.
    #[must_use]
    pub fn search_for_first_set_value<T: StrataValue>(
        &self,
        start: Layer,
        property: &str,
    ) -> Option<T> {
        let core = self.core.upgrade()?;
        let storage = core.storage();
        storage
            .layers_at_or_below(start)
            .find_map(|layer| storage.value(layer, self.id, property)?.downcast())
    }

    /// The list as seen from `layer` if a list is set at exactly `layer`,
    /// skipping elements that are not a `T`.
    #[must_use]
    pub fn list<T: StrataValue>(&self, layer: Layer, property: &str) -> Option<Vec<T>> {
        let core = self.core.upgrade()?;
        let storage = core.storage();
        storage
            .list_at(layer, self.id, property)
            .map(|list| list.values())
    }

    /// The list as seen from `layer`, skipping elements that are not a `T`.
    #[must_use]
    pub fn materialized_list<T: StrataValue>(&self, layer: Layer, property: &str) -> Option<Vec<T>> {
        self.list_snapshot(layer, property)
            .map(|snapshot| snapshot.values)
    }

    /// Loads the list as seen from `layer` for a cache.
    ///
    /// The snapshot carries the store revision it reflects, and whether the
    /// list holds elements of other types than `T`.
    pub(crate) fn list_snapshot<T: StrataValue>(
        &self,
        layer: Layer,
        property: &str,
    ) -> Option<ListSnapshot<T>> {
        let core = self.core.upgrade()?;
        let storage = core.storage();
        let revision = storage.revision();
        storage
            .materialized_list(layer, self.id, property)
            .map(|list| ListSnapshot {
                values: list.values(),
                revision,
                mixed: !list.is_uniform::<T>(),
            })
    }

    /// Position of the first element equal to `value` in the list as seen
    /// from `layer`.
    #[must_use]
    pub fn find_list_element<T: StrataValue>(
        &self,
        layer: Layer,
        property: &str,
        value: &T,
    ) -> Option<usize> {
        let core = self.core.upgrade()?;
        let storage = core.storage();
        storage
            .materialized_list(layer, self.id, property)?
            .elements()
            .iter()
            .position(|element| element.value().downcast_ref::<T>() == Some(value))
    }

    // =========================================================================
    // Writes scoped to this object
    // =========================================================================

    /// Stores `value` at `layer`. Returns `true` if storage changed.
    pub fn set_value<T: StrataValue>(&self, layer: Layer, property: &str, value: T) -> bool {
        self.write(layer, |storage| {
            storage.set_value(layer, self.id, property, ErasedValue::new(value))
        })
    }

    /// Removes the value at `layer`. Returns `true` if one was stored.
    pub fn remove_value(&self, layer: Layer, property: &str) -> bool {
        self.write(layer, |storage| storage.remove_value(layer, self.id, property))
    }

    /// Inserts `value` at `index` of the list at `layer`.
    pub fn insert_list_element<T: StrataValue>(
        &self,
        layer: Layer,
        property: &str,
        index: usize,
        value: T,
    ) -> bool {
        self.write(layer, |storage| {
            storage
                .insert_list_element(layer, self.id, property, index, ErasedValue::new(value))
                .ok()
        })
    }

    /// Appends `value` to the list at `layer`.
    pub fn push_list_element<T: StrataValue>(&self, layer: Layer, property: &str, value: T) -> bool {
        self.write(layer, |storage| {
            Some(storage.push_list_element(layer, self.id, property, ErasedValue::new(value)))
        })
    }

    /// Removes the element at `index` of the list at `layer`.
    pub fn remove_list_element(&self, layer: Layer, property: &str, index: usize) -> bool {
        self.write(layer, |storage| {
            storage
                .remove_list_element(layer, self.id, property, index)
                .ok()
        })
    }

    /// Empties the list at `layer`, leaving it set.
    pub fn clear_list_elements(&self, layer: Layer, property: &str) -> bool {
        self.write(layer, |storage| {
            storage.clear_list_elements(layer, self.id, property)
        })
    }

    /// Removes the list at `layer` entirely.
    pub fn remove_list(&self, layer: Layer, property: &str) -> bool {
        self.write(layer, |storage| storage.remove_list(layer, self.id, property))
    }

    /// Overwrites the list at `destination` with the list as seen from `source`.
    pub fn copy_list(&self, source: Layer, destination: Layer, property: &str) -> bool {
        self.write(destination, |storage| {
            storage.copy_list(source, destination, self.id, property)
        })
    }

    fn write<F>(&self, layer: Layer, mutate: F) -> bool
    where
        F: FnOnce(&mut LayerStorage) -> Option<LayerChange>,
    {
        match self.core.upgrade() {
            Some(core) => core.apply(layer, mutate),
            None => {
                tracing::debug!(id = %self.id, "write through a manager whose store is gone");
                false
            }
        }
    }

    // =========================================================================
    // Accessor bookkeeping
    // =========================================================================

    pub(crate) fn handle_access_granted(&self) {
        self.access_count.set(self.access_count.get() + 1);
    }

    pub(crate) fn handle_access_withdrawn(&self) {
        let remaining = self.access_count.get().saturating_sub(1);
        self.access_count.set(remaining);
        if remaining == 0
            && let Some(core) = self.core.upgrade()
        {
            core.manager_idle(self.id);
        }
    }

    pub(crate) fn register_sink(&self, property: &str, sink: Weak<dyn LayerChangeSink>) -> SinkId {
        let id = SinkId(self.next_sink.get());
        self.next_sink.set(id.0 + 1);
        self.sinks
            .borrow_mut()
            .entry_ref(property)
            .or_default()
            .push(SinkEntry { id, sink });
        id
    }

    pub(crate) fn unregister_sink(&self, property: &str, id: SinkId) {
        let mut sinks = self.sinks.borrow_mut();
        if let Some(entries) = sinks.get_mut(property) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                sinks.remove(property);
            }
        }
    }

    fn live_sinks(&self, property: Option<&str>) -> SmallVec<[Rc<dyn LayerChangeSink>; 4]> {
        let sinks = self.sinks.borrow();
        match property {
            Some(property) => sinks
                .get(property)
                .into_iter()
                .flatten()
                .filter_map(|entry| entry.sink.upgrade())
                .collect(),
            None => sinks
                .values()
                .flatten()
                .filter_map(|entry| entry.sink.upgrade())
                .collect(),
        }
    }

    pub(crate) fn deliver(&self, notification: &Notification) {
        match notification {
            Notification::Changed(change) => {
                for sink in self.live_sinks(Some(&change.property)) {
                    sink.on_layer_change(self, change);
                }
                match change.kind {
                    LayerChangeKind::ValueSet { .. } => self.layer_data_set.raise(change),
                    LayerChangeKind::ValueRemoved { .. } | LayerChangeKind::ListRemoved => {
                        self.layer_data_removed.raise(change);
                    }
                    LayerChangeKind::ListChanged { .. } => {
                        self.layer_list_elements_changed.raise(change);
                    }
                }
            }
            Notification::Cleared(id) => {
                for sink in self.live_sinks(None) {
                    sink.on_cleared(self);
                }
                self.cleared.raise(id);
            }
        }
    }
}

impl fmt::Debug for ObjectDataAccessManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDataAccessManager")
            .field("id", &self.id)
            .field("access_count", &self.access_count.get())
            .field("properties", &self.sinks.borrow().len())
            .finish_non_exhaustive()
    }
}
