// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The store handle and its notification queue.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell};
use core::fmt;
use hashbrown::HashMap;

use crate::access::{StrataPropertyListAccess, StrataPropertyValueAccess};
use crate::config::StratabaseConfig;
use crate::error::StrataError;
use crate::id::{Layer, ObjectId};
use crate::manager::ObjectDataAccessManager;
use crate::storage::{LayerChange, LayerStorage};
use crate::value::{ErasedValue, StrataValue};

/// A queued notification.
#[derive(Debug)]
pub(crate) enum Notification {
    Changed(LayerChange),
    Cleared(ObjectId),
}

impl Notification {
    fn id(&self) -> ObjectId {
        match self {
            Self::Changed(change) => change.id,
            Self::Cleared(id) => *id,
        }
    }
}

/// Shared state behind every [`Stratabase`] handle.
pub(crate) struct StrataCore {
    config: StratabaseConfig,
    storage: RefCell<LayerStorage>,
    managers: RefCell<HashMap<ObjectId, Rc<ObjectDataAccessManager>>>,
    pending: RefCell<VecDeque<Notification>>,
    dispatching: Cell<bool>,
}

/// Ends a drain. If the drain did not run to completion because a handler
/// unwound, the notifications still queued are discarded.
struct DispatchGuard<'a> {
    core: &'a StrataCore,
    drained: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if !self.drained
            && let Ok(mut pending) = self.core.pending.try_borrow_mut()
        {
            let discarded = core::mem::take(&mut *pending);
            drop(pending);
            tracing::warn!(
                discarded = discarded.len(),
                "dispatch interrupted; queued notifications discarded"
            );
        }
        self.core.dispatching.set(false);
    }
}

impl StrataCore {
    pub(crate) fn storage(&self) -> Ref<'_, LayerStorage> {
        self.storage.borrow()
    }

    pub(crate) fn check_layer(&self, layer: Layer) -> Result<(), StrataError> {
        match (layer, self.config.override_layer_limit()) {
            (Layer::Override(index), Some(limit)) if !self.config.accepts_override(index) => {
                tracing::warn!(layer = index, limit, "override layer beyond configured limit");
                Err(StrataError::LayerLimitExceeded {
                    layer: index,
                    limit,
                })
            }
            _ => Ok(()),
        }
    }

    /// Applies one storage mutation and queues its notification.
    ///
    /// Returns `true` if storage changed.
    pub(crate) fn apply<F>(&self, layer: Layer, mutate: F) -> bool
    where
        F: FnOnce(&mut LayerStorage) -> Option<LayerChange>,
    {
        if self.check_layer(layer).is_err() {
            return false;
        }
        let change = mutate(&mut *self.storage.borrow_mut());
        match change {
            Some(change) => {
                self.emit(Notification::Changed(change));
                true
            }
            None => false,
        }
    }

    /// Queues a notification and drains the queue unless a drain is already
    /// running further up the stack.
    pub(crate) fn emit(&self, notification: Notification) {
        self.pending.borrow_mut().push_back(notification);
        if self.dispatching.get() {
            tracing::trace!("notification deferred behind active dispatch");
            return;
        }
        self.dispatching.set(true);
        let mut guard = DispatchGuard {
            core: self,
            drained: false,
        };
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(notification) = next else {
                break;
            };
            let manager = self.managers.borrow().get(&notification.id()).cloned();
            if let Some(manager) = manager {
                manager.deliver(&notification);
            }
        }
        guard.drained = true;
    }

    pub(crate) fn manager_for(self: &Rc<Self>, id: ObjectId) -> Rc<ObjectDataAccessManager> {
        self.managers
            .borrow_mut()
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(%id, "object data access manager created");
                Rc::new(ObjectDataAccessManager::new(id, Rc::downgrade(self)))
            })
            .clone()
    }

    /// Called when the last accessor of a manager has been released.
    pub(crate) fn manager_idle(&self, id: ObjectId) {
        if !self.config.discard_idle_managers() {
            return;
        }
        let mut managers = self.managers.borrow_mut();
        if managers
            .get(&id)
            .is_some_and(|manager| manager.access_count() == 0)
        {
            managers.remove(&id);
            tracing::debug!(%id, "idle object data access manager discarded");
        }
    }
}

/// A layered property store.
///
/// Each property of each object can hold a baseline value plus any number of
/// independently addressable override layers. The active value of a property
/// is the value at the highest-indexed override layer that holds one, falling
/// back to the baseline.
///
/// `Stratabase` is a cheap handle: cloning it yields another handle onto the
/// same store.
///
/// # Threading
///
/// All reads and writes happen on one thread of ownership. The handle is
/// built on `Rc` and `RefCell` and is therefore neither `Send` nor `Sync`;
/// sharing a store across threads requires an external locking layer.
///
/// # Notifications
///
/// Every write that changes storage produces a notification that is routed
/// to the [`ObjectDataAccessManager`] of the object (if any accessor is alive)
/// and from there to the accessors of the property. Notifications are
/// delivered from a FIFO queue: a write performed by a handler is applied to
/// storage immediately, but its notification is delivered only after the
/// current notification has reached every subscriber.
///
/// # Example
///
/// ```rust
/// use stratabase::{ObjectId, Stratabase};
///
/// let strata = Stratabase::new();
/// let id = ObjectId::new();
///
/// strata.set_baseline_value(id, "Count", 10);
/// let count = strata.property_access::<i32>(id, "Count");
/// assert_eq!(count.get_value(), Some(10));
///
/// strata.set_override_value(0, id, "Count", 20);
/// strata.set_override_value(1, id, "Count", 30);
/// assert_eq!(count.get_value(), Some(30));
///
/// strata.obliterate_property_storage_in_layer(1, id, "Count");
/// assert_eq!(count.get_value(), Some(20));
/// ```
#[derive(Clone)]
pub struct Stratabase {
    core: Rc<StrataCore>,
}

impl Stratabase {
    /// Creates an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StratabaseConfig::default())
    }

    /// Creates an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: StratabaseConfig) -> Self {
        Self {
            core: Rc::new(StrataCore {
                config,
                storage: RefCell::new(LayerStorage::new()),
                managers: RefCell::new(HashMap::new()),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StratabaseConfig {
        &self.core.config
    }

    /// Borrows the underlying storage for inspection.
    ///
    /// The borrow must be released before writing to the store.
    #[must_use]
    pub fn storage(&self) -> Ref<'_, LayerStorage> {
        self.core.storage()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns a new scalar accessor for `(id, property)`.
    ///
    /// Accessors for the same pair share one [`ObjectDataAccessManager`].
    #[must_use]
    pub fn property_access<T: StrataValue>(
        &self,
        id: ObjectId,
        property: &str,
    ) -> StrataPropertyValueAccess<T> {
        StrataPropertyValueAccess::new(self.core.manager_for(id), property)
    }

    /// Returns a new list accessor for `(id, property)`.
    #[must_use]
    pub fn list_access<T: StrataValue>(
        &self,
        id: ObjectId,
        property: &str,
    ) -> StrataPropertyListAccess<T> {
        StrataPropertyListAccess::new(self.core.manager_for(id), property)
    }

    /// Returns the manager for `id`, if any accessor has created one.
    #[must_use]
    pub fn manager(&self, id: ObjectId) -> Option<Rc<ObjectDataAccessManager>> {
        self.core.managers.borrow().get(&id).cloned()
    }

    /// Number of managers currently cached in the object table.
    #[must_use]
    pub fn manager_count(&self) -> usize {
        self.core.managers.borrow().len()
    }

    /// Removes every manager that has no live accessor.
    ///
    /// Returns the number of managers removed. Stored data is unaffected.
    pub fn discard_idle_managers(&self) -> usize {
        let mut managers = self.core.managers.borrow_mut();
        let before = managers.len();
        managers.retain(|_, manager| manager.access_count() > 0);
        let removed = before - managers.len();
        if removed > 0 {
            tracing::debug!(removed, "idle object data access managers discarded");
        }
        removed
    }

    // =========================================================================
    // Scalar values
    // =========================================================================

    /// Stores `value` as the baseline of `(id, property)`.
    ///
    /// Returns `true` if the stored value changed.
    pub fn set_baseline_value<T: StrataValue>(&self, id: ObjectId, property: &str, value: T) -> bool {
        self.set_value(Layer::Baseline, id, property, value)
    }

    /// Stores `value` at override `layer` of `(id, property)`.
    ///
    /// Returns `true` if the stored value changed; `false` for equal writes
    /// and for layers beyond the configured limit.
    pub fn set_override_value<T: StrataValue>(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
        value: T,
    ) -> bool {
        self.set_value(Layer::Override(layer), id, property, value)
    }

    /// Stores `value` at `layer` of `(id, property)`.
    pub fn set_value<T: StrataValue>(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        value: T,
    ) -> bool {
        self.core.apply(layer, |storage| {
            storage.set_value(layer, id, property, ErasedValue::new(value))
        })
    }

    /// Reads the baseline value, treating a type mismatch as absent.
    #[must_use]
    pub fn try_get_baseline_value<T: StrataValue>(&self, id: ObjectId, property: &str) -> Option<T> {
        self.get_value(Layer::Baseline, id, property).ok()
    }

    /// Reads the value stored at exactly override `layer`, treating a type
    /// mismatch as absent.
    #[must_use]
    pub fn try_get_override_value<T: StrataValue>(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
    ) -> Option<T> {
        self.get_value(Layer::Override(layer), id, property).ok()
    }

    /// Reads the baseline value.
    ///
    /// # Errors
    ///
    /// [`StrataError::Absent`] if no baseline is stored,
    /// [`StrataError::TypeMismatch`] if it is not a `T`.
    pub fn get_baseline_value<T: StrataValue>(
        &self,
        id: ObjectId,
        property: &str,
    ) -> Result<T, StrataError> {
        self.get_value(Layer::Baseline, id, property)
    }

    /// Reads the value stored at exactly override `layer`.
    ///
    /// # Errors
    ///
    /// As [`get_value`](Self::get_value).
    pub fn get_override_value<T: StrataValue>(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
    ) -> Result<T, StrataError> {
        self.get_value(Layer::Override(layer), id, property)
    }

    /// Reads the value stored at exactly `layer`.
    ///
    /// # Errors
    ///
    /// [`StrataError::LayerLimitExceeded`] for layers beyond the configured
    /// limit, [`StrataError::Absent`] if nothing is stored,
    /// [`StrataError::TypeMismatch`] if the stored value is not a `T`.
    pub fn get_value<T: StrataValue>(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
    ) -> Result<T, StrataError> {
        self.core.check_layer(layer)?;
        let storage = self.core.storage();
        let stored = storage
            .value(layer, id, property)
            .ok_or_else(|| StrataError::Absent {
                layer,
                property: String::from(property),
            })?;
        stored.downcast::<T>().ok_or_else(|| StrataError::TypeMismatch {
            layer,
            property: String::from(property),
            expected: core::any::type_name::<T>(),
        })
    }

    /// Returns the active layer of a scalar property: the highest override
    /// layer holding a value, else the baseline if it holds one.
    #[must_use]
    pub fn find_active_layer(&self, id: ObjectId, property: &str) -> Option<Layer> {
        self.core.storage().highest_value_layer(id, property)
    }

    /// Removes the baseline value of `(id, property)`. No-op if absent.
    pub fn obliterate_property_storage_in_baseline(&self, id: ObjectId, property: &str) -> bool {
        self.obliterate_value(Layer::Baseline, id, property)
    }

    /// Removes the value of `(id, property)` at override `layer`. No-op if absent.
    pub fn obliterate_property_storage_in_layer(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
    ) -> bool {
        self.obliterate_value(Layer::Override(layer), id, property)
    }

    /// Removes the value of `(id, property)` at `layer`. No-op if absent.
    pub fn obliterate_value(&self, layer: Layer, id: ObjectId, property: &str) -> bool {
        self.core
            .apply(layer, |storage| storage.remove_value(layer, id, property))
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Inserts `value` at `index` of the baseline list.
    ///
    /// Returns `false` if `index` is past the end of the list.
    pub fn insert_element_into_baseline_list<T: StrataValue>(
        &self,
        id: ObjectId,
        property: &str,
        index: usize,
        value: T,
    ) -> bool {
        self.insert_list_element(Layer::Baseline, id, property, index, value)
    }

    /// Inserts `value` at `index` of the list at override `layer`.
    ///
    /// `index` addresses the list as seen from `layer`; the insertion is
    /// recorded at that layer on top of the layers below. Returns `false` if
    /// `index` is out of bounds.
    pub fn insert_element_into_override_layer_list<T: StrataValue>(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
        index: usize,
        value: T,
    ) -> bool {
        self.insert_list_element(Layer::Override(layer), id, property, index, value)
    }

    /// Inserts `value` at `index` of the list at `layer`.
    pub fn insert_list_element<T: StrataValue>(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        index: usize,
        value: T,
    ) -> bool {
        self.core.apply(layer, |storage| {
            storage
                .insert_list_element(layer, id, property, index, ErasedValue::new(value))
                .ok()
        })
    }

    /// Appends `value` to the baseline list.
    pub fn add_element_into_baseline_list<T: StrataValue>(
        &self,
        id: ObjectId,
        property: &str,
        value: T,
    ) -> bool {
        self.add_list_element(Layer::Baseline, id, property, value)
    }

    /// Appends `value` to the list at override `layer`.
    pub fn add_element_into_override_layer_list<T: StrataValue>(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
        value: T,
    ) -> bool {
        self.add_list_element(Layer::Override(layer), id, property, value)
    }

    /// Appends `value` to the list at `layer`.
    pub fn add_list_element<T: StrataValue>(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        value: T,
    ) -> bool {
        self.core.apply(layer, |storage| {
            Some(storage.push_list_element(layer, id, property, ErasedValue::new(value)))
        })
    }

    /// Removes the element at `index` of the baseline list.
    ///
    /// Returns `false` if there is no element at `index`.
    pub fn remove_element_from_baseline_list(
        &self,
        id: ObjectId,
        property: &str,
        index: usize,
    ) -> bool {
        self.remove_list_element(Layer::Baseline, id, property, index)
    }

    /// Removes the element at `index` of the list at override `layer`.
    pub fn remove_element_from_override_layer_list(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
        index: usize,
    ) -> bool {
        self.remove_list_element(Layer::Override(layer), id, property, index)
    }

    /// Removes the element at `index` of the list at `layer`.
    pub fn remove_list_element(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        index: usize,
    ) -> bool {
        self.core.apply(layer, |storage| {
            storage.remove_list_element(layer, id, property, index).ok()
        })
    }

    /// Empties the baseline list, leaving it set.
    pub fn remove_all_elements_in_baseline_list(&self, id: ObjectId, property: &str) -> bool {
        self.remove_all_list_elements(Layer::Baseline, id, property)
    }

    /// Empties the list at override `layer`, leaving it set.
    pub fn remove_all_elements_in_override_layer_list(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
    ) -> bool {
        self.remove_all_list_elements(Layer::Override(layer), id, property)
    }

    /// Empties the list at `layer`, leaving it set.
    pub fn remove_all_list_elements(&self, layer: Layer, id: ObjectId, property: &str) -> bool {
        self.core.apply(layer, |storage| {
            storage.clear_list_elements(layer, id, property)
        })
    }

    /// Removes the baseline list entirely. No-op if absent.
    pub fn obliterate_list_storage_in_baseline(&self, id: ObjectId, property: &str) -> bool {
        self.obliterate_list(Layer::Baseline, id, property)
    }

    /// Removes the list at override `layer` entirely. No-op if absent.
    pub fn obliterate_list_storage_in_layer(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
    ) -> bool {
        self.obliterate_list(Layer::Override(layer), id, property)
    }

    /// Removes the list at `layer` entirely. No-op if absent.
    pub fn obliterate_list(&self, layer: Layer, id: ObjectId, property: &str) -> bool {
        self.core
            .apply(layer, |storage| storage.remove_list(layer, id, property))
    }

    /// Overwrites the list at `destination` with the list as seen from
    /// `source`.
    pub fn reset_layer_by_copying_elements(
        &self,
        source: Layer,
        destination: Layer,
        id: ObjectId,
        property: &str,
    ) -> bool {
        self.core.apply(destination, |storage| {
            storage.copy_list(source, destination, id, property)
        })
    }

    /// Returns the baseline list, skipping elements that are not a `T`.
    #[must_use]
    pub fn try_get_baseline_list<T: StrataValue>(
        &self,
        id: ObjectId,
        property: &str,
    ) -> Option<Vec<T>> {
        self.core
            .storage()
            .list_at(Layer::Baseline, id, property)
            .map(|list| list.values())
    }

    /// Returns the list as seen from override `layer`, if that layer holds
    /// a list.
    #[must_use]
    pub fn try_get_override_layer_list<T: StrataValue>(
        &self,
        layer: usize,
        id: ObjectId,
        property: &str,
    ) -> Option<Vec<T>> {
        self.core
            .storage()
            .list_at(Layer::Override(layer), id, property)
            .map(|list| list.values())
    }

    /// Returns the list as seen from `layer`.
    #[must_use]
    pub fn materialized_list<T: StrataValue>(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
    ) -> Option<Vec<T>> {
        self.core
            .storage()
            .materialized_list(layer, id, property)
            .map(|list| list.values())
    }

    // =========================================================================
    // Bulk removal
    // =========================================================================

    /// Removes every property of `id` stored at `layer`.
    pub fn obliterate_object_in_layer(&self, layer: Layer, id: ObjectId) -> bool {
        let changes = self.core.storage.borrow_mut().remove_object_in_layer(layer, id);
        self.emit_all(changes)
    }

    /// Removes every property of every object stored at `layer`.
    pub fn obliterate_layer(&self, layer: Layer) -> bool {
        let changes = self.core.storage.borrow_mut().clear_layer(layer);
        if !changes.is_empty() {
            tracing::debug!(%layer, count = changes.len(), "layer obliterated");
        }
        self.emit_all(changes)
    }

    /// Removes everything stored for `id` in every layer.
    ///
    /// Accessors of the object are reset to unset.
    pub fn obliterate_object(&self, id: ObjectId) -> bool {
        let removed = self.core.storage.borrow_mut().remove_object(id);
        if removed {
            self.core.emit(Notification::Cleared(id));
        }
        removed
    }

    /// Removes all data and all override layers.
    ///
    /// Every live accessor is reset to unset.
    pub fn clear_all(&self) {
        self.core.storage.borrow_mut().clear_all();
        let mut ids: Vec<ObjectId> = self.core.managers.borrow().keys().copied().collect();
        ids.sort_unstable();
        tracing::debug!(managed = ids.len(), "store cleared");
        for id in ids {
            self.core.emit(Notification::Cleared(id));
        }
    }

    fn emit_all(&self, changes: Vec<LayerChange>) -> bool {
        let changed = !changes.is_empty();
        for change in changes {
            self.core.emit(Notification::Changed(change));
        }
        changed
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of override layers created so far.
    #[must_use]
    pub fn override_layer_count(&self) -> usize {
        self.core.storage().override_layer_count()
    }

    /// Every object id holding data, sorted.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.core.storage().object_ids()
    }

    /// Every property name stored for `id`, sorted.
    #[must_use]
    pub fn property_names(&self, id: ObjectId) -> Vec<String> {
        self.core.storage().property_names(id)
    }
}

impl Default for Stratabase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stratabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stratabase")
            .field("config", &self.core.config)
            .field("override_layers", &self.override_layer_count())
            .field("managers", &self.manager_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StratabaseConfigBuilder;
    use alloc::vec;

    const ID: ObjectId = ObjectId::from_u128(0x61);

    #[test]
    fn baseline_round_trip() {
        let strata = Stratabase::new();
        assert!(strata.set_baseline_value(ID, "X", 42));
        assert_eq!(strata.try_get_baseline_value::<i32>(ID, "X"), Some(42));

        assert!(strata.obliterate_property_storage_in_baseline(ID, "X"));
        assert_eq!(strata.try_get_baseline_value::<i32>(ID, "X"), None);
        assert!(!strata.obliterate_property_storage_in_baseline(ID, "X"));
    }

    #[test]
    fn get_distinguishes_absent_from_mismatch() {
        let strata = Stratabase::new();
        assert!(matches!(
            strata.get_baseline_value::<i32>(ID, "X"),
            Err(StrataError::Absent { .. })
        ));

        strata.set_baseline_value(ID, "X", 42_i32);
        assert!(matches!(
            strata.get_baseline_value::<String>(ID, "X"),
            Err(StrataError::TypeMismatch { .. })
        ));
        // The lenient form collapses both to `None`.
        assert_eq!(strata.try_get_baseline_value::<String>(ID, "X"), None);
    }

    #[test]
    fn override_reads_are_exact_scope() {
        let strata = Stratabase::new();
        strata.set_baseline_value(ID, "X", 1);
        strata.set_override_value(2, ID, "X", 3);

        assert_eq!(strata.try_get_override_value::<i32>(2, ID, "X"), Some(3));
        assert_eq!(strata.try_get_override_value::<i32>(1, ID, "X"), None);
        assert_eq!(strata.find_active_layer(ID, "X"), Some(Layer::Override(2)));
    }

    #[test]
    fn layer_limit_rejects_writes() {
        let strata = Stratabase::with_config(
            StratabaseConfigBuilder::new().override_layer_limit(2).build(),
        );
        assert!(strata.set_override_value(1, ID, "X", 1));
        assert!(!strata.set_override_value(2, ID, "X", 1));
        assert!(!strata.add_element_into_override_layer_list(2, ID, "L", 1));
        assert_eq!(strata.override_layer_count(), 2);
        assert_eq!(
            strata.get_override_value::<i32>(5, ID, "X"),
            Err(StrataError::LayerLimitExceeded { layer: 5, limit: 2 })
        );
    }

    #[test]
    fn list_operations_report_bounds() {
        let strata = Stratabase::new();
        assert!(!strata.insert_element_into_baseline_list(ID, "L", 1, 'a'));
        assert!(strata.insert_element_into_baseline_list(ID, "L", 0, 'a'));
        assert!(strata.add_element_into_baseline_list(ID, "L", 'c'));
        assert!(strata.insert_element_into_baseline_list(ID, "L", 1, 'b'));
        assert_eq!(
            strata.try_get_baseline_list::<char>(ID, "L"),
            Some(vec!['a', 'b', 'c'])
        );

        assert!(!strata.remove_element_from_baseline_list(ID, "L", 3));
        assert!(strata.remove_element_from_baseline_list(ID, "L", 0));
        assert!(strata.remove_all_elements_in_baseline_list(ID, "L"));
        assert!(!strata.remove_all_elements_in_baseline_list(ID, "L"));
        assert_eq!(strata.try_get_baseline_list::<char>(ID, "L"), Some(vec![]));
        assert!(strata.obliterate_list_storage_in_baseline(ID, "L"));
        assert_eq!(strata.try_get_baseline_list::<char>(ID, "L"), None);
    }

    #[test]
    fn managers_are_discarded_when_idle() {
        let strata = Stratabase::new();
        let a = strata.property_access::<i32>(ID, "X");
        let b = strata.property_access::<i32>(ID, "Y");
        assert_eq!(strata.manager_count(), 1);
        assert_eq!(strata.manager(ID).map(|m| m.access_count()), Some(2));

        drop(a);
        assert_eq!(strata.manager_count(), 1);
        drop(b);
        assert_eq!(strata.manager_count(), 0);
    }

    #[test]
    fn idle_managers_can_be_swept_explicitly() {
        let strata = Stratabase::with_config(
            StratabaseConfigBuilder::new()
                .discard_idle_managers(false)
                .build(),
        );
        drop(strata.property_access::<i32>(ID, "X"));
        assert_eq!(strata.manager_count(), 1);
        assert_eq!(strata.discard_idle_managers(), 1);
        assert_eq!(strata.manager_count(), 0);
    }

    #[test]
    fn obliterate_object_in_layer_keeps_other_layers() {
        let strata = Stratabase::new();
        strata.set_baseline_value(ID, "X", 1);
        strata.set_override_value(0, ID, "X", 2);
        strata.add_element_into_override_layer_list(0, ID, "L", 2);

        assert!(strata.obliterate_object_in_layer(Layer::Override(0), ID));
        assert_eq!(strata.find_active_layer(ID, "X"), Some(Layer::Baseline));
        assert_eq!(strata.try_get_override_layer_list::<i32>(0, ID, "L"), None);
        assert_eq!(strata.property_names(ID), ["X"]);

        assert!(strata.obliterate_object(ID));
        assert!(strata.object_ids().is_empty());
    }
}
