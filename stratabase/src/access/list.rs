// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use super::{AccessRegistration, LayerTracking};
use crate::event::Event;
use crate::id::{Layer, ObjectId};
use crate::manager::{LayerChangeSink, ObjectDataAccessManager};
use crate::storage::{LayerChange, LayerChangeKind, ListElementChange};
use crate::value::StrataValue;

/// A change to the elements seen through a [`StrataPropertyListAccess`].
#[derive(Clone, Debug, PartialEq)]
pub enum ListChange<T> {
    /// `value` was inserted at `index`.
    Inserted {
        /// Position of the new element.
        index: usize,
        /// The new element.
        value: T,
    },
    /// `value` was removed from `index`.
    Removed {
        /// Former position of the element.
        index: usize,
        /// The removed element.
        value: T,
    },
    /// The elements were replaced wholesale; re-read them.
    Reset,
}

struct ListAccessState<T> {
    tracking: LayerTracking,
    elements: RefCell<Vec<T>>,
    revision: Cell<u64>,
    mixed: Cell<bool>,
    elements_changed: Event<ListChange<T>>,
}

impl<T: StrataValue> ListAccessState<T> {
    /// Reloads the cache from the active layer.
    ///
    /// Returns `true` if the cached elements changed.
    fn rematerialize(&self, manager: &ObjectDataAccessManager, property: &str) -> bool {
        let snapshot = self
            .tracking
            .active_layer()
            .and_then(|layer| manager.list_snapshot(layer, property))
            .unwrap_or_default();
        self.revision.set(snapshot.revision);
        self.mixed.set(snapshot.mixed);
        let mut elements = self.elements.borrow_mut();
        if *elements == snapshot.values {
            return false;
        }
        *elements = snapshot.values;
        true
    }

    /// Reloads the cache and reports a reset if anything changed.
    fn reload(&self, manager: &ObjectDataAccessManager, property: &str) -> Option<ListChange<T>> {
        self.rematerialize(manager, property)
            .then_some(ListChange::Reset)
    }

    /// Mirrors one positional change into the cache.
    ///
    /// Returns `None` if the change cannot be mirrored and the cache needs a
    /// reload instead. Positions only line up with the cache while every
    /// stored element is a `T`.
    fn mirror(&self, change: &ListElementChange) -> Option<ListChange<T>> {
        if self.mixed.get() {
            return None;
        }
        let mut elements = self.elements.borrow_mut();
        match change {
            ListElementChange::Inserted { index, element } => {
                let value = element.downcast::<T>()?;
                if *index > elements.len() {
                    return None;
                }
                elements.insert(*index, value.clone());
                Some(ListChange::Inserted {
                    index: *index,
                    value,
                })
            }
            ListElementChange::Removed { index, element } => {
                let value = element.downcast::<T>()?;
                if elements.get(*index) != Some(&value) {
                    return None;
                }
                elements.remove(*index);
                Some(ListChange::Removed {
                    index: *index,
                    value,
                })
            }
            ListElementChange::Reset => None,
        }
    }

    fn clear_handlers(&self) {
        self.tracking.clear_handlers();
        self.elements_changed.clear();
    }

    fn publish(&self, change: Option<ListChange<T>>) {
        if let Some(change) = change {
            self.elements_changed.raise(&change);
            self.tracking.value_changed.raise(&());
        }
    }
}

impl<T: StrataValue> LayerChangeSink for ListAccessState<T> {
    fn on_layer_change(&self, manager: &ObjectDataAccessManager, change: &LayerChange) {
        let tracking = &self.tracking;
        let before = tracking.flags();
        let previous = tracking.active_layer();

        let published = match &change.kind {
            LayerChangeKind::ListChanged {
                change: element_change,
                revision,
            } => {
                if change.layer.is_baseline() {
                    tracking.is_baseline_set.set(true);
                }
                if previous.is_none_or(|active| change.layer > active) {
                    tracking.active_layer.set(Some(change.layer));
                    self.rematerialize(manager, &change.property);
                    Some(ListChange::Reset)
                } else if *revision <= self.revision.get() {
                    None
                } else if previous != Some(change.layer) {
                    // A lower layer changed; it shows through unless a layer
                    // in between hides it.
                    self.reload(manager, &change.property)
                } else if let Some(mirrored) = self.mirror(element_change) {
                    self.revision.set(*revision);
                    Some(mirrored)
                } else {
                    self.rematerialize(manager, &change.property);
                    Some(ListChange::Reset)
                }
            }
            LayerChangeKind::ListRemoved => {
                if change.layer.is_baseline() {
                    tracking.is_baseline_set.set(false);
                }
                if previous == Some(change.layer) {
                    tracking
                        .active_layer
                        .set(manager.try_find_active_list_layer(&change.property));
                    self.rematerialize(manager, &change.property);
                    Some(ListChange::Reset)
                } else if previous.is_some_and(|active| change.layer < active) {
                    self.reload(manager, &change.property)
                } else {
                    None
                }
            }
            LayerChangeKind::ValueSet { .. } | LayerChangeKind::ValueRemoved { .. } => return,
        };

        tracking.raise_flag_changes(before);
        self.publish(published);
    }

    fn on_cleared(&self, _manager: &ObjectDataAccessManager) {
        self.elements.borrow_mut().clear();
        self.mixed.set(false);
        self.tracking.reset();
        self.publish(Some(ListChange::Reset));
    }
}

/// Typed access to one list property of one object.
///
/// The accessor keeps a cached copy of the list as seen from its active
/// layer (the highest layer holding a list). Changes at the active layer are
/// mirrored element by element. A change of active layer, or a change below
/// the active layer that shows through it, reloads the cache and raises
/// [`ListChange::Reset`].
///
/// Elements that are not a `T` are skipped. While the stored list holds any,
/// every change reloads the cache instead of being mirrored.
///
/// ```rust
/// use stratabase::{Layer, ObjectId, Stratabase};
///
/// let strata = Stratabase::new();
/// let id = ObjectId::new();
/// let tags = strata.list_access::<&'static str>(id, "Tags");
///
/// tags.add_element_to_baseline("a");
/// tags.add_element_to_baseline("b");
/// tags.add_element_to_override_layer(0, "c");
///
/// assert_eq!(tags.active_layer(), Some(Layer::Override(0)));
/// assert_eq!(tags.elements(), ["a", "b", "c"]);
/// assert_eq!(tags.baseline_elements(), Some(vec!["a", "b"]));
/// ```
pub struct StrataPropertyListAccess<T: StrataValue> {
    registration: AccessRegistration,
    state: Rc<ListAccessState<T>>,
}

impl<T: StrataValue> StrataPropertyListAccess<T> {
    pub(crate) fn new(manager: Rc<ObjectDataAccessManager>, property: &str) -> Self {
        let state = Rc::new(ListAccessState {
            tracking: LayerTracking::new(
                manager.try_find_active_list_layer(property),
                manager.has_list(Layer::Baseline, property),
            ),
            elements: RefCell::new(Vec::new()),
            revision: Cell::new(0),
            mixed: Cell::new(false),
            elements_changed: Event::new(),
        });
        state.rematerialize(&manager, property);
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

    /// The highest layer holding a list, or `None` while unset.
    #[must_use]
    pub fn active_layer(&self) -> Option<Layer> {
        self.state.tracking.active_layer()
    }

    /// Returns `true` if any layer holds a list, even an empty one.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.active_layer().is_some()
    }

    /// Returns `true` if the baseline holds a list.
    #[must_use]
    pub fn is_baseline_set(&self) -> bool {
        self.state.tracking.is_baseline_set.get()
    }

    /// Returns `true` once [`release`](Self::release) has run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.registration.is_released()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// A copy of the effective elements.
    #[must_use]
    pub fn elements(&self) -> Vec<T> {
        self.state.elements.borrow().clone()
    }

    /// Runs `f` on the effective elements without copying them.
    ///
    /// `f` must not write to the store.
    pub fn with_elements<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.elements.borrow())
    }

    /// Number of effective elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.elements.borrow().len()
    }

    /// Returns `true` if there are no effective elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.elements.borrow().is_empty()
    }

    /// The effective element at `index`.
    #[must_use]
    pub fn element_at(&self, index: usize) -> Option<T> {
        self.state.elements.borrow().get(index).cloned()
    }

    /// Position of the first effective element equal to `value`.
    #[must_use]
    pub fn find_element_index(&self, value: &T) -> Option<usize> {
        self.state
            .elements
            .borrow()
            .iter()
            .position(|element| element == value)
    }

    /// The baseline list.
    #[must_use]
    pub fn baseline_elements(&self) -> Option<Vec<T>> {
        self.registration
            .live()?
            .list(Layer::Baseline, self.property())
    }

    /// The list as seen from override `layer`, if that layer holds a list.
    #[must_use]
    pub fn override_layer_elements(&self, layer: usize) -> Option<Vec<T>> {
        self.registration
            .live()?
            .list(Layer::Override(layer), self.property())
    }

    /// The list as seen from `layer`.
    #[must_use]
    pub fn materialized_elements(&self, layer: Layer) -> Option<Vec<T>> {
        self.registration
            .live()?
            .materialized_list(layer, self.property())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts into the baseline list. Returns `false` if `index` is out of bounds.
    pub fn insert_element_into_baseline(&self, index: usize, value: T) -> bool {
        self.insert_element_at(Layer::Baseline, index, value)
    }

    /// Inserts into the list at override `layer`.
    pub fn insert_element_into_override_layer(&self, layer: usize, index: usize, value: T) -> bool {
        self.insert_element_at(Layer::Override(layer), index, value)
    }

    /// Inserts into the list at `layer`.
    pub fn insert_element_at(&self, layer: Layer, index: usize, value: T) -> bool {
        self.registration.live().is_some_and(|manager| {
            manager.insert_list_element(layer, self.property(), index, value)
        })
    }

    /// Appends to the baseline list.
    pub fn add_element_to_baseline(&self, value: T) -> bool {
        self.add_element_at(Layer::Baseline, value)
    }

    /// Appends to the list at override `layer`.
    pub fn add_element_to_override_layer(&self, layer: usize, value: T) -> bool {
        self.add_element_at(Layer::Override(layer), value)
    }

    /// Appends to the list at `layer`.
    pub fn add_element_at(&self, layer: Layer, value: T) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.push_list_element(layer, self.property(), value))
    }

    /// Removes the baseline element at `index`.
    pub fn remove_element_at_baseline(&self, index: usize) -> bool {
        self.remove_index_at(Layer::Baseline, index)
    }

    /// Removes the element at `index` of override `layer`.
    pub fn remove_element_at_override_layer(&self, layer: usize, index: usize) -> bool {
        self.remove_index_at(Layer::Override(layer), index)
    }

    /// Removes the element at `index` of `layer`.
    pub fn remove_index_at(&self, layer: Layer, index: usize) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.remove_list_element(layer, self.property(), index))
    }

    /// Removes the first baseline element equal to `value`.
    pub fn remove_element_from_baseline(&self, value: &T) -> bool {
        self.remove_value_at(Layer::Baseline, value)
    }

    /// Removes the first element equal to `value` from override `layer`.
    pub fn remove_element_from_override_layer(&self, layer: usize, value: &T) -> bool {
        self.remove_value_at(Layer::Override(layer), value)
    }

    /// Removes the first element equal to `value` from `layer`.
    pub fn remove_value_at(&self, layer: Layer, value: &T) -> bool {
        let Some(manager) = self.registration.live() else {
            return false;
        };
        manager
            .find_list_element(layer, self.property(), value)
            .is_some_and(|index| manager.remove_list_element(layer, self.property(), index))
    }

    /// Empties the baseline list, leaving it set.
    pub fn remove_all_elements_in_baseline(&self) -> bool {
        self.remove_all_at(Layer::Baseline)
    }

    /// Empties the list at override `layer`, leaving it set.
    pub fn remove_all_elements_in_override_layer(&self, layer: usize) -> bool {
        self.remove_all_at(Layer::Override(layer))
    }

    /// Empties the list at `layer`, leaving it set.
    pub fn remove_all_at(&self, layer: Layer) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.clear_list_elements(layer, self.property()))
    }

    /// Removes the baseline list entirely.
    pub fn clear_baseline(&self) -> bool {
        self.clear_layer(Layer::Baseline)
    }

    /// Removes the list at override `layer` entirely.
    pub fn clear_override_layer(&self, layer: usize) -> bool {
        self.clear_layer(Layer::Override(layer))
    }

    /// Removes the list at `layer` entirely.
    pub fn clear_layer(&self, layer: Layer) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.remove_list(layer, self.property()))
    }

    /// Overwrites `destination` with the list as seen from `source`.
    pub fn reset_layer_by_copying_elements(&self, source: Layer, destination: Layer) -> bool {
        self.registration
            .live()
            .is_some_and(|manager| manager.copy_list(source, destination, self.property()))
    }

    /// Overwrites `destination` with the effective elements.
    ///
    /// Returns `false` while unset.
    pub fn reset_layer_by_copying_active_elements(&self, destination: Layer) -> bool {
        self.active_layer()
            .is_some_and(|source| self.reset_layer_by_copying_elements(source, destination))
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Raised after each mirrored change or reload of the effective elements.
    pub fn elements_changed(&self) -> &Event<ListChange<T>> {
        &self.state.elements_changed
    }

    /// Raised when the effective elements may have changed.
    pub fn value_changed(&self) -> &Event<()> {
        &self.state.tracking.value_changed
    }

    /// Raised with the new state when the property becomes set or unset.
    pub fn is_set_changed(&self) -> &Event<bool> {
        &self.state.tracking.is_set_changed
    }

    /// Raised with the new state when the baseline list appears or disappears.
    pub fn is_baseline_set_changed(&self) -> &Event<bool> {
        &self.state.tracking.is_baseline_set_changed
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

impl<T: StrataValue> Drop for StrataPropertyListAccess<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: StrataValue> fmt::Debug for StrataPropertyListAccess<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrataPropertyListAccess")
            .field("id", &self.id())
            .field("property", &self.property())
            .field("active_layer", &self.active_layer())
            .field("elements", &*self.state.elements.borrow())
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Layer, ListChange, ObjectId, Stratabase};
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    const ID: ObjectId = ObjectId::from_u128(0x115);

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        (log, move |item: &T| sink.borrow_mut().push(item.clone()))
    }

    #[test]
    fn active_layer_edits_are_mirrored() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        let (log, handler) = recorder::<ListChange<char>>();
        tags.elements_changed().subscribe(handler);

        tags.add_element_to_baseline('a');
        tags.add_element_to_baseline('c');
        tags.insert_element_into_baseline(1, 'b');
        tags.remove_element_from_baseline(&'a');

        assert_eq!(tags.elements(), ['b', 'c']);
        assert_eq!(
            *log.borrow(),
            [
                ListChange::Reset,
                ListChange::Inserted { index: 1, value: 'c' },
                ListChange::Inserted { index: 1, value: 'b' },
                ListChange::Removed { index: 0, value: 'a' },
            ]
        );
    }

    #[test]
    fn lower_layer_edits_show_through_the_active_layer() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<&'static str>(ID, "Tags");
        tags.add_element_to_baseline("a");
        tags.add_element_to_baseline("b");
        assert!(tags.insert_element_into_override_layer(0, 1, "x"));
        assert_eq!(tags.active_layer(), Some(Layer::Override(0)));
        assert_eq!(tags.elements(), ["a", "x", "b"]);

        let (log, handler) = recorder::<ListChange<&'static str>>();
        tags.elements_changed().subscribe(handler);
        tags.add_element_to_baseline("c");
        assert_eq!(tags.elements(), ["a", "x", "b", "c"]);
        assert_eq!(tags.baseline_elements(), Some(vec!["a", "b", "c"]));
        assert_eq!(*log.borrow(), [ListChange::Reset]);

        // Layer 0 still shows through once layer 1 is active.
        tags.add_element_to_override_layer(1, "y");
        tags.add_element_to_override_layer(0, "z");
        assert_eq!(tags.active_layer(), Some(Layer::Override(1)));
        assert_eq!(tags.elements(), ["a", "x", "b", "c", "z", "y"]);
        assert_eq!(
            tags.materialized_elements(Layer::Override(1)),
            Some(tags.elements())
        );
    }

    #[test]
    fn override_removal_hides_the_element_from_below() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        tags.add_element_to_baseline('a');
        tags.add_element_to_baseline('b');

        tags.remove_element_at_override_layer(0, 0);
        assert_eq!(tags.active_layer(), Some(Layer::Override(0)));
        assert_eq!(tags.elements(), ['b']);
        assert_eq!(tags.baseline_elements(), Some(vec!['a', 'b']));

        tags.add_element_to_baseline('z');
        assert_eq!(tags.elements(), ['b', 'z']);
        assert_eq!(tags.materialized_elements(Layer::Baseline), Some(vec!['a', 'b', 'z']));
    }

    #[test]
    fn hidden_lower_edits_raise_nothing() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        tags.add_element_to_baseline('a');
        tags.add_element_to_override_layer(0, 'b');
        tags.remove_all_elements_in_override_layer(0);

        let (log, handler) = recorder::<ListChange<char>>();
        tags.elements_changed().subscribe(handler);
        tags.add_element_to_baseline('c');
        assert!(tags.is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn elements_of_other_types_do_not_shift_the_cache() {
        let strata = Stratabase::new();
        strata.add_element_into_baseline_list(ID, "N", 1_i32);
        strata.add_element_into_baseline_list(ID, "N", 'c');
        strata.add_element_into_baseline_list(ID, "N", 2_i32);
        let numbers = strata.list_access::<i32>(ID, "N");
        assert_eq!(numbers.elements(), [1, 2]);

        strata.insert_element_into_baseline_list(ID, "N", 2, 9_i32);
        assert_eq!(numbers.elements(), [1, 9, 2]);
        assert_eq!(
            strata.materialized_list::<i32>(Layer::Baseline, ID, "N"),
            Some(numbers.elements())
        );

        strata.remove_element_from_baseline_list(ID, "N", 1);
        assert_eq!(numbers.elements(), [1, 9, 2]);
        strata.remove_element_from_baseline_list(ID, "N", 1);
        assert_eq!(numbers.elements(), [1, 2]);

        // With the foreign element gone, edits are mirrored again.
        let (log, handler) = recorder::<ListChange<i32>>();
        numbers.elements_changed().subscribe(handler);
        strata.add_element_into_baseline_list(ID, "N", 3_i32);
        assert_eq!(numbers.elements(), [1, 2, 3]);
        assert_eq!(*log.borrow(), [ListChange::Inserted { index: 2, value: 3 }]);
    }

    #[test]
    fn out_of_bounds_insert_is_rejected() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        assert!(!tags.insert_element_into_override_layer(0, 1, 'x'));
        assert!(!tags.is_set());
        assert!(!tags.remove_element_at_baseline(0));
    }

    #[test]
    fn obliterating_the_active_layer_falls_back() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        tags.add_element_to_baseline('a');
        tags.add_element_to_override_layer(1, 'b');
        assert_eq!(tags.elements(), ['a', 'b']);

        let (log, handler) = recorder::<ListChange<char>>();
        tags.elements_changed().subscribe(handler);
        assert!(tags.clear_override_layer(1));
        assert_eq!(tags.active_layer(), Some(Layer::Baseline));
        assert_eq!(tags.elements(), ['a']);
        assert_eq!(*log.borrow(), [ListChange::Reset]);

        assert!(tags.clear_baseline());
        assert!(!tags.is_set());
        assert!(tags.is_empty());
    }

    #[test]
    fn remove_all_keeps_the_layer_set() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        tags.add_element_to_baseline('a');
        tags.add_element_to_override_layer(0, 'b');

        assert!(tags.remove_all_elements_in_override_layer(0));
        assert_eq!(tags.active_layer(), Some(Layer::Override(0)));
        assert!(tags.is_empty());
        assert_eq!(tags.override_layer_elements(0), Some(vec![]));
    }

    #[test]
    fn copy_resets_the_destination() {
        let strata = Stratabase::new();
        let tags = strata.list_access::<char>(ID, "Tags");
        tags.add_element_to_baseline('a');
        tags.add_element_to_override_layer(0, 'b');

        let (log, handler) = recorder::<ListChange<char>>();
        tags.elements_changed().subscribe(handler);
        assert!(tags.reset_layer_by_copying_elements(Layer::Baseline, Layer::Override(0)));
        assert_eq!(tags.elements(), ['a']);
        assert_eq!(*log.borrow(), [ListChange::Reset]);

        assert!(tags.reset_layer_by_copying_active_elements(Layer::Override(3)));
        assert_eq!(tags.active_layer(), Some(Layer::Override(3)));
        assert_eq!(tags.elements(), ['a']);
    }

    #[test]
    fn second_accessor_sees_the_same_elements() {
        let strata = Stratabase::new();
        let first = strata.list_access::<u32>(ID, "N");
        first.add_element_to_baseline(1);

        let second = strata.list_access::<u32>(ID, "N");
        assert_eq!(second.elements(), [1]);
        second.add_element_to_override_layer(0, 2);
        assert_eq!(first.elements(), [1, 2]);
        assert_eq!(first.find_element_index(&2), Some(1));
    }
}
