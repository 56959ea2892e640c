// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw keyed storage with layer scoping.
//!
//! [`LayerStorage`] holds, for the baseline and for every override layer, a
//! mapping from `(object id, property name)` to a stored scalar value and a
//! separate mapping to a stored list. It has no notion of an "active" layer
//! beyond the lookups needed by [`ObjectDataAccessManager`]; every mutation
//! returns a [`LayerChange`] describing what happened, and the owning
//! [`Stratabase`] turns those into notifications.
//!
//! # Lists
//!
//! The baseline stores a list as a plain sequence. An override layer stores
//! the edits it made (insertions, appends and removals) over whatever the
//! layers beneath it hold, so the list seen from layer `L` is the baseline
//! list with the edits of every set layer from `0` through `L` applied in
//! order. A later edit to a lower layer therefore shows through every layer
//! above it. Clearing a layer's list or copying a list into a layer replaces
//! the layer's edits with a complete sequence that shadows the layers below.
//!
//! Every list mutation is stamped with a store-wide, monotonically increasing
//! revision so that caches can discard deferred notifications they have
//! already observed.
//!
//! [`ObjectDataAccessManager`]: crate::ObjectDataAccessManager
//! [`Stratabase`]: crate::Stratabase

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::StrataError;
use crate::id::{Layer, ObjectId};
use crate::value::ErasedValue;

/// One element of a materialized list.
#[derive(Clone, Debug, PartialEq)]
pub struct ListElement {
    source: Layer,
    key: u64,
    value: ErasedValue,
}

impl ListElement {
    /// The layer this element was inserted at.
    #[must_use]
    #[inline]
    pub fn source(&self) -> Layer {
        self.source
    }

    /// The stored value.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &ErasedValue {
        &self.value
    }
}

/// One edit an override layer made to the list beneath it.
#[derive(Clone, Debug, PartialEq)]
enum ListEdit {
    /// Insert at a position, clamped to the length of the list below.
    Insert { index: usize, element: ListElement },
    /// Append after whatever the list below holds.
    Push(ListElement),
    /// Remove the element inserted under `key`, if it is still present.
    Remove { key: u64 },
}

impl ListEdit {
    fn apply(&self, elements: &mut Vec<ListElement>) {
        match self {
            Self::Insert { index, element } => {
                let at = (*index).min(elements.len());
                elements.insert(at, element.clone());
            }
            Self::Push(element) => elements.push(element.clone()),
            Self::Remove { key } => {
                if let Some(at) = elements.iter().position(|element| element.key == *key) {
                    elements.remove(at);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum ListBody {
    /// Edits applied on top of the list seen from the layer below.
    Overlay(Vec<ListEdit>),
    /// A complete list that shadows every layer below.
    Replaced(Vec<ListElement>),
}

/// The list state stored at one scope for one property.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredList {
    body: ListBody,
    revision: u64,
}

impl StoredList {
    fn empty_at(layer: Layer) -> Self {
        let body = if layer.is_baseline() {
            ListBody::Replaced(Vec::new())
        } else {
            ListBody::Overlay(Vec::new())
        };
        Self { body, revision: 0 }
    }

    /// Revision stamp of the last mutation applied at this scope.
    #[must_use]
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` if this scope holds a complete list, hiding the layers
    /// below, rather than edits on top of them.
    #[must_use]
    #[inline]
    pub fn shadows_lower_layers(&self) -> bool {
        matches!(self.body, ListBody::Replaced(_))
    }

    fn is_cleared(&self) -> bool {
        matches!(&self.body, ListBody::Replaced(elements) if elements.is_empty())
    }

    fn apply_to(&self, elements: &mut Vec<ListElement>) {
        match &self.body {
            ListBody::Replaced(list) => elements.clone_from(list),
            ListBody::Overlay(edits) => {
                for edit in edits {
                    edit.apply(elements);
                }
            }
        }
    }
}

/// A list as seen from one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterializedList {
    layer: Layer,
    elements: Vec<ListElement>,
}

impl MaterializedList {
    /// The highest set scope the list was resolved from.
    #[must_use]
    #[inline]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// The elements, in order.
    #[must_use]
    #[inline]
    pub fn elements(&self) -> &[ListElement] {
        &self.elements
    }

    /// Number of elements.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the list holds no elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Clones every element out as a `T`, skipping elements of another type.
    #[must_use]
    pub fn values<T: Clone + 'static>(&self) -> Vec<T> {
        self.elements
            .iter()
            .filter_map(|element| element.value.downcast())
            .collect()
    }

    /// Returns `true` if every element is a `T`.
    #[must_use]
    pub fn is_uniform<T: 'static>(&self) -> bool {
        self.elements.iter().all(|element| element.value.is::<T>())
    }
}

/// A positional change to a list, in the coordinates of the list as seen
/// from the layer that changed.
#[derive(Clone, Debug, PartialEq)]
pub enum ListElementChange {
    /// `element` now sits at `index`; later elements shifted up by one.
    Inserted {
        /// Position of the new element.
        index: usize,
        /// The inserted value.
        element: ErasedValue,
    },
    /// The element previously at `index` was removed.
    Removed {
        /// Former position of the element.
        index: usize,
        /// The removed value.
        element: ErasedValue,
    },
    /// The list was replaced wholesale.
    Reset,
}

/// What a mutation did at one scope.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerChangeKind {
    /// A scalar value was written and differs from what was stored before.
    ValueSet {
        /// The previous value at this scope, if any.
        old: Option<ErasedValue>,
        /// The new value.
        new: ErasedValue,
    },
    /// A scalar value was obliterated.
    ValueRemoved {
        /// The value that was stored.
        old: ErasedValue,
    },
    /// A list at this scope changed.
    ListChanged {
        /// The positional change.
        change: ListElementChange,
        /// Revision stamp of the change.
        revision: u64,
    },
    /// A list was obliterated.
    ListRemoved,
}

/// A change reported by [`LayerStorage`] for one `(object, property, layer)`.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerChange {
    /// The object the change belongs to.
    pub id: ObjectId,
    /// The property that changed.
    pub property: String,
    /// The scope that changed.
    pub layer: Layer,
    /// What happened.
    pub kind: LayerChangeKind,
}

impl LayerChange {
    /// Returns `true` if the change happened at the baseline.
    #[must_use]
    #[inline]
    pub fn is_baseline(&self) -> bool {
        self.layer.is_baseline()
    }

    /// Returns `true` for list changes (including list obliteration).
    #[must_use]
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(
            self.kind,
            LayerChangeKind::ListChanged { .. } | LayerChangeKind::ListRemoved
        )
    }
}

#[derive(Debug, Default)]
struct ObjectData {
    values: HashMap<String, ErasedValue>,
    lists: HashMap<String, StoredList>,
}

impl ObjectData {
    fn is_empty(&self) -> bool {
        self.values.is_empty() && self.lists.is_empty()
    }
}

#[derive(Debug, Default)]
struct LayerData {
    objects: HashMap<ObjectId, ObjectData>,
}

/// Baseline plus override layers of keyed property storage.
///
/// Override layers are kept sparse: only indices that have been written
/// exist, so lookups walk the layers that hold data rather than every index
/// below the one asked for.
///
/// # Example
///
/// ```rust
/// use stratabase::{ErasedValue, Layer, LayerStorage, ObjectId};
///
/// let mut storage = LayerStorage::new();
/// let id = ObjectId::from_u128(1);
///
/// assert!(storage.set_value(Layer::Baseline, id, "X", ErasedValue::new(42)).is_some());
/// // Writing an equal value is not a change.
/// assert!(storage.set_value(Layer::Baseline, id, "X", ErasedValue::new(42)).is_none());
///
/// storage.set_value(Layer::Override(3), id, "X", ErasedValue::new(7));
/// assert_eq!(storage.override_layer_count(), 4);
/// assert_eq!(storage.highest_value_layer(id, "X"), Some(Layer::Override(3)));
/// ```
#[derive(Debug, Default)]
pub struct LayerStorage {
    baseline: LayerData,
    overrides: BTreeMap<usize, LayerData>,
    revision: u64,
}

impl LayerStorage {
    /// Creates empty storage with no override layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One more than the highest override index written so far, saturating
    /// at `usize::MAX`.
    ///
    /// Layers are created implicitly by the first write that addresses them.
    #[must_use]
    #[inline]
    pub fn override_layer_count(&self) -> usize {
        self.overrides
            .last_key_value()
            .map_or(0, |(index, _)| index.saturating_add(1))
    }

    /// The latest revision stamped on any list mutation.
    #[must_use]
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The existing layers at or below `layer`, highest first, ending with
    /// the baseline.
    pub fn layers_at_or_below(&self, layer: Layer) -> impl Iterator<Item = Layer> + '_ {
        let overrides = match layer {
            Layer::Baseline => None,
            Layer::Override(index) => Some(self.overrides.range(..=index)),
        };
        overrides
            .into_iter()
            .flatten()
            .rev()
            .map(|(index, _)| Layer::Override(*index))
            .chain(core::iter::once(Layer::Baseline))
    }

    fn layer_data(&self, layer: Layer) -> Option<&LayerData> {
        match layer {
            Layer::Baseline => Some(&self.baseline),
            Layer::Override(index) => self.overrides.get(&index),
        }
    }

    fn layer_data_mut(&mut self, layer: Layer) -> Option<&mut LayerData> {
        match layer {
            Layer::Baseline => Some(&mut self.baseline),
            Layer::Override(index) => self.overrides.get_mut(&index),
        }
    }

    fn object(&self, layer: Layer, id: ObjectId) -> Option<&ObjectData> {
        self.layer_data(layer)?.objects.get(&id)
    }

    /// Returns the object's data at `layer`, creating the layer if needed.
    fn object_entry(&mut self, layer: Layer, id: ObjectId) -> &mut ObjectData {
        let data = match layer {
            Layer::Baseline => &mut self.baseline,
            Layer::Override(index) => self.overrides.entry(index).or_insert_with(|| {
                tracing::debug!(layer = index, "creating override layer");
                LayerData::default()
            }),
        };
        data.objects.entry(id).or_default()
    }

    /// Drops the object's entry at `layer` if nothing is left in it.
    fn prune(&mut self, layer: Layer, id: ObjectId) {
        if let Some(data) = self.layer_data_mut(layer)
            && data.objects.get(&id).is_some_and(ObjectData::is_empty)
        {
            data.objects.remove(&id);
        }
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn change(id: ObjectId, property: &str, layer: Layer, kind: LayerChangeKind) -> LayerChange {
        LayerChange {
            id,
            property: String::from(property),
            layer,
            kind,
        }
    }

    // =========================================================================
    // Scalar values
    // =========================================================================

    /// Returns the value stored at exactly `layer`.
    #[must_use]
    pub fn value(&self, layer: Layer, id: ObjectId, property: &str) -> Option<&ErasedValue> {
        self.object(layer, id)?.values.get(property)
    }

    /// Returns `true` if a value is stored at exactly `layer`.
    #[must_use]
    pub fn has_value(&self, layer: Layer, id: ObjectId, property: &str) -> bool {
        self.value(layer, id, property).is_some()
    }

    /// Stores `value` at `layer`, overwriting what was there.
    ///
    /// Returns `None` if an equal value was already stored, in which case
    /// nothing changed.
    pub fn set_value(
        &mut self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        value: ErasedValue,
    ) -> Option<LayerChange> {
        if self
            .value(layer, id, property)
            .is_some_and(|existing| existing.value_eq(&value))
        {
            return None;
        }
        let old = self
            .object_entry(layer, id)
            .values
            .insert(String::from(property), value.clone());
        tracing::trace!(%id, property, %layer, "value set");
        Some(Self::change(
            id,
            property,
            layer,
            LayerChangeKind::ValueSet { old, new: value },
        ))
    }

    /// Obliterates the value stored at `layer`. No-op if absent.
    pub fn remove_value(&mut self, layer: Layer, id: ObjectId, property: &str) -> Option<LayerChange> {
        let old = self
            .layer_data_mut(layer)?
            .objects
            .get_mut(&id)?
            .values
            .remove(property)?;
        self.prune(layer, id);
        tracing::trace!(%id, property, %layer, "value removed");
        Some(Self::change(
            id,
            property,
            layer,
            LayerChangeKind::ValueRemoved { old },
        ))
    }

    /// Returns the highest layer holding a value for the property.
    ///
    /// Override layers are scanned from the highest index downward; the
    /// baseline is only reported when no override layer holds a value.
    #[must_use]
    pub fn highest_value_layer(&self, id: ObjectId, property: &str) -> Option<Layer> {
        self.overrides
            .keys()
            .rev()
            .map(|index| Layer::Override(*index))
            .chain(core::iter::once(Layer::Baseline))
            .find(|layer| self.has_value(*layer, id, property))
    }

    // =========================================================================
    // Lists
    // =========================================================================

    /// Returns the list state stored at exactly `layer`.
    #[must_use]
    pub fn list(&self, layer: Layer, id: ObjectId, property: &str) -> Option<&StoredList> {
        self.object(layer, id)?.lists.get(property)
    }

    /// Returns `true` if a list is set at exactly `layer`.
    #[must_use]
    pub fn has_list(&self, layer: Layer, id: ObjectId, property: &str) -> bool {
        self.list(layer, id, property).is_some()
    }

    /// Returns the list as seen from `layer` if a list is set at exactly
    /// `layer`.
    #[must_use]
    pub fn list_at(&self, layer: Layer, id: ObjectId, property: &str) -> Option<MaterializedList> {
        if self.has_list(layer, id, property) {
            self.materialized_list(layer, id, property)
        } else {
            None
        }
    }

    /// Returns the highest layer holding a list for the property.
    #[must_use]
    pub fn highest_list_layer(&self, id: ObjectId, property: &str) -> Option<Layer> {
        self.materialized_list_layer(Layer::Override(usize::MAX), id, property)
    }

    /// Returns the highest layer at or below `layer` that holds a list.
    #[must_use]
    pub fn materialized_list_layer(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
    ) -> Option<Layer> {
        self.layers_at_or_below(layer)
            .find(|scope| self.has_list(*scope, id, property))
    }

    /// Returns the list as seen from `layer`.
    ///
    /// The set scopes at or below `layer` are folded from the bottom up,
    /// starting at the highest one that holds a complete list. Returns `None`
    /// if no scope at or below `layer` holds a list.
    #[must_use]
    pub fn materialized_list(
        &self,
        layer: Layer,
        id: ObjectId,
        property: &str,
    ) -> Option<MaterializedList> {
        let mut top = None;
        let mut stack: SmallVec<[&StoredList; 4]> = SmallVec::new();
        for scope in self.layers_at_or_below(layer) {
            let Some(list) = self.list(scope, id, property) else {
                continue;
            };
            if top.is_none() {
                top = Some(scope);
            }
            stack.push(list);
            if list.shadows_lower_layers() {
                break;
            }
        }
        let layer = top?;
        let mut elements = Vec::new();
        for list in stack.iter().rev() {
            list.apply_to(&mut elements);
        }
        Some(MaterializedList { layer, elements })
    }

    fn materialized_len(&self, layer: Layer, id: ObjectId, property: &str) -> usize {
        self.materialized_list(layer, id, property)
            .map_or(0, |list| list.len())
    }

    /// Returns the list state at `layer` for mutation, creating an empty one
    /// (edits over the layers below, for an override) if needed.
    fn list_entry(&mut self, layer: Layer, id: ObjectId, property: &str) -> &mut StoredList {
        self.object_entry(layer, id)
            .lists
            .entry_ref(property)
            .or_insert_with(|| StoredList::empty_at(layer))
    }

    /// Inserts `value` at `index` in the list as seen from `layer`.
    ///
    /// `index` may equal the current length, which appends.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::IndexOutOfBounds`] if `index` is past the end
    /// of the materialized list at that scope; nothing is modified.
    pub fn insert_list_element(
        &mut self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        index: usize,
        value: ErasedValue,
    ) -> Result<LayerChange, StrataError> {
        let len = self.materialized_len(layer, id, property);
        if index > len {
            return Err(StrataError::IndexOutOfBounds { index, len });
        }
        Ok(self.insert_unchecked(layer, id, property, index, value, false))
    }

    /// Appends `value` to the list as seen from `layer`.
    ///
    /// At an override layer the element stays last even if the layers below
    /// grow later.
    pub fn push_list_element(
        &mut self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        value: ErasedValue,
    ) -> LayerChange {
        let index = self.materialized_len(layer, id, property);
        self.insert_unchecked(layer, id, property, index, value, true)
    }

    fn insert_unchecked(
        &mut self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        index: usize,
        value: ErasedValue,
        append: bool,
    ) -> LayerChange {
        let revision = self.next_revision();
        let element = ListElement {
            source: layer,
            key: revision,
            value: value.clone(),
        };
        let list = self.list_entry(layer, id, property);
        match &mut list.body {
            ListBody::Replaced(elements) => elements.insert(index, element),
            ListBody::Overlay(edits) if append => edits.push(ListEdit::Push(element)),
            ListBody::Overlay(edits) => edits.push(ListEdit::Insert { index, element }),
        }
        list.revision = revision;
        tracing::trace!(%id, property, %layer, index, "list element inserted");
        Self::change(
            id,
            property,
            layer,
            LayerChangeKind::ListChanged {
                change: ListElementChange::Inserted {
                    index,
                    element: value,
                },
                revision,
            },
        )
    }

    /// Removes the element at `index` from the list as seen from `layer`.
    ///
    /// At an override layer this records the removal of that element, so it
    /// stays hidden from `layer` upward even if the layers below it shift.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::IndexOutOfBounds`] if there is no element at
    /// `index` in the materialized list at that scope; nothing is modified.
    pub fn remove_list_element(
        &mut self,
        layer: Layer,
        id: ObjectId,
        property: &str,
        index: usize,
    ) -> Result<LayerChange, StrataError> {
        let current = self.materialized_list(layer, id, property);
        let len = current.as_ref().map_or(0, MaterializedList::len);
        let Some(target) = current.and_then(|list| list.elements.into_iter().nth(index)) else {
            return Err(StrataError::IndexOutOfBounds { index, len });
        };
        let revision = self.next_revision();
        let list = self.list_entry(layer, id, property);
        match &mut list.body {
            ListBody::Replaced(elements) => {
                elements.remove(index);
            }
            ListBody::Overlay(edits) => edits.push(ListEdit::Remove { key: target.key }),
        }
        list.revision = revision;
        tracing::trace!(%id, property, %layer, index, "list element removed");
        Ok(Self::change(
            id,
            property,
            layer,
            LayerChangeKind::ListChanged {
                change: ListElementChange::Removed {
                    index,
                    element: target.value,
                },
                revision,
            },
        ))
    }

    /// Empties the list at `layer`, leaving an empty (but set) list behind
    /// that hides the layers below.
    ///
    /// Returns `None` if the scope already held such an empty list.
    pub fn clear_list_elements(
        &mut self,
        layer: Layer,
        id: ObjectId,
        property: &str,
    ) -> Option<LayerChange> {
        if self.list(layer, id, property).is_some_and(StoredList::is_cleared) {
            return None;
        }
        let revision = self.next_revision();
        *self.list_entry(layer, id, property) = StoredList {
            body: ListBody::Replaced(Vec::new()),
            revision,
        };
        tracing::trace!(%id, property, %layer, "list cleared");
        Some(Self::change(
            id,
            property,
            layer,
            LayerChangeKind::ListChanged {
                change: ListElementChange::Reset,
                revision,
            },
        ))
    }

    /// Replaces the list at `destination` with a copy of the list as seen
    /// from `source`.
    ///
    /// An unset source copies as an empty list. Returns `None` if
    /// `destination` already holds exactly that copy.
    pub fn copy_list(
        &mut self,
        source: Layer,
        destination: Layer,
        id: ObjectId,
        property: &str,
    ) -> Option<LayerChange> {
        let elements = self
            .materialized_list(source, id, property)
            .map(|list| list.elements)
            .unwrap_or_default();
        let body = ListBody::Replaced(elements);
        if self
            .list(destination, id, property)
            .is_some_and(|existing| existing.body == body)
        {
            return None;
        }
        let revision = self.next_revision();
        *self.list_entry(destination, id, property) = StoredList { body, revision };
        tracing::trace!(%id, property, %source, %destination, "list copied");
        Some(Self::change(
            id,
            property,
            destination,
            LayerChangeKind::ListChanged {
                change: ListElementChange::Reset,
                revision,
            },
        ))
    }

    /// Obliterates the list stored at `layer`. No-op if absent.
    pub fn remove_list(&mut self, layer: Layer, id: ObjectId, property: &str) -> Option<LayerChange> {
        self.layer_data_mut(layer)?
            .objects
            .get_mut(&id)?
            .lists
            .remove(property)?;
        self.prune(layer, id);
        tracing::trace!(%id, property, %layer, "list removed");
        Some(Self::change(id, property, layer, LayerChangeKind::ListRemoved))
    }

    // =========================================================================
    // Bulk removal
    // =========================================================================

    /// Obliterates every property of `id` stored at `layer`.
    ///
    /// Returns one change per removed value or list, in property-name order.
    pub fn remove_object_in_layer(&mut self, layer: Layer, id: ObjectId) -> Vec<LayerChange> {
        let Some(object) = self
            .layer_data_mut(layer)
            .and_then(|data| data.objects.remove(&id))
        else {
            return Vec::new();
        };
        let mut changes: Vec<LayerChange> = object
            .values
            .into_iter()
            .map(|(property, old)| LayerChange {
                id,
                property,
                layer,
                kind: LayerChangeKind::ValueRemoved { old },
            })
            .chain(object.lists.into_keys().map(|property| LayerChange {
                id,
                property,
                layer,
                kind: LayerChangeKind::ListRemoved,
            }))
            .collect();
        changes.sort_by(|a, b| a.property.cmp(&b.property));
        changes
    }

    /// Obliterates every property of every object stored at `layer`.
    pub fn clear_layer(&mut self, layer: Layer) -> Vec<LayerChange> {
        let ids: Vec<ObjectId> = self
            .layer_data(layer)
            .map(|data| data.objects.keys().copied().collect())
            .unwrap_or_default();
        let mut changes = Vec::new();
        for id in sorted(ids) {
            changes.extend(self.remove_object_in_layer(layer, id));
        }
        changes
    }

    /// Obliterates everything stored for `id` in every layer.
    ///
    /// Returns `false` if nothing was stored.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let mut removed = self.baseline.objects.remove(&id).is_some();
        for data in self.overrides.values_mut() {
            removed |= data.objects.remove(&id).is_some();
        }
        removed
    }

    /// Drops all data and all override layers.
    ///
    /// Returns the ids that held data, sorted.
    pub fn clear_all(&mut self) -> Vec<ObjectId> {
        let ids = self.object_ids();
        self.baseline.objects.clear();
        self.overrides.clear();
        ids
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Every object id holding data in any layer, sorted.
    #[must_use]
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = core::iter::once(&self.baseline)
            .chain(self.overrides.values())
            .flat_map(|data| data.objects.keys().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Every property name stored for `id` in any layer, sorted.
    #[must_use]
    pub fn property_names(&self, id: ObjectId) -> Vec<String> {
        let mut names: Vec<String> = core::iter::once(&self.baseline)
            .chain(self.overrides.values())
            .filter_map(|data| data.objects.get(&id))
            .flat_map(|object| object.values.keys().chain(object.lists.keys()))
            .cloned()
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn sorted(mut ids: Vec<ObjectId>) -> Vec<ObjectId> {
    ids.sort_unstable();
    ids
}
