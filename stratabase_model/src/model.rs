// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The model and its bound properties.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use stratabase::{
    Event, ObjectId, StrataPropertyListAccess, StrataPropertyValueAccess, StrataValue, Stratabase,
};

use crate::adapter::{StrataListPropertyAdapter, StrataPropertyAdapter};

/// One object in a [`Stratabase`], seen as a set of named properties.
///
/// The model owns no property values itself. Each `generate_*` call returns
/// a bound property that the caller keeps (typically as a field of a domain
/// type); dropping it releases the underlying accessor.
pub struct StratabaseBackedModel {
    id: ObjectId,
    strata: Stratabase,
    property_changed: Rc<Event<str>>,
}

impl StratabaseBackedModel {
    /// Binds a model to `id` in `strata`.
    #[must_use]
    pub fn new(strata: &Stratabase, id: ObjectId) -> Self {
        Self {
            id,
            strata: strata.clone(),
            property_changed: Rc::new(Event::new()),
        }
    }

    /// Binds a model to a fresh random id.
    #[must_use]
    pub fn with_new_id(strata: &Stratabase) -> Self {
        Self::new(strata, ObjectId::new())
    }

    /// The object this model reads and writes.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The backing store.
    #[must_use]
    pub fn strata(&self) -> &Stratabase {
        &self.strata
    }

    /// Raised with the property name whenever a generated property's
    /// effective value may have changed.
    pub fn property_changed(&self) -> &Event<str> {
        &self.property_changed
    }

    /// Binds a scalar property, seeding the baseline with `default` if the
    /// baseline is unset.
    pub fn generate_property<T: StrataValue>(&self, name: &str, default: T) -> BoundProperty<T> {
        let access = self.seeded_access(name, default);
        let property = BoundProperty::new(access);
        self.forward(name, property.access().value_changed());
        property
    }

    /// Binds a list property. An unset list reads as empty.
    pub fn generate_list_property<T: StrataValue>(&self, name: &str) -> BoundListProperty<T> {
        let property = BoundListProperty {
            access: self.strata.list_access(self.id, name),
        };
        self.forward(name, property.access().value_changed());
        property
    }

    /// Binds a scalar property exposed through `adapt`.
    ///
    /// The baseline is seeded with `default` if unset.
    pub fn generate_adapted_property<T, U, F>(
        &self,
        name: &str,
        default: T,
        adapt: F,
    ) -> StrataPropertyAdapter<T, U>
    where
        T: StrataValue,
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let adapter = StrataPropertyAdapter::new(self.seeded_access(name, default), adapt);
        self.forward(name, adapter.access().value_changed());
        adapter
    }

    /// Binds a list property whose elements are exposed through `adapt`.
    pub fn generate_adapted_list_property<T, U, F>(
        &self,
        name: &str,
        adapt: F,
    ) -> StrataListPropertyAdapter<T, U>
    where
        T: StrataValue,
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let adapter =
            StrataListPropertyAdapter::new(self.strata.list_access(self.id, name), adapt);
        self.forward(name, adapter.access().value_changed());
        adapter
    }

    fn seeded_access<T: StrataValue>(&self, name: &str, default: T) -> StrataPropertyValueAccess<T> {
        let access = self.strata.property_access(self.id, name);
        if !access.is_baseline_set() {
            tracing::debug!(id = %self.id, property = name, "seeding baseline with default");
            access.set_baseline_value(default);
        }
        access
    }

    /// Re-raises `source` as a `property_changed` for `name`.
    fn forward(&self, name: &str, source: &Event<()>) {
        let target: Weak<Event<str>> = Rc::downgrade(&self.property_changed);
        let name = String::from(name);
        source.subscribe(move |()| {
            if let Some(target) = target.upgrade() {
                target.raise(&name);
            }
        });
    }
}

impl fmt::Debug for StratabaseBackedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StratabaseBackedModel")
            .field("id", &self.id)
            .field("property_changed", &self.property_changed)
            .finish_non_exhaustive()
    }
}

/// A scalar model property with a lazily filled value cache.
///
/// The cache is dropped whenever the effective value may have changed and
/// refilled on the next [`get`](Self::get).
pub struct BoundProperty<T: StrataValue> {
    access: StrataPropertyValueAccess<T>,
    cache: Rc<RefCell<Option<T>>>,
}

impl<T: StrataValue> BoundProperty<T> {
    fn new(access: StrataPropertyValueAccess<T>) -> Self {
        let cache: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        let invalidate = Rc::downgrade(&cache);
        access.value_changed().subscribe(move |()| {
            if let Some(cache) = invalidate.upgrade() {
                // Take first so the old value is dropped outside the borrow.
                let stale = cache.borrow_mut().take();
                drop(stale);
            }
        });
        Self { access, cache }
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.access.property()
    }

    /// The effective value.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Some(cached.clone());
        }
        let value = self.access.get_value()?;
        *self.cache.borrow_mut() = Some(value.clone());
        Some(value)
    }

    /// Writes the baseline.
    pub fn set_baseline(&self, value: T) -> bool {
        self.access.set_baseline_value(value)
    }

    /// Writes override `layer`.
    pub fn set_override(&self, layer: usize, value: T) -> bool {
        self.access.set_override_value(layer, value)
    }

    /// Removes the value at override `layer`.
    pub fn clear_override(&self, layer: usize) -> bool {
        self.access.clear_override_value(layer)
    }

    /// The underlying accessor.
    #[must_use]
    pub fn access(&self) -> &StrataPropertyValueAccess<T> {
        &self.access
    }
}

impl<T: StrataValue> fmt::Debug for BoundProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundProperty")
            .field("access", &self.access)
            .field("cache", &self.cache.borrow())
            .finish()
    }
}

/// A list model property.
pub struct BoundListProperty<T: StrataValue> {
    access: StrataPropertyListAccess<T>,
}

impl<T: StrataValue> BoundListProperty<T> {
    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.access.property()
    }

    /// A copy of the effective elements.
    #[must_use]
    pub fn elements(&self) -> Vec<T> {
        self.access.elements()
    }

    /// Appends to the baseline list.
    pub fn push_baseline(&self, value: T) -> bool {
        self.access.add_element_to_baseline(value)
    }

    /// Appends to the list at override `layer`.
    pub fn push_override(&self, layer: usize, value: T) -> bool {
        self.access.add_element_to_override_layer(layer, value)
    }

    /// The underlying accessor.
    #[must_use]
    pub fn access(&self) -> &StrataPropertyListAccess<T> {
        &self.access
    }
}

impl<T: StrataValue> fmt::Debug for BoundListProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundListProperty")
            .field("access", &self.access)
            .finish()
    }
}
