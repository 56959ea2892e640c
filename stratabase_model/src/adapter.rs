// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accessors that expose stored values through a conversion.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use stratabase::{
    Event, ListChange, StrataPropertyListAccess, StrataPropertyValueAccess, StrataValue,
};

type Adapt<T, U> = Rc<dyn Fn(&T) -> U>;

/// A scalar accessor exposed as another type.
///
/// The converted value is cached and recomputed after the stored value
/// changes.
///
/// ```rust
/// use stratabase::{ObjectId, Stratabase};
/// use stratabase_model::StrataPropertyAdapter;
///
/// let strata = Stratabase::new();
/// let id = ObjectId::new();
/// strata.set_baseline_value(id, "Percent", 25_u8);
///
/// let ratio = StrataPropertyAdapter::new(
///     strata.property_access::<u8>(id, "Percent"),
///     |p: &u8| f32::from(*p) / 100.0,
/// );
/// assert_eq!(ratio.value(), Some(0.25));
///
/// ratio.access().set_override_value(0, 50);
/// assert_eq!(ratio.value(), Some(0.5));
/// ```
pub struct StrataPropertyAdapter<T: StrataValue, U> {
    access: StrataPropertyValueAccess<T>,
    adapt: Box<dyn Fn(&T) -> U>,
    cache: Rc<RefCell<Option<U>>>,
}

impl<T: StrataValue, U: Clone + 'static> StrataPropertyAdapter<T, U> {
    /// Wraps `access`, converting each read through `adapt`.
    pub fn new<F>(access: StrataPropertyValueAccess<T>, adapt: F) -> Self
    where
        F: Fn(&T) -> U + 'static,
    {
        let cache: Rc<RefCell<Option<U>>> = Rc::new(RefCell::new(None));
        let invalidate = Rc::downgrade(&cache);
        access.value_changed().subscribe(move |()| {
            if let Some(cache) = invalidate.upgrade() {
                let stale = cache.borrow_mut().take();
                drop(stale);
            }
        });
        Self {
            access,
            adapt: Box::new(adapt),
            cache,
        }
    }

    /// The converted effective value.
    #[must_use]
    pub fn value(&self) -> Option<U> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Some(cached.clone());
        }
        let value = (self.adapt)(&self.access.get_value()?);
        *self.cache.borrow_mut() = Some(value.clone());
        Some(value)
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.access.property()
    }

    /// The underlying accessor, for writes and raw reads.
    #[must_use]
    pub fn access(&self) -> &StrataPropertyValueAccess<T> {
        &self.access
    }
}

impl<T: StrataValue, U> fmt::Debug for StrataPropertyAdapter<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrataPropertyAdapter")
            .field("access", &self.access)
            .field("cached", &self.cache.borrow().is_some())
            .finish_non_exhaustive()
    }
}

/// A list accessor whose elements are exposed as another type.
///
/// The converted elements are mirrored from the accessor's
/// [`elements_changed`](StrataPropertyListAccess::elements_changed): single
/// inserts and removals are applied in place, and a reset reconverts the
/// whole list.
pub struct StrataListPropertyAdapter<T: StrataValue, U> {
    access: Rc<StrataPropertyListAccess<T>>,
    elements: Rc<RefCell<Vec<U>>>,
    elements_changed: Rc<Event<ListChange<U>>>,
}

impl<T: StrataValue, U: Clone + 'static> StrataListPropertyAdapter<T, U> {
    /// Wraps `access`, converting each element through `adapt`.
    pub fn new<F>(access: StrataPropertyListAccess<T>, adapt: F) -> Self
    where
        F: Fn(&T) -> U + 'static,
    {
        let adapt: Adapt<T, U> = Rc::new(adapt);
        let access = Rc::new(access);
        let elements = Rc::new(RefCell::new(
            access.with_elements(|source| source.iter().map(|v| adapt(v)).collect::<Vec<U>>()),
        ));
        let elements_changed = Rc::new(Event::new());

        let source = Rc::downgrade(&access);
        let mirror = Rc::downgrade(&elements);
        let relay = Rc::downgrade(&elements_changed);
        access.elements_changed().subscribe(move |change: &ListChange<T>| {
            let (Some(mirror), Some(relay)) = (mirror.upgrade(), relay.upgrade()) else {
                return;
            };
            let adapted = match change {
                ListChange::Inserted { index, value } => {
                    let value = adapt(value);
                    let mut items = mirror.borrow_mut();
                    let at = (*index).min(items.len());
                    items.insert(at, value.clone());
                    ListChange::Inserted { index: at, value }
                }
                ListChange::Removed { index, value } => {
                    let mut items = mirror.borrow_mut();
                    if *index < items.len() {
                        items.remove(*index);
                    }
                    ListChange::Removed {
                        index: *index,
                        value: adapt(value),
                    }
                }
                ListChange::Reset => {
                    if let Some(source) = source.upgrade() {
                        let reconverted: Vec<U> =
                            source.with_elements(|items| items.iter().map(|v| adapt(v)).collect());
                        *mirror.borrow_mut() = reconverted;
                    }
                    ListChange::Reset
                }
            };
            relay.raise(&adapted);
        });

        Self {
            access,
            elements,
            elements_changed,
        }
    }

    /// A copy of the converted elements.
    #[must_use]
    pub fn elements(&self) -> Vec<U> {
        self.elements.borrow().clone()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    /// Raised after each mirrored change, with converted values.
    pub fn elements_changed(&self) -> &Event<ListChange<U>> {
        &self.elements_changed
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.access.property()
    }

    /// The underlying accessor, for writes and raw reads.
    #[must_use]
    pub fn access(&self) -> &StrataPropertyListAccess<T> {
        &self.access
    }
}

impl<T: StrataValue, U> fmt::Debug for StrataListPropertyAdapter<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrataListPropertyAdapter")
            .field("access", &self.access)
            .field("len", &self.elements.borrow().len())
            .finish_non_exhaustive()
    }
}
