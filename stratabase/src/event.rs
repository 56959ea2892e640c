// Copyright 2025 the Stratabase Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit listener registration.
//!
//! [`Event`] is the observer primitive used by accessors, managers and models.
//! Handlers are registered with [`Event::subscribe`] and removed with the
//! returned [`HandlerId`].
//!
//! ## Delivery
//!
//! Delivery is synchronous. [`Event::raise`] takes a snapshot of the handler
//! list before invoking anything, so a handler may subscribe or unsubscribe
//! (itself or others) while it runs; such changes take effect for the next
//! raise. Handlers that write back into the store do not recurse: the store
//! queues their notifications until the current one has been delivered (see
//! [`Stratabase`](crate::Stratabase)).

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;
use smallvec::SmallVec;

/// Identifies one registered handler on one [`Event`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Handler<A> = Rc<dyn Fn(&A)>;

/// A list of handlers invoked with a borrowed argument.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use stratabase::Event;
///
/// let event = Event::<i32>::new();
/// let total = Rc::new(Cell::new(0));
///
/// let sink = total.clone();
/// let id = event.subscribe(move |v| sink.set(sink.get() + *v));
/// event.raise(&5);
/// event.raise(&2);
/// assert_eq!(total.get(), 7);
///
/// assert!(event.unsubscribe(id));
/// event.raise(&100);
/// assert_eq!(total.get(), 7);
/// ```
pub struct Event<A: ?Sized> {
    handlers: RefCell<SmallVec<[(HandlerId, Handler<A>); 2]>>,
    next_id: Cell<u64>,
}

impl<A: ?Sized> Event<A> {
    /// Creates an event with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(SmallVec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers a handler and returns its id.
    pub fn subscribe<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&A) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Removes a handler.
    ///
    /// Returns `false` if no handler with that id is registered.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        if let Some(pos) = handlers.iter().position(|(hid, _)| *hid == id) {
            handlers.remove(pos);
            true
        } else {
            false
        }
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Invokes every handler registered at the time of the call, in
    /// registration order.
    pub fn raise(&self, args: &A) {
        let snapshot: SmallVec<[Handler<A>; 2]> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in snapshot {
            handler(args);
        }
    }
}

impl<A: ?Sized> Default for Event<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
