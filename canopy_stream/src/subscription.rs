// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cancellation handles.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

type Teardown = Box<dyn FnOnce()>;

#[derive(Default)]
struct Inner {
    closed: bool,
    teardowns: Vec<Teardown>,
}

/// Handle to a running subscription.
///
/// Cloning a `Subscription` yields another handle to the same underlying
/// resource; unsubscribing through any handle closes all of them.
///
/// ## Semantics
///
/// - [`Subscription::unsubscribe`] runs every registered teardown exactly once,
///   in registration order, and marks the handle closed.
/// - Teardowns registered on an already closed handle run immediately.
/// - Unsubscribing twice is a no-op.
#[derive(Clone, Default)]
pub struct Subscription {
    inner: Rc<RefCell<Inner>>,
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Subscription")
            .field("closed", &inner.closed)
            .field("teardowns", &inner.teardowns.len())
            .finish()
    }
}

impl Subscription {
    /// Create an open subscription with no teardowns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a subscription that is already closed.
    pub fn closed() -> Self {
        let sub = Self::new();
        sub.inner.borrow_mut().closed = true;
        sub
    }

    /// Create an open subscription that runs `teardown` when unsubscribed.
    pub fn from_teardown(teardown: impl FnOnce() + 'static) -> Self {
        let sub = Self::new();
        sub.add_teardown(teardown);
        sub
    }

    /// Returns `true` once [`Subscription::unsubscribe`] has run.
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Register a teardown; runs immediately if the subscription is closed.
    pub fn add_teardown(&self, teardown: impl FnOnce() + 'static) {
        let closed = self.inner.borrow().closed;
        if closed {
            teardown();
        } else {
            self.inner.borrow_mut().teardowns.push(Box::new(teardown));
        }
    }

    /// Tie `child` to this subscription so that closing `self` closes `child`.
    pub fn add(&self, child: Self) {
        if Rc::ptr_eq(&self.inner, &child.inner) {
            return;
        }
        self.add_teardown(move || child.unsubscribe());
    }

    pub(crate) fn downgrade(&self) -> WeakSubscription {
        WeakSubscription(Rc::downgrade(&self.inner))
    }

    /// Close the subscription and run its teardowns.
    pub fn unsubscribe(&self) {
        let teardowns = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.closed = true;
            core::mem::take(&mut inner.teardowns)
        };
        // Teardowns may re-enter (for example to unsubscribe a parent), so the
        // borrow above must be released before running them.
        for teardown in teardowns {
            teardown();
        }
    }
}

/// Non-owning handle used by observers to close their own subscription.
#[derive(Clone)]
pub(crate) struct WeakSubscription(Weak<RefCell<Inner>>);

impl WeakSubscription {
    pub(crate) fn upgrade(&self) -> Option<Subscription> {
        self.0.upgrade().map(|inner| Subscription { inner })
    }
}
