// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Stream`] type and its sources.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::error::StreamError;
use crate::observer::Observer;
use crate::subscription::Subscription;

type Producer<T> = dyn Fn(Observer<T>) -> Subscription;

/// A cold, push-based sequence of values.
///
/// A stream does nothing until subscribed. Each call to [`Stream::subscribe`]
/// runs the producer again with a fresh observer; use a
/// [`Subject`](crate::Subject) to share one execution between observers.
///
/// Delivery is synchronous: a producer may call its observer before
/// `subscribe` returns.
pub struct Stream<T> {
    producer: Rc<Producer<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: self.producer.clone(),
        }
    }
}

impl<T> core::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stream")
            .field("producer", &Rc::as_ptr(&self.producer).cast::<()>())
            .finish()
    }
}

impl<T: 'static> Stream<T> {
    /// Create a stream from a producer.
    ///
    /// The producer receives the observer for one subscription and returns a
    /// [`Subscription`] releasing whatever it set up.
    pub fn new(producer: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Returns `true` if both handles share the same producer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.producer, &other.producer)
    }

    /// Start the stream.
    ///
    /// Closing the returned subscription stops delivery to `observer` and tears
    /// down the producer. The subscription also closes itself after a terminal
    /// notification.
    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let sub = Subscription::new();
        let closed = Rc::new(Cell::new(false));
        {
            let closed = closed.clone();
            sub.add_teardown(move || closed.set(true));
        }
        let weak = sub.downgrade();
        let guarded = observer.guarded(closed, move || {
            if let Some(sub) = weak.upgrade() {
                sub.unsubscribe();
            }
        });
        let inner = (self.producer)(guarded);
        sub.add(inner);
        sub
    }

    /// Subscribe with only a `next` callback.
    pub fn for_each(&self, next: impl Fn(T) + 'static) -> Subscription {
        self.subscribe(Observer::new(next))
    }

    /// A stream that completes immediately.
    pub fn empty() -> Self {
        Self::new(|out| {
            out.complete();
            Subscription::closed()
        })
    }

    /// A stream that never notifies.
    pub fn never() -> Self {
        Self::new(|_| Subscription::new())
    }

    /// A stream that fails immediately with `err`.
    pub fn throw(err: StreamError) -> Self {
        Self::new(move |out| {
            out.error(err.clone());
            Subscription::closed()
        })
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// A stream emitting `value` once and completing.
    pub fn of(value: T) -> Self {
        Self::new(move |out| {
            out.next(value.clone());
            out.complete();
            Subscription::closed()
        })
    }

    /// A stream emitting each item of `items` in order and completing.
    pub fn from_values(items: impl IntoIterator<Item = T>) -> Self {
        let items: Rc<[T]> = items.into_iter().collect::<Vec<_>>().into();
        Self::new(move |out| {
            for item in items.iter() {
                if out.is_closed() {
                    break;
                }
                out.next(item.clone());
            }
            out.complete();
            Subscription::closed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequenceError;
    use crate::test_util::collect;
    use alloc::vec;
    use core::cell::RefCell;

    #[test]
    fn of_emits_then_completes() {
        assert_eq!(collect(&Stream::of(7)), (vec![7], true));
    }

    #[test]
    fn from_values_is_cold() {
        let s = Stream::from_values([1, 2, 3]);
        assert_eq!(collect(&s).0, [1, 2, 3]);
        assert_eq!(collect(&s).0, [1, 2, 3]);
    }

    #[test]
    fn empty_and_never() {
        assert_eq!(collect(&Stream::<u8>::empty()), (vec![], true));
        assert_eq!(collect(&Stream::<u8>::never()), (vec![], false));
    }

    #[test]
    fn subscription_closes_after_terminal() {
        let sub = Stream::of(1).for_each(|_| {});
        assert!(sub.is_closed());
        let sub = Stream::<u8>::throw(SequenceError::Empty.shared())
            .subscribe(Observer::noop().with_error(|_| {}));
        assert!(sub.is_closed());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let slot: Rc<RefCell<Option<Observer<u32>>>> = Rc::new(RefCell::new(None));
        let captured = slot.clone();
        let s = Stream::new(move |out| {
            *captured.borrow_mut() = Some(out);
            Subscription::new()
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = s.for_each(move |v| sink.borrow_mut().push(v));
        let out = slot.borrow().clone().unwrap();
        out.next(1);
        sub.unsubscribe();
        out.next(2);
        assert_eq!(*seen.borrow(), [1]);
    }

    #[test]
    fn ptr_eq_tracks_clones() {
        let a = Stream::of(1);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Stream::of(1)));
    }
}
