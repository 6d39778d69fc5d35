// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multicast: one execution, many observers.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::error::StreamError;
use crate::observer::Observer;
use crate::stream::Stream;
use crate::subscription::Subscription;

#[derive(Clone)]
enum Terminal {
    Completed,
    Failed(StreamError),
}

struct Hub<T> {
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
    replay: bool,
    latest: Option<T>,
    terminal: Option<Terminal>,
}

/// A hot stream fed by hand.
///
/// Values pushed with [`Subject::next`] are delivered to every observer
/// subscribed through [`Subject::stream`] at that moment. A subject created
/// with [`Subject::replay_latest`] additionally remembers the most recent value
/// and hands it to late subscribers before anything else.
///
/// After [`Subject::complete`] or [`Subject::error`] the subject is terminated:
/// later pushes are ignored and new subscribers receive the terminal
/// notification (preceded by the replayed value, if any).
pub struct Subject<T> {
    hub: Rc<RefCell<Hub<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
        }
    }
}

impl<T> core::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let hub = self.hub.borrow();
        f.debug_struct("Subject")
            .field("observers", &hub.observers.len())
            .field("replay", &hub.replay)
            .field("terminated", &hub.terminal.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// A subject without replay.
    pub fn new() -> Self {
        Self::with_replay(false)
    }

    /// A subject replaying its most recent value to late subscribers.
    pub fn replay_latest() -> Self {
        Self::with_replay(true)
    }

    fn with_replay(replay: bool) -> Self {
        Self {
            hub: Rc::new(RefCell::new(Hub {
                observers: Vec::new(),
                next_id: 0,
                replay,
                latest: None,
                terminal: None,
            })),
        }
    }

    /// Push a value to every current observer.
    pub fn next(&self, value: T) {
        let observers = {
            let mut hub = self.hub.borrow_mut();
            if hub.terminal.is_some() {
                return;
            }
            if hub.replay {
                hub.latest = Some(value.clone());
            }
            snapshot(&hub.observers)
        };
        for observer in observers {
            observer.next(value.clone());
        }
    }

    /// Terminate with an error.
    pub fn error(&self, err: StreamError) {
        self.terminate(Terminal::Failed(err));
    }

    /// Terminate with completion.
    pub fn complete(&self) {
        self.terminate(Terminal::Completed);
    }

    fn terminate(&self, terminal: Terminal) {
        let observers = {
            let mut hub = self.hub.borrow_mut();
            if hub.terminal.is_some() {
                return;
            }
            hub.terminal = Some(terminal.clone());
            core::mem::take(&mut hub.observers)
        };
        for (_, observer) in observers {
            deliver_terminal(&observer, &terminal);
        }
    }

    /// The most recent value, for a replaying subject.
    pub fn latest(&self) -> Option<T> {
        self.hub.borrow().latest.clone()
    }

    /// Number of currently subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.hub.borrow().observers.len()
    }

    /// Returns `true` after [`Subject::complete`] or [`Subject::error`].
    pub fn is_terminated(&self) -> bool {
        self.hub.borrow().terminal.is_some()
    }

    /// A stream subscribing to this subject.
    pub fn stream(&self) -> Stream<T> {
        let hub = Rc::downgrade(&self.hub);
        Stream::new(move |out| subscribe_to_hub(&hub, out))
    }
}

fn snapshot<T>(observers: &[(u64, Observer<T>)]) -> Vec<Observer<T>> {
    observers.iter().map(|(_, o)| o.clone()).collect()
}

fn deliver_terminal<T: 'static>(observer: &Observer<T>, terminal: &Terminal) {
    match terminal {
        Terminal::Completed => observer.complete(),
        Terminal::Failed(err) => observer.error(err.clone()),
    }
}

fn subscribe_to_hub<T: Clone + 'static>(hub: &Weak<RefCell<Hub<T>>>, out: Observer<T>) -> Subscription {
    let Some(strong) = hub.upgrade() else {
        // The subject is gone; nothing can ever be pushed again.
        out.complete();
        return Subscription::closed();
    };
    let (replayed, terminal, id) = {
        let mut h = strong.borrow_mut();
        let replayed = h.latest.clone();
        let terminal = h.terminal.clone();
        let id = h.next_id;
        if terminal.is_none() {
            h.next_id += 1;
            h.observers.push((id, out.clone()));
        }
        (replayed, terminal, id)
    };
    if let Some(value) = replayed {
        out.next(value);
    }
    if let Some(terminal) = terminal {
        deliver_terminal(&out, &terminal);
        return Subscription::closed();
    }
    let hub = hub.clone();
    Subscription::from_teardown(move || {
        if let Some(hub) = hub.upgrade() {
            hub.borrow_mut().observers.retain(|(other, _)| *other != id);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequenceError;
    use crate::test_util::collect;
    use alloc::vec;
    use core::cell::Cell;

    #[test]
    fn multicasts_to_current_observers() {
        let subject = Subject::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let a = seen.clone();
        let b = seen.clone();
        subject.stream().for_each(move |v| a.borrow_mut().push(("a", v)));
        subject.next(1);
        subject.stream().for_each(move |v| b.borrow_mut().push(("b", v)));
        subject.next(2);
        assert_eq!(*seen.borrow(), [("a", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn replay_latest_serves_late_subscribers() {
        let subject = Subject::replay_latest();
        subject.next("old");
        subject.next("new");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        subject.stream().for_each(move |v| sink.borrow_mut().push(v));
        assert_eq!(*seen.borrow(), ["new"]);
        assert_eq!(subject.latest(), Some("new"));
    }

    #[test]
    fn late_subscriber_sees_terminal() {
        let subject = Subject::replay_latest();
        subject.next(3);
        subject.complete();
        subject.next(4);
        assert_eq!(collect(&subject.stream()), (vec![3], true));
    }

    #[test]
    fn error_reaches_observers() {
        let subject = Subject::<u8>::new();
        let failed = Rc::new(Cell::new(false));
        let flag = failed.clone();
        subject
            .stream()
            .subscribe(Observer::noop().with_error(move |_| flag.set(true)));
        subject.error(SequenceError::Empty.shared());
        assert!(failed.get());
        assert!(subject.is_terminated());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn unsubscribe_detaches() {
        let subject = Subject::<u8>::new();
        let sub = subject.stream().for_each(|_| {});
        assert_eq!(subject.observer_count(), 1);
        sub.unsubscribe();
        assert_eq!(subject.observer_count(), 0);
    }
}
