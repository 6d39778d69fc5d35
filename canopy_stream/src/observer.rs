// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observers: the receiving end of a [`Stream`](crate::Stream).

use alloc::rc::Rc;
use core::cell::Cell;

use crate::error::StreamError;

/// A set of callbacks receiving the notifications of a stream.
///
/// An observer sees zero or more `next` notifications followed by at most one
/// terminal notification (`error` or `complete`). Once terminated, or once the
/// owning subscription has been closed, further notifications are dropped.
///
/// Observers are cheap to clone; all clones share the same callbacks and the
/// same closed flag.
pub struct Observer<T> {
    on_next: Rc<dyn Fn(T)>,
    on_error: Rc<dyn Fn(StreamError)>,
    on_complete: Rc<dyn Fn()>,
    closed: Rc<Cell<bool>>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            on_next: self.on_next.clone(),
            on_error: self.on_error.clone(),
            on_complete: self.on_complete.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<T> core::fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Observer")
            .field("closed", &self.closed.get())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Observer<T> {
    /// Create an observer from a `next` callback.
    ///
    /// Errors are reported through `log::error!` and completion is ignored
    /// until [`Observer::with_error`] / [`Observer::with_complete`] replace them.
    pub fn new(next: impl Fn(T) + 'static) -> Self {
        Self {
            on_next: Rc::new(next),
            on_error: Rc::new(|err| log::error!("unhandled stream error: {err}")),
            on_complete: Rc::new(|| {}),
            closed: Rc::new(Cell::new(false)),
        }
    }

    /// An observer that ignores every notification except errors, which are logged.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Replace the error callback.
    #[must_use]
    pub fn with_error(mut self, error: impl Fn(StreamError) + 'static) -> Self {
        self.on_error = Rc::new(error);
        self
    }

    /// Replace the completion callback.
    #[must_use]
    pub fn with_complete(mut self, complete: impl Fn() + 'static) -> Self {
        self.on_complete = Rc::new(complete);
        self
    }

    /// Deliver a value.
    pub fn next(&self, value: T) {
        if !self.closed.get() {
            (self.on_next)(value);
        }
    }

    /// Deliver a terminal error.
    pub fn error(&self, err: StreamError) {
        if !self.closed.replace(true) {
            (self.on_error)(err);
        }
    }

    /// Deliver completion.
    pub fn complete(&self) {
        if !self.closed.replace(true) {
            (self.on_complete)();
        }
    }

    /// Returns `true` once the observer has terminated or been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// An observer of `S` that runs `next` and forwards terminal
    /// notifications to `self`.
    pub(crate) fn forward<S: 'static>(&self, next: impl Fn(S) + 'static) -> Observer<S> {
        let on_error = self.clone();
        let on_complete = self.clone();
        Observer::new(next)
            .with_error(move |err| on_error.error(err))
            .with_complete(move || on_complete.complete())
    }

    /// Wrap `self` behind a fresh closed flag.
    ///
    /// The returned observer forwards to `self` until `closed` is set; the
    /// `after_terminal` hook runs after an error or completion was delivered.
    pub(crate) fn guarded(
        &self,
        closed: Rc<Cell<bool>>,
        after_terminal: impl Fn() + 'static,
    ) -> Self {
        let after_terminal: Rc<dyn Fn()> = Rc::new(after_terminal);
        let next = self.clone();
        let error = self.clone();
        let complete = self.clone();
        let after_error = after_terminal.clone();
        Self {
            on_next: Rc::new(move |value| next.next(value)),
            on_error: Rc::new(move |err| {
                error.error(err);
                after_error();
            }),
            on_complete: Rc::new(move || {
                complete.complete();
                after_terminal();
            }),
            closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequenceError;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[test]
    fn nothing_after_complete() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let done = Rc::new(Cell::new(0));
        let counter = done.clone();
        let obs = Observer::new(move |v: u32| sink.borrow_mut().push(v))
            .with_complete(move || counter.set(counter.get() + 1));
        obs.next(1);
        obs.complete();
        obs.next(2);
        obs.complete();
        assert_eq!(*seen.borrow(), [1]);
        assert_eq!(done.get(), 1);
        assert!(obs.is_closed());
    }

    #[test]
    fn error_is_terminal() {
        let errors = Rc::new(Cell::new(0));
        let counter = errors.clone();
        let obs = Observer::<u8>::noop().with_error(move |_| counter.set(counter.get() + 1));
        obs.error(Rc::new(SequenceError::Empty));
        obs.complete();
        obs.error(Rc::new(SequenceError::Empty));
        assert_eq!(errors.get(), 1);
    }
}
