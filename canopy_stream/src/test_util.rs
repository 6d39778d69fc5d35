// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::{Observer, Stream};

/// Subscribe to `stream` and return everything it delivered synchronously,
/// together with whether it completed.
pub(crate) fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Vec<T>, bool) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let done = Rc::new(Cell::new(false));
    let sink = seen.clone();
    let flag = done.clone();
    stream.subscribe(
        Observer::new(move |v| sink.borrow_mut().push(v)).with_complete(move || flag.set(true)),
    );
    let values = seen.borrow().clone();
    (values, done.get())
}

/// A stream whose observers can be driven by hand.
pub(crate) fn manual<T: 'static>() -> (Stream<T>, Rc<RefCell<Vec<Observer<T>>>>) {
    let observers: Rc<RefCell<Vec<Observer<T>>>> = Rc::new(RefCell::new(Vec::new()));
    let registry = observers.clone();
    let stream = Stream::new(move |out| {
        registry.borrow_mut().push(out);
        crate::Subscription::new()
    });
    (stream, observers)
}
