// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Stream: single-threaded, push-based reactive sequences.
//!
//! ## Overview
//!
//! A [`Stream`] is a cold sequence of values delivered synchronously to an
//! [`Observer`]. Subscribing returns a [`Subscription`]; closing it stops
//! delivery and releases whatever the producer set up. A [`Subject`] turns one
//! execution into a hot stream shared by many observers, optionally replaying
//! its latest value to late subscribers.
//!
//! The operator set is the one a UI driver needs:
//!
//! - [`Stream::map`], [`Stream::filter`], [`Stream::filter_map`] and [`Stream::inspect`].
//! - [`Stream::merge`] and [`Stream::combine_latest`] over a list of sources.
//! - [`Stream::switch_map`] to follow only the latest inner stream.
//! - [`Stream::start_with`], [`Stream::pairwise`], [`Stream::take`],
//!   [`Stream::skip`], [`Stream::last`] and [`Stream::catch_error`].
//!
//! ## Example
//!
//! ```
//! use canopy_stream::{Stream, Subject};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let clicks = Subject::new();
//! let labels = clicks
//!     .stream()
//!     .map(|n: u32| format!("clicked {n} times"))
//!     .start_with(String::from("idle"));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! let sub = labels.for_each(move |label| sink.borrow_mut().push(label));
//!
//! clicks.next(1);
//! sub.unsubscribe();
//! clicks.next(2);
//! assert_eq!(*seen.borrow(), ["idle", "clicked 1 times"]);
//! ```
//!
//! ## Errors
//!
//! Error notifications carry a [`StreamError`], a shared `core::error::Error`
//! trait object. An [`Observer`] built without an error callback reports
//! errors through `log::error!`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod observer;
mod operators;
mod stream;
mod subject;
mod subscription;

#[cfg(test)]
mod test_util;

pub use error::{SequenceError, StreamError};
pub use observer::Observer;
pub use stream::Stream;
pub use subject::Subject;
pub use subscription::Subscription;
