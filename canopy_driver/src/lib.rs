// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Driver: the render loop.
//!
//! ## Overview
//!
//! An application describes its UI as a [`Stream`](canopy_stream::Stream) of
//! [`UiNode`](canopy_vtree::UiNode) trees. [`DomDriver`] renders that stream
//! into a container of a live [`Document`](canopy_dom::Document):
//!
//! 1. every tree is [transposed](canopy_vtree::transpose) into synchronous
//!    trees, following only the latest tree of the sink;
//! 2. consecutive trees are diffed and patched into the container, aligned
//!    with the container's tag, id and class;
//! 3. the root element is published after each patch, replaying the latest
//!    one to late subscribers.
//!
//! The driver hands back a [`DomSource`]. [`DomSource::select`] and
//! [`DomSource::isolate_source`] derive narrower surfaces, each exposing its
//! [`elements`](DomSource::elements) and [`events`](DomSource::events).
//! Selections never reach into nested isolation boundaries, and events are
//! delivered through simulated bubbling, so scopes work the same for event
//! types that do not bubble natively.
//!
//! ```
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//! use canopy_dom::{Document, NativeEvent, dispatch_event};
//! use canopy_driver::{DomDriver, Driver, EventOptions};
//! use canopy_stream::Stream;
//! use canopy_vtree::h;
//!
//! let doc = Rc::new(RefCell::new(Document::new()));
//! let view = h("form")
//!     .child(h("input.name"))
//!     .child(h("input.email"))
//!     .build();
//! let source = DomDriver::new(doc.clone(), "body")?.run(Stream::of(view))?;
//!
//! let changes = Rc::new(Cell::new(0));
//! let seen = changes.clone();
//! source
//!     .select(".email")?
//!     .events("change", EventOptions::default())?
//!     .for_each(move |_| seen.set(seen.get() + 1));
//!
//! let inputs = Rc::new(RefCell::new(Vec::new()));
//! let found = inputs.clone();
//! source
//!     .select("input")?
//!     .elements()?
//!     .for_each(move |elements| *found.borrow_mut() = elements);
//! let (name, email) = (inputs.borrow()[0], inputs.borrow()[1]);
//!
//! // `change` does not bubble natively; the driver captures it and replays
//! // the bubble for each scope.
//! dispatch_event(&doc, NativeEvent::new("change", email));
//! dispatch_event(&doc, NativeEvent::new("change", name));
//! assert_eq!(changes.get(), 1);
//! # Ok::<(), canopy_driver::DriverError>(())
//! ```
//!
//! [`HtmlDriver`] is the text-output counterpart: it serializes the last tree
//! of its sink.
//!
//! Failures of an in-flight render pass (a tree that cannot be transposed or
//! patched) are reported to [`DriverConfig::with_error_handler`], which logs
//! them by default; the driver keeps rendering later trees.

mod config;
mod driver;
mod error;
mod html;
mod registry;
mod runtime;
mod source;

pub use config::{Container, DriverConfig, ErrorHandler, EventOptions};
pub use driver::{DomDriver, Driver};
pub use error::DriverError;
pub use html::{HtmlDriver, HtmlSelection, HtmlSource};
pub use runtime::DriverState;
pub use source::{DomEvent, DomSource};
