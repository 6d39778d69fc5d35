// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy DOM: an in-memory live document.
//!
//! ## Overview
//!
//! [`Document`] stores element and text nodes in a generational arena addressed
//! by [`NodeId`]. On top of the tree it offers:
//!
//! - CSS [`Selector`] parsing and matching, with [`query_selector`] and
//!   [`query_selector_all`] for document-order lookups.
//! - Native event listeners and [`dispatch_event`], which runs the capture,
//!   target and bubble phases with `stopPropagation` semantics.
//! - [`diff`] and [`patch`], which bring a live subtree in line with a
//!   synchronous [`UiNode`](canopy_vtree::UiNode), and [`read_tree`] for the
//!   reverse direction.
//!
//! ```
//! use canopy_dom::{Document, Selector, create, query_selector_all};
//! use canopy_vtree::h;
//!
//! let mut doc = Document::new();
//! let list = create(
//!     &mut doc,
//!     &h("ul").children(["a", "b"].map(|t| h("li.item").text(t))).build(),
//! )
//! .unwrap();
//! let body = doc.body();
//! doc.append_child(body, list).unwrap();
//!
//! let items = query_selector_all(&doc, body, &Selector::parse("ul > .item").unwrap());
//! assert_eq!(items.len(), 2);
//! assert_eq!(doc.text_content(items[1]), "b");
//! ```
//!
//! The isolation attribute ([`ISOLATE_ATTRIBUTE`](canopy_vtree::ISOLATE_ATTRIBUTE))
//! is reserved: only the patch engine writes it, from the isolation declared on
//! a tree's elements.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod document;
mod error;
mod events;
mod patch;
mod selector;
mod types;

pub use document::Document;
pub use error::{DomError, PatchError, SelectorError};
pub use events::{
    EventFlags, Listener, NON_BUBBLING_EVENTS, NativeEvent, Phase, bubbles_natively,
    dispatch_event,
};
pub use patch::{Patch, PatchOp, create, diff, patch, read_tree};
pub use selector::{Selector, query_selector, query_selector_all};
pub use types::{ListenerId, NodeId, NodeKind};
