// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy VTree: declarative UI trees whose branches may be asynchronous.
//!
//! ## Overview
//!
//! A [`UiNode`] describes an element hierarchy. Any node may be an
//! [`UiNode::Async`] branch: a [`Stream`](canopy_stream::Stream) of subtrees
//! whose latest value stands in for the node. [`transpose`] turns such a tree
//! into a stream of fully synchronous trees, ready to be diffed against a live
//! document or written out with [`to_html`].
//!
//! Trees are built with the hyperscript helpers [`h`], [`svg`] and [`text`]:
//!
//! ```
//! use canopy_vtree::{h, to_html};
//!
//! let page = h("main#app")
//!     .child(h("h1.title").text("Todos"))
//!     .child(h("ul").children(["milk", "eggs"].map(|t| h("li").text(t))))
//!     .build();
//! assert_eq!(
//!     to_html(&page).unwrap(),
//!     r#"<main id="app"><h1 class="title">Todos</h1><ul><li>milk</li><li>eggs</li></ul></main>"#,
//! );
//! ```
//!
//! ## Isolation
//!
//! [`UiNode::with_isolation`] marks the top element of a tree as an isolation
//! boundary. The declaration travels in [`Props::isolate`] and is written to
//! the live document under [`ISOLATE_ATTRIBUTE`] by the patch engine; scoped
//! queries use it to tell domestic nodes from nodes of a nested foreign scope.
//!
//! ## Widgets
//!
//! A [`Widget`] is an opaque leaf. The transposer passes it through untouched
//! and the patch engine renders it via [`WidgetRender::render`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod builder;
mod error;
mod html;
mod node;
mod transpose;

pub use builder::{ElementBuilder, h, svg, text};
pub use error::{SerializeError, TransposeError};
pub use html::to_html;
pub use node::{
    Element, ISOLATE_ATTRIBUTE, Props, SVG_NAMESPACE, UiNode, Widget, WidgetRender, is_valid_tag,
};
pub use transpose::transpose;
