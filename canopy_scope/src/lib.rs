// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Scope: scoped selection over a live [`Document`](canopy_dom::Document).
//!
//! A [`ScopeNamespace`] records a chain of scoped selections: plain selector
//! fragments and isolation markers. Against a live root it answers two
//! questions:
//!
//! - which elements does the namespace select ([`PreparedScope::resolve`]);
//! - does an event dispatched at some target reach a handler scoped to the
//!   namespace, and at which element ([`PreparedScope::simulate_bubbling`]).
//!
//! Both answers exclude nodes sealed inside a nested foreign isolation
//! boundary, as decided by [`is_strictly_in_scope`].
//!
//! ```
//! use canopy_dom::{Document, create};
//! use canopy_scope::{ScopeNamespace, resolve};
//! use canopy_vtree::h;
//!
//! let mut doc = Document::new();
//! let root = create(
//!     &mut doc,
//!     &h("div")
//!         .child(h("p").text("mine"))
//!         .child(h("div").isolate("child").child(h("p").text("theirs")))
//!         .build(),
//! )
//! .unwrap();
//!
//! let paragraphs = resolve(&ScopeNamespace::new().with_selector("p"), &doc, root).unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! assert_eq!(doc.text_content(paragraphs[0]), "mine");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod membership;
mod namespace;
mod prepared;

pub use membership::is_strictly_in_scope;
pub use namespace::{Fragment, ScopeNamespace};
pub use prepared::{PreparedScope, resolve, simulate_bubbling};
