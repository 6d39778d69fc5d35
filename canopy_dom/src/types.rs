// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public identifiers for document nodes and listeners.

/// Identifier for a node in a [`Document`](crate::Document) (generational).
///
/// A `NodeId` stays valid until its node is removed; after that the slot may be
/// reused, but with a newer generation, so stale ids never alias new nodes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// What kind of node a [`NodeId`] refers to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// An element with a tag, attributes and children.
    Element,
    /// A text node.
    Text,
}

/// Handle to a registered event listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);
