// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;

use crate::types::NodeId;

/// Errors raised by structural and attribute operations on a [`Document`](crate::Document).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The id refers to a removed node.
    #[error("node {0:?} is no longer alive")]
    StaleNode(NodeId),
    /// The operation needs an element.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// The operation needs a text node.
    #[error("node {0:?} is not a text node")]
    NotText(NodeId),
    /// The attribute is managed by the patch engine.
    #[error("attribute `{0}` is reserved")]
    ReservedAttribute(String),
    /// The insertion would make a node its own ancestor.
    #[error("cannot insert {child:?} under {parent:?}: hierarchy request")]
    HierarchyRequest {
        /// Would-be parent.
        parent: NodeId,
        /// Node being inserted.
        child: NodeId,
    },
    /// The reference node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Reference node.
        child: NodeId,
    },
    /// The node cannot receive event listeners.
    #[error("no listener found on node {0:?}")]
    NoListenerTarget(NodeId),
    /// The tag is not a valid element name.
    #[error("invalid tag name `{0}`")]
    InvalidTag(String),
}

/// Errors raised while parsing a CSS selector.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector (or one entry of a selector list) is empty.
    #[error("empty selector")]
    Empty,
    /// The input ended in the middle of a construct.
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    /// A character that does not fit the grammar.
    #[error("unexpected `{ch}` at offset {offset}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Byte offset in the input.
        offset: usize,
    },
    /// Valid CSS that this engine does not implement.
    #[error("unsupported selector feature `{0}`")]
    Unsupported(String),
}

/// Errors raised while applying a [`Patch`](crate::Patch).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// A document operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The tree still contains an asynchronous branch.
    #[error("cannot materialize an unresolved asynchronous node")]
    UnresolvedNode,
    /// A patch path does not lead to a node of the live tree.
    #[error("patch path {0:?} does not exist in the live tree")]
    InvalidPath(Vec<usize>),
}
