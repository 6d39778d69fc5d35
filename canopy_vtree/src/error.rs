// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

/// A tree node that the transposer cannot classify.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransposeError {
    /// The node is neither a well-formed element, a text node, a widget nor an
    /// asynchronous branch.
    #[error("unsupported node shape: {reason}")]
    UnsupportedNodeShape {
        /// What made the node unclassifiable.
        reason: String,
    },
}

/// Failure to render a tree as HTML text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    /// The tree still contains an asynchronous branch; transpose it first.
    #[error("cannot serialize an unresolved asynchronous node")]
    UnresolvedNode,
    /// An element tag is not a valid markup name.
    #[error("invalid tag name `{0}`")]
    InvalidTag(String),
}
