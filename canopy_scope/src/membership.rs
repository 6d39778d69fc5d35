// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_dom::{Document, NodeId};

use crate::namespace::ScopeNamespace;

/// Returns `true` if `node` belongs to the innermost isolation region of
/// `namespace` rather than to a nested foreign one.
///
/// Walks from `node` (inclusive) towards the document root. The nearest
/// element carrying an isolation marker decides: the node is in scope exactly
/// when that marker's scope is part of `namespace`. A node with no marked
/// ancestor is in scope.
///
/// Both [`PreparedScope::resolve`](crate::PreparedScope::resolve) and
/// [`PreparedScope::simulate_bubbling`](crate::PreparedScope::simulate_bubbling)
/// filter through this function.
pub fn is_strictly_in_scope(namespace: &ScopeNamespace, doc: &Document, node: NodeId) -> bool {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if let Some(scope) = doc.isolation_of(current) {
            return namespace.has_isolation(scope);
        }
        cursor = doc.parent_element(current);
    }
    true
}
