// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped element resolution and simulated bubbling.

use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use canopy_dom::{Document, NativeEvent, NodeId, Selector, SelectorError};
use canopy_dom::{query_selector, query_selector_all};
use hashbrown::HashSet;

use crate::membership::is_strictly_in_scope;
use crate::namespace::{Fragment, ScopeNamespace};

/// A [`ScopeNamespace`] with its selectors parsed once.
///
/// The namespace splits into a scope prefix (its isolation markers, which
/// locate the sealed subtree) and a selector suffix (its selector fragments,
/// joined as descendants).
#[derive(Clone, Debug)]
pub struct PreparedScope {
    namespace: ScopeNamespace,
    /// Isolation markers joined as descendants.
    prefix: Option<Selector>,
    /// Selector fragments joined as descendants.
    suffix: Option<Selector>,
    /// Every fragment joined as descendants.
    full: Option<Selector>,
    /// Every fragment on its own.
    each: Vec<Selector>,
}

impl PreparedScope {
    /// Parse the selectors of `namespace`.
    pub fn new(namespace: &ScopeNamespace) -> Result<Self, SelectorError> {
        let mut prefix: Option<Selector> = None;
        let mut suffix: Option<Selector> = None;
        let mut full: Option<Selector> = None;
        let mut each = Vec::with_capacity(namespace.fragments().len());
        for fragment in namespace.fragments() {
            let selector = match fragment {
                Fragment::Selector(s) => Selector::parse(s)?,
                Fragment::Isolation(_) => Selector::parse(&fragment.to_string())?,
            };
            let part = match fragment {
                Fragment::Selector(_) => &mut suffix,
                Fragment::Isolation(_) => &mut prefix,
            };
            *part = Some(join(part.take(), &selector));
            full = Some(join(full.take(), &selector));
            each.push(selector);
        }
        Ok(Self {
            namespace: namespace.clone(),
            prefix,
            suffix,
            full,
            each,
        })
    }

    /// The namespace this scope was prepared from.
    pub fn namespace(&self) -> &ScopeNamespace {
        &self.namespace
    }

    /// The live elements under `root` selected by the namespace.
    ///
    /// - An empty namespace yields `[root]`.
    /// - Otherwise the first element matching the isolation markers (searched
    ///   among the descendants of `root`, then `root` itself) becomes the
    ///   search root; without one the result is empty.
    /// - A namespace of isolation markers only yields that search root.
    /// - Otherwise the result is every descendant of the search root matching
    ///   the selector fragments in document order, followed by the search
    ///   root if it matches too.
    ///
    /// Every candidate must be [strictly in scope](is_strictly_in_scope) and
    /// appears at most once.
    pub fn resolve(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        if self.namespace.is_empty() {
            return vec![root];
        }
        let top = match &self.prefix {
            None => root,
            Some(prefix) => match query_selector(doc, root, prefix) {
                Some(found) => found,
                None if prefix.matches(doc, root) => root,
                None => return Vec::new(),
            },
        };
        let mut candidates = match &self.suffix {
            None => vec![top],
            Some(suffix) => {
                let mut found = query_selector_all(doc, top, suffix);
                if suffix.matches(doc, top) {
                    found.push(top);
                }
                found
            }
        };
        let mut seen = HashSet::with_capacity(candidates.len());
        candidates.retain(|&n| is_strictly_in_scope(&self.namespace, doc, n) && seen.insert(n));
        log::trace!(
            "resolved {} element(s) for `{}`",
            candidates.len(),
            self.namespace
        );
        candidates
    }

    /// Replay bubbling of `event` from its target up to `root`.
    ///
    /// Returns the element acting as current target for this namespace, or
    /// `None` when the event does not reach it. The walk skips nodes outside
    /// the namespace's isolation region and stops at the first node matching
    /// the namespace, either as a descendant selector or by matching every
    /// fragment itself (a scoped selection on its own boundary element).
    ///
    /// An event whose propagation was stopped never matches. An empty
    /// namespace matches any target under `root`, with `root` as current
    /// target.
    pub fn simulate_bubbling(
        &self,
        doc: &Document,
        root: NodeId,
        event: &NativeEvent,
    ) -> Option<NodeId> {
        if event.is_propagation_stopped() {
            return None;
        }
        let target = event.target();
        if !doc.contains(root, target) {
            return None;
        }
        if self.namespace.is_empty() {
            return Some(root);
        }
        let stop = doc.parent_of(root);
        let mut cursor = Some(target);
        while let Some(node) = cursor
            && Some(node) != stop
        {
            if is_strictly_in_scope(&self.namespace, doc, node) && self.matches(doc, node) {
                return Some(node);
            }
            cursor = doc.parent_of(node);
        }
        None
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.full.as_ref().is_some_and(|s| s.matches(doc, node))
            || (!self.each.is_empty() && self.each.iter().all(|s| s.matches(doc, node)))
    }
}

fn join(outer: Option<Selector>, inner: &Selector) -> Selector {
    match outer {
        Some(outer) => outer.then_descendant(inner),
        None => inner.clone(),
    }
}

/// Resolve `namespace` under `root`; see [`PreparedScope::resolve`].
pub fn resolve(
    namespace: &ScopeNamespace,
    doc: &Document,
    root: NodeId,
) -> Result<Vec<NodeId>, SelectorError> {
    Ok(PreparedScope::new(namespace)?.resolve(doc, root))
}

/// Replay bubbling of `event` for `namespace`; see
/// [`PreparedScope::simulate_bubbling`].
pub fn simulate_bubbling(
    namespace: &ScopeNamespace,
    doc: &Document,
    root: NodeId,
    event: &NativeEvent,
) -> Result<Option<NodeId>, SelectorError> {
    Ok(PreparedScope::new(namespace)?.simulate_bubbling(doc, root, event))
}
