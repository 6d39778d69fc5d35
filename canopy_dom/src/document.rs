// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: node arena, structure, attributes.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use canopy_vtree::{ISOLATE_ATTRIBUTE, is_valid_tag};

use crate::error::DomError;
use crate::events::ListenerRecord;
use crate::types::{NodeId, NodeKind};

/// A live document: a tree of elements and text nodes.
///
/// Nodes live in a generational arena. Creating a node returns a [`NodeId`]
/// for a detached node; attach it with [`Document::append_child`] or
/// [`Document::insert_before`]. A fresh document contains a single `body`
/// element, the root of the connected tree.
///
/// ## Example
///
/// ```rust
/// use canopy_dom::Document;
///
/// let mut doc = Document::new();
/// let app = doc.create_element("div").unwrap();
/// doc.set_attribute(app, "id", "app").unwrap();
/// doc.append_child(doc.body(), app).unwrap();
///
/// let label = doc.create_text("hello");
/// doc.append_child(app, label).unwrap();
///
/// assert_eq!(doc.text_content(doc.body()), "hello");
/// assert_eq!(doc.parent_of(label), Some(app));
/// assert!(doc.is_connected(label));
/// ```
pub struct Document {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    body: NodeId,
    pub(crate) next_listener: u64,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) namespace: Option<String>,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) listeners: Vec<ListenerRecord>,
}

impl Node {
    fn new(generation: u32, data: NodeData) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            data,
        }
    }
}

impl Document {
    /// Create a document holding only its `body` element.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            body: NodeId::new(0, 0),
            next_listener: 0,
        };
        doc.body = doc.alloc(NodeData::Element(ElementData {
            tag: String::from("body"),
            namespace: None,
            attrs: BTreeMap::new(),
            listeners: Vec::new(),
        }));
        doc
    }

    /// The root element of the connected tree.
    pub fn body(&self) -> NodeId {
        self.body
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, data));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, data)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Create a detached HTML element.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        self.create_element_ns(tag, None)
    }

    /// Create a detached element in `namespace` (`None` for HTML).
    pub fn create_element_ns(
        &mut self,
        tag: &str,
        namespace: Option<&str>,
    ) -> Result<NodeId, DomError> {
        if !is_valid_tag(tag) {
            return Err(DomError::InvalidTag(tag.to_string()));
        }
        let tag = if namespace.is_none() {
            tag.to_ascii_lowercase()
        } else {
            tag.to_string()
        };
        Ok(self.alloc(NodeData::Element(ElementData {
            tag,
            namespace: namespace.map(ToString::to_string),
            attrs: BTreeMap::new(),
            listeners: Vec::new(),
        })))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    // --- structure ---

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference`, or last if `reference`
    /// is `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if let Some(reference) = reference
            && self.parent_of(reference) != Some(parent)
        {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        if reference == Some(child) {
            return Ok(());
        }
        self.detach(child);
        let siblings = &mut self.node_mut(parent).children;
        let at = match reference {
            Some(reference) => siblings
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(siblings.len()),
            None => siblings.len(),
        };
        siblings.insert(at, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Put `new_child` in the place of `old_child` under `parent`.
    ///
    /// `old_child` is detached, not removed.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        if self.parent_of(old_child) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: old_child,
            });
        }
        if new_child == old_child {
            return Ok(());
        }
        self.insert_before(parent, new_child, Some(old_child))?;
        self.detach(old_child);
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_alive(parent)?;
        self.check_alive(child)?;
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        if child == self.body || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Unlink `node` from its parent, keeping it (and its subtree) alive.
    pub fn detach(&mut self, node: NodeId) {
        if !self.is_alive(node) {
            return;
        }
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|&c| c != node);
            self.node_mut(node).parent = None;
        }
    }

    /// Remove a node and its subtree; every id in the subtree becomes stale.
    ///
    /// Listeners registered on removed elements are dropped with them. The
    /// `body` element cannot be removed.
    pub fn remove(&mut self, node: NodeId) {
        if !self.is_alive(node) || node == self.body {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    fn free_subtree(&mut self, node: NodeId) {
        let children = core::mem::take(&mut self.node_mut(node).children);
        for child in children {
            self.free_subtree(child);
        }
        self.nodes[node.idx()] = None;
        self.free_list.push(node.idx());
    }

    // --- queries ---

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    fn check_alive(&self, id: NodeId) -> Result<(), DomError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(DomError::StaleNode(id))
        }
    }

    /// The kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|n| match n.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
        })
    }

    /// Returns true if `id` is a live element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Element)
    }

    /// Returns the parent of a node if live, or `None` for detached nodes or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Get the children of a node, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent_of(id), move |&n| self.parent_of(n))
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Returns true if `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_alive(node) && (node == ancestor || self.ancestors(node).any(|a| a == ancestor))
    }

    /// Returns true if `id` is attached (transitively) to the `body` element.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    /// Descendants of `root` in document order, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children_of(node).iter().rev().copied());
        }
        out
    }

    /// Element children of `id`.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// The parent of `id` if that parent is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent_of(id).filter(|&p| self.is_element(p))
    }

    // --- element data ---

    /// Tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Namespace URI of an element (`None` for HTML).
    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.namespace.as_deref())
    }

    /// Value of an attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .and_then(|e| e.attrs.get(name))
            .map(String::as_str)
    }

    /// All attributes of an element, in name order.
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.element(id)
            .into_iter()
            .flat_map(|e| e.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Set an attribute.
    ///
    /// The isolation attribute is reserved and rejected with
    /// [`DomError::ReservedAttribute`].
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if name == ISOLATE_ATTRIBUTE {
            return Err(DomError::ReservedAttribute(name.to_string()));
        }
        let el = self.element_mut(id)?;
        if el.attrs.get(name).map(String::as_str) != Some(value) {
            el.attrs.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    /// Remove an attribute; returns the old value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        if name == ISOLATE_ATTRIBUTE {
            return Err(DomError::ReservedAttribute(name.to_string()));
        }
        Ok(self.element_mut(id)?.attrs.remove(name))
    }

    /// The `id` attribute.
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id")
    }

    /// The `class` attribute.
    pub fn class_name(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "class")
    }

    /// Returns true if the element's class list contains `class`.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.class_name(node)
            .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == class))
    }

    /// Isolation scope recorded on an element by the patch engine.
    pub fn isolation_of(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, ISOLATE_ATTRIBUTE)
    }

    /// Record or clear the isolation scope of a boundary element.
    ///
    /// This is the only writer of the isolation attribute. The patch engine
    /// calls it when a boundary is created, when its declared scope changes and
    /// when a reused element stops being a boundary; removed elements take the
    /// attribute with them.
    pub(crate) fn set_isolation(&mut self, id: NodeId, scope: Option<&str>) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        match scope {
            Some(scope) => {
                el.attrs
                    .insert(String::from(ISOLATE_ATTRIBUTE), scope.to_string());
            }
            None => {
                el.attrs.remove(ISOLATE_ATTRIBUTE);
            }
        }
        Ok(())
    }

    // --- text ---

    /// Data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node_opt(id)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.check_alive(id)?;
        match &mut self.node_mut(id).data {
            NodeData::Text(data) => {
                if data != text {
                    *data = text.to_string();
                }
                Ok(())
            }
            NodeData::Element(_) => Err(DomError::NotText(id)),
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    // --- internals ---

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|n| n.as_mut())
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.node_opt(id).expect("dangling NodeId")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()]
            .as_mut()
            .filter(|n| n.generation == id.1)
            .expect("dangling NodeId")
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node_opt(id)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        self.check_alive(id)?;
        match &mut self.node_mut(id).data {
            NodeData::Element(el) => Ok(el),
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(doc: &mut Document, tag: &str) -> NodeId {
        doc.create_element(tag).unwrap()
    }

    #[test]
    fn append_detaches_from_previous_parent() {
        let mut doc = Document::new();
        let a = el(&mut doc, "div");
        let b = el(&mut doc, "div");
        let c = el(&mut doc, "span");
        doc.append_child(a, c).unwrap();
        doc.append_child(b, c).unwrap();
        assert!(doc.children_of(a).is_empty());
        assert_eq!(doc.children_of(b), &[c]);
        assert_eq!(doc.parent_of(c), Some(b));
    }

    #[test]
    fn insert_before_and_replace() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = el(&mut doc, "a");
        let b = el(&mut doc, "b");
        let c = el(&mut doc, "i");
        doc.append_child(body, a).unwrap();
        doc.insert_before(body, b, Some(a)).unwrap();
        assert_eq!(doc.children_of(body), &[b, a]);
        doc.replace_child(body, c, b).unwrap();
        assert_eq!(doc.children_of(body), &[c, a]);
        assert!(doc.is_alive(b));
        assert_eq!(doc.parent_of(b), None);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut doc = Document::new();
        let a = el(&mut doc, "div");
        let b = el(&mut doc, "div");
        doc.append_child(a, b).unwrap();
        assert_eq!(
            doc.append_child(b, a),
            Err(DomError::HierarchyRequest { parent: b, child: a })
        );
        let body = doc.body();
        assert!(doc.append_child(a, body).is_err());
    }

    #[test]
    fn remove_frees_subtree_and_bumps_generation() {
        let mut doc = Document::new();
        let a = el(&mut doc, "div");
        let t = doc.create_text("x");
        doc.append_child(a, t).unwrap();
        doc.remove(a);
        assert!(!doc.is_alive(a));
        assert!(!doc.is_alive(t));
        let fresh = el(&mut doc, "p");
        assert!(doc.is_alive(fresh));
        assert!(!doc.is_alive(a));
        assert!(!doc.is_alive(t));
    }

    #[test]
    fn reserved_attribute_is_rejected() {
        let mut doc = Document::new();
        let a = el(&mut doc, "div");
        assert_eq!(
            doc.set_attribute(a, ISOLATE_ATTRIBUTE, "x"),
            Err(DomError::ReservedAttribute(ISOLATE_ATTRIBUTE.to_string()))
        );
        doc.set_isolation(a, Some("x")).unwrap();
        assert_eq!(doc.isolation_of(a), Some("x"));
        doc.set_isolation(a, None).unwrap();
        assert_eq!(doc.isolation_of(a), None);
    }

    #[test]
    fn classes_and_text() {
        let mut doc = Document::new();
        let a = el(&mut doc, "P");
        assert_eq!(doc.tag_name(a), Some("p"));
        doc.set_attribute(a, "class", "x  y").unwrap();
        assert!(doc.has_class(a, "y"));
        assert!(!doc.has_class(a, "z"));
        let t = doc.create_text("one");
        doc.append_child(a, t).unwrap();
        doc.set_text(t, "two").unwrap();
        assert_eq!(doc.text_content(a), "two");
        assert_eq!(doc.set_text(a, "no"), Err(DomError::NotText(a)));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::new();
        let root = el(&mut doc, "div");
        let a = el(&mut doc, "a");
        let a1 = el(&mut doc, "b");
        let b = el(&mut doc, "i");
        doc.append_child(root, a).unwrap();
        doc.append_child(a, a1).unwrap();
        doc.append_child(root, b).unwrap();
        assert_eq!(doc.descendants(root), [a, a1, b]);
        assert_eq!(doc.depth(a1), 2);
        assert!(doc.contains(root, a1));
        assert!(!doc.contains(a, b));
    }
}
