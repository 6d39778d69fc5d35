// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diffing synchronous trees and patching them into a [`Document`].
//!
//! [`diff`] compares two trees and yields a [`Patch`]: a list of edits
//! addressed by child-index paths from the root. [`patch`] applies it to the
//! live node standing for the old tree.
//!
//! Nodes are reused when they have the same kind, tag, namespace and key;
//! anything else is replaced wholesale. The two roots are matched on tag and
//! namespace only, so the live root keeps its identity (and its listeners)
//! across renders.
//!
//! This module is also the isolation bridge: it is the only code that records
//! a tree's [`Props::isolate`](canopy_vtree::Props::isolate) declaration on
//! live elements. The declaration is written when a boundary element is
//! created or its scope changes, and cleared when a reused element stops
//! declaring one. Removed boundaries take their marker with them.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use canopy_vtree::{Element, ISOLATE_ATTRIBUTE, Props, UiNode};

use crate::document::Document;
use crate::error::PatchError;
use crate::types::{NodeId, NodeKind};

/// A single edit of a [`Patch`].
#[derive(Clone, Debug, PartialEq)]
pub enum PatchOp {
    /// Replace the node at `path` with a freshly created one.
    Replace {
        /// Child indices from the root.
        path: Vec<usize>,
        /// The new subtree.
        node: UiNode,
    },
    /// Set an attribute of the element at `path`.
    SetAttribute {
        /// Child indices from the root.
        path: Vec<usize>,
        /// Attribute name.
        name: String,
        /// New value.
        value: String,
    },
    /// Remove an attribute of the element at `path`.
    RemoveAttribute {
        /// Child indices from the root.
        path: Vec<usize>,
        /// Attribute name.
        name: String,
    },
    /// Record or clear the isolation scope of the element at `path`.
    SetIsolation {
        /// Child indices from the root.
        path: Vec<usize>,
        /// New scope, `None` to clear.
        scope: Option<String>,
    },
    /// Replace the data of the text node at `path`.
    SetText {
        /// Child indices from the root.
        path: Vec<usize>,
        /// New text.
        text: String,
    },
    /// Append a new child to the element at `path`.
    Append {
        /// Child indices from the root.
        path: Vec<usize>,
        /// The new subtree.
        node: UiNode,
    },
    /// Remove the children of the element at `path` from index `len` on.
    Truncate {
        /// Child indices from the root.
        path: Vec<usize>,
        /// Number of children to keep.
        len: usize,
    },
}

/// The edits turning one tree into another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    /// Edits in application order.
    pub ops: Vec<PatchOp>,
}

impl Patch {
    /// Returns `true` if applying the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of edits.
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Compute the edits turning `old` into `new`.
///
/// Diffing a tree against an equal tree yields an empty patch.
pub fn diff(old: &UiNode, new: &UiNode) -> Patch {
    let mut ops = Vec::new();
    let mut path = Vec::new();
    match (old, new) {
        (UiNode::Element(a), UiNode::Element(b))
            if a.tag == b.tag && a.namespace == b.namespace =>
        {
            diff_element(a, b, &mut path, &mut ops);
        }
        _ => diff_node(old, new, &mut path, &mut ops),
    }
    Patch { ops }
}

fn diff_node(old: &UiNode, new: &UiNode, path: &mut Vec<usize>, ops: &mut Vec<PatchOp>) {
    if old == new {
        return;
    }
    match (old, new) {
        (UiNode::Text(a), UiNode::Text(b)) => {
            if a != b {
                ops.push(PatchOp::SetText {
                    path: path.clone(),
                    text: b.clone(),
                });
            }
        }
        (UiNode::Element(a), UiNode::Element(b))
            if a.tag == b.tag && a.namespace == b.namespace && a.key == b.key =>
        {
            diff_element(a, b, path, ops);
        }
        _ => ops.push(PatchOp::Replace {
            path: path.clone(),
            node: new.clone(),
        }),
    }
}

fn diff_element(old: &Element, new: &Element, path: &mut Vec<usize>, ops: &mut Vec<PatchOp>) {
    diff_props(&old.props, &new.props, path, ops);
    let common = old.children.len().min(new.children.len());
    for (i, (a, b)) in old.children.iter().zip(&new.children).enumerate() {
        path.push(i);
        diff_node(a, b, path, ops);
        path.pop();
    }
    if old.children.len() > common {
        ops.push(PatchOp::Truncate {
            path: path.clone(),
            len: common,
        });
    }
    for child in &new.children[common..] {
        ops.push(PatchOp::Append {
            path: path.clone(),
            node: child.clone(),
        });
    }
}

fn diff_props(old: &Props, new: &Props, path: &[usize], ops: &mut Vec<PatchOp>) {
    for name in old.attrs.keys() {
        if !new.attrs.contains_key(name) {
            ops.push(PatchOp::RemoveAttribute {
                path: path.to_vec(),
                name: name.clone(),
            });
        }
    }
    for (name, value) in &new.attrs {
        if old.attrs.get(name) != Some(value) {
            ops.push(PatchOp::SetAttribute {
                path: path.to_vec(),
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
    if old.isolate != new.isolate {
        ops.push(PatchOp::SetIsolation {
            path: path.to_vec(),
            scope: new.isolate.clone(),
        });
    }
}

/// Apply `patch` to the live tree rooted at `root`.
///
/// Returns the root after patching, which differs from `root` only when the
/// root itself was replaced.
pub fn patch(doc: &mut Document, root: NodeId, patch: &Patch) -> Result<NodeId, PatchError> {
    let mut root = root;
    for op in &patch.ops {
        match op {
            PatchOp::Replace { path, node } => {
                let old = resolve(doc, root, path)?;
                let fresh = create(doc, node)?;
                if let Some(parent) = doc.parent_of(old) {
                    doc.replace_child(parent, fresh, old)?;
                }
                doc.remove(old);
                if path.is_empty() {
                    root = fresh;
                }
            }
            PatchOp::SetAttribute { path, name, value } => {
                let node = resolve(doc, root, path)?;
                doc.set_attribute(node, name, value)?;
            }
            PatchOp::RemoveAttribute { path, name } => {
                let node = resolve(doc, root, path)?;
                doc.remove_attribute(node, name)?;
            }
            PatchOp::SetIsolation { path, scope } => {
                let node = resolve(doc, root, path)?;
                doc.set_isolation(node, scope.as_deref())?;
            }
            PatchOp::SetText { path, text } => {
                let node = resolve(doc, root, path)?;
                doc.set_text(node, text)?;
            }
            PatchOp::Append { path, node } => {
                let parent = resolve(doc, root, path)?;
                let fresh = create(doc, node)?;
                doc.append_child(parent, fresh)?;
            }
            PatchOp::Truncate { path, len } => {
                let parent = resolve(doc, root, path)?;
                let extra: Vec<NodeId> = doc.children_of(parent).iter().skip(*len).copied().collect();
                for child in extra {
                    doc.remove(child);
                }
            }
        }
    }
    log::trace!("applied {} patch ops", patch.len());
    Ok(root)
}

fn resolve(doc: &Document, root: NodeId, path: &[usize]) -> Result<NodeId, PatchError> {
    let mut node = root;
    for &i in path {
        node = *doc
            .children_of(node)
            .get(i)
            .ok_or_else(|| PatchError::InvalidPath(path.to_vec()))?;
    }
    if doc.is_alive(node) {
        Ok(node)
    } else {
        Err(PatchError::InvalidPath(path.to_vec()))
    }
}

/// Materialize a synchronous tree as a detached live subtree.
///
/// Widgets are rendered; asynchronous branches fail with
/// [`PatchError::UnresolvedNode`].
pub fn create(doc: &mut Document, node: &UiNode) -> Result<NodeId, PatchError> {
    match node {
        UiNode::Text(text) => Ok(doc.create_text(text)),
        UiNode::Widget(widget) => create(doc, &widget.render()),
        UiNode::Async(_) => Err(PatchError::UnresolvedNode),
        UiNode::Element(el) => {
            let id = doc.create_element_ns(&el.tag, el.namespace.as_deref())?;
            for (name, value) in &el.props.attrs {
                doc.set_attribute(id, name, value)?;
            }
            if let Some(scope) = &el.props.isolate {
                doc.set_isolation(id, Some(scope))?;
            }
            for child in &el.children {
                match create(doc, child) {
                    Ok(child) => doc.append_child(id, child)?,
                    Err(err) => {
                        doc.remove(id);
                        return Err(err);
                    }
                }
            }
            Ok(id)
        }
    }
}

/// Read a live subtree back into a tree description.
///
/// The isolation attribute is lifted back into
/// [`Props::isolate`](canopy_vtree::Props::isolate). Returns `None` for a
/// stale id.
pub fn read_tree(doc: &Document, node: NodeId) -> Option<UiNode> {
    match doc.kind(node)? {
        NodeKind::Text => doc.text(node).map(|t| UiNode::Text(t.into())),
        NodeKind::Element => {
            let mut attrs = BTreeMap::new();
            let mut isolate = None;
            for (name, value) in doc.attributes(node) {
                if name == ISOLATE_ATTRIBUTE {
                    isolate = Some(String::from(value));
                } else {
                    attrs.insert(String::from(name), String::from(value));
                }
            }
            let children = doc
                .children_of(node)
                .iter()
                .filter_map(|&c| read_tree(doc, c))
                .collect();
            Some(UiNode::Element(Element {
                tag: doc.tag_name(node)?.into(),
                props: Props { attrs, isolate },
                children,
                key: None,
                namespace: doc.namespace(node).map(Into::into),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomError;
    use canopy_stream::Stream;
    use canopy_vtree::h;

    fn mount(doc: &mut Document, tree: &UiNode) -> NodeId {
        let id = create(doc, tree).unwrap();
        let body = doc.body();
        doc.append_child(body, id).unwrap();
        id
    }

    fn render(doc: &mut Document, root: NodeId, old: &UiNode, new: &UiNode) -> NodeId {
        let p = diff(old, new);
        let root = patch(doc, root, &p).unwrap();
        assert_eq!(read_tree(doc, root).as_ref(), Some(new));
        root
    }

    #[test]
    fn equal_trees_produce_empty_patch() {
        let tree = h("div.a").child(h("p").text("x")).build();
        assert!(diff(&tree, &tree.clone()).is_empty());
    }

    #[test]
    fn create_then_read_back() {
        let mut doc = Document::new();
        let tree = h("section#main.wide")
            .isolate("s1")
            .child(h("h1").text("Title"))
            .child("tail")
            .build();
        let id = mount(&mut doc, &tree);
        assert_eq!(doc.isolation_of(id), Some("s1"));
        assert_eq!(read_tree(&doc, id), Some(tree));
    }

    #[test]
    fn attributes_text_and_children_update_in_place() {
        let mut doc = Document::new();
        let v1 = h("ul.list")
            .child(h("li").text("a"))
            .child(h("li").text("b"))
            .child(h("li").text("c"))
            .build();
        let root = mount(&mut doc, &v1);
        let first = doc.children_of(root)[0];
        let v2 = h("ul.list.done").child(h("li").text("A")).build();
        let root2 = render(&mut doc, root, &v1, &v2);
        assert_eq!(root2, root);
        assert_eq!(doc.children_of(root)[0], first);
        let v3 = h("ul")
            .child(h("li").text("A"))
            .child(h("li").text("new"))
            .build();
        render(&mut doc, root, &v2, &v3);
    }

    #[test]
    fn tag_or_key_change_replaces() {
        let mut doc = Document::new();
        let v1 = h("div").child(h("p").key("1").text("x")).build();
        let root = mount(&mut doc, &v1);
        let old_child = doc.children_of(root)[0];
        let v2 = h("div").child(h("p").key("2").text("x")).build();
        render(&mut doc, root, &v1, &v2);
        assert!(!doc.is_alive(old_child));
        let v3 = h("div").child(h("span").text("x")).build();
        render(&mut doc, root, &v2, &v3);
    }

    #[test]
    fn root_keeps_identity_across_keys() {
        let mut doc = Document::new();
        let v1 = h("div").key("a").build();
        let root = mount(&mut doc, &v1);
        let v2 = h("div").key("b").text("x").build();
        let p = diff(&v1, &v2);
        assert_eq!(patch(&mut doc, root, &p).unwrap(), root);
    }

    #[test]
    fn root_replacement_returns_new_root() {
        let mut doc = Document::new();
        let v1 = h("div").build();
        let root = mount(&mut doc, &v1);
        let v2 = h("section").build();
        let new_root = render(&mut doc, root, &v1, &v2);
        assert_ne!(new_root, root);
        assert_eq!(doc.parent_of(new_root), Some(doc.body()));
    }

    #[test]
    fn isolation_marker_follows_declaration() {
        let mut doc = Document::new();
        let v1 = h("div").child(h("div").isolate("x")).build();
        let root = mount(&mut doc, &v1);
        let boundary = doc.children_of(root)[0];
        assert_eq!(doc.isolation_of(boundary), Some("x"));
        let v2 = h("div").child(h("div").isolate("y")).build();
        render(&mut doc, root, &v1, &v2);
        assert_eq!(doc.isolation_of(boundary), Some("y"));
        let v3 = h("div").child(h("div")).build();
        render(&mut doc, root, &v2, &v3);
        assert_eq!(doc.isolation_of(boundary), None);
    }

    #[test]
    fn reserved_attribute_in_props_is_rejected() {
        let mut doc = Document::new();
        let mut el = Element::new("div");
        el.props
            .attrs
            .insert(String::from(ISOLATE_ATTRIBUTE), String::from("x"));
        assert_eq!(
            create(&mut doc, &UiNode::Element(el)),
            Err(PatchError::Dom(DomError::ReservedAttribute(String::from(
                ISOLATE_ATTRIBUTE
            ))))
        );
    }

    #[test]
    fn unresolved_nodes_cannot_be_created() {
        let mut doc = Document::new();
        let tree = h("div")
            .child(UiNode::Async(Stream::of(UiNode::from("x"))))
            .build();
        assert_eq!(create(&mut doc, &tree), Err(PatchError::UnresolvedNode));
    }

    #[test]
    fn bad_path_is_reported() {
        let mut doc = Document::new();
        let root = mount(&mut doc, &h("div").build());
        let p = Patch {
            ops: alloc::vec![PatchOp::SetText {
                path: alloc::vec![3],
                text: String::from("x"),
            }],
        };
        assert_eq!(
            patch(&mut doc, root, &p),
            Err(PatchError::InvalidPath(alloc::vec![3]))
        );
    }
}
