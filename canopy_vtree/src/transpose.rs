// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening asynchronous branches into a sequence of synchronous trees.

use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;

use canopy_stream::Stream;

use crate::error::TransposeError;
use crate::node::{UiNode, is_valid_tag};

/// Resolve every asynchronous branch of `node`.
///
/// The returned stream emits a fully synchronous tree each time any branch
/// produces a new value, combining it with the latest value of every other
/// branch:
///
/// - an [`UiNode::Async`] branch follows only its most recent tree; the
///   previous one is unsubscribed as soon as a new tree arrives;
/// - text nodes and widgets pass through as a single emission;
/// - an element re-emits a copy of itself whenever any child changes. Children
///   are subscribed in declaration order and each child notification yields
///   exactly one new tree, so a tree without asynchronous branches is emitted
///   exactly once.
///
/// Elements that cannot be classified (empty or malformed tag) fail with
/// [`TransposeError::UnsupportedNodeShape`] immediately. Such elements appearing
/// later inside an asynchronous branch surface as an error notification on the
/// returned stream.
///
/// ```
/// use canopy_stream::Subject;
/// use canopy_vtree::{UiNode, h, transpose};
///
/// let label = Subject::new();
/// let tree = h("div")
///     .child(UiNode::Async(label.stream()))
///     .child("c")
///     .build();
///
/// let texts = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
/// let sink = texts.clone();
/// transpose(&tree)?.for_each(move |t| sink.borrow_mut().push(t.text_content()));
/// label.next(UiNode::from("a"));
/// label.next(UiNode::from("b"));
/// assert_eq!(*texts.borrow(), ["ac", "bc"]);
/// # Ok::<(), canopy_vtree::TransposeError>(())
/// ```
pub fn transpose(node: &UiNode) -> Result<Stream<UiNode>, TransposeError> {
    match node {
        UiNode::Async(stream) => Ok(stream.switch_map(|inner| match transpose(&inner) {
            Ok(resolved) => resolved,
            Err(err) => Stream::throw(Rc::new(err)),
        })),
        UiNode::Text(_) | UiNode::Widget(_) => Ok(Stream::of(node.clone())),
        UiNode::Element(el) => {
            if !is_valid_tag(&el.tag) {
                return Err(TransposeError::UnsupportedNodeShape {
                    reason: format!("element with invalid tag {:?}", el.tag),
                });
            }
            if el.children.is_empty() {
                return Ok(Stream::of(node.clone()));
            }
            let children = el
                .children
                .iter()
                .map(transpose)
                .collect::<Result<Vec<_>, _>>()?;
            let template = el.shallow();
            Ok(Stream::combine_latest(children).map(move |children| {
                let mut el = template.clone();
                el.children = children;
                UiNode::Element(el)
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, h};
    use alloc::string::String;
    use alloc::vec;
    use canopy_stream::{Observer, Subject, Subscription};
    use core::cell::{Cell, RefCell};

    fn emissions(node: &UiNode) -> Rc<RefCell<Vec<UiNode>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        transpose(node)
            .unwrap()
            .for_each(move |t| sink.borrow_mut().push(t));
        seen
    }

    #[test]
    fn synchronous_tree_emits_once_unchanged() {
        let tree = h("div.top")
            .child(h("h2.bar").text("Wrong"))
            .child(h("div.foo").child(h("h4.bar").text("Correct")))
            .build();
        let seen = emissions(&tree);
        assert_eq!(*seen.borrow(), vec![tree]);
    }

    #[test]
    fn async_child_combines_with_latest_sibling() {
        let branch = Subject::new();
        let tree = h("div")
            .child(UiNode::Async(branch.stream()))
            .child("c")
            .build();
        let seen = emissions(&tree);
        branch.next(UiNode::from("a"));
        branch.next(UiNode::from("b"));
        let texts: Vec<String> = seen.borrow().iter().map(UiNode::text_content).collect();
        assert_eq!(texts, ["ac", "bc"]);
    }

    #[test]
    fn synchronous_burst_settles_before_siblings_subscribe() {
        let tree = h("div")
            .child(UiNode::Async(Stream::from_values([
                UiNode::from("a"),
                UiNode::from("b"),
            ])))
            .child("c")
            .build();
        let seen = emissions(&tree);
        let texts: Vec<String> = seen.borrow().iter().map(UiNode::text_content).collect();
        assert_eq!(texts, ["bc"]);
    }

    #[test]
    fn sibling_updates_are_last_writer_wins_in_declaration_order() {
        let left = Subject::new();
        let right = Subject::new();
        let tree = h("div")
            .child(UiNode::Async(left.stream()))
            .child(UiNode::Async(right.stream()))
            .build();
        let seen = emissions(&tree);
        left.next(UiNode::from("1"));
        assert!(seen.borrow().is_empty());
        right.next(UiNode::from("2"));
        left.next(UiNode::from("3"));
        right.next(UiNode::from("4"));
        let texts: Vec<String> = seen.borrow().iter().map(UiNode::text_content).collect();
        assert_eq!(texts, ["12", "32", "34"]);
    }

    #[test]
    fn async_root_resolves_nested_branches() {
        let inner = UiNode::Async(Stream::of(h("span").text("deep").build()));
        let root = UiNode::Async(Stream::of(h("div").child(inner).build()));
        let seen = emissions(&root);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_resolved());
        assert_eq!(seen.borrow()[0].text_content(), "deep");
    }

    #[test]
    fn element_props_and_key_survive() {
        let tree = h("li#x.y")
            .key("k")
            .isolate("s")
            .child(UiNode::Async(Stream::of(UiNode::from("t"))))
            .build();
        let seen = emissions(&tree);
        let out = seen.borrow()[0].as_element().cloned().unwrap();
        let src = tree.as_element().unwrap();
        assert_eq!(out.props, src.props);
        assert_eq!(out.key, src.key);
    }

    #[test]
    fn switching_unsubscribes_previous_branch() {
        let live = Rc::new(Cell::new(0_i32));
        let counter = live.clone();
        let branch = move || {
            let counter = counter.clone();
            UiNode::Async(Stream::new(move |out: Observer<UiNode>| {
                counter.set(counter.get() + 1);
                out.next(UiNode::from("x"));
                let counter = counter.clone();
                Subscription::from_teardown(move || counter.set(counter.get() - 1))
            }))
        };
        let outer = Subject::new();
        let seen = emissions(&UiNode::Async(outer.stream()));
        outer.next(branch());
        outer.next(branch());
        outer.next(branch());
        assert_eq!(live.get(), 1);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn malformed_element_fails_synchronously() {
        let bad = UiNode::Element(Element::new(""));
        assert!(matches!(
            transpose(&bad),
            Err(TransposeError::UnsupportedNodeShape { .. })
        ));
        let nested = h("div").child(Element::new("no spaces")).build();
        assert!(transpose(&nested).is_err());
    }

    #[test]
    fn malformed_element_inside_branch_is_an_error_notification() {
        let failed = Rc::new(Cell::new(false));
        let flag = failed.clone();
        let node = UiNode::Async(Stream::of(UiNode::Element(Element::new(""))));
        transpose(&node)
            .unwrap()
            .subscribe(Observer::noop().with_error(move |_| flag.set(true)));
        assert!(failed.get());
    }
}
