// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The UI-tree data model.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use canopy_stream::Stream;

/// Attribute name under which an element's isolation scope is stored on the
/// live document.
///
/// The attribute is reserved: it is written only by the patch engine, from
/// [`Props::isolate`].
pub const ISOLATE_ATTRIBUTE: &str = "data-isolate";

/// Namespace URI of SVG elements.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// A declarative description of part of a UI.
///
/// A tree may contain [`UiNode::Async`] branches: sequences of subtrees whose
/// value changes over time. [`transpose`](crate::transpose) resolves them into
/// a sequence of fully synchronous trees.
#[derive(Clone, Debug)]
pub enum UiNode {
    /// An element with properties and children.
    Element(Element),
    /// A text node.
    Text(String),
    /// An opaque leaf rendered by user code.
    Widget(Widget),
    /// A pending branch whose value is the latest tree of the sequence.
    Async(Stream<Self>),
}

impl PartialEq for UiNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Element(a), Self::Element(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Widget(a), Self::Widget(b)) => a == b,
            (Self::Async(a), Self::Async(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl UiNode {
    /// Returns the element payload, if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` if no asynchronous branch remains anywhere in the tree.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Element(el) => el.children.iter().all(Self::is_resolved),
            Self::Text(_) | Self::Widget(_) => true,
            Self::Async(_) => false,
        }
    }

    /// Concatenated text of this node and its descendants.
    ///
    /// Asynchronous branches and widgets contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(el) => {
                for child in &el.children {
                    child.push_text(out);
                }
            }
            Self::Widget(_) | Self::Async(_) => {}
        }
    }

    /// Declare this tree an isolation boundary for `scope`.
    ///
    /// The top element is marked; for an asynchronous branch every tree the
    /// branch produces is marked. Text nodes and widgets are returned as is.
    #[must_use]
    pub fn with_isolation(self, scope: impl Into<String>) -> Self {
        let scope: String = scope.into();
        match self {
            Self::Element(mut el) => {
                el.props.isolate = Some(scope);
                Self::Element(el)
            }
            Self::Async(stream) => {
                Self::Async(stream.map(move |node| node.with_isolation(scope.clone())))
            }
            other => other,
        }
    }
}

impl From<Element> for UiNode {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<String> for UiNode {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for UiNode {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<Widget> for UiNode {
    fn from(widget: Widget) -> Self {
        Self::Widget(widget)
    }
}

impl From<Stream<Self>> for UiNode {
    fn from(stream: Stream<Self>) -> Self {
        Self::Async(stream)
    }
}

/// An element node.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Tag name, lowercase for HTML elements.
    pub tag: String,
    /// Attributes and isolation declaration.
    pub props: Props,
    /// Ordered children.
    pub children: Vec<UiNode>,
    /// Identity hint for the patch engine: keyed nodes are only reused by a
    /// node with the same key.
    pub key: Option<String>,
    /// Namespace URI (for example [`SVG_NAMESPACE`]); `None` for HTML.
    pub namespace: Option<String>,
}

impl Element {
    /// An element with no attributes and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: Props::default(),
            children: Vec::new(),
            key: None,
            namespace: None,
        }
    }

    /// A copy of this element without its children.
    pub fn shallow(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            props: self.props.clone(),
            children: Vec::new(),
            key: self.key.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Element properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Props {
    /// Attributes, including `id` and `class`.
    pub attrs: BTreeMap<String, String>,
    /// Isolation scope declared on this element, if any.
    pub isolate: Option<String>,
}

impl Props {
    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    /// The `class` attribute.
    pub fn class_name(&self) -> Option<&str> {
        self.attrs.get("class").map(String::as_str)
    }

    /// Whitespace-separated class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_name()
            .into_iter()
            .flat_map(str::split_ascii_whitespace)
    }
}

/// Rendering hook for an opaque widget.
pub trait WidgetRender {
    /// A short name used in diagnostics.
    fn name(&self) -> &str;

    /// Produce the synchronous tree this widget stands for.
    fn render(&self) -> UiNode;
}

/// An opaque leaf.
///
/// The transposer never looks inside a widget; the patch engine renders it
/// through [`WidgetRender::render`]. Two widgets are equal when they are the
/// same instance.
#[derive(Clone)]
pub struct Widget(Rc<dyn WidgetRender>);

impl Widget {
    /// Wrap a renderer.
    pub fn new(render: impl WidgetRender + 'static) -> Self {
        Self(Rc::new(render))
    }

    /// The widget's diagnostic name.
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Render the widget.
    pub fn render(&self) -> UiNode {
        self.0.render()
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl core::fmt::Debug for Widget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Widget").field(&self.name()).finish()
    }
}

/// Returns `true` if `tag` is usable as an element name.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::h;

    #[test]
    fn tag_validation() {
        assert!(is_valid_tag("div"));
        assert!(is_valid_tag("my-widget"));
        assert!(is_valid_tag("svg:rect"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("1div"));
        assert!(!is_valid_tag("di v"));
    }

    #[test]
    fn isolation_marks_top_element_only() {
        let tree = h("div").child(h("span")).build().with_isolation("scope-x");
        let el = tree.as_element().unwrap();
        assert_eq!(el.props.isolate.as_deref(), Some("scope-x"));
        assert_eq!(el.children[0].as_element().unwrap().props.isolate, None);
    }

    #[test]
    fn async_nodes_compare_by_identity() {
        let stream = Stream::of(UiNode::from("x"));
        let a = UiNode::Async(stream.clone());
        assert_eq!(a, UiNode::Async(stream));
        assert_ne!(a, UiNode::Async(Stream::of(UiNode::from("x"))));
    }

    #[test]
    fn text_content_concatenates() {
        let tree = h("p").text("a").child(h("b").text("b")).text("c").build();
        assert_eq!(tree.text_content(), "abc");
        assert!(tree.is_resolved());
    }
}
