// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hyperscript-style tree construction.

use alloc::string::{String, ToString};

use crate::node::{Element, ISOLATE_ATTRIBUTE, SVG_NAMESPACE, UiNode};

/// Start an element from a selector-like shorthand: `tag`, `tag#id`,
/// `tag.class`, or combinations such as `li.item.done#first`.
///
/// An omitted tag means `div`.
///
/// ```
/// use canopy_vtree::h;
///
/// let node = h("ul.todo#list").child(h("li").text("milk")).build();
/// let el = node.as_element().unwrap();
/// assert_eq!(el.tag, "ul");
/// assert_eq!(el.props.id(), Some("list"));
/// assert_eq!(el.props.class_name(), Some("todo"));
/// ```
pub fn h(shorthand: &str) -> ElementBuilder {
    let mut builder = ElementBuilder {
        element: Element::new(""),
    };
    let mut tag_end = shorthand.len();
    for (idx, c) in shorthand.char_indices() {
        if c == '#' || c == '.' {
            tag_end = idx;
            break;
        }
    }
    let tag = &shorthand[..tag_end];
    builder.element.tag = if tag.is_empty() {
        String::from("div")
    } else {
        tag.to_ascii_lowercase()
    };

    let mut rest = &shorthand[tag_end..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let name = &body[..end];
        if !name.is_empty() {
            builder = match marker {
                '#' => builder.id(name),
                _ => builder.class(name),
            };
        }
        rest = &body[end..];
    }
    builder
}

/// Start an SVG element; see [`h`] for the shorthand.
pub fn svg(shorthand: &str) -> ElementBuilder {
    let mut builder = h(shorthand);
    builder.element.namespace = Some(SVG_NAMESPACE.to_string());
    builder
}

/// A text node.
pub fn text(content: impl Into<String>) -> UiNode {
    UiNode::Text(content.into())
}

/// Incrementally configures an [`Element`].
#[derive(Clone, Debug)]
pub struct ElementBuilder {
    element: Element,
}

impl ElementBuilder {
    /// Set an attribute.
    ///
    /// Setting the reserved isolation attribute declares an isolation scope
    /// instead, as [`ElementBuilder::isolate`] does.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        if name == ISOLATE_ATTRIBUTE {
            self.element.props.isolate = Some(value.into());
        } else {
            self.element.props.attrs.insert(name, value.into());
        }
        self
    }

    /// Set the `id` attribute.
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Append a class name.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        let attrs = &mut self.element.props.attrs;
        match attrs.get_mut("class") {
            Some(existing) if !existing.is_empty() => {
                if !existing.split_ascii_whitespace().any(|c| c == class) {
                    existing.push(' ');
                    existing.push_str(class);
                }
            }
            _ => {
                attrs.insert(String::from("class"), class.to_string());
            }
        }
        self
    }

    /// Set the patch identity key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.element.key = Some(key.into());
        self
    }

    /// Declare this element an isolation boundary.
    #[must_use]
    pub fn isolate(mut self, scope: impl Into<String>) -> Self {
        self.element.props.isolate = Some(scope.into());
        self
    }

    /// Set the namespace URI.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.element.namespace = Some(namespace.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<UiNode>) -> Self {
        self.element.children.push(child.into());
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<UiNode>,
    {
        self.element
            .children
            .extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(UiNode::Text(content.into()))
    }

    /// The configured element.
    pub fn into_element(self) -> Element {
        self.element
    }

    /// The configured element as a tree node.
    pub fn build(self) -> UiNode {
        UiNode::Element(self.element)
    }
}

impl From<ElementBuilder> for UiNode {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.element
    }
}
