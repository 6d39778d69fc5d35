// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HTML text output.

use alloc::string::String;

use crate::error::SerializeError;
use crate::node::{Element, ISOLATE_ATTRIBUTE, UiNode, is_valid_tag};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Serialize a synchronous tree as HTML.
///
/// Attributes are written in name order; a declared isolation scope is
/// written as the reserved isolation attribute so that markup rendered on a
/// server reads back with its boundaries intact. Widgets are rendered first.
///
/// ```
/// use canopy_vtree::{h, to_html};
///
/// let html = to_html(&h("div.test-element").text("Foobar").build()).unwrap();
/// assert_eq!(html, r#"<div class="test-element">Foobar</div>"#);
/// ```
pub fn to_html(node: &UiNode) -> Result<String, SerializeError> {
    let mut out = String::new();
    write_node(node, &mut out)?;
    Ok(out)
}

fn write_node(node: &UiNode, out: &mut String) -> Result<(), SerializeError> {
    match node {
        UiNode::Text(text) => {
            escape_into(text, false, out);
            Ok(())
        }
        UiNode::Element(el) => write_element(el, out),
        UiNode::Widget(widget) => write_node(&widget.render(), out),
        UiNode::Async(_) => Err(SerializeError::UnresolvedNode),
    }
}

fn write_element(el: &Element, out: &mut String) -> Result<(), SerializeError> {
    if !is_valid_tag(&el.tag) {
        return Err(SerializeError::InvalidTag(el.tag.clone()));
    }
    out.push('<');
    out.push_str(&el.tag);
    let isolate = el.props.isolate.as_deref().map(|scope| (ISOLATE_ATTRIBUTE, scope));
    let attrs = el
        .props
        .attrs
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()));
    for (name, value) in attrs.chain(isolate) {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&el.tag.as_str()) && el.namespace.is_none() {
        return Ok(());
    }
    for child in &el.children {
        write_node(child, out)?;
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
    Ok(())
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Widget, WidgetRender, h};
    use canopy_stream::Stream;

    #[test]
    fn escapes_text_and_attributes() {
        let node = h("a").attr("title", "\"x\" & y").text("<b>").build();
        assert_eq!(
            to_html(&node).unwrap(),
            r#"<a title="&quot;x&quot; &amp; y">&lt;b&gt;</a>"#
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let node = h("p").child(h("br")).child(h("input#name")).build();
        assert_eq!(to_html(&node).unwrap(), r#"<p><br><input id="name"></p>"#);
    }

    #[test]
    fn isolation_is_written_as_reserved_attribute() {
        let node = h("section").isolate("s1").build();
        assert_eq!(
            to_html(&node).unwrap(),
            r#"<section data-isolate="s1"></section>"#
        );
    }

    #[test]
    fn widgets_render_inline() {
        struct Badge;
        impl WidgetRender for Badge {
            fn name(&self) -> &str {
                "badge"
            }
            fn render(&self) -> UiNode {
                h("span.badge").text("new").build()
            }
        }
        let node = h("div").child(Widget::new(Badge)).build();
        assert_eq!(
            to_html(&node).unwrap(),
            r#"<div><span class="badge">new</span></div>"#
        );
    }

    #[test]
    fn unresolved_branches_are_rejected() {
        let node = h("div")
            .child(UiNode::Async(Stream::of(UiNode::from("x"))))
            .build();
        assert_eq!(to_html(&node), Err(SerializeError::UnresolvedNode));
    }
}
