// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CSS selectors: parsing and matching against a [`Document`].
//!
//! Supported grammar:
//!
//! - compound parts: type (`div`), universal (`*`), `#id`, `.class`,
//!   `[attr]`, `[attr=v]`, `[attr~=v]`, `[attr|=v]`, `[attr^=v]`, `[attr$=v]`,
//!   `[attr*=v]`, `:first-child`, `:last-child`, `:only-child`, `:empty`;
//! - combinators: descendant (whitespace), child (`>`), adjacent sibling
//!   (`+`), general sibling (`~`);
//! - selector lists separated by `,`.
//!
//! Matching follows `querySelectorAll`: the rightmost compound must match a
//! node under the query root, but the parts to its left may match anywhere in
//! the node's ancestry, including above the query root.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use smallvec::SmallVec;

use crate::document::Document;
use crate::error::SelectorError;
use crate::types::NodeId;

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Complex>,
}

/// One entry of a selector list: compounds joined by combinators.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    /// Leftmost first; `parts[0].0` is unused.
    parts: Vec<(Combinator, Compound)>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
    attrs: Vec<AttrCondition>,
    pseudo: SmallVec<[Pseudo; 1]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    op: AttrOp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    DashMatch(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list()
    }

    /// The selector matching descendants of `self` that match `inner`.
    ///
    /// Every entry of `self` is combined with every entry of `inner`, so
    /// `a, b` followed by `c` yields `a c, b c`.
    pub fn then_descendant(&self, inner: &Self) -> Self {
        let mut groups = Vec::with_capacity(self.groups.len() * inner.groups.len());
        for outer in &self.groups {
            for tail in &inner.groups {
                let mut parts = outer.parts.clone();
                let mut tail_parts = tail.parts.iter().cloned();
                if let Some((_, first)) = tail_parts.next() {
                    parts.push((Combinator::Descendant, first));
                }
                parts.extend(tail_parts);
                groups.push(Complex { parts });
            }
        }
        Self { groups }
    }

    /// Returns true if `node` matches any entry of the list.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.groups
            .iter()
            .any(|g| match_from(doc, node, &g.parts, g.parts.len() - 1))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            for (j, (combinator, compound)) in group.parts.iter().enumerate() {
                if j > 0 {
                    f.write_str(match combinator {
                        Combinator::Descendant => " ",
                        Combinator::Child => " > ",
                        Combinator::Adjacent => " + ",
                        Combinator::Sibling => " ~ ",
                    })?;
                }
                write!(f, "{compound}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        } else if self.universal || self.is_bare() {
            f.write_str("*")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for cond in &self.attrs {
            let (op, value) = match &cond.op {
                AttrOp::Exists => {
                    write!(f, "[{}]", cond.name)?;
                    continue;
                }
                AttrOp::Equals(v) => ("=", v),
                AttrOp::Includes(v) => ("~=", v),
                AttrOp::DashMatch(v) => ("|=", v),
                AttrOp::Prefix(v) => ("^=", v),
                AttrOp::Suffix(v) => ("$=", v),
                AttrOp::Substring(v) => ("*=", v),
            };
            write!(f, "[{}{op}\"{}\"]", cond.name, value.replace('"', "\\\""))?;
        }
        for pseudo in &self.pseudo {
            f.write_str(match pseudo {
                Pseudo::FirstChild => ":first-child",
                Pseudo::LastChild => ":last-child",
                Pseudo::OnlyChild => ":only-child",
                Pseudo::Empty => ":empty",
            })?;
        }
        Ok(())
    }
}

impl Compound {
    fn is_bare(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && !el.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attrs.get("id") != Some(id)
        {
            return false;
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        let attrs_ok = self.attrs.iter().all(|cond| {
            let Some(value) = el.attrs.get(&cond.name) else {
                return false;
            };
            match &cond.op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => value == v,
                AttrOp::Includes(v) => value.split_ascii_whitespace().any(|t| t == v),
                AttrOp::DashMatch(v) => {
                    value == v
                        || value
                            .strip_prefix(v.as_str())
                            .is_some_and(|rest| rest.starts_with('-'))
                }
                AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
                AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
                AttrOp::Substring(v) => !v.is_empty() && value.contains(v.as_str()),
            }
        });
        if !attrs_ok {
            return false;
        }
        self.pseudo.iter().all(|p| match p {
            Pseudo::FirstChild => prev_element_sibling(doc, node).is_none(),
            Pseudo::LastChild => next_element_sibling(doc, node).is_none(),
            Pseudo::OnlyChild => {
                prev_element_sibling(doc, node).is_none()
                    && next_element_sibling(doc, node).is_none()
            }
            Pseudo::Empty => doc.children_of(node).is_empty(),
        })
    }
}

fn prev_element_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent_of(node)?;
    let siblings = doc.children_of(parent);
    let at = siblings.iter().position(|&c| c == node)?;
    siblings[..at]
        .iter()
        .rev()
        .copied()
        .find(|&c| doc.is_element(c))
}

fn next_element_sibling(doc: &Document, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent_of(node)?;
    let siblings = doc.children_of(parent);
    let at = siblings.iter().position(|&c| c == node)?;
    siblings[at + 1..].iter().copied().find(|&c| doc.is_element(c))
}

/// Match `parts[..=idx]` with `parts[idx]` anchored at `node`, backtracking
/// over every candidate the combinator allows.
fn match_from(doc: &Document, node: NodeId, parts: &[(Combinator, Compound)], idx: usize) -> bool {
    if !parts[idx].1.matches(doc, node) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match parts[idx].0 {
        Combinator::Child => {
            doc.parent_element(node)
                .is_some_and(|p| match_from(doc, p, parts, idx - 1))
        }
        Combinator::Descendant => doc
            .ancestors(node)
            .filter(|&a| doc.is_element(a))
            .any(|a| match_from(doc, a, parts, idx - 1)),
        Combinator::Adjacent => {
            prev_element_sibling(doc, node).is_some_and(|s| match_from(doc, s, parts, idx - 1))
        }
        Combinator::Sibling => {
            let mut cursor = prev_element_sibling(doc, node);
            while let Some(sibling) = cursor {
                if match_from(doc, sibling, parts, idx - 1) {
                    return true;
                }
                cursor = prev_element_sibling(doc, sibling);
            }
            false
        }
    }
}

/// All descendants of `root` (excluding `root`) matching `selector`, in
/// document order.
pub fn query_selector_all(doc: &Document, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|&n| selector.matches(doc, n))
        .collect()
}

/// The first descendant of `root` matching `selector`, in document order.
pub fn query_selector(doc: &Document, root: NodeId, selector: &Selector) -> Option<NodeId> {
    doc.descendants(root)
        .into_iter()
        .find(|&n| selector.matches(doc, n))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek()
            && c.is_whitespace()
        {
            self.pos += c.len_utf8();
        }
        self.pos != start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar {
                ch,
                offset: self.pos,
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn parse_list(&mut self) -> Result<Selector, SelectorError> {
        let mut groups = Vec::new();
        loop {
            self.skip_ws();
            if matches!(self.peek(), None | Some(',')) {
                return Err(SelectorError::Empty);
            }
            groups.push(self.parse_complex()?);
            // `parse_complex` stops only at a comma or at the end of input.
            if self.bump().is_none() {
                break;
            }
        }
        Ok(Selector { groups })
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = Vec::new();
        let mut combinator = Combinator::Descendant;
        loop {
            parts.push((combinator, self.parse_compound()?));
            let spaced = self.skip_ws();
            combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::Sibling,
                Some(_) if spaced => {
                    combinator = Combinator::Descendant;
                    continue;
                }
                Some(_) => return Err(self.unexpected()),
            };
            self.bump();
            self.skip_ws();
        }
        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        if self.peek() == Some('*') {
            self.bump();
            compound.universal = true;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attr_condition()?);
                }
                Some(':') => {
                    self.bump();
                    compound.pseudo.push(self.pseudo()?);
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                out.push(self.bump().ok_or(SelectorError::UnexpectedEnd)?);
            } else if is_ident_char(c) {
                self.bump();
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.unexpected());
        }
        Ok(out)
    }

    fn attr_condition(&mut self) -> Result<AttrCondition, SelectorError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        let op = match self.bump() {
            Some(']') => {
                return Ok(AttrCondition {
                    name,
                    op: AttrOp::Exists,
                });
            }
            Some('=') => "=",
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.peek() != Some('=') {
                    return Err(self.unexpected());
                }
                self.bump();
                match c {
                    '~' => "~=",
                    '|' => "|=",
                    '^' => "^=",
                    '$' => "$=",
                    _ => "*=",
                }
            }
            Some(c) => {
                self.pos -= c.len_utf8();
                return Err(self.unexpected());
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => value.push(self.bump().ok_or(SelectorError::UnexpectedEnd)?),
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(SelectorError::UnexpectedEnd),
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        if self.bump() != Some(']') {
            return Err(SelectorError::UnexpectedEnd);
        }
        let op = match op {
            "=" => AttrOp::Equals(value),
            "~=" => AttrOp::Includes(value),
            "|=" => AttrOp::DashMatch(value),
            "^=" => AttrOp::Prefix(value),
            "$=" => AttrOp::Suffix(value),
            _ => AttrOp::Substring(value),
        };
        Ok(AttrCondition { name, op })
    }

    fn pseudo(&mut self) -> Result<Pseudo, SelectorError> {
        let name = self.ident()?;
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "only-child" => Ok(Pseudo::OnlyChild),
            "empty" => Ok(Pseudo::Empty),
            _ => Err(SelectorError::Unsupported(alloc::format!(":{name}"))),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
