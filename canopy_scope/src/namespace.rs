// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The accumulated chain of scoped selections.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use canopy_vtree::ISOLATE_ATTRIBUTE;

/// One link of a [`ScopeNamespace`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fragment {
    /// A CSS selector passed to a scoped `select`.
    Selector(String),
    /// An isolation boundary with the given scope identifier.
    Isolation(String),
}

impl fmt::Display for Fragment {
    /// Isolation markers render as the attribute selector matching their
    /// boundary element.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(selector) => f.write_str(selector),
            Self::Isolation(scope) => {
                write!(f, "[{ISOLATE_ATTRIBUTE}=\"")?;
                for c in scope.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"]")
            }
        }
    }
}

/// An ordered chain of selector fragments and isolation markers.
///
/// Namespaces are immutable values: extending one returns a new namespace and
/// leaves the original untouched, so every scoped surface can hold on to its
/// own. Cloning is cheap; the fragments are shared.
///
/// ```
/// use canopy_scope::ScopeNamespace;
///
/// let root = ScopeNamespace::new();
/// let todo = root.with_isolation("todo").with_selector(".item");
/// assert!(root.is_empty());
/// assert!(todo.has_isolation("todo"));
/// assert_eq!(todo.to_string(), r#"[data-isolate="todo"] .item"#);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeNamespace {
    fragments: Rc<[Fragment]>,
}

impl ScopeNamespace {
    /// The empty namespace of a driver's root surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a namespace from fragments, outermost first.
    pub fn from_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Self {
        Self {
            fragments: fragments.into_iter().collect(),
        }
    }

    /// The fragments, outermost first.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Returns `true` if nothing has been selected yet.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// This namespace extended with a selector fragment.
    pub fn with_selector(&self, selector: impl Into<String>) -> Self {
        self.with(Fragment::Selector(selector.into()))
    }

    /// This namespace extended with an isolation marker.
    pub fn with_isolation(&self, scope: impl Into<String>) -> Self {
        self.with(Fragment::Isolation(scope.into()))
    }

    fn with(&self, fragment: Fragment) -> Self {
        let mut fragments = Vec::with_capacity(self.fragments.len() + 1);
        fragments.extend_from_slice(&self.fragments);
        fragments.push(fragment);
        Self {
            fragments: fragments.into(),
        }
    }

    /// Returns `true` if the namespace carries a marker for `scope`.
    pub fn has_isolation(&self, scope: &str) -> bool {
        self.isolation_scopes().any(|s| s == scope)
    }

    /// The isolation scopes, outermost first.
    pub fn isolation_scopes(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Isolation(scope) => Some(scope.as_str()),
            Fragment::Selector(_) => None,
        })
    }

    /// The selector fragments, outermost first.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Selector(selector) => Some(selector.as_str()),
            Fragment::Isolation(_) => None,
        })
    }
}

impl fmt::Display for ScopeNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{fragment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ScopeNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fragments.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn extension_leaves_original_untouched() {
        let base = ScopeNamespace::new().with_selector(".a");
        let ext = base.with_selector(".b");
        assert_eq!(base.fragments().len(), 1);
        assert_eq!(ext.fragments().len(), 2);
        assert_eq!(ext.selectors().collect::<Vec<_>>(), [".a", ".b"]);
    }

    #[test]
    fn isolation_markers_are_tracked() {
        let ns = ScopeNamespace::new()
            .with_isolation("x")
            .with_selector("li")
            .with_isolation("y");
        assert!(ns.has_isolation("x"));
        assert!(ns.has_isolation("y"));
        assert!(!ns.has_isolation("z"));
        assert_eq!(ns.isolation_scopes().collect::<Vec<_>>(), ["x", "y"]);
    }

    #[test]
    fn isolation_marker_display_is_escaped() {
        let f = Fragment::Isolation(String::from(r#"a"b\c"#));
        assert_eq!(f.to_string(), r#"[data-isolate="a\"b\\c"]"#);
    }

    #[test]
    fn equal_chains_compare_equal() {
        let a = ScopeNamespace::new().with_selector(".a");
        let b = ScopeNamespace::from_fragments([Fragment::Selector(String::from(".a"))]);
        assert_eq!(a, b);
    }
}
