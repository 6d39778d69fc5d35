// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State shared by a running DOM driver and every surface derived from it.

use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::fmt;
use std::rc::Rc;

use canopy_dom::{Document, Listener, NativeEvent, NodeId, diff, patch, read_tree};
use canopy_stream::{Stream, Subject, Subscription};
use canopy_vtree::{Element, UiNode, transpose};

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::registry::{EventKey, EventRegistry};

/// Lifecycle of a running [`DomDriver`](crate::DomDriver).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Running, no tree rendered yet.
    Idle,
    /// At least one tree has been patched into the container.
    Streaming,
    /// Torn down; every operation fails with
    /// [`DriverError::DriverDisposed`].
    Disposed,
}

pub(crate) struct Runtime {
    pub(crate) doc: Rc<RefCell<Document>>,
    pub(crate) container: NodeId,
    pub(crate) config: DriverConfig,
    root: Subject<NodeId>,
    current_root: Cell<NodeId>,
    /// The tree the container currently shows; every render diffs against it.
    rendered: RefCell<UiNode>,
    state: Cell<DriverState>,
    render: RefCell<Option<Subscription>>,
    pub(crate) registry: RefCell<EventRegistry>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("container", &self.container)
            .field("current_root", &self.current_root.get())
            .field("state", &self.state.get())
            .field("registry", &self.registry.borrow())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub(crate) fn new(
        doc: Rc<RefCell<Document>>,
        container: NodeId,
        initial: UiNode,
        config: DriverConfig,
    ) -> Self {
        let root = Subject::replay_latest();
        root.next(container);
        Self {
            doc,
            container,
            config,
            root,
            current_root: Cell::new(container),
            rendered: RefCell::new(initial),
            state: Cell::new(DriverState::Idle),
            render: RefCell::new(None),
            registry: RefCell::new(EventRegistry::default()),
        }
    }

    pub(crate) fn state(&self) -> DriverState {
        self.state.get()
    }

    pub(crate) fn ensure_running(&self) -> Result<(), DriverError> {
        match self.state.get() {
            DriverState::Disposed => Err(DriverError::DriverDisposed),
            DriverState::Idle | DriverState::Streaming => Ok(()),
        }
    }

    /// The root element after every patch, replaying the latest one.
    pub(crate) fn root_stream(&self) -> Stream<NodeId> {
        self.root.stream()
    }

    pub(crate) fn current_root(&self) -> NodeId {
        self.current_root.get()
    }

    pub(crate) fn attach(&self, render: Subscription) {
        if self.state.get() == DriverState::Disposed {
            render.unsubscribe();
        } else {
            *self.render.borrow_mut() = Some(render);
        }
    }

    /// Patch the container from the tree it shows to `new` and publish the
    /// root.
    ///
    /// A patch that fails may stop halfway; the container is then read back
    /// so the next render diffs against what the document really holds.
    pub(crate) fn render(&self, new: &UiNode) {
        if self.state.get() == DriverState::Disposed {
            return;
        }
        let patched = {
            let mut doc = self.doc.borrow_mut();
            let root = self.current_root.get();
            let new = wrap_top_level(new.clone(), &doc, root);
            let edits = diff(&self.rendered.borrow(), &new);
            log::trace!("patching {} edit(s) into {root:?}", edits.len());
            let patched = patch(&mut doc, root, &edits);
            let shown = match &patched {
                Ok(_) => Some(new),
                Err(_) => read_tree(&doc, root),
            };
            if let Some(shown) = shown {
                *self.rendered.borrow_mut() = shown;
            }
            patched
        };
        match patched {
            Ok(root) => {
                self.current_root.set(root);
                if self.state.replace(DriverState::Streaming) == DriverState::Idle {
                    log::debug!("DOM driver streaming into {root:?}");
                }
                self.root.next(root);
            }
            Err(err) => self.config.report(&DriverError::Patch(err)),
        }
    }

    /// Install the native listener for `key` unless it exists.
    pub(crate) fn ensure_listener(self: &Rc<Self>, key: &EventKey) -> Result<(), DriverError> {
        if self.registry.borrow().contains(key) {
            return Ok(());
        }
        let weak = Rc::downgrade(self);
        let dispatch_key = key.clone();
        let listener: Listener = Rc::new(move |event: &Rc<NativeEvent>| {
            if let Some(runtime) = weak.upgrade() {
                runtime.deliver(&dispatch_key, event);
            }
        });
        let id = self
            .doc
            .borrow_mut()
            .add_event_listener(self.container, &key.event_type, key.capture, listener)
            .map_err(DriverError::Listener)?;
        log::debug!(
            "native `{}` listener on {:?} (capture: {})",
            key.event_type,
            self.container,
            key.capture
        );
        self.registry.borrow_mut().insert_listener(key.clone(), id);
        Ok(())
    }

    /// Hand a native event to every scoped handler it reaches.
    ///
    /// Handlers run deepest matched element first; ties keep registration
    /// order. Each handler re-checks the event right before delivery, so one
    /// that stops propagation silences the handlers of enclosing scopes.
    fn deliver(&self, key: &EventKey, event: &Rc<NativeEvent>) {
        if self.state.get() == DriverState::Disposed {
            return;
        }
        let root = self.current_root.get();
        let handlers = self.registry.borrow().handlers(key);
        let mut reached: Vec<_> = {
            let doc = self.doc.borrow();
            handlers
                .into_iter()
                .filter_map(|h| {
                    let node = h.scope.simulate_bubbling(&doc, root, event)?;
                    Some((doc.depth(node), h))
                })
                .collect()
        };
        reached.sort_by_key(|(depth, _)| Reverse(*depth));
        for (_, handler) in reached {
            let current = {
                let doc = self.doc.borrow();
                handler.scope.simulate_bubbling(&doc, root, event)
            };
            if let Some(current) = current {
                handler.deliver(event, current);
            }
        }
    }

    pub(crate) fn dispose(&self) {
        if self.state.replace(DriverState::Disposed) == DriverState::Disposed {
            return;
        }
        let render = self.render.borrow_mut().take();
        if let Some(render) = render {
            render.unsubscribe();
        }
        let entries = self.registry.borrow_mut().drain();
        {
            let mut doc = self.doc.borrow_mut();
            for (listener, _) in &entries {
                doc.remove_event_listener(self.container, *listener);
            }
        }
        for (_, handlers) in entries {
            for handler in handlers {
                handler.observer.complete();
            }
        }
        self.root.complete();
        log::debug!("DOM driver on {:?} disposed", self.container);
    }
}

/// Transpose `tree`, reporting failures instead of propagating them.
///
/// A tree that cannot be transposed, or whose asynchronous branches fail,
/// renders nothing; the next tree of the sink renders normally.
pub(crate) fn transpose_reporting(tree: &UiNode, config: &DriverConfig) -> Stream<UiNode> {
    match transpose(tree) {
        Ok(trees) => {
            let config = config.clone();
            trees.catch_error(move |err| {
                config.report(&DriverError::from_stream(err));
                Stream::empty()
            })
        }
        Err(err) => {
            config.report(&DriverError::UnsupportedNodeShape(err));
            Stream::empty()
        }
    }
}

/// Align the top of `tree` with the live container.
///
/// A tree whose top element has the container's tag, namespace, id and class
/// is used as is. Anything else is wrapped in an element carrying the container's tag,
/// namespace, id and class.
pub(crate) fn wrap_top_level(tree: UiNode, doc: &Document, container: NodeId) -> UiNode {
    let tag = doc.tag_name(container).unwrap_or("div");
    let id = doc.id(container).unwrap_or_default();
    let class = doc.class_name(container).unwrap_or_default();
    if let UiNode::Element(el) = &tree
        && el.tag.eq_ignore_ascii_case(tag)
        && el.namespace.as_deref() == doc.namespace(container)
        && el.props.id().unwrap_or_default() == id
        && el.props.class_name().unwrap_or_default() == class
    {
        return tree;
    }
    let mut wrapper = Element::new(tag);
    wrapper.namespace = doc.namespace(container).map(Into::into);
    if !id.is_empty() {
        wrapper.props.attrs.insert("id".into(), id.into());
    }
    if !class.is_empty() {
        wrapper.props.attrs.insert("class".into(), class.into());
    }
    wrapper.children.push(tree);
    UiNode::Element(wrapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_dom::create;
    use canopy_vtree::{h, svg};

    fn container(tree: &UiNode) -> (Document, NodeId) {
        let mut doc = Document::new();
        let id = create(&mut doc, tree).unwrap();
        let body = doc.body();
        doc.append_child(body, id).unwrap();
        (doc, id)
    }

    #[test]
    fn matching_top_passes_through() {
        let (doc, app) = container(&h("div#app.main").build());
        let tree = h("div#app.main").text("hi").build();
        assert_eq!(wrap_top_level(tree.clone(), &doc, app), tree);
    }

    #[test]
    fn other_tops_are_wrapped() {
        let (doc, app) = container(&h("section#app").build());
        let tree = h("p").text("hi").build();
        assert_eq!(
            wrap_top_level(tree.clone(), &doc, app),
            h("section#app").child(tree).build()
        );
        let text = UiNode::from("bare");
        assert_eq!(
            wrap_top_level(text.clone(), &doc, app),
            h("section#app").child(text).build()
        );
    }

    #[test]
    fn foreign_namespace_tops_are_wrapped() {
        let (doc, app) = container(&h("div#app").build());
        let tree = svg("div#app").build();
        assert_eq!(
            wrap_top_level(tree.clone(), &doc, app),
            h("div#app").child(tree).build()
        );
    }

    #[test]
    fn bad_trees_are_reported_not_propagated() {
        let errors = Rc::new(Cell::new(0));
        let seen = errors.clone();
        let config = DriverConfig::default().with_error_handler(move |_| seen.set(seen.get() + 1));
        let bad = UiNode::Element(Element::new("not a tag"));
        let completed = Rc::new(Cell::new(false));
        let done = completed.clone();
        transpose_reporting(&bad, &config).subscribe(
            canopy_stream::Observer::new(|_: UiNode| {}).with_complete(move || done.set(true)),
        );
        assert_eq!(errors.get(), 1);
        assert!(completed.get());
    }
}
