// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped surfaces over a running DOM driver.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use canopy_dom::{Document, NativeEvent, NodeId, SelectorError, bubbles_natively};
use canopy_scope::{PreparedScope, ScopeNamespace};
use canopy_stream::{Observer, Stream, Subscription};
use canopy_vtree::UiNode;

use crate::config::EventOptions;
use crate::error::DriverError;
use crate::registry::EventKey;
use crate::runtime::{DriverState, Runtime};

/// An event delivered to a scoped [`DomSource::events`] stream.
#[derive(Clone, Debug)]
pub struct DomEvent {
    native: Rc<NativeEvent>,
    current_target: NodeId,
}

impl DomEvent {
    pub(crate) fn new(native: Rc<NativeEvent>, current_target: NodeId) -> Self {
        Self {
            native,
            current_target,
        }
    }

    /// The dispatched native event.
    pub fn native(&self) -> &Rc<NativeEvent> {
        &self.native
    }

    /// Event type.
    pub fn event_type(&self) -> &str {
        self.native.event_type()
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> NodeId {
        self.native.target()
    }

    /// The element of this scope the simulated bubble reached.
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    /// Keep the event from reaching the handlers of enclosing scopes, and
    /// from further native propagation.
    pub fn stop_propagation(&self) {
        self.native.stop_propagation();
    }

    /// Cancel the default action.
    pub fn prevent_default(&self) {
        self.native.prevent_default();
    }
}

/// A scoped view of a running [`DomDriver`](crate::DomDriver).
///
/// The root surface is returned by [`Driver::run`](crate::Driver::run). Each
/// [`select`](Self::select) or [`isolate_source`](Self::isolate_source) call
/// derives a narrower surface; surfaces are cheap to clone and share the
/// driver's state.
#[derive(Clone)]
pub struct DomSource {
    runtime: Rc<Runtime>,
    scope: Rc<PreparedScope>,
}

impl fmt::Debug for DomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomSource")
            .field("namespace", self.scope.namespace())
            .field("state", &self.runtime.state())
            .finish_non_exhaustive()
    }
}

impl DomSource {
    pub(crate) fn new(runtime: Rc<Runtime>) -> Result<Self, DriverError> {
        let namespace = ScopeNamespace::new();
        let scope = PreparedScope::new(&namespace).map_err(|source| {
            DriverError::InvalidSelectorArgument {
                selector: namespace.to_string(),
                source,
            }
        })?;
        Ok(Self {
            runtime,
            scope: Rc::new(scope),
        })
    }

    fn derive(&self, namespace: ScopeNamespace, selector: &str) -> Result<Self, DriverError> {
        let scope = PreparedScope::new(&namespace).map_err(|source| {
            DriverError::InvalidSelectorArgument {
                selector: selector.to_owned(),
                source,
            }
        })?;
        Ok(Self {
            runtime: self.runtime.clone(),
            scope: Rc::new(scope),
        })
    }

    /// The namespace of this surface.
    pub fn namespace(&self) -> &ScopeNamespace {
        self.scope.namespace()
    }

    /// Narrow the surface to the elements matching `selector` below it.
    ///
    /// `:root` returns the driver's top surface, whose elements are the root
    /// element sequence, however deeply `self` is nested. Empty or
    /// unparsable selectors fail with [`DriverError::InvalidSelectorArgument`].
    pub fn select(&self, selector: &str) -> Result<Self, DriverError> {
        self.runtime.ensure_running()?;
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(DriverError::InvalidSelectorArgument {
                selector: selector.to_owned(),
                source: SelectorError::Empty,
            });
        }
        if trimmed == ":root" {
            return self.derive(ScopeNamespace::new(), selector);
        }
        self.derive(self.namespace().with_selector(trimmed), selector)
    }

    /// Narrow the surface to the isolation boundary `scope`.
    ///
    /// Pairs with [`isolate_sink`](Self::isolate_sink): a child component
    /// renders through an isolated sink and reads through an isolated source,
    /// so its parent's selections no longer reach inside it.
    pub fn isolate_source(&self, scope: &str) -> Result<Self, DriverError> {
        self.runtime.ensure_running()?;
        self.derive(self.namespace().with_isolation(scope), scope)
    }

    /// Mark the top element of every tree of `sink` as boundary `scope`.
    pub fn isolate_sink(sink: &Stream<UiNode>, scope: &str) -> Stream<UiNode> {
        let scope: Rc<str> = scope.into();
        sink.map(move |tree| tree.with_isolation(&*scope))
    }

    /// The elements of this surface, re-resolved after every patch.
    ///
    /// Subscribers see the current selection immediately.
    pub fn elements(&self) -> Result<Stream<Vec<NodeId>>, DriverError> {
        self.runtime.ensure_running()?;
        let doc = self.runtime.doc.clone();
        let scope = self.scope.clone();
        Ok(self
            .runtime
            .root_stream()
            .map(move |root| scope.resolve(&doc.borrow(), root)))
    }

    /// The root element after every patch, replaying the latest one.
    pub fn root(&self) -> Result<Stream<NodeId>, DriverError> {
        self.runtime.ensure_running()?;
        Ok(self.runtime.root_stream())
    }

    /// Events of type `event_type` reaching this surface.
    ///
    /// One native listener per event type and phase is installed on the
    /// container and shared by every `events` stream. Types that do not bubble
    /// natively are always captured. An event is delivered when its simulated
    /// bubble from the true target reaches an element of this surface.
    ///
    /// Fails with [`DriverError::Listener`] when the native listener cannot be
    /// attached.
    pub fn events(
        &self,
        event_type: &str,
        options: EventOptions,
    ) -> Result<Stream<DomEvent>, DriverError> {
        self.runtime.ensure_running()?;
        let key = EventKey {
            event_type: event_type.to_owned(),
            capture: options.use_capture
                || self.runtime.config.capture_all()
                || !bubbles_natively(event_type),
        };
        self.runtime.ensure_listener(&key)?;
        let runtime = Rc::downgrade(&self.runtime);
        let scope = self.scope.clone();
        Ok(Stream::new(move |observer: Observer<DomEvent>| {
            let id = runtime.upgrade().and_then(|rt| {
                rt.registry
                    .borrow_mut()
                    .add_handler(&key, scope.clone(), observer.clone())
            });
            let Some(id) = id else {
                observer.complete();
                return Subscription::closed();
            };
            let runtime = runtime.clone();
            let key = key.clone();
            Subscription::from_teardown(move || {
                if let Some(rt) = runtime.upgrade() {
                    rt.registry.borrow_mut().remove_handler(&key, id);
                }
            })
        }))
    }

    /// Lifecycle state of the driver.
    pub fn state(&self) -> DriverState {
        self.runtime.state()
    }

    /// The document the driver renders into.
    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.runtime.doc
    }

    /// The container element.
    pub fn container(&self) -> NodeId {
        self.runtime.container
    }

    /// Number of native listeners the driver holds on the container.
    pub fn native_listener_count(&self) -> usize {
        self.runtime.registry.borrow().listener_count()
    }

    /// Stop rendering and detach every native listener.
    ///
    /// Open event and element streams complete. Idempotent; afterwards every
    /// operation of every surface of this driver fails with
    /// [`DriverError::DriverDisposed`].
    pub fn dispose(&self) {
        self.runtime.dispose();
    }

    /// The current root element, without subscribing.
    pub fn current_root(&self) -> Result<NodeId, DriverError> {
        self.runtime.ensure_running()?;
        Ok(self.runtime.current_root())
    }
}
