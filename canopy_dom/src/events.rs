// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native events: listeners and capture → target → bubble dispatch.
//!
//! Dispatch computes the propagation path once, from the document root down to
//! the target, then runs:
//!
//! 1. capture listeners on every ancestor, outermost first;
//! 2. capture listeners, then non-capture listeners, on the target;
//! 3. non-capture listeners on every ancestor, innermost first, but only for
//!    event types that bubble.
//!
//! [`NativeEvent::stop_propagation`] lets the remaining listeners of the
//! current node run and skips every later node.
//!
//! ```
//! use canopy_dom::{Document, NativeEvent, dispatch_event};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let doc = Rc::new(RefCell::new(Document::new()));
//! let button = {
//!     let mut d = doc.borrow_mut();
//!     let button = d.create_element("button").unwrap();
//!     let body = d.body();
//!     d.append_child(body, button).unwrap();
//!     button
//! };
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let body = doc.borrow().body();
//! doc.borrow_mut()
//!     .add_event_listener(body, "click", false, Rc::new(move |ev: &Rc<NativeEvent>| {
//!         log.borrow_mut().push(ev.current_target());
//!     }))
//!     .unwrap();
//!
//! dispatch_event(&doc, NativeEvent::new("click", button));
//! assert_eq!(*seen.borrow(), [Some(body)]);
//! ```

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::document::{Document, NodeData};
use crate::error::DomError;
use crate::types::{ListenerId, NodeId};

/// Event types that do not bubble natively.
pub const NON_BUBBLING_EVENTS: &[&str] = &[
    "blur",
    "canplay",
    "canplaythrough",
    "change",
    "durationchange",
    "emptied",
    "ended",
    "focus",
    "load",
    "loadeddata",
    "loadedmetadata",
    "mouseenter",
    "mouseleave",
    "pause",
    "play",
    "playing",
    "ratechange",
    "reset",
    "scroll",
    "seeked",
    "seeking",
    "stalled",
    "submit",
    "suspend",
    "timeupdate",
    "unload",
    "volumechange",
    "waiting",
];

/// Returns `true` unless `event_type` is one of [`NON_BUBBLING_EVENTS`].
pub fn bubbles_natively(event_type: &str) -> bool {
    !NON_BUBBLING_EVENTS.contains(&event_type)
}

bitflags::bitflags! {
    /// Static properties of an event.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// The event takes part in the bubble phase.
        const BUBBLES    = 0b0000_0001;
        /// [`NativeEvent::prevent_default`] has an effect.
        const CANCELABLE = 0b0000_0010;
    }
}

/// Phases of event propagation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Not being dispatched.
    None,
    /// Root-to-target traversal.
    Capture,
    /// Target node.
    Target,
    /// Target-to-root traversal.
    Bubble,
}

/// An event travelling through a [`Document`].
///
/// Dispatch state lives in cells so that listeners, which only see a shared
/// reference, can stop propagation or cancel the default action.
#[derive(Debug)]
pub struct NativeEvent {
    event_type: String,
    target: NodeId,
    flags: EventFlags,
    detail: Option<String>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
    phase: Cell<Phase>,
    current_target: Cell<Option<NodeId>>,
}

impl NativeEvent {
    /// An event of `event_type` aimed at `target`.
    ///
    /// It bubbles unless the type is known not to, and it is cancelable.
    pub fn new(event_type: &str, target: NodeId) -> Self {
        let mut flags = EventFlags::CANCELABLE;
        if bubbles_natively(event_type) {
            flags |= EventFlags::BUBBLES;
        }
        Self {
            event_type: event_type.to_string(),
            target,
            flags,
            detail: None,
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            phase: Cell::new(Phase::None),
            current_target: Cell::new(None),
        }
    }

    /// Override the static flags.
    #[must_use]
    pub fn with_flags(mut self, flags: EventFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Attach a payload, such as the new value of a form control.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The event type, for example `"click"`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node the event was dispatched to.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Static flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Returns `true` if the event takes part in the bubble phase.
    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    /// Payload attached with [`NativeEvent::with_detail`].
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Stop propagation after the listeners of the current node.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Returns `true` once [`NativeEvent::stop_propagation`] was called.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Cancel the default action, if the event is cancelable.
    pub fn prevent_default(&self) {
        if self.flags.contains(EventFlags::CANCELABLE) {
            self.default_prevented.set(true);
        }
    }

    /// Returns `true` if the default action was cancelled.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// The current dispatch phase.
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// The node whose listeners are running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }
}

/// Callback invoked for a dispatched event.
pub type Listener = Rc<dyn Fn(&Rc<NativeEvent>)>;

pub(crate) struct ListenerRecord {
    id: ListenerId,
    event_type: String,
    capture: bool,
    callback: Listener,
}

impl Document {
    /// Register `listener` for `event_type` on `node`.
    ///
    /// Only elements accept listeners; text nodes and stale ids fail with
    /// [`DomError::NoListenerTarget`].
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        listener: Listener,
    ) -> Result<ListenerId, DomError> {
        let id = ListenerId(self.next_listener);
        let Some(NodeData::Element(el)) = self.node_opt_mut(node).map(|n| &mut n.data) else {
            return Err(DomError::NoListenerTarget(node));
        };
        el.listeners.push(ListenerRecord {
            id,
            event_type: event_type.to_string(),
            capture,
            callback: listener,
        });
        self.next_listener += 1;
        Ok(id)
    }

    /// Unregister a listener; returns `false` if it was not registered on `node`.
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Ok(el) = self.element_mut(node) else {
            return false;
        };
        let before = el.listeners.len();
        el.listeners.retain(|l| l.id != id);
        el.listeners.len() != before
    }

    /// Number of listeners registered on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.element(node).map_or(0, |e| e.listeners.len())
    }

    fn listeners_for(&self, node: NodeId, event_type: &str, capture: bool) -> Vec<Listener> {
        self.element(node)
            .map(|el| {
                el.listeners
                    .iter()
                    .filter(|l| l.capture == capture && l.event_type == event_type)
                    .map(|l| l.callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Dispatch `event` through `doc` and return it once propagation is over.
///
/// The document is only borrowed while collecting listeners, never while one
/// runs, so listeners may read or mutate it.
pub fn dispatch_event(doc: &RefCell<Document>, event: NativeEvent) -> Rc<NativeEvent> {
    let event = Rc::new(event);
    let target = event.target;
    let path: Vec<NodeId> = {
        let d = doc.borrow();
        if !d.is_alive(target) {
            return event;
        }
        let mut path: Vec<NodeId> = d.ancestors(target).collect();
        path.reverse();
        path
    };

    let run = |node: NodeId, phase: Phase, capture: bool| -> bool {
        let listeners = doc.borrow().listeners_for(node, &event.event_type, capture);
        event.phase.set(phase);
        event.current_target.set(Some(node));
        for listener in listeners {
            listener(&event);
        }
        event.is_propagation_stopped()
    };

    'dispatch: {
        for &node in &path {
            if run(node, Phase::Capture, true) {
                break 'dispatch;
            }
        }
        // At the target, capture listeners run before the others.
        if run(target, Phase::Target, true) || run(target, Phase::Target, false) {
            break 'dispatch;
        }
        if event.bubbles() {
            for &node in path.iter().rev() {
                if run(node, Phase::Bubble, false) {
                    break 'dispatch;
                }
            }
        }
    }

    event.phase.set(Phase::None);
    event.current_target.set(None);
    event
}
