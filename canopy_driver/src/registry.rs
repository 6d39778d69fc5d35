// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out of native listeners to scoped event streams.
//!
//! Every `(event type, capture)` pair gets exactly one native listener on the
//! container; each logical `events()` subscription registers a handler under
//! it instead of a listener of its own.

use std::fmt;
use std::rc::Rc;

use canopy_dom::{ListenerId, NativeEvent, NodeId};
use canopy_scope::PreparedScope;
use canopy_stream::Observer;
use hashbrown::HashMap;

use crate::source::DomEvent;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EventKey {
    pub(crate) event_type: String,
    pub(crate) capture: bool,
}

pub(crate) struct Handler {
    id: u64,
    pub(crate) scope: Rc<PreparedScope>,
    pub(crate) observer: Observer<DomEvent>,
}

impl Handler {
    pub(crate) fn deliver(&self, native: &Rc<NativeEvent>, current_target: NodeId) {
        self.observer.next(DomEvent::new(native.clone(), current_target));
    }
}

struct Entry {
    listener: ListenerId,
    handlers: Vec<Rc<Handler>>,
}

#[derive(Default)]
pub(crate) struct EventRegistry {
    entries: HashMap<EventKey, Entry>,
    next_handler: u64,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("native_listeners", &self.listener_count())
            .field("handlers", &self.handler_count())
            .finish_non_exhaustive()
    }
}

impl EventRegistry {
    pub(crate) fn contains(&self, key: &EventKey) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn insert_listener(&mut self, key: EventKey, listener: ListenerId) {
        self.entries.insert(
            key,
            Entry {
                listener,
                handlers: Vec::new(),
            },
        );
    }

    /// Register a handler; `None` once the native listener is gone.
    pub(crate) fn add_handler(
        &mut self,
        key: &EventKey,
        scope: Rc<PreparedScope>,
        observer: Observer<DomEvent>,
    ) -> Option<u64> {
        let entry = self.entries.get_mut(key)?;
        let id = self.next_handler;
        self.next_handler += 1;
        entry.handlers.push(Rc::new(Handler {
            id,
            scope,
            observer,
        }));
        Some(id)
    }

    pub(crate) fn remove_handler(&mut self, key: &EventKey, id: u64) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.handlers.retain(|h| h.id != id);
        }
    }

    /// Handlers for `key`, in registration order.
    pub(crate) fn handlers(&self, key: &EventKey) -> Vec<Rc<Handler>> {
        self.entries
            .get(key)
            .map(|e| e.handlers.clone())
            .unwrap_or_default()
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.entries.values().map(|e| e.handlers.len()).sum()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.entries.len()
    }

    /// Remove everything, returning the native listeners and their handlers.
    pub(crate) fn drain(&mut self) -> Vec<(ListenerId, Vec<Rc<Handler>>)> {
        self.entries
            .drain()
            .map(|(_, e)| (e.listener, e.handlers))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_scope::ScopeNamespace;

    fn key(event_type: &str) -> EventKey {
        EventKey {
            event_type: event_type.into(),
            capture: false,
        }
    }

    fn scope() -> Rc<PreparedScope> {
        Rc::new(PreparedScope::new(&ScopeNamespace::new()).unwrap())
    }

    #[test]
    fn handlers_need_a_native_listener() {
        let mut registry = EventRegistry::default();
        assert_eq!(registry.add_handler(&key("click"), scope(), Observer::noop()), None);
    }

    #[test]
    fn handlers_fan_out_from_one_listener() {
        let mut doc = canopy_dom::Document::new();
        let body = doc.body();
        let listener = doc
            .add_event_listener(body, "click", false, Rc::new(|_: &Rc<NativeEvent>| {}))
            .unwrap();
        let mut registry = EventRegistry::default();
        registry.insert_listener(key("click"), listener);
        let a = registry.add_handler(&key("click"), scope(), Observer::noop()).unwrap();
        let b = registry.add_handler(&key("click"), scope(), Observer::noop()).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.listener_count(), 1);
        assert_eq!(registry.handler_count(), 2);
        registry.remove_handler(&key("click"), a);
        assert_eq!(registry.handlers(&key("click")).len(), 1);
        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, listener);
        assert!(!registry.contains(&key("click")));
    }
}
