//! Event listeners and dispatch.
//!
//! Events bubble from their target through every ancestor. Shadow roots are crossed into their host, so a
//! listener on a custom element sees clicks that happened inside its shadow tree.

use std::{cell::Cell, fmt::Debug, rc::Rc};

use crate::NodeId;

/// An event travelling through the document.
pub struct Event {
    name: Rc<str>,
    target: NodeId,
    current_target: Cell<NodeId>,
    propagates: Cell<bool>,
}

impl Event {
    pub(crate) fn new(name: Rc<str>, target: NodeId) -> Self {
        Self {
            name,
            target,
            current_target: Cell::new(target),
            propagates: Cell::new(true),
        }
    }

    /// The event's type, e.g. `click`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node the event was dispatched to.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    /// Prevent the event from reaching any further ancestors.
    pub fn stop_propagation(&self) {
        self.propagates.set(false);
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    pub(crate) fn propagates(&self) -> bool {
        self.propagates.get()
    }
}

impl Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("current_target", &self.current_target.get())
            .finish()
    }
}

/// A callback attached to an element for a single event type.
#[derive(Clone)]
pub struct Listener {
    pub(crate) event: Rc<str>,
    pub(crate) handler: Rc<dyn Fn(&Event)>,
}

impl Listener {
    pub fn new(event: impl Into<Rc<str>>, handler: impl Fn(&Event) + 'static) -> Self {
        Self {
            event: event.into(),
            handler: Rc::new(handler),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}
