//! Verb and event-handler registries of one story instance.

use bramble_foundation::ObjectId;

use crate::value::{Callable, Value};

/// An `on` handler: runs when the player uses `event` on `owner`.
#[derive(Clone)]
pub struct Handler {
    /// The event value, normally a verb object.
    pub event: Value,
    /// Object whose name the command must mention.
    pub owner: ObjectId,
    /// Handler body.
    pub action: Callable,
}

/// Verbs and handlers in registration order.
#[derive(Default)]
pub struct Registry {
    verbs: Vec<ObjectId>,
    handlers: Vec<Handler>,
}

impl Registry {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a verb.
    pub fn register_verb(&mut self, verb: ObjectId) {
        self.verbs.push(verb);
    }

    /// Appends a handler.
    pub fn register_handler(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    /// Registered verbs.
    #[must_use]
    pub fn verbs(&self) -> &[ObjectId] {
        &self.verbs
    }

    /// Registered handlers.
    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// The verb at `index`, if any.
    #[must_use]
    pub fn verb(&self, index: usize) -> Option<ObjectId> {
        self.verbs.get(index).copied()
    }

    /// The handler at `index`, if any.
    #[must_use]
    pub fn handler(&self, index: usize) -> Option<Handler> {
        self.handlers.get(index).cloned()
    }
}
