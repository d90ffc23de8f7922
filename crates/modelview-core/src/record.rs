#![forbid(unsafe_code)]

//! In-memory attribute record implementing [`Model`].
//!
//! `Record` is the reference model: a JSON attribute map with change events.
//! Setting an attribute to a different value triggers `change:<key>` (with the
//! new value as payload) followed by `change`. Setting an equal value is a
//! no-op and triggers nothing.

use std::any::Any;
use std::cell::RefCell;

use serde_json::{Map, Value};

use crate::events::{EventEmitter, Listener, ListenerId};
use crate::model::Model;

/// Event triggered once per mutating call.
pub const CHANGE_EVENT: &str = "change";

/// Event name for a change to a single attribute: `change:<key>`.
#[must_use]
pub fn change_event(key: &str) -> String {
    format!("{CHANGE_EVENT}:{key}")
}

/// Observable attribute map.
#[derive(Debug, Default)]
pub struct Record {
    attributes: RefCell<Map<String, Value>>,
    events: EventEmitter,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record seeded from a JSON object; non-object values yield an empty record.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        let attributes = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            attributes: RefCell::new(attributes),
            events: EventEmitter::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.attributes.borrow().get(key).cloned()
    }

    /// Set one attribute. Returns whether the value changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        if !self.store(key, value.clone()) {
            return false;
        }
        self.events.trigger(&change_event(key), Some(&value));
        self.events.trigger(CHANGE_EVENT, None);
        true
    }

    /// Set several attributes, triggering each `change:<key>` and then a
    /// single `change`. Returns the number of attributes that changed.
    pub fn set_many<K, V>(&self, attrs: impl IntoIterator<Item = (K, V)>) -> usize
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let changed: Vec<(String, Value)> = attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, v)| self.store(k, v.clone()))
            .collect();
        for (key, value) in &changed {
            self.events.trigger(&change_event(key), Some(value));
        }
        if !changed.is_empty() {
            self.events.trigger(CHANGE_EVENT, None);
        }
        changed.len()
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn unset(&self, key: &str) -> bool {
        let removed = self.attributes.borrow_mut().remove(key).is_some();
        if removed {
            self.events.trigger(&change_event(key), Some(&Value::Null));
            self.events.trigger(CHANGE_EVENT, None);
        }
        removed
    }

    /// Trigger an arbitrary event on this record.
    pub fn trigger(&self, event: &str, payload: Option<&Value>) {
        self.events.trigger(event, payload);
    }

    /// The record's listener registry.
    #[must_use]
    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    // The borrow ends before any event is triggered.
    fn store(&self, key: &str, value: Value) -> bool {
        let mut attrs = self.attributes.borrow_mut();
        if attrs.get(key) == Some(&value) {
            return false;
        }
        attrs.insert(key.to_owned(), value);
        true
    }
}

impl Model for Record {
    fn on(&self, event: &str, listener: Listener) {
        self.events.on(event, listener);
    }

    fn off(&self, event: &str, id: ListenerId) {
        self.events.off(event, id);
    }

    fn to_json(&self) -> Value {
        Value::Object(self.attributes.borrow().clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
