#![forbid(unsafe_code)]

//! The model contract and the keyed collection handed to connected components.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::events::{Listener, ListenerId};

/// An observable, serializable data object.
///
/// Implementations are usually thin wrappers around an
/// [`EventEmitter`](crate::EventEmitter) plus their own state; see
/// [`Record`](crate::Record).
pub trait Model: 'static {
    /// Register `listener` for `event` (or for [`ALL_EVENTS`](crate::ALL_EVENTS)).
    fn on(&self, event: &str, listener: Listener);

    /// Deregister the listener `id` from `event`.
    fn off(&self, event: &str, id: ListenerId);

    /// Plain snapshot of the current state.
    fn to_json(&self) -> Value;

    /// Concrete-type access, used by [`ModelType`] checks and downcasts.
    fn as_any(&self) -> &dyn Any;
}

/// Expected concrete type of a model, checked when a connected component mounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
}

impl ModelType {
    /// Constraint matching exactly `T`.
    #[must_use]
    pub fn of<T: Model>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Whether `model` is a `T`.
    #[must_use]
    pub fn matches(&self, model: &dyn Model) -> bool {
        model.as_any().type_id() == self.id
    }

    /// Type name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Logical name → shared model handle.
///
/// Cloning is cheap (the models are reference counted) and never duplicates
/// a model. Iteration is in key order.
#[derive(Clone, Default)]
pub struct ModelsMap {
    models: BTreeMap<String, Rc<dyn Model>>,
}

impl ModelsMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, model: Rc<dyn Model>) -> Self {
        self.models.insert(key.into(), model);
        self
    }

    /// Insert a model, returning the previous one under `key`.
    pub fn insert(&mut self, key: impl Into<String>, model: Rc<dyn Model>) -> Option<Rc<dyn Model>> {
        self.models.insert(key.into(), model)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Rc<dyn Model>> {
        self.models.get(key)
    }

    /// Look up `key` and downcast it to `T`.
    #[must_use]
    pub fn get_as<T: Model>(&self, key: &str) -> Option<&T> {
        self.models.get(key)?.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<dyn Model>)> {
        self.models.iter().map(|(k, m)| (k.as_str(), m))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Debug for ModelsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelsMap")
            .field("keys", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FromIterator<(String, Rc<dyn Model>)> for ModelsMap {
    fn from_iter<I: IntoIterator<Item = (String, Rc<dyn Model>)>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}
