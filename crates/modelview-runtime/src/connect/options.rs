//! Connector options: debouncing, per-model event selection, type constraints.

use std::collections::BTreeMap;
use std::time::Duration;

use modelview_core::{ALL_EVENTS, ConnectError, Model, ModelType, ModelsMap, Result};

/// How re-projections are coalesced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Debounce {
    /// Re-project synchronously on every event.
    #[default]
    Off,
    /// Coalesce everything triggered before the scheduler's next tick.
    Tick,
    /// Coalesce until no event has fired for the given wait.
    Wait(Duration),
}

impl Debounce {
    /// The coalescing wait, or `None` when debouncing is off.
    #[must_use]
    pub fn wait(self) -> Option<Duration> {
        match self {
            Self::Off => None,
            Self::Tick => Some(Duration::ZERO),
            Self::Wait(wait) => Some(wait),
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Self::Off
    }
}

impl From<bool> for Debounce {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Tick } else { Self::Off }
    }
}

impl From<Duration> for Debounce {
    fn from(wait: Duration) -> Self {
        Self::Wait(wait)
    }
}

/// Per-model event selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventNames {
    /// Never subscribe to this model.
    Disabled,
    /// Subscribe to these events; an empty list means [`ALL_EVENTS`].
    Names(Vec<String>),
}

impl EventNames {
    /// Explicit event list.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    /// Events to subscribe to, deduplicated in first-seen order.
    #[must_use]
    pub fn resolve(&self) -> Vec<String> {
        match self {
            Self::Disabled => Vec::new(),
            Self::Names(names) if names.is_empty() => vec![ALL_EVENTS.to_owned()],
            Self::Names(names) => {
                let mut out: Vec<String> = Vec::with_capacity(names.len());
                for name in names {
                    if !out.contains(name) {
                        out.push(name.clone());
                    }
                }
                out
            }
        }
    }
}

impl Default for EventNames {
    fn default() -> Self {
        Self::Names(Vec::new())
    }
}

impl From<bool> for EventNames {
    /// `false` disables the model; `true` is the default (`"all"`).
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::default()
        } else {
            Self::Disabled
        }
    }
}

impl<const N: usize> From<[&str; N]> for EventNames {
    fn from(names: [&str; N]) -> Self {
        Self::names(names)
    }
}

impl From<Vec<String>> for EventNames {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

/// Options recognised by a [`Connector`](super::Connector).
#[derive(Clone, Debug, Default)]
pub struct ConnectOptions {
    pub debounce: Debounce,
    pub events: BTreeMap<String, EventNames>,
    /// Checked in order at mount; the first failure aborts the mount.
    pub model_types: Vec<(String, ModelType)>,
}

impl ConnectOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn debounce(mut self, debounce: impl Into<Debounce>) -> Self {
        self.debounce = debounce.into();
        self
    }

    #[must_use]
    pub fn events(mut self, key: impl Into<String>, events: impl Into<EventNames>) -> Self {
        self.events.insert(key.into(), events.into());
        self
    }

    /// Require the model under `key` to be a `T`.
    #[must_use]
    pub fn model_type<T: Model>(mut self, key: impl Into<String>) -> Self {
        self.model_types.push((key.into(), ModelType::of::<T>()));
        self
    }

    /// Events the connector subscribes to for `key`.
    #[must_use]
    pub fn event_names(&self, key: &str) -> Vec<String> {
        self.events
            .get(key)
            .map_or_else(|| vec![ALL_EVENTS.to_owned()], EventNames::resolve)
    }

    /// Check the type constraints against `models`.
    ///
    /// # Errors
    ///
    /// [`ConnectError::TypeMismatch`] for the first constrained key whose model
    /// is missing or of another type.
    pub fn validate(&self, models: &ModelsMap) -> Result<()> {
        for (key, expected) in &self.model_types {
            let ok = models.get(key).is_some_and(|m| expected.matches(&**m));
            if !ok {
                return Err(ConnectError::TypeMismatch {
                    key: key.clone(),
                    expected: expected.name(),
                });
            }
        }
        Ok(())
    }
}
