//! Connector options as data.
//!
//! [`ConnectConfig`] deserializes the data-only part of [`ConnectOptions`]
//! with the loose shape hosts already write by hand:
//!
//! ```json
//! { "debounce": 50, "events": { "todos": ["add", "remove"], "session": false } }
//! ```
//!
//! - `debounce`: `false` (off), `true` (next tick), or a non-negative wait
//!   in milliseconds (fractions allowed).
//! - `events.<key>`: `false` disables the model, a list of strings selects
//!   events, and any other non-list value (including `true`) means `"all"`,
//!   as does `[]`. A list with a non-string entry is rejected.
//!
//! Type constraints have no data form; add them to the converted options.

use std::collections::BTreeMap;
use std::time::Duration;

use modelview_core::{ConnectError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::connect::{ConnectOptions, Debounce, EventNames};

/// `debounce` setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DebounceSetting {
    Flag(bool),
    #[serde(deserialize_with = "wait_millis")]
    Millis(f64),
}

fn wait_millis<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let ms = f64::deserialize(deserializer)?;
    if ms.is_finite() && ms >= 0.0 {
        Ok(ms)
    } else {
        Err(D::Error::custom(format!(
            "debounce must be a non-negative number of milliseconds, got {ms}"
        )))
    }
}

impl Default for DebounceSetting {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl From<&DebounceSetting> for Debounce {
    fn from(setting: &DebounceSetting) -> Self {
        match *setting {
            DebounceSetting::Flag(enabled) => Debounce::from(enabled),
            DebounceSetting::Millis(ms) => Debounce::Wait(millis_to_duration(ms)),
        }
    }
}

/// Nearest-nanosecond conversion; waits beyond `Duration::MAX` saturate.
fn millis_to_duration(ms: f64) -> Duration {
    let nanos = (ms * 1_000_000.0).round();
    if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
    }
}

/// `events.<key>` setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventsSetting {
    Flag(bool),
    Names(Vec<String>),
    /// Any other non-list value; treated as the default.
    #[serde(deserialize_with = "non_list")]
    Other(Value),
}

fn non_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Value, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_array() {
        Err(D::Error::custom("event names must be strings"))
    } else {
        Ok(value)
    }
}

impl From<&EventsSetting> for EventNames {
    fn from(setting: &EventsSetting) -> Self {
        match setting {
            EventsSetting::Flag(enabled) => EventNames::from(*enabled),
            EventsSetting::Names(names) => EventNames::Names(names.clone()),
            EventsSetting::Other(_) => EventNames::default(),
        }
    }
}

/// Serializable connector configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    pub debounce: DebounceSetting,
    pub events: BTreeMap<String, EventsSetting>,
}

impl ConnectConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Config`] when the document is malformed.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ConnectError::Config(e.to_string()))
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConnectError::Config`] when the document is malformed.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConnectError::Config(e.to_string()))
    }

    /// Convert into connector options.
    #[must_use]
    pub fn to_options(&self) -> ConnectOptions {
        ConnectOptions {
            debounce: Debounce::from(&self.debounce),
            events: self
                .events
                .iter()
                .map(|(key, setting)| (key.clone(), EventNames::from(setting)))
                .collect(),
            model_types: Vec::new(),
        }
    }
}

impl From<ConnectConfig> for ConnectOptions {
    fn from(config: ConnectConfig) -> Self {
        config.to_options()
    }
}
