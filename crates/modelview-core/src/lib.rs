#![forbid(unsafe_code)]

//! Model contract, event registry, and plain props for modelview.
//!
//! - [`Model`]: what an observable data object must provide (`on`, `off`,
//!   `to_json`, `as_any`).
//! - [`EventEmitter`]: listener registry that model types embed.
//! - [`ModelsMap`]: logical name → shared model handle.
//! - [`Props`]: plain JSON props produced by projections.
//! - [`Record`]: in-memory reference model with `change` events.

pub mod error;
pub mod events;
pub mod model;
pub mod props;
pub mod record;

pub use error::{ConnectError, Result};
pub use events::{ALL_EVENTS, EventEmitter, Listener, ListenerId, ModelEvent};
pub use model::{Model, ModelType, ModelsMap};
pub use props::{MODELS_PROP, Props};
pub use record::{CHANGE_EVENT, Record, change_event};
