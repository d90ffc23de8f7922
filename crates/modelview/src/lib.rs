#![forbid(unsafe_code)]

//! modelview public facade.
//!
//! Keep UI components pure functions of props while models mutate
//! underneath them. See [`prelude`] for the common imports.
//!
//! ```
//! use std::rc::Rc;
//! use modelview::prelude::*;
//!
//! let counter = Rc::new(Record::from_json(serde_json::json!({"value": 1})));
//! let models = ModelsMap::new().with("counter", counter.clone());
//!
//! let view = Connector::new(
//!     |m: &ModelsMap| {
//!         let value = m.get_as::<Record>("counter").and_then(|c| c.get("value"));
//!         Props::new().with("count", value.unwrap_or_default())
//!     },
//!     ConnectOptions::new().events("counter", ["change"]),
//! )
//! .wrap(component_fn(|p: &Props| format!("count = {}", p.get("count").unwrap())));
//!
//! let instance = view.mount_with_models(models).unwrap();
//! assert_eq!(instance.render(&Props::new()), "count = 1");
//!
//! counter.set("value", 2);
//! assert_eq!(instance.render(&Props::new()), "count = 2");
//! ```

pub use modelview_core;
pub use modelview_runtime;

pub use modelview_core::{ConnectError, Model, ModelsMap, Props, Record};
pub use modelview_runtime::{Connected, ConnectedInstance, Connector, ModelsContext, ModelsProvider};

/// Common imports.
pub mod prelude {
    pub use modelview_core::{
        ALL_EVENTS, CHANGE_EVENT, ConnectError, EventEmitter, Listener, ListenerId, Model,
        ModelEvent, ModelType, ModelsMap, Props, Record,
    };
    pub use modelview_runtime::{
        Component, ConnectConfig, ConnectOptions, Connected, ConnectedInstance, Connector,
        Debounce, EventNames, ModelsContext, ModelsProvider, Scheduler, component_fn,
    };
}
