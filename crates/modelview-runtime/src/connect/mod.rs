#![forbid(unsafe_code)]

//! Connecting observable models to components.
//!
//! - [`Connector`]: holds a projection and [`ConnectOptions`]; `wrap` turns a
//!   [`Component`] into a [`Connected`] component.
//! - [`Connected`]: the wrapper. Forwards the wrapped component's statics and
//!   mounts [`ConnectedInstance`]s.
//! - [`ConnectedInstance`]: a mounted wrapper. Owns the projected state and
//!   the model subscriptions; releases both on unmount or drop.
//!
//! # Data flow
//!
//! ```text
//! ModelsMap ──projection──▶ state ──merge(own props) − "models"──▶ Component::render
//!     ▲                       │
//!     └── model events ───────┘ (re-project, optionally debounced)
//! ```
//!
//! # Invariants
//!
//! 1. A mount that fails type validation subscribes to nothing.
//! 2. Own props win over projected props on key collision.
//! 3. The `models` key never reaches the wrapped component.
//! 4. The models of an instance are fixed at mount; replacing a model in the
//!    caller's map later does not re-subscribe.

pub mod component;
pub mod connector;
pub mod instance;
pub mod options;

pub use component::{Component, FnComponent, Statics, component_fn};
pub use connector::{Connected, Connector, Projection, connect, default_projection};
pub use instance::ConnectedInstance;
pub use options::{ConnectOptions, Debounce, EventNames};
