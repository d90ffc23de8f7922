#![forbid(unsafe_code)]

//! Subscription-and-projection runtime for modelview.
//!
//! Components stay pure functions of props; models mutate imperatively. The
//! runtime sits between them: it projects models into props, re-projects when
//! a model fires an event it listens to, optionally coalesces bursts, and
//! releases every subscription when a component goes away.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Debounced work runs
//! on a [`Scheduler`] the host drives from its event loop.

pub mod config;
pub mod connect;
pub mod context;
pub mod debounce;
pub mod timer;

pub use config::ConnectConfig;
pub use connect::{
    Component, ConnectOptions, Connected, ConnectedInstance, Connector, Debounce, EventNames,
    FnComponent, Statics, component_fn, connect, default_projection,
};
pub use context::{ModelsContext, ModelsProvider, ModelsScope};
pub use debounce::{DebounceState, Debouncer};
pub use timer::{Clock, ManualClock, Scheduler, SystemClock, TimerId};
