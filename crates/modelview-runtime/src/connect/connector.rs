//! Connector factory and the wrapped component type.

use std::fmt;
use std::rc::Rc;

use modelview_core::{ModelsMap, Props, Result};

use super::component::{Component, Statics};
use super::instance::ConnectedInstance;
use super::options::ConnectOptions;
use crate::context::ModelsContext;
use crate::timer::Scheduler;

/// Maps a models map to plain props.
pub type Projection = Rc<dyn Fn(&ModelsMap) -> Props>;

/// Serialize every model under its own key.
#[must_use]
pub fn default_projection(models: &ModelsMap) -> Props {
    models
        .iter()
        .map(|(key, model)| (key.to_owned(), model.to_json()))
        .collect()
}

/// Builds wrappers that keep components in sync with models.
///
/// ```ignore
/// let connector = Connector::new(
///     |m| Props::new().with("count", m.get_as::<Record>("counter").and_then(|c| c.get("value"))),
///     ConnectOptions::new().debounce(Duration::from_millis(50)),
/// );
/// let counter_view = connector.wrap(component_fn(|p: &Props| p.get("count").cloned()));
/// let instance = counter_view.mount_with_models(models)?;
/// ```
#[derive(Clone)]
pub struct Connector {
    projection: Projection,
    options: Rc<ConnectOptions>,
    scheduler: Option<Scheduler>,
}

impl Connector {
    pub fn new(projection: impl Fn(&ModelsMap) -> Props + 'static, options: ConnectOptions) -> Self {
        Self {
            projection: Rc::new(projection),
            options: Rc::new(options),
            scheduler: None,
        }
    }

    /// Connector using [`default_projection`].
    #[must_use]
    pub fn with_options(options: ConnectOptions) -> Self {
        Self::new(default_projection, options)
    }

    /// Scheduler driving debounced projections. Defaults to [`Scheduler::global`].
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Wrap `component`.
    pub fn wrap<C: Component>(&self, component: C) -> Connected<C> {
        let inner = component.display_name().unwrap_or("Component");
        Connected {
            display_name: format!("connect({inner})"),
            wrapped: Rc::new(component),
            connector: self.clone(),
        }
    }

    pub(crate) fn projection(&self) -> &Projection {
        &self.projection
    }

    pub(crate) fn scheduler(&self) -> Scheduler {
        self.scheduler.clone().unwrap_or_else(Scheduler::global)
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::with_options(ConnectOptions::default())
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Shorthand for [`Connector::new`].
pub fn connect(
    projection: impl Fn(&ModelsMap) -> Props + 'static,
    options: ConnectOptions,
) -> Connector {
    Connector::new(projection, options)
}

/// A component wrapped by a [`Connector`].
///
/// Forwards the wrapped component's static metadata and exposes the component
/// itself. Each [`mount`](Self::mount) creates an independent instance.
pub struct Connected<C> {
    display_name: String,
    wrapped: Rc<C>,
    connector: Connector,
}

impl<C> Clone for Connected<C> {
    fn clone(&self) -> Self {
        Self {
            display_name: self.display_name.clone(),
            wrapped: Rc::clone(&self.wrapped),
            connector: self.connector.clone(),
        }
    }
}

impl<C: Component> Connected<C> {
    /// `connect(<wrapped name>)`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn wrapped(&self) -> &C {
        &self.wrapped
    }

    /// The wrapped component's static metadata.
    #[must_use]
    pub fn statics(&self) -> Statics {
        self.wrapped.statics()
    }

    #[must_use]
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Mount an instance.
    ///
    /// The models map is `models` when given, else the context's current map,
    /// else empty.
    ///
    /// # Errors
    ///
    /// [`ConnectError::TypeMismatch`](modelview_core::ConnectError::TypeMismatch)
    /// when a type constraint fails; nothing has been subscribed in that case.
    pub fn mount(
        &self,
        models: Option<ModelsMap>,
        context: Option<&ModelsContext>,
    ) -> Result<ConnectedInstance<C>> {
        ConnectedInstance::mount(self, models, context)
    }

    /// Mount with an explicit models map.
    ///
    /// # Errors
    ///
    /// See [`mount`](Self::mount).
    pub fn mount_with_models(&self, models: ModelsMap) -> Result<ConnectedInstance<C>> {
        self.mount(Some(models), None)
    }

    /// Mount reading the models map from `context`.
    ///
    /// # Errors
    ///
    /// See [`mount`](Self::mount).
    pub fn mount_in(&self, context: &ModelsContext) -> Result<ConnectedInstance<C>> {
        self.mount(None, Some(context))
    }

    pub(crate) fn wrapped_rc(&self) -> Rc<C> {
        Rc::clone(&self.wrapped)
    }
}

impl<C> fmt::Debug for Connected<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connected")
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}
