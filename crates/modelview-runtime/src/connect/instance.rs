//! A mounted connected component: subscriptions, projected state, teardown.
//!
//! # Lifecycle
//!
//! ```text
//! mount ──▶ Active ──(unmount | drop)──▶ TornDown
//!             │  ▲
//!   event ────┘  └── re-project (now, or after the debounce wait)
//! ```
//!
//! # Invariants
//!
//! 1. Each (model, event) pair is subscribed at most once per instance, and
//!    teardown deregisters exactly the recorded pairs.
//! 2. State is replaced wholesale by each completed projection.
//! 3. Once teardown starts, no projection updates state, even if a model's
//!    in-flight dispatch still holds this instance's listener.
//!
//! # Failure Modes
//!
//! - **Projection panics**: the panic unwinds through the model's `trigger`
//!   call; the remaining listeners of that dispatch do not run.
//! - **Re-entrant model writes from `on_update`**: allowed; state is not
//!   borrowed while the hook runs.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use modelview_core::{Listener, ListenerId, MODELS_PROP, Model, ModelsMap, Props, Result};

use super::component::Component;
use super::connector::{Connected, Projection};
use crate::context::ModelsContext;
use crate::debounce::Debouncer;

type UpdateHook = Rc<dyn Fn(&Props)>;

struct Shared {
    id: ListenerId,
    models: ModelsMap,
    projection: Projection,
    state: RefCell<Props>,
    version: Cell<u64>,
    alive: Cell<bool>,
    on_update: RefCell<Option<UpdateHook>>,
    debouncer: Option<Debouncer>,
}

impl Shared {
    /// Entry point for model events.
    fn request(&self) {
        if !self.alive.get() {
            return;
        }
        match &self.debouncer {
            Some(debouncer) => {
                debouncer.call();
            }
            None => self.reproject(),
        }
    }

    fn reproject(&self) {
        if !self.alive.get() {
            return;
        }
        let next = (self.projection)(&self.models);
        if !self.alive.get() {
            return;
        }
        *self.state.borrow_mut() = next;
        let version = self.version.get() + 1;
        self.version.set(version);
        tracing::trace!(listener = self.id.get(), version, "re-projected");

        let hook = self.on_update.borrow().clone();
        if let Some(hook) = hook {
            let snapshot = self.state.borrow().clone();
            hook(&snapshot);
        }
    }
}

struct Subscribed {
    key: String,
    event: String,
    model: Rc<dyn Model>,
}

/// A mounted [`Connected`] component.
///
/// Dropping the instance tears it down; [`unmount`](Self::unmount) does the
/// same explicitly.
pub struct ConnectedInstance<C: Component> {
    display_name: String,
    component: Rc<C>,
    shared: Rc<Shared>,
    subscriptions: Vec<Subscribed>,
}

impl<C: Component> ConnectedInstance<C> {
    pub(crate) fn mount(
        connected: &Connected<C>,
        explicit: Option<ModelsMap>,
        context: Option<&ModelsContext>,
    ) -> Result<Self> {
        let connector = connected.connector();
        let options = connector.options();

        let models = match explicit.or_else(|| context.and_then(ModelsContext::current)) {
            Some(models) => models,
            None => {
                tracing::warn!(
                    component = connected.display_name(),
                    "no models map supplied or provided by context; using an empty map"
                );
                ModelsMap::new()
            }
        };

        options.validate(&models)?;

        let projection = Rc::clone(connector.projection());
        let initial = projection(&models);
        let id = ListenerId::next();
        let wait = options.debounce.wait();
        let scheduler = wait.map(|_| connector.scheduler());

        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let debouncer = wait.zip(scheduler).map(|(wait, scheduler)| {
                let weak = weak.clone();
                Debouncer::new(scheduler, wait, move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.reproject();
                    }
                })
            });
            Shared {
                id,
                models: models.clone(),
                projection,
                state: RefCell::new(initial),
                version: Cell::new(0),
                alive: Cell::new(true),
                on_update: RefCell::new(None),
                debouncer,
            }
        });

        let weak = Rc::downgrade(&shared);
        let listener = Listener::new(id, move |_event| {
            if let Some(shared) = weak.upgrade() {
                shared.request();
            }
        });

        let mut seen: HashSet<(*const (), String)> = HashSet::new();
        let mut subscriptions = Vec::new();
        for (key, model) in models.iter() {
            for event in options.event_names(key) {
                let identity = Rc::as_ptr(model).cast::<()>();
                if !seen.insert((identity, event.clone())) {
                    continue;
                }
                model.on(&event, listener.clone());
                subscriptions.push(Subscribed {
                    key: key.to_owned(),
                    event,
                    model: Rc::clone(model),
                });
            }
        }

        tracing::debug!(
            component = connected.display_name(),
            listener = id.get(),
            models = models.len(),
            subscriptions = subscriptions.len(),
            debounce = ?options.debounce,
            "connected component mounted"
        );

        Ok(Self {
            display_name: connected.display_name().to_owned(),
            component: connected.wrapped_rc(),
            shared,
            subscriptions,
        })
    }

    /// Props handed to the wrapped component for the given own props:
    /// projected state overlaid with `own`, without the `models` key.
    #[must_use]
    pub fn props(&self, own: &Props) -> Props {
        let mut props = self.shared.state.borrow().merged(own);
        props.remove(MODELS_PROP);
        props
    }

    /// Render the wrapped component.
    pub fn render(&self, own: &Props) -> C::Output {
        let props = self.props(own);
        self.component.render(&props)
    }

    /// Current projected state.
    #[must_use]
    pub fn state(&self) -> Props {
        self.shared.state.borrow().clone()
    }

    /// Number of completed re-projections since mount.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.version.get()
    }

    /// Hook called after every re-projection with the new state; the host
    /// re-renders from here.
    pub fn set_on_update(&self, hook: impl Fn(&Props) + 'static) {
        *self.shared.on_update.borrow_mut() = Some(Rc::new(hook));
    }

    /// Run a pending debounced projection now. Returns whether one was pending.
    pub fn flush(&self) -> bool {
        self.shared
            .debouncer
            .as_ref()
            .is_some_and(Debouncer::flush)
    }

    /// Whether a debounced projection is waiting to run.
    #[must_use]
    pub fn has_pending_projection(&self) -> bool {
        self.shared
            .debouncer
            .as_ref()
            .is_some_and(Debouncer::is_pending)
    }

    #[must_use]
    pub fn models(&self) -> &ModelsMap {
        &self.shared.models
    }

    #[must_use]
    pub fn listener_id(&self) -> ListenerId {
        self.shared.id
    }

    /// `(model key, event)` pairs currently subscribed.
    pub fn subscriptions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.subscriptions
            .iter()
            .map(|s| (s.key.as_str(), s.event.as_str()))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.alive.get()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Tear the instance down.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.shared.alive.replace(false) {
            return;
        }
        let cancelled = self
            .shared
            .debouncer
            .as_ref()
            .is_some_and(Debouncer::cancel);
        let id = self.shared.id;
        let released = self.subscriptions.len();
        for sub in self.subscriptions.drain(..) {
            sub.model.off(&sub.event, id);
        }
        self.shared.on_update.borrow_mut().take();
        tracing::debug!(
            component = %self.display_name,
            listener = id.get(),
            released,
            cancelled_pending = cancelled,
            "connected component torn down"
        );
    }
}

impl<C: Component> Drop for ConnectedInstance<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C: Component> fmt::Debug for ConnectedInstance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedInstance")
            .field("display_name", &self.display_name)
            .field("listener", &self.shared.id)
            .field("version", &self.shared.version.get())
            .field("subscriptions", &self.subscriptions.len())
            .field("active", &self.shared.alive.get())
            .finish()
    }
}
