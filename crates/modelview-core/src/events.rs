#![forbid(unsafe_code)]

//! Named-event listener registry for observable models.
//!
//! [`EventEmitter`] is the piece a [`Model`](crate::Model) implementation
//! embeds to satisfy the `on`/`off` half of the model contract. Listeners are
//! keyed by `(event name, ListenerId)`, so a consumer that registers the same
//! id for several events can later remove exactly what it added.
//!
//! # Dispatch
//!
//! `trigger(name, payload)` calls the listeners registered for `name` in
//! registration order, then every listener registered for [`ALL_EVENTS`].
//! Wildcard listeners receive the concrete event name through
//! [`ModelEvent::name`].
//!
//! # Invariants
//!
//! 1. A `(event, id)` pair is registered at most once; a second `on` with the
//!    same pair is a no-op.
//! 2. `off(event, id)` removes only that pair.
//! 3. Callbacks run outside the registry borrow, so a listener may call `on`
//!    or `off` on the emitter that is dispatching to it.
//!
//! # Failure Modes
//!
//! - **Listener panics**: the panic propagates out of `trigger`; listeners
//!   later in the same dispatch are not called.
//! - **Removal during dispatch**: the dispatch works on a snapshot, so a
//!   listener removed by an earlier listener in the same cycle is still
//!   called once. Consumers that need a hard cut-off keep their own liveness
//!   flag.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

/// Wildcard event name. Listeners on `"all"` see every triggered event.
pub const ALL_EVENTS: &str = "all";

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a listener, the equivalent of a callback-plus-context pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique listener id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Build an id from a raw value (tests and external registries).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// An event as seen by a listener.
#[derive(Clone, Copy, Debug)]
pub struct ModelEvent<'a> {
    /// Concrete event name, even for wildcard listeners.
    pub name: &'a str,
    /// Optional payload supplied by the emitter.
    pub payload: Option<&'a Value>,
}

type Callback = Rc<dyn Fn(&ModelEvent<'_>)>;

/// A callback paired with the id used to deregister it.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Callback,
}

impl Listener {
    /// Create a listener with an explicit id.
    pub fn new(id: ListenerId, callback: impl Fn(&ModelEvent<'_>) + 'static) -> Self {
        Self {
            id,
            callback: Rc::new(callback),
        }
    }

    /// The listener's id.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback directly.
    pub fn call(&self, event: &ModelEvent<'_>) {
        (self.callback)(event);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

struct Registration {
    event: String,
    listener: Listener,
}

/// Listener registry keyed by event name and listener id.
#[derive(Default)]
pub struct EventEmitter {
    registrations: RefCell<Vec<Registration>>,
}

impl EventEmitter {
    /// Create an emitter with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`.
    ///
    /// Returns `false` when the same `(event, id)` pair was already present.
    pub fn on(&self, event: &str, listener: Listener) -> bool {
        let mut regs = self.registrations.borrow_mut();
        if regs
            .iter()
            .any(|r| r.event == event && r.listener.id == listener.id)
        {
            return false;
        }
        tracing::trace!(event, id = listener.id.get(), "listener registered");
        regs.push(Registration {
            event: event.to_owned(),
            listener,
        });
        true
    }

    /// Deregister the listener `id` from `event`. Returns whether it was present.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut regs = self.registrations.borrow_mut();
        let before = regs.len();
        regs.retain(|r| !(r.event == event && r.listener.id == id));
        let removed = regs.len() != before;
        if removed {
            tracing::trace!(event, id = id.get(), "listener removed");
        }
        removed
    }

    /// Deregister `id` from every event. Returns how many registrations were removed.
    pub fn off_all(&self, id: ListenerId) -> usize {
        let mut regs = self.registrations.borrow_mut();
        let before = regs.len();
        regs.retain(|r| r.listener.id != id);
        before - regs.len()
    }

    /// Dispatch `event` to its listeners, then to the wildcard listeners.
    pub fn trigger(&self, event: &str, payload: Option<&Value>) {
        let (direct, wildcard): (Vec<Listener>, Vec<Listener>) = {
            let regs = self.registrations.borrow();
            let direct = regs
                .iter()
                .filter(|r| r.event == event)
                .map(|r| r.listener.clone())
                .collect();
            let wildcard = if event == ALL_EVENTS {
                Vec::new()
            } else {
                regs.iter()
                    .filter(|r| r.event == ALL_EVENTS)
                    .map(|r| r.listener.clone())
                    .collect()
            };
            (direct, wildcard)
        };

        let ev = ModelEvent {
            name: event,
            payload,
        };
        for listener in direct.iter().chain(wildcard.iter()) {
            listener.call(&ev);
        }
    }

    /// Number of listeners registered for exactly `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.registrations
            .borrow()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    /// Total number of registrations across all events.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.registrations.borrow().len()
    }

    /// Whether `id` is registered for `event`.
    #[must_use]
    pub fn is_registered(&self, event: &str, id: ListenerId) -> bool {
        self.registrations
            .borrow()
            .iter()
            .any(|r| r.event == event && r.listener.id == id)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.registrations.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting(id: ListenerId, count: &Rc<Cell<u32>>) -> Listener {
        let c = Rc::clone(count);
        Listener::new(id, move |_| c.set(c.get() + 1))
    }

    #[test]
    fn trigger_reaches_named_listener() {
        let emitter = EventEmitter::new();
        let count = Rc::new(Cell::new(0));
        emitter.on("change", counting(ListenerId::next(), &count));

        emitter.trigger("change", None);
        emitter.trigger("other", None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn wildcard_sees_every_event_with_its_name() {
        let emitter = EventEmitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        emitter.on(
            ALL_EVENTS,
            Listener::new(ListenerId::next(), move |ev| {
                s.borrow_mut().push(ev.name.to_owned());
            }),
        );

        emitter.trigger("change:x", None);
        emitter.trigger("change", None);
        assert_eq!(*seen.borrow(), vec!["change:x", "change"]);
    }

    #[test]
    fn triggering_all_directly_calls_wildcard_once() {
        let emitter = EventEmitter::new();
        let count = Rc::new(Cell::new(0));
        emitter.on(ALL_EVENTS, counting(ListenerId::next(), &count));
        emitter.trigger(ALL_EVENTS, None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let emitter = EventEmitter::new();
        let count = Rc::new(Cell::new(0));
        let id = ListenerId::next();
        assert!(emitter.on("change", counting(id, &count)));
        assert!(!emitter.on("change", counting(id, &count)));
        assert_eq!(emitter.listener_count("change"), 1);

        emitter.trigger("change", None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn off_removes_only_that_pair() {
        let emitter = EventEmitter::new();
        let count = Rc::new(Cell::new(0));
        let id = ListenerId::next();
        emitter.on("a", counting(id, &count));
        emitter.on("b", counting(id, &count));

        assert!(emitter.off("a", id));
        assert!(!emitter.off("a", id));
        emitter.trigger("a", None);
        emitter.trigger("b", None);
        assert_eq!(count.get(), 1);
        assert!(emitter.is_registered("b", id));
    }

    #[test]
    fn off_all_clears_every_event() {
        let emitter = EventEmitter::new();
        let count = Rc::new(Cell::new(0));
        let id = ListenerId::next();
        let other = ListenerId::next();
        emitter.on("a", counting(id, &count));
        emitter.on("b", counting(id, &count));
        emitter.on("a", counting(other, &count));

        assert_eq!(emitter.off_all(id), 2);
        assert_eq!(emitter.total_listeners(), 1);
    }

    #[test]
    fn listeners_called_in_registration_order() {
        let emitter = EventEmitter::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let o = Rc::clone(&order);
            emitter.on(
                "tick",
                Listener::new(ListenerId::next(), move |_| o.borrow_mut().push(tag)),
            );
        }
        emitter.trigger("tick", None);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn listener_may_deregister_during_dispatch() {
        let emitter = Rc::new(EventEmitter::new());
        let id = ListenerId::next();
        let e = Rc::clone(&emitter);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        emitter.on(
            "change",
            Listener::new(id, move |ev| {
                c.set(c.get() + 1);
                e.off(ev.name, id);
            }),
        );

        emitter.trigger("change", None);
        emitter.trigger("change", None);
        assert_eq!(count.get(), 1);
        assert_eq!(emitter.listener_count("change"), 0);
    }

    #[test]
    fn payload_is_forwarded() {
        let emitter = EventEmitter::new();
        let got = Rc::new(RefCell::new(None));
        let g = Rc::clone(&got);
        emitter.on(
            "change:x",
            Listener::new(ListenerId::next(), move |ev| {
                *g.borrow_mut() = ev.payload.cloned();
            }),
        );
        emitter.trigger("change:x", Some(&Value::from(7)));
        assert_eq!(*got.borrow(), Some(Value::from(7)));
    }

    #[test]
    fn listener_ids_are_unique() {
        let a = ListenerId::next();
        let b = ListenerId::next();
        assert_ne!(a, b);
        assert_eq!(ListenerId::from_raw(a.get()), a);
    }
}
