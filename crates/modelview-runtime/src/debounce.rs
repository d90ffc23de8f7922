#![forbid(unsafe_code)]

//! Trailing-edge debouncer over a [`Scheduler`].
//!
//! A [`Debouncer`] wraps an action. Each [`call`](Debouncer::call) (re)arms a
//! timer for `wait` after that call; the action runs once, when the timer
//! fires after the last call of a burst.
//!
//! # State machine
//!
//! ```text
//!            call                    call (cancel + reschedule)
//!   Idle ───────────▶ Pending ◀──────────────┐
//!    ▲                 │  │ └────────────────┘
//!    │   timer fires   │  │
//!    └─────────────────┘  │ cancel
//!                         ▼
//!   (any) ── cancel ──▶ Cancelled   (terminal: call is a no-op)
//! ```
//!
//! # Invariants
//!
//! 1. At most one timer is outstanding.
//! 2. The action runs at least `wait` after the most recent `call`.
//! 3. After `cancel`, the action never runs again.
//! 4. The state returns to `Idle` before the action runs, so the action may
//!    call the debouncer again and arm a new cycle.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::timer::{Scheduler, TimerId};

/// Debouncer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Duration, timer: TimerId },
    Cancelled,
}

struct Inner {
    scheduler: Scheduler,
    wait: Duration,
    state: Cell<DebounceState>,
    runs: Cell<u64>,
    action: Box<dyn Fn()>,
}

impl Inner {
    fn fire(&self, timer: TimerId) {
        match self.state.get() {
            DebounceState::Pending { timer: current, .. } if current == timer => {}
            _ => return,
        }
        self.state.set(DebounceState::Idle);
        self.runs.set(self.runs.get() + 1);
        tracing::trace!(timer = timer.get(), "debounced action fired");
        (self.action)();
    }
}

/// Coalesces bursts of calls into one trailing invocation.
pub struct Debouncer {
    inner: Rc<Inner>,
}

impl Debouncer {
    /// Debounce `action` by `wait` on `scheduler`. `Duration::ZERO` coalesces
    /// the calls made before the scheduler's next tick.
    pub fn new(scheduler: Scheduler, wait: Duration, action: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                scheduler,
                wait,
                state: Cell::new(DebounceState::Idle),
                runs: Cell::new(0),
                action: Box::new(action),
            }),
        }
    }

    /// Request the action. Returns `false` once cancelled.
    pub fn call(&self) -> bool {
        let inner = &self.inner;
        match inner.state.get() {
            DebounceState::Cancelled => return false,
            DebounceState::Pending { timer, .. } => {
                inner.scheduler.cancel(timer);
            }
            DebounceState::Idle => {}
        }

        // The task only knows its own id once scheduled; route through a cell.
        let slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let task_slot = Rc::clone(&slot);
        let weak: Weak<Inner> = Rc::downgrade(inner);
        let timer = inner.scheduler.schedule(inner.wait, move || {
            if let (Some(inner), Some(timer)) = (weak.upgrade(), task_slot.get()) {
                inner.fire(timer);
            }
        });
        slot.set(Some(timer));

        let deadline = inner
            .scheduler
            .deadline(timer)
            .unwrap_or_else(|| inner.scheduler.now().saturating_add(inner.wait));
        inner.state.set(DebounceState::Pending { deadline, timer });
        tracing::trace!(timer = timer.get(), ?deadline, "debounce armed");
        true
    }

    /// Run a pending action now. Returns whether one was pending.
    pub fn flush(&self) -> bool {
        match self.inner.state.get() {
            DebounceState::Pending { timer, .. } => {
                self.inner.scheduler.cancel(timer);
                self.inner.fire(timer);
                true
            }
            _ => false,
        }
    }

    /// Drop any pending action and disable the debouncer for good.
    /// Returns whether an action was pending.
    pub fn cancel(&self) -> bool {
        let was_pending = match self.inner.state.get() {
            DebounceState::Pending { timer, .. } => {
                self.inner.scheduler.cancel(timer);
                true
            }
            _ => false,
        };
        self.inner.state.set(DebounceState::Cancelled);
        was_pending
    }

    #[must_use]
    pub fn state(&self) -> DebounceState {
        self.inner.state.get()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state(), DebounceState::Pending { .. })
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    /// How many times the action has run.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.inner.runs.get()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let DebounceState::Pending { timer, .. } = self.inner.state.get() {
            self.inner.scheduler.cancel(timer);
        }
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.inner.wait)
            .field("state", &self.inner.state.get())
            .field("runs", &self.inner.runs.get())
            .finish()
    }
}
