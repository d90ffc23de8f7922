#![forbid(unsafe_code)]

//! Single-threaded timer queue driven by the host loop.
//!
//! A [`Scheduler`] owns deferred tasks keyed by deadline. Nothing runs on its
//! own: the host calls [`Scheduler::run_due`] from its event loop (using
//! [`Scheduler::time_until_next`] as the poll timeout) and due tasks execute
//! on that call stack.
//!
//! Time comes from a [`Clock`]. [`SystemClock`] reads monotonic time;
//! [`ManualClock`] only moves when told to, which makes timer-dependent code
//! deterministic under test.
//!
//! # Invariants
//!
//! 1. Due tasks run in deadline order; equal deadlines run in scheduling order.
//! 2. A cancelled task never runs.
//! 3. Tasks scheduled while `run_due` is executing wait for the next call,
//!    even when their deadline has already passed. A task that reschedules
//!    itself with zero delay therefore runs once per tick, not in a loop.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

thread_local! {
    static GLOBAL_SCHEDULER: Scheduler = Scheduler::system();
}

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual time. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute instant. Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Handle to a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct Queue {
    next_id: u64,
    tasks: BTreeMap<(Duration, TimerId), Task>,
    deadlines: HashMap<TimerId, Duration>,
}

/// Timer queue over a [`Clock`]. Clones share the same queue.
#[derive(Clone)]
pub struct Scheduler {
    clock: Rc<dyn Clock>,
    queue: Rc<RefCell<Queue>>,
}

impl Scheduler {
    /// Scheduler over an arbitrary clock.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Rc::new(clock),
            queue: Rc::new(RefCell::new(Queue::default())),
        }
    }

    /// Scheduler over [`SystemClock`].
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock::new())
    }

    /// Scheduler over a fresh [`ManualClock`], returned alongside it.
    #[must_use]
    pub fn manual() -> (Self, ManualClock) {
        let clock = ManualClock::new();
        (Self::new(clock.clone()), clock)
    }

    /// The thread-local scheduler used when a connector is not given one.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_SCHEDULER.with(Clone::clone)
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Run `task` once `delay` has elapsed. Deadlines past `Duration::MAX`
    /// saturate, so such a task only runs once the clock reaches the maximum.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
        let deadline = self.clock.now().saturating_add(delay);
        let mut queue = self.queue.borrow_mut();
        let id = TimerId(queue.next_id);
        queue.next_id += 1;
        queue.tasks.insert((deadline, id), Box::new(task));
        queue.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a scheduled task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut queue = self.queue.borrow_mut();
        match queue.deadlines.remove(&id) {
            Some(deadline) => queue.tasks.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    #[must_use]
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.queue.borrow().deadlines.contains_key(&id)
    }

    /// Deadline of a scheduled task.
    #[must_use]
    pub fn deadline(&self, id: TimerId) -> Option<Duration> {
        self.queue.borrow().deadlines.get(&id).copied()
    }

    /// Number of tasks waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().tasks.len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.borrow().tasks.keys().next().map(|(d, _)| *d)
    }

    /// Time until the earliest task is due (zero if already due).
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        let next = self.next_deadline()?;
        Some(next.saturating_sub(self.clock.now()))
    }

    /// Run every task that is due now. Returns how many ran.
    pub fn run_due(&self) -> usize {
        let watermark = TimerId(self.queue.borrow().next_id);
        let now = self.clock.now();
        let mut ran = 0;
        loop {
            let task = {
                let mut queue = self.queue.borrow_mut();
                let key = queue
                    .tasks
                    .keys()
                    .take_while(|(deadline, _)| *deadline <= now)
                    .find(|(_, id)| *id < watermark)
                    .copied();
                key.and_then(|key| {
                    queue.deadlines.remove(&key.1);
                    queue.tasks.remove(&key)
                })
            };
            let Some(task) = task else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, "scheduler tick");
        }
        ran
    }

    /// Drop every scheduled task without running it.
    pub fn clear(&self) {
        let mut queue = self.queue.borrow_mut();
        queue.tasks.clear();
        queue.deadlines.clear();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.clock.now())
            .field("pending", &self.pending())
            .finish()
    }
}
