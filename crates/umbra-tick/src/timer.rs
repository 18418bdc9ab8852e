//! Cancellable single-shot timers on a virtual clock.
//!
//! A [`TimerQueue`] is a cheap, cloneable handle onto one shared queue.
//! Timers fire only from inside [`TimerQueue::advance`], on the caller's
//! stack, in deadline order. Callbacks run with no internal borrow held,
//! so they are free to schedule or cancel other timers.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::trace;

/// Identifier of a scheduled timer, unique within its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

type Callback = Box<dyn FnOnce()>;

/// Entries are keyed by `(deadline, id)`: earliest deadline first, and
/// scheduling order among equal deadlines.
#[derive(Default)]
struct QueueInner {
    now: Duration,
    next_id: u64,
    entries: BTreeMap<(Duration, TimerId), Callback>,
}

/// Shared queue of single-shot timers.
#[derive(Clone, Default)]
pub struct TimerQueue {
    inner: Rc<RefCell<QueueInner>>,
}

impl TimerQueue {
    /// Creates an empty queue with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer that runs `callback` once, `delay` after the current
    /// virtual time.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        let deadline = inner.now + delay;
        inner.entries.insert((deadline, id), Box::new(callback));
        trace!(timer = %id, delay_ms = delay.as_millis(), "timer armed");

        TimerHandle {
            id,
            deadline,
            queue: Rc::downgrade(&self.inner),
        }
    }

    /// Moves the clock forward by `dt`, firing every timer that falls due.
    ///
    /// Each callback sees [`now`](Self::now) equal to its own deadline.
    /// Timers armed by a callback fire in the same call if their deadline
    /// is still within the window. Returns the number of timers fired.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.inner.borrow().now + dt;
        let mut fired = 0;

        loop {
            let (id, callback) = {
                let mut inner = self.inner.borrow_mut();
                let key = match inner.entries.first_key_value() {
                    Some((&key, _)) if key.0 <= target => key,
                    _ => break,
                };
                let Some(callback) = inner.entries.remove(&key) else {
                    break;
                };
                inner.now = key.0;
                (key.1, callback)
            };

            trace!(timer = %id, "timer fired");
            callback();
            fired += 1;
        }

        let mut inner = self.inner.borrow_mut();
        if inner.now < target {
            inner.now = target;
        }
        fired
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Disarms every timer. Returns how many were pending.
    pub fn cancel_all(&self) -> usize {
        // Dropping callbacks can drop captured state; do it outside the borrow.
        let drained = std::mem::take(&mut self.inner.borrow_mut().entries);
        drained.len()
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("now", &inner.now)
            .field("pending", &inner.entries.len())
            .finish()
    }
}

/// Handle to one armed timer.
///
/// Holding a handle does not keep the queue alive. Cancelling after the
/// timer fired, after it was already cancelled, or after the queue was
/// dropped is a no-op.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    deadline: Duration,
    queue: Weak<RefCell<QueueInner>>,
}

impl TimerHandle {
    /// This timer's id.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Virtual time at which the timer fires.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Disarms the timer. Returns `true` only if it was still pending.
    pub fn cancel(&self) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        let removed = queue.borrow_mut().entries.remove(&(self.deadline, self.id));
        let cancelled = removed.is_some();
        if cancelled {
            trace!(timer = %self.id, "timer cancelled");
        }
        drop(removed);
        cancelled
    }

    /// `true` while the timer is armed and has not fired.
    pub fn is_pending(&self) -> bool {
        self.queue
            .upgrade()
            .is_some_and(|q| q.borrow().entries.contains_key(&(self.deadline, self.id)))
    }
}
