//! Per-frame callback channel.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

type FrameCallback = Rc<dyn Fn(Duration)>;

#[derive(Default)]
struct HeartbeatInner {
    next_id: u64,
    callbacks: Vec<(u64, FrameCallback)>,
}

impl HeartbeatInner {
    fn is_connected(&self, id: u64) -> bool {
        self.callbacks.iter().any(|(cid, _)| *cid == id)
    }
}

/// Fires connected callbacks once per frame with the frame's `dt`.
///
/// Cloning yields another handle onto the same channel.
#[derive(Clone, Default)]
pub struct Heartbeat {
    inner: Rc<RefCell<HeartbeatInner>>,
}

impl Heartbeat {
    /// Creates a heartbeat with nothing connected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects `callback`. It runs on every [`fire`](Self::fire) until the
    /// returned connection is disconnected.
    pub fn connect<F>(&self, callback: F) -> HeartbeatConnection
    where
        F: Fn(Duration) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.callbacks.push((id, Rc::new(callback)));
        HeartbeatConnection {
            id,
            heartbeat: Rc::downgrade(&self.inner),
        }
    }

    /// Runs every connected callback in connection order.
    ///
    /// A callback disconnected by an earlier callback in the same frame is
    /// skipped. Callbacks connected during the frame first run next frame.
    pub fn fire(&self, dt: Duration) {
        let snapshot: Vec<(u64, FrameCallback)> = self.inner.borrow().callbacks.clone();
        for (id, callback) in snapshot {
            if self.inner.borrow().is_connected(id) {
                callback(dt);
            }
        }
    }

    /// Number of connected callbacks.
    pub fn connection_count(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }
}

impl fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heartbeat")
            .field("connections", &self.connection_count())
            .finish()
    }
}

/// Handle returned by [`Heartbeat::connect`].
#[derive(Debug)]
pub struct HeartbeatConnection {
    id: u64,
    heartbeat: Weak<RefCell<HeartbeatInner>>,
}

impl HeartbeatConnection {
    /// Stops the callback. Returns `true` if it was connected.
    pub fn disconnect(&self) -> bool {
        let Some(inner) = self.heartbeat.upgrade() else {
            return false;
        };
        // The removed callback is dropped after the borrow is released.
        let removed = {
            let mut inner = inner.borrow_mut();
            let index = inner.callbacks.iter().position(|(cid, _)| *cid == self.id);
            index.map(|index| inner.callbacks.remove(index))
        };
        removed.is_some()
    }

    /// `true` while the callback is connected.
    pub fn is_connected(&self) -> bool {
        self.heartbeat
            .upgrade()
            .is_some_and(|inner| inner.borrow().is_connected(self.id))
    }
}
