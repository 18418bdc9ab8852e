//! The process-scoped simulation context.

use std::fmt;
use std::rc::Rc;

use umbra_tick::{Heartbeat, TimerQueue};

use crate::Arena;

/// Everything a service needs from the surrounding process.
///
/// One context is built per simulation and cloned into each service
/// factory. Clones share the same timer queue, heartbeat and arena, so two
/// contexts built separately are two fully independent simulations.
#[derive(Clone)]
pub struct SimContext {
    /// Single-shot timers (intermission, round length, respawn, ...).
    pub timers: TimerQueue,
    /// Per-frame callbacks.
    pub heartbeat: Heartbeat,
    /// The world.
    pub arena: Rc<dyn Arena>,
}

impl SimContext {
    /// Builds a fresh context around `arena`.
    pub fn new(arena: Rc<dyn Arena>) -> Self {
        Self {
            timers: TimerQueue::new(),
            heartbeat: Heartbeat::new(),
            arena,
        }
    }
}

impl fmt::Debug for SimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimContext")
            .field("timers", &self.timers)
            .field("heartbeat", &self.heartbeat)
            .finish_non_exhaustive()
    }
}
