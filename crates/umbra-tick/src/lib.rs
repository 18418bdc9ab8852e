//! Cooperative scheduling for Umbra.
//!
//! Umbra runs as a single cooperative update loop. Nothing in this crate
//! spawns threads or tasks; everything is driven by the owner of the loop:
//!
//! - [`TimerQueue`] — cancellable single-shot timers on a virtual clock.
//!   The clock only moves when [`TimerQueue::advance`] is called, so timer
//!   behaviour is fully deterministic in tests.
//! - [`Heartbeat`] — the per-frame callback channel. Systems connect to
//!   it while they need frame updates and disconnect when they don't.
//! - [`FrameLoop`] — wall-clock pacing on Tokio time. Produces one
//!   [`FrameInfo`] per frame with a fixed `dt`.
//!
//! # Frame order
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         frame = frames.wait_for_frame() => {
//!             timers.advance(frame.dt);
//!             heartbeat.fire(frame.dt);
//!         }
//!     }
//! }
//! ```

mod frame;
mod heartbeat;
mod timer;

pub use frame::{FrameConfig, FrameInfo, FrameLoop, FramePolicy, FrameStats};
pub use heartbeat::{Heartbeat, HeartbeatConnection};
pub use timer::{TimerHandle, TimerId, TimerQueue};
