//! Shared state store for Umbra.
//!
//! A keyed [`Value`](umbra_types::Value) store with synchronous change
//! notification. It is how the round controller tells the rest of the
//! simulation which phase it is in without knowing who is listening.
//!
//! ```text
//! RoundController ── set("RoundState", Playing) ──→ StateStore
//!                                                    │ key listeners (new, old)
//!                                                    │ global listeners (key, new, old)
//!                                                    ▼
//!                                             DetectionEngine, ...
//! ```
//!
//! Listeners run on the caller's stack, in subscription order, after the
//! new value is stored. A listener must not `set` the key it is reacting
//! to; that recurses without bound.

mod store;
mod subscription;

pub use store::{GlobalListener, KeyListener, STATE_STORE, StateStore};
pub use subscription::Subscription;
