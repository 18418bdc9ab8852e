//! Shared types for Umbra.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`PlayerId`] — who a player is.
//! - [`RoundState`] — which phase the round state machine is in.
//! - [`Value`] — the payload stored in the shared state store.
//!
//! The crate has no behaviour beyond small helpers on these types, so it
//! can sit at the bottom of the dependency graph.

mod types;

pub use types::{PlayerId, RoundState, Value};
