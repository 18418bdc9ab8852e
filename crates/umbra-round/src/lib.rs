//! Round lifecycle for Umbra.
//!
//! The [`RoundController`] service runs the round state machine
//! (Lobby → Intermission → Playing → RoundEnd → Intermission ...), keeps
//! the set of players still alive, and handles elimination and respawn.
//! Other services never query it for the phase; they watch
//! [`keys::ROUND_STATE`] in the state store.
//!
//! # Key types
//!
//! - [`RoundController`] — the service (registered as [`ROUND_SERVICE`])
//! - [`RoundConfig`] — phase durations and respawn delay
//! - [`keys`] — the state store keys it publishes

mod config;
mod controller;
pub mod keys;

pub use config::RoundConfig;
pub use controller::{ROUND_SERVICE, RoundController};
