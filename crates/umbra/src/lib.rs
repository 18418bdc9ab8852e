//! # Umbra
//!
//! Real-time stealth detection and round lifecycle for multiplayer arena
//! games.
//!
//! Lights sweep the arena; players caught in a light long enough are
//! eliminated; rounds cycle through intermission, play and results. The
//! pieces are services wired by a registry and decoupled through a shared
//! state store:
//!
//! ```text
//! ServiceRegistry ──builds──→ StateStore, RoundController, DetectionEngine
//! RoundController ──"RoundState"──→ StateStore ──notifies──→ DetectionEngine
//! DetectionEngine ──eliminate_player──→ RoundController
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//!
//! use umbra::prelude::*;
//!
//! # async fn run() -> Result<(), UmbraError> {
//! let arena = Rc::new(SandboxArena::new());
//! arena.add_spawn_point(Vec3::new(0.0, 2.0, 10.0));
//! arena.connect(PlayerId(1));
//!
//! let mut sim = Simulation::bootstrap(GameConfig::default(), arena)?;
//! sim.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod logging;
mod simulation;

pub use config::{ConfigError, GameConfig};
pub use error::UmbraError;
pub use simulation::Simulation;

pub use umbra_detect as detect;
pub use umbra_round as round;
pub use umbra_service as service;
pub use umbra_store as store;
pub use umbra_tick as tick;
pub use umbra_types as types;
pub use umbra_world as world;

/// Everything needed to build and drive a simulation.
pub mod prelude {
    pub use crate::{ConfigError, GameConfig, Simulation, UmbraError};
    pub use umbra_detect::{DetectionConfig, DetectionEngine, LightConfig};
    pub use umbra_round::{RoundConfig, RoundController};
    pub use umbra_service::{Service, ServiceError, ServiceRegistry};
    pub use umbra_store::{StateStore, Subscription};
    pub use umbra_types::{PlayerId, RoundState, Value};
    pub use umbra_world::{Aabb, Arena, LightPath, SandboxArena, SimContext, Vec3};
}
