//! Light detection for Umbra.
//!
//! While a round is Playing, lights sweep along their paths and every
//! alive player is tested against every light each frame:
//!
//! 1. **Range**: distance from the light to the player's reference point.
//! 2. **Cone**: angle between the light's facing and the player.
//! 3. **Line of sight**: a ray from the player to the light fixture must
//!    not hit anything first (the player's own body excepted).
//!
//! A player lit by any light accumulates exposure; one dark frame resets
//! it. Crossing the threshold eliminates the player through the
//! [`RoundController`](umbra_round::RoundController).
//!
//! # Key types
//!
//! - [`DetectionEngine`] — the service (registered as [`DETECTION_SERVICE`])
//! - [`Light`] — one moving light and its detection test
//! - [`ExposureTracker`] — continuous-exposure counters
//! - [`DetectionConfig`] / [`LightConfig`] — thresholds and light shape

mod config;
mod engine;
mod exposure;
mod light;

pub use config::{DetectionConfig, LightConfig};
pub use engine::{DETECTION_SERVICE, DetectionEngine};
pub use exposure::ExposureTracker;
pub use light::{Heading, Light};
