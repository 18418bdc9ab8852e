//! World boundary for Umbra.
//!
//! The core simulation never builds level geometry itself. It asks an
//! [`Arena`] for what it needs (who is connected, where characters stand,
//! what can block a light, where lights travel) and tells it when a
//! character should be moved, removed or respawned.
//!
//! # Key types
//!
//! - [`Vec3`], [`Ray`], [`Aabb`] — the geometry the detection test runs on
//! - [`Arena`] — the collaborator trait
//! - [`SandboxArena`] — in-memory arena for tests and demos
//! - [`SimContext`] — the process-scoped bundle handed to every service

mod arena;
mod context;
mod error;
mod geometry;
mod sandbox;

pub use arena::{Arena, LightPath, Obstacle};
pub use context::SimContext;
pub use error::WorldError;
pub use geometry::{Aabb, Ray, Vec3};
pub use sandbox::SandboxArena;
