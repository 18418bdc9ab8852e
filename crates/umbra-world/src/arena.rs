//! The `Arena` trait: the boundary between the simulation core and the
//! world it runs in.
//!
//! Level generation, character models and networking all live behind this
//! trait. The core only needs the handful of queries and commands below.

use serde::{Deserialize, Serialize};
use umbra_types::PlayerId;

use crate::{Aabb, Vec3, WorldError};

/// Something that can block a light's line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Solid extent.
    pub bounds: Aabb,
    /// Set when this obstacle is part of a player's own body. A player's
    /// own body never blocks the light from that player.
    pub owner: Option<PlayerId>,
}

impl Obstacle {
    /// Level geometry (walls, grates, crates).
    pub fn solid(bounds: Aabb) -> Self {
        Self {
            bounds,
            owner: None,
        }
    }

    /// A player's body.
    pub fn body_of(player: PlayerId, bounds: Aabb) -> Self {
        Self {
            bounds,
            owner: Some(player),
        }
    }
}

/// Where a light travels and which way it faces.
///
/// The light moves back and forth along the segment `start → end`; its
/// facing never changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightPath {
    /// One movement bound (spawn point).
    pub start: Vec3,
    /// The other movement bound.
    pub end: Vec3,
    /// Facing direction. Need not be unit length.
    pub forward: Vec3,
}

/// The world collaborator.
///
/// Methods take `&self`; implementations use interior mutability for the
/// few commands that change the world. The simulation is single-threaded,
/// so no `Send`/`Sync` bound is required.
pub trait Arena {
    /// Players currently connected, in a stable order.
    fn connected_players(&self) -> Vec<PlayerId>;

    /// The point detection is measured from (typically the head) of the
    /// player's live character, or `None` if they have no character.
    fn reference_point(&self, player: PlayerId) -> Option<Vec3>;

    /// Everything that can block line of sight, including player bodies.
    fn obstacles(&self) -> Vec<Obstacle>;

    /// One path per light to spawn when a round starts.
    fn light_paths(&self) -> Vec<LightPath>;

    /// Moves the player's character to a safe spawn point and returns it.
    fn place_at_safe_spawn(&self, player: PlayerId) -> Result<Vec3, WorldError>;

    /// Removes the player's character from the world (eliminated).
    fn remove_character(&self, player: PlayerId);

    /// Gives the player a fresh character at the default spawn.
    fn spawn_character(&self, player: PlayerId) -> Result<(), WorldError>;
}
