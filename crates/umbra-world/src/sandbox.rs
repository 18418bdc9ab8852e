//! In-memory arena used by tests and the sandbox demo.

use std::cell::RefCell;
use std::collections::BTreeMap;

use rand::Rng;
use umbra_types::PlayerId;

use crate::{Aabb, Arena, LightPath, Obstacle, Vec3, WorldError};

/// Body extent around a reference point. The reference point sits near the
/// top of the box, the way a head sits on a character.
const BODY_SIZE: Vec3 = Vec3::new(1.0, 2.5, 1.0);
const BODY_DROP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

#[derive(Debug, Default)]
struct SandboxInner {
    /// Connected players and, if alive, their reference point.
    players: BTreeMap<PlayerId, Option<Vec3>>,
    obstacles: Vec<Obstacle>,
    light_paths: Vec<LightPath>,
    spawn_points: Vec<Vec3>,
    lobby: Vec3,
}

/// A scriptable [`Arena`]: players are points with a box-shaped body,
/// level geometry is a list of boxes.
#[derive(Debug, Default)]
pub struct SandboxArena {
    inner: RefCell<SandboxInner>,
}

impl SandboxArena {
    /// Empty arena with the lobby at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where fresh characters appear.
    pub fn set_lobby(&self, point: Vec3) {
        self.inner.borrow_mut().lobby = point;
    }

    /// Adds a safe spawn point used when a round starts.
    pub fn add_spawn_point(&self, point: Vec3) {
        self.inner.borrow_mut().spawn_points.push(point);
    }

    /// Adds a piece of level geometry.
    pub fn add_obstacle(&self, bounds: Aabb) {
        self.inner.borrow_mut().obstacles.push(Obstacle::solid(bounds));
    }

    /// Adds a light path.
    pub fn add_light_path(&self, path: LightPath) {
        self.inner.borrow_mut().light_paths.push(path);
    }

    /// Connects a player. Their character appears in the lobby.
    pub fn connect(&self, player: PlayerId) {
        let mut inner = self.inner.borrow_mut();
        let lobby = inner.lobby;
        inner.players.insert(player, Some(lobby));
        tracing::debug!(%player, "sandbox player connected");
    }

    /// Disconnects a player and removes their character.
    pub fn disconnect(&self, player: PlayerId) {
        if self.inner.borrow_mut().players.remove(&player).is_some() {
            tracing::debug!(%player, "sandbox player disconnected");
        }
    }

    /// Moves a player's live character.
    pub fn set_position(&self, player: PlayerId, point: Vec3) -> Result<(), WorldError> {
        let mut inner = self.inner.borrow_mut();
        let slot = inner
            .players
            .get_mut(&player)
            .ok_or(WorldError::UnknownPlayer(player))?;
        *slot = Some(point);
        Ok(())
    }

    /// Whether the player currently has a character.
    pub fn has_character(&self, player: PlayerId) -> bool {
        matches!(self.inner.borrow().players.get(&player), Some(Some(_)))
    }
}

impl Arena for SandboxArena {
    fn connected_players(&self) -> Vec<PlayerId> {
        self.inner.borrow().players.keys().copied().collect()
    }

    fn reference_point(&self, player: PlayerId) -> Option<Vec3> {
        self.inner.borrow().players.get(&player).copied().flatten()
    }

    fn obstacles(&self) -> Vec<Obstacle> {
        let inner = self.inner.borrow();
        let bodies = inner.players.iter().filter_map(|(id, point)| {
            point.map(|p| Obstacle::body_of(*id, Aabb::from_center(p - BODY_DROP, BODY_SIZE)))
        });
        inner.obstacles.iter().copied().chain(bodies).collect()
    }

    fn light_paths(&self) -> Vec<LightPath> {
        self.inner.borrow().light_paths.clone()
    }

    fn place_at_safe_spawn(&self, player: PlayerId) -> Result<Vec3, WorldError> {
        let mut inner = self.inner.borrow_mut();
        if inner.spawn_points.is_empty() {
            return Err(WorldError::NoSpawnPoints);
        }
        let index = rand::rng().random_range(0..inner.spawn_points.len());
        let point = inner.spawn_points[index];
        let slot = inner
            .players
            .get_mut(&player)
            .ok_or(WorldError::UnknownPlayer(player))?;
        *slot = Some(point);
        Ok(point)
    }

    fn remove_character(&self, player: PlayerId) {
        if let Some(slot) = self.inner.borrow_mut().players.get_mut(&player) {
            *slot = None;
        }
    }

    fn spawn_character(&self, player: PlayerId) -> Result<(), WorldError> {
        let mut inner = self.inner.borrow_mut();
        let lobby = inner.lobby;
        let slot = inner
            .players
            .get_mut(&player)
            .ok_or(WorldError::UnknownPlayer(player))?;
        *slot = Some(lobby);
        Ok(())
    }
}
