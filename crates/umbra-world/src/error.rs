//! Error types for the world boundary.

use umbra_types::PlayerId;

/// Errors reported by an [`Arena`](crate::Arena).
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The player is not connected to this arena.
    #[error("player {0} is not connected")]
    UnknownPlayer(PlayerId),

    /// The arena has no safe spawn points configured.
    #[error("arena has no safe spawn points")]
    NoSpawnPoints,
}
