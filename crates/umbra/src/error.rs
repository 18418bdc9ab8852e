//! Unified error type for Umbra.

use umbra_service::ServiceError;
use umbra_world::WorldError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum UmbraError {
    /// Bootstrap failed (missing dependency, factory error, start before init).
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The arena rejected a command.
    #[error(transparent)]
    World(#[from] WorldError),

    /// The configuration could not be read or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A global log subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
