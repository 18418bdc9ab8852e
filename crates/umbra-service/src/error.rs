//! Error types for the service layer.

/// Errors raised while building, wiring or starting services.
///
/// Every variant is a bootstrap failure. The registry stops at the first
/// one; a partially wired service graph never runs.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A service declared a dependency that is not registered.
    #[error("service {service} requires {dependency}, which is not registered")]
    MissingDependency {
        /// The service being initialized.
        service: String,
        /// The dependency it could not find.
        dependency: String,
    },

    /// `start` was called before `init`.
    #[error("service {0} started before it was initialized")]
    NotInitialized(String),

    /// A factory could not produce its service.
    #[error("failed to construct service {service}: {reason}")]
    Construction {
        /// The registered name.
        service: String,
        /// Why construction failed.
        reason: String,
    },

    /// A dependency exists but is not of the requested concrete type.
    #[error("service {service} is not of the requested type")]
    WrongType {
        /// The dependency that was looked up.
        service: String,
    },
}
