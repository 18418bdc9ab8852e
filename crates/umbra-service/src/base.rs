//! The `Service` trait and the shared lifecycle guards.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use crate::{ServiceError, ServiceMap};

/// The three-phase lifecycle every service implements.
///
/// Services are shared behind `Rc` and use interior mutability, so every
/// method takes `&self`. Implementations embed a [`ServiceBase`] and call
/// its guards explicitly at the top of `init`, `start` and `shutdown`:
///
/// ```ignore
/// fn init(&self, deps: &ServiceMap) -> Result<(), ServiceError> {
///     if !self.base.init(deps)? {
///         return Ok(()); // already initialized
///     }
///     // resolve dependencies, subscribe, ...
///     Ok(())
/// }
/// ```
pub trait Service: Any {
    /// The embedded lifecycle state.
    fn base(&self) -> &ServiceBase;

    /// Wires the service to its dependencies. Called once per process by
    /// [`ServiceRegistry::init_all`](crate::ServiceRegistry::init_all).
    fn init(&self, deps: &ServiceMap) -> Result<(), ServiceError>;

    /// Begins normal operation. Only valid after `init`.
    fn start(&self) -> Result<(), ServiceError>;

    /// Stops the service and releases what it holds.
    fn shutdown(&self);

    /// Upcast for typed lookups through [`ServiceMap::resolve`].
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// Registered name.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Names of services that must exist before `init` can succeed.
    fn dependencies(&self) -> &[String] {
        self.base().dependencies()
    }

    /// Whether `init` has completed.
    fn is_initialized(&self) -> bool {
        self.base().is_initialized()
    }

    /// Whether `start` has completed and `shutdown` has not.
    fn is_started(&self) -> bool {
        self.base().is_started()
    }
}

/// Lifecycle flags and guards shared by every service.
///
/// Invariant: `started ⇒ initialized`.
#[derive(Debug)]
pub struct ServiceBase {
    name: String,
    dependencies: Vec<String>,
    initialized: Cell<bool>,
    started: Cell<bool>,
}

impl ServiceBase {
    /// Lifecycle state for a service called `name` that depends on
    /// `dependencies`.
    pub fn new(name: impl Into<String>, dependencies: &[&str]) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            initialized: Cell::new(false),
            started: Cell::new(false),
        }
    }

    /// Init guard.
    ///
    /// Returns `Ok(false)` with a warning if already initialized; the
    /// caller should return without doing anything. Returns
    /// [`ServiceError::MissingDependency`] if a declared dependency is not
    /// in `deps`. Otherwise marks the service initialized and returns
    /// `Ok(true)`.
    pub fn init(&self, deps: &ServiceMap) -> Result<bool, ServiceError> {
        if self.initialized.get() {
            tracing::warn!(service = %self.name, "init called twice, ignoring");
            return Ok(false);
        }
        if let Some(missing) = self.dependencies.iter().find(|d| !deps.contains(d)) {
            tracing::error!(
                service = %self.name,
                dependency = %missing,
                "missing dependency, aborting bootstrap"
            );
            return Err(ServiceError::MissingDependency {
                service: self.name.clone(),
                dependency: missing.clone(),
            });
        }
        self.initialized.set(true);
        tracing::debug!(service = %self.name, "service initialized");
        Ok(true)
    }

    /// Start guard.
    ///
    /// Fails with [`ServiceError::NotInitialized`] before `init`. Returns
    /// `Ok(false)` with a warning if already started.
    pub fn start(&self) -> Result<bool, ServiceError> {
        if !self.initialized.get() {
            tracing::error!(service = %self.name, "start called before init");
            return Err(ServiceError::NotInitialized(self.name.clone()));
        }
        if self.started.get() {
            tracing::warn!(service = %self.name, "start called twice, ignoring");
            return Ok(false);
        }
        self.started.set(true);
        tracing::info!(service = %self.name, "service started");
        Ok(true)
    }

    /// Shutdown guard. Returns `false` with a warning if the service was
    /// never started (or already shut down).
    pub fn shutdown(&self) -> bool {
        if !self.started.get() {
            tracing::warn!(service = %self.name, "shutdown of a service that is not running");
            return false;
        }
        self.started.set(false);
        tracing::info!(service = %self.name, "service stopped");
        true
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependency names.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Whether `init` succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Whether the service is running.
    pub fn is_started(&self) -> bool {
        self.started.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_base_is_idle() {
        let base = ServiceBase::new("Round", &["Store"]);
        assert_eq!(base.name(), "Round");
        assert_eq!(base.dependencies(), ["Store".to_string()]);
        assert!(!base.is_initialized());
        assert!(!base.is_started());
    }

    #[test]
    fn test_init_then_start_then_shutdown() {
        let base = ServiceBase::new("Solo", &[]);
        assert!(base.init(&ServiceMap::default()).unwrap());
        assert!(base.start().unwrap());
        assert!(base.is_started());
        assert!(base.shutdown());
        assert!(!base.is_started());
        assert!(base.is_initialized());
    }

    #[test]
    fn test_second_init_is_noop() {
        let base = ServiceBase::new("Solo", &[]);
        assert!(base.init(&ServiceMap::default()).unwrap());
        assert!(!base.init(&ServiceMap::default()).unwrap());
        assert!(base.is_initialized());
    }

    #[test]
    fn test_start_before_init_fails() {
        let base = ServiceBase::new("Solo", &[]);
        assert!(matches!(base.start(), Err(ServiceError::NotInitialized(_))));
        assert!(!base.is_started());
    }

    #[test]
    fn test_second_start_is_noop() {
        let base = ServiceBase::new("Solo", &[]);
        base.init(&ServiceMap::default()).unwrap();
        assert!(base.start().unwrap());
        assert!(!base.start().unwrap());
    }

    #[test]
    fn test_shutdown_before_start_is_noop() {
        let base = ServiceBase::new("Solo", &[]);
        assert!(!base.shutdown());
    }

    #[test]
    fn test_missing_dependency_is_fatal() {
        let base = ServiceBase::new("Detection", &["Round"]);
        let err = base.init(&ServiceMap::default()).unwrap_err();
        match err {
            ServiceError::MissingDependency { service, dependency } => {
                assert_eq!(service, "Detection");
                assert_eq!(dependency, "Round");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!base.is_initialized());
    }
}
