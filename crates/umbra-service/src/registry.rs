//! The service registry: named factories, two-phase bootstrap, ordered
//! start and reverse-ordered shutdown.

use std::collections::HashMap;
use std::rc::Rc;

use crate::{Service, ServiceError, ServiceMap};

/// Zero-argument constructor for a service.
pub type ServiceFactory = Box<dyn Fn() -> Result<Rc<dyn Service>, ServiceError>>;

/// Owns service factories and the instances built from them.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ init_all() ──→ start_all() ──→ shutdown_all()
///                  │
///                  ├─ phase 1: call every factory, collect the ServiceMap
///                  └─ phase 2: init(&map) on each, in registration order
/// ```
///
/// Registration order is the start order; shutdown runs in reverse.
#[derive(Default)]
pub struct ServiceRegistry {
    factories: HashMap<String, ServiceFactory>,
    /// Registration order. A name appears once even if re-registered.
    order: Vec<String>,
    instances: ServiceMap,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`.
    ///
    /// Registering a name twice replaces the factory (with a warning) and
    /// keeps the name's original position in the start order.
    pub fn register<S, F>(&mut self, name: &str, factory: F)
    where
        S: Service,
        F: Fn() -> Result<Rc<S>, ServiceError> + 'static,
    {
        let boxed: ServiceFactory = Box::new(move || factory().map(|s| s as Rc<dyn Service>));
        if self.factories.insert(name.to_string(), boxed).is_some() {
            tracing::warn!(service = %name, "service registered twice, replacing factory");
        } else {
            self.order.push(name.to_string());
            tracing::debug!(service = %name, "service registered");
        }
    }

    /// Builds every service, then initializes each in registration order
    /// with the full instance map.
    ///
    /// # Errors
    ///
    /// The first factory or `init` failure is returned and bootstrap
    /// stops there. Callers must treat any error as fatal.
    pub fn init_all(&mut self) -> Result<(), ServiceError> {
        if !self.instances.is_empty() {
            tracing::warn!("init_all called twice, ignoring");
            return Ok(());
        }

        // Phase 1: construct.
        let mut built = ServiceMap::default();
        for name in &self.order {
            let Some(factory) = self.factories.get(name) else {
                continue;
            };
            let service = factory().map_err(|e| {
                tracing::error!(service = %name, error = %e, "service construction failed");
                e
            })?;
            if service.name() != name {
                tracing::warn!(
                    registered = %name,
                    reported = %service.name(),
                    "service reports a different name than it was registered under"
                );
            }
            built.insert(name.clone(), service);
        }
        tracing::info!(count = built.len(), "services constructed");

        // Phase 2: init with the complete map.
        for name in &self.order {
            if let Some(service) = built.get(name) {
                service.init(&built)?;
            }
        }

        self.instances = built;
        tracing::info!(count = self.instances.len(), "services initialized");
        Ok(())
    }

    /// Starts every service in registration order.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotInitialized`] if `init_all` has not run (or a
    /// service skipped its init). Fatal.
    pub fn start_all(&self) -> Result<(), ServiceError> {
        for name in &self.order {
            let service = self
                .instances
                .get(name)
                .ok_or_else(|| ServiceError::NotInitialized(name.clone()))?;
            service.start()?;
        }
        Ok(())
    }

    /// Shuts every service down in reverse registration order.
    pub fn shutdown_all(&self) {
        for name in self.order.iter().rev() {
            if let Some(service) = self.instances.get(name) {
                service.shutdown();
            }
        }
        tracing::info!("all services shut down");
    }

    /// The instance registered as `name`, if built.
    pub fn get(&self, name: &str) -> Option<Rc<dyn Service>> {
        self.instances.get(name)
    }

    /// Typed instance lookup. `None` if absent or of another type.
    pub fn get_as<T: Service>(&self, name: &str) -> Option<Rc<T>> {
        self.instances.resolve::<T>("registry", name).ok()
    }

    /// Registered names in start order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
