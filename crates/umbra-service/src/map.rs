//! The instance map handed to every service's `init`.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Service, ServiceError};

/// Constructed services keyed by registered name.
///
/// Cloning is cheap: entries are `Rc`s onto the same instances.
#[derive(Clone, Default)]
pub struct ServiceMap {
    services: HashMap<String, Rc<dyn Service>>,
}

impl ServiceMap {
    /// Adds or replaces the instance registered as `name`.
    pub fn insert(&mut self, name: impl Into<String>, service: Rc<dyn Service>) {
        self.services.insert(name.into(), service);
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// The instance registered as `name`, if any.
    pub fn get(&self, name: &str) -> Option<Rc<dyn Service>> {
        self.services.get(name).cloned()
    }

    /// Typed lookup used by services to grab their dependencies.
    ///
    /// `requester` is only used to build the error.
    pub fn resolve<T: Service>(&self, requester: &str, name: &str) -> Result<Rc<T>, ServiceError> {
        let service = self
            .get(name)
            .ok_or_else(|| ServiceError::MissingDependency {
                service: requester.to_string(),
                dependency: name.to_string(),
            })?;
        service
            .into_any()
            .downcast::<T>()
            .map_err(|_| ServiceError::WrongType {
                service: name.to_string(),
            })
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ServiceMap").field("services", &names).finish()
    }
}
