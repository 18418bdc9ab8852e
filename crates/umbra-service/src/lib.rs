//! Service lifecycle and registry for Umbra.
//!
//! Every long-lived subsystem (state store, round controller, detection
//! engine) is a [`Service`]. The [`ServiceRegistry`] owns their factories
//! and brings them up in two phases:
//!
//! ```text
//! register(name, factory) ... ──→ init_all() ──→ start_all() ──→ shutdown_all()
//!                                  │                │                │
//!                                  │ 1. build all   │ registration   │ reverse
//!                                  │ 2. init each   │ order          │ order
//!                                  ▼    with map    ▼                ▼
//! ```
//!
//! A missing dependency at init time is fatal: `init_all` returns
//! [`ServiceError::MissingDependency`] and nothing is started. Redundant
//! calls (second init, second start, shutdown before start) are logged and
//! ignored.

mod base;
mod error;
mod map;
mod registry;

pub use base::{Service, ServiceBase};
pub use error::ServiceError;
pub use map::ServiceMap;
pub use registry::{ServiceFactory, ServiceRegistry};
