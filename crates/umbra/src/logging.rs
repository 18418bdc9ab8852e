//! Log subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::UmbraError;

/// Installs the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (for example
/// `"umbra=info"`) is used. Calling this a second time returns
/// [`UmbraError::Logging`] instead of panicking.
pub fn init(default_filter: &str) -> Result<(), UmbraError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}
