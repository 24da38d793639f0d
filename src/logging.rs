//! Tracing subscriber setup for host integrations

use crate::config::GeneralConfig;
use crate::error::{HostkitError, HostkitResult};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(general: &GeneralConfig) -> &'static str {
    if general.verbose {
        "hostkit=debug"
    } else {
        "hostkit=warn"
    }
}

/// Install a global fmt subscriber
///
/// `RUST_LOG` takes precedence over the configured verbosity. Fails if a
/// global subscriber is already set.
pub fn init(general: &GeneralConfig) -> HostkitResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(general)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match general.log_format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.without_time().try_init(),
    };

    result.map_err(|e| HostkitError::Internal(format!("initializing logging: {}", e)))
}
