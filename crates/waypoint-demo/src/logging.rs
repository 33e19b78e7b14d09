//! Subscriber setup for the demo binary.
//!
//! Filtering follows `WAYPOINT_LOG` (same syntax as `RUST_LOG`), defaulting
//! to `warn`. Output goes to stderr so stdout stays clean for reports.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the filter directives.
pub const ENV_VAR: &str = "WAYPOINT_LOG";

/// Build the filter from [`ENV_VAR`], falling back to `default`.
pub fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(json: bool) {
    let registry = tracing_subscriber::registry().with(filter("warn"));
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init()
    };
    if let Err(error) = result {
        eprintln!("logging already initialized: {error}");
    }
}
