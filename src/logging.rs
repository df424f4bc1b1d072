//! Tracing subscriber setup.

use std::io;

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the configuration sets one.
pub const DEFAULT_FILTER: &str = "info";

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` takes precedence over `filter`. Calling this more than once
/// keeps the first subscriber.
pub fn initialize(filter: &str) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(filter))
		.unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

	let installed = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.compact()
		.try_init()
		.is_ok();

	if installed {
		tracing::debug!("logging initialised");
	}
}
