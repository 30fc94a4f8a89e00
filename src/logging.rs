//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Updated local branch from remote");
//! warn!("Unable to fetch remote");
//! ```

pub use tracing::{debug, error, info, warn};

use crate::config::LogFormat;

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` wins over `default_level` when set:
///
/// ```bash
/// RUST_LOG=debug gitcache sync 'https://host/repo[main]'
/// RUST_LOG=gitcache::sync=trace gitcache sync ...
/// ```
pub fn init_tracing(default_level: &str, format: LogFormat) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

	// A second init (tests, embedding) is not an error worth surfacing
	let _ = match format {
		LogFormat::Pretty => builder.try_init(),
		LogFormat::Compact => builder.compact().try_init(),
		LogFormat::Json => builder.json().try_init(),
	};
}

// vim: ts=4
