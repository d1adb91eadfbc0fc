//! Global `tracing` subscriber setup for the binary.

// std
use std::fs::OpenOptions;
// crates.io
use color_eyre::eyre::WrapErr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::_prelude::*;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Installs the stderr subscriber, mirrored to `log_file` (appended, no ANSI) when provided.
pub fn init(log_file: Option<&Path>) -> color_eyre::Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
	let file_layer = match log_file {
		Some(path) => {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.wrap_err_with(|| format!("Failed to open log file {}.", path.display()))?;

			Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
		},
		None => None,
	};

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(file_layer)
		.try_init()
		.wrap_err("Failed to install the tracing subscriber.")?;

	Ok(())
}
