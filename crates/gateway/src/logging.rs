// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging initialization for the GCS gateway
//!
//! # Configuration
//!
//! - `RUST_LOG`: Log level filter (default: `info`)
//!   - Can be set per target: `RUST_LOG=allocation=debug,geo=info,actix_web=warn`
//!
//! - `LOG_DIR`: Root directory for log files (default: `{project_root}/logs`)
//!   - Log files are created in `{LOG_DIR}/gateway/`
//!
//! - `LOG_TO_CONSOLE`: Also write to stderr with ANSI colors (default: `false`)
//!   - `true`, `1` or `yes` enable it
//!
//! # Log File Format
//!
//! - Rotation: one file per day (UTC), `gateway.{date}.log`
//! - Format: UTC timestamp, thread ID, log level, target, message

use std::{
	env,
	path::{Path, PathBuf},
	sync::OnceLock,
};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::{
	non_blocking,
	rolling::{self, Rotation},
};
use tracing_subscriber::{
	EnvFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_TO_CONSOLE, LOG_COMPONENT_NAME};

// Keeps the background writer alive until exit
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

/// Nearest ancestor of the current directory holding a workspace `Cargo.toml`
fn find_project_root() -> PathBuf {
	let start = env::var("CARGO_MANIFEST_DIR")
		.map(PathBuf::from)
		.or_else(|_| env::current_dir())
		.unwrap_or_else(|_| PathBuf::from("."));

	let workspace_root = start
		.ancestors()
		.find(|dir| {
			std::fs::read_to_string(dir.join("Cargo.toml"))
				.map(|content| content.contains("[workspace]"))
				.unwrap_or(false)
		})
		.map(Path::to_path_buf);

	workspace_root.unwrap_or(start)
}

fn get_log_root() -> PathBuf {
	env::var("LOG_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|_| find_project_root().join("logs"))
}

fn setup_file_logging(log_dir: &Path) -> Result<non_blocking::NonBlocking> {
	let file_appender = rolling::RollingFileAppender::builder()
		.rotation(Rotation::DAILY)
		.filename_prefix(LOG_COMPONENT_NAME)
		.filename_suffix("log")
		.build(log_dir)
		.with_context(|| {
			format!(
				"Failed to create rolling file appender in {}",
				log_dir.display()
			)
		})?;

	let (file_writer, guard) = non_blocking(file_appender);
	LOG_GUARD.set(guard).ok();

	Ok(file_writer)
}

/// Initialize logging with file output and optional console output
///
/// Fails if the log directory cannot be created or a global subscriber
/// is already installed.
pub fn init_logging() -> Result<()> {
	dotenv::dotenv().ok();

	let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

	let log_dir = get_log_root().join(LOG_COMPONENT_NAME);
	std::fs::create_dir_all(&log_dir)
		.with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

	let file_writer = setup_file_logging(&log_dir)?;

	let log_to_console = env::var("LOG_TO_CONSOLE")
		.map(|v| v == "true" || v == "1" || v == "yes")
		.unwrap_or(DEFAULT_LOG_TO_CONSOLE);

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

	let file_layer = fmt::layer()
		.with_writer(file_writer)
		.with_timer(fmt::time::UtcTime::rfc_3339())
		.with_thread_ids(true)
		.with_target(true)
		.with_thread_names(false)
		.with_ansi(false);

	let console_layer = log_to_console.then(|| {
		fmt::layer()
			.with_writer(std::io::stderr)
			.with_timer(fmt::time::UtcTime::rfc_3339())
			.with_thread_ids(true)
			.with_target(true)
			.with_thread_names(false)
			.with_ansi(true)
	});

	Registry::default()
		.with(filter)
		.with(file_layer)
		.with(console_layer)
		.try_init()
		.context("Failed to install tracing subscriber")?;

	info!(target: "server", "Log level: {}", log_level);
	info!(target: "server", "Log directory: {}", log_dir.display());
	if log_to_console {
		info!(target: "server", "Console output: enabled");
	}

	Ok(())
}
