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

use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use gcs_allocation::{AllocationConfig, GeoPoint};

// Logging configuration constants
/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory component name
pub const LOG_COMPONENT_NAME: &str = "gateway";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

// Server configuration constants
/// Default HTTP server bind address (can be overridden by GCS_BIND_ADDR environment variable)
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default maximum HTTP request body size in bytes (can be overridden by GCS_MAX_BODY_BYTES)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Default Redis pool size (can be overridden by GCS_REDIS_POOL_SIZE)
pub const DEFAULT_REDIS_POOL_SIZE: usize = 10;

/// Default webhook timeout in milliseconds (can be overridden by GCS_NOTIFY_TIMEOUT_MS)
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;

/// Reference point of the `/receive/list` diagnostic listing
pub const LIST_CENTER: GeoPoint = GeoPoint::new(1.2966426, 103.7742052);

/// Radius of the `/receive/list` listing; larger than any distance on earth
pub const LIST_RADIUS_KM: f64 = 40_075.0;

#[derive(Debug, Clone)]
pub struct GatewayRuntimeConfig {
	pub bind_addr: SocketAddr,
	pub workers: usize,
	pub max_body_bytes: usize,
	/// Redis endpoint; in-memory backends are used when unset
	pub redis_url: Option<String>,
	pub redis_pool_size: usize,
	/// Webhook for match notifications; notifications are only logged when unset
	pub notify_webhook_url: Option<String>,
	pub notify_timeout: Duration,
	/// Register the demo receivers at startup
	pub seed_demo_receivers: bool,
	pub allocation: AllocationConfig,
}

impl GatewayRuntimeConfig {
	pub fn from_env() -> Result<Self> {
		dotenv::dotenv().ok();

		let bind_addr_str =
			env::var("GCS_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
		let bind_addr = bind_addr_str
			.parse()
			.with_context(|| format!("Invalid bind address: {}", bind_addr_str))?;

		let workers = env::var("GCS_WORKERS")
			.ok()
			.and_then(|w| w.parse().ok())
			.unwrap_or_else(num_cpus::get);

		let max_body_bytes = env::var("GCS_MAX_BODY_BYTES")
			.ok()
			.and_then(|v| v.parse().ok())
			.unwrap_or(DEFAULT_MAX_BODY_BYTES);

		let redis_url = env::var("GCS_REDIS_URL").ok().filter(|v| !v.is_empty());

		let redis_pool_size = env::var("GCS_REDIS_POOL_SIZE")
			.ok()
			.and_then(|v| v.parse().ok())
			.unwrap_or(DEFAULT_REDIS_POOL_SIZE);

		let notify_webhook_url = env::var("GCS_NOTIFY_WEBHOOK_URL")
			.ok()
			.filter(|v| !v.is_empty());

		let notify_timeout_ms = env::var("GCS_NOTIFY_TIMEOUT_MS")
			.ok()
			.and_then(|v| v.parse().ok())
			.unwrap_or(DEFAULT_NOTIFY_TIMEOUT_MS);

		let seed_demo_receivers = env::var("GCS_SEED_DEMO_RECEIVERS")
			.map(|v| v == "true" || v == "1" || v == "yes")
			.unwrap_or(false);

		let allocation =
			AllocationConfig::from_env().context("Failed to load allocation configuration")?;

		Ok(Self {
			bind_addr,
			workers,
			max_body_bytes,
			redis_url,
			redis_pool_size,
			notify_webhook_url,
			notify_timeout: Duration::from_millis(notify_timeout_ms),
			seed_demo_receivers,
			allocation,
		})
	}
}

impl Default for GatewayRuntimeConfig {
	fn default() -> Self {
		Self {
			bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
			workers: 1,
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
			redis_url: None,
			redis_pool_size: DEFAULT_REDIS_POOL_SIZE,
			notify_webhook_url: None,
			notify_timeout: Duration::from_millis(DEFAULT_NOTIFY_TIMEOUT_MS),
			seed_demo_receivers: false,
			allocation: AllocationConfig::default(),
		}
	}
}
