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

//! GCS Gateway Service
//!
//! HTTP front of the food allocation service. It accepts food offers,
//! stores them as bookings and hands them to the allocation workers,
//! and maintains receiver registrations in the geo index.
//!
//! Every request failure is answered with `500` and a plain-text message.

mod config;
mod dispatcher;
mod handlers;
mod logging;
mod middleware;
mod routes;
mod seed;
mod server;
mod validation;

use anyhow::{Context, Result};
use tracing::info;

use crate::{config::GatewayRuntimeConfig, logging::init_logging};
use server::GatewayServer;

#[actix_rt::main]
async fn main() -> Result<()> {
	// Initialize logging first
	init_logging()?;

	let config = GatewayRuntimeConfig::from_env()?;
	info!(target: "server", "Starting GCS Gateway on {}", config.bind_addr);

	let server = GatewayServer::new(config)
		.await
		.context("Failed to create gateway server")?;

	info!(target: "server", "Gateway server initialized");

	server.serve().await.context("Failed to run gateway server")?;

	Ok(())
}
