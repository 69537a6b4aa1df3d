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

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use gcs_allocation::{
	AllocationConfig, AllocationQueue, AllocationWorkerPool, Allocator, BookingStore,
	CodeGenerator, Counter, DemandRegistry, GeoIndex, LogNotificationSink, MemoryBookingStore,
	MemoryCounter, MemoryGeoIndex, NotificationSink, QueueReceiver, RedisGeoIndex,
	WebhookNotificationSink,
};
use tracing::info;

use crate::{
	config::GatewayRuntimeConfig, dispatcher::BookingDispatcher, middleware::LoggingMiddleware,
	routes, seed,
};

/// Storage handles shared by the HTTP layer and the allocation workers
#[derive(Clone)]
pub struct Backends {
	pub index: Arc<dyn GeoIndex>,
	pub counter: Arc<dyn Counter>,
	pub store: Arc<dyn BookingStore>,
}

impl Backends {
	pub fn in_memory() -> Self {
		Self {
			index: Arc::new(MemoryGeoIndex::new()),
			counter: Arc::new(MemoryCounter::new()),
			store: Arc::new(MemoryBookingStore::new()),
		}
	}

	/// Geo index and code counter in Redis; bookings stay in process
	pub fn redis(redis_url: &str, pool_size: usize) -> Result<Self> {
		let index = Arc::new(
			RedisGeoIndex::with_pool_size(redis_url, pool_size)
				.with_context(|| format!("Failed to create Redis pool for {}", redis_url))?,
		);

		Ok(Self {
			index: index.clone(),
			counter: index,
			store: Arc::new(MemoryBookingStore::new()),
		})
	}
}

/// Gateway server state
pub struct GatewayState {
	pub dispatcher: BookingDispatcher,
	pub store: Arc<dyn BookingStore>,
	pub registry: DemandRegistry,
}

impl GatewayState {
	/// Build the request-side state and the receiving end of its allocation queue
	pub fn new(backends: &Backends, config: &AllocationConfig) -> (Self, QueueReceiver) {
		let (sender, receiver) = AllocationQueue::new(config.queue_capacity).split();
		let codes = CodeGenerator::new(
			backends.counter.clone(),
			config.code_prefix.clone(),
			config.counter_key.clone(),
		);

		let state = Self {
			dispatcher: BookingDispatcher::new(codes, backends.store.clone(), sender),
			store: backends.store.clone(),
			registry: DemandRegistry::new(backends.index.clone()),
		};
		(state, receiver)
	}

	#[cfg(test)]
	pub fn in_memory(config: &AllocationConfig) -> (Self, QueueReceiver) {
		Self::new(&Backends::in_memory(), config)
	}
}

/// Gateway server
pub struct GatewayServer {
	config: GatewayRuntimeConfig,
	state: web::Data<GatewayState>,
	workers: AllocationWorkerPool,
}

impl GatewayServer {
	/// Wire backends, seed data and the allocation worker pool
	pub async fn new(config: GatewayRuntimeConfig) -> Result<Self> {
		let backends = match &config.redis_url {
			Some(url) => {
				info!(target: "server", "Using Redis backends at {}", url);
				Backends::redis(url, config.redis_pool_size)?
			}
			None => {
				info!(target: "server", "GCS_REDIS_URL not set, using in-memory backends");
				Backends::in_memory()
			}
		};

		let notifier: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
			Some(url) => Arc::new(
				WebhookNotificationSink::new(url.clone(), config.notify_timeout)
					.context("Failed to create webhook notification sink")?,
			),
			None => Arc::new(LogNotificationSink),
		};

		let (state, receiver) = GatewayState::new(&backends, &config.allocation);

		if config.seed_demo_receivers {
			seed::seed_demo_receivers(&state.registry)
				.await
				.context("Failed to register demo receivers")?;
		}

		let allocator = Arc::new(Allocator::new(
			backends.index.clone(),
			backends.store.clone(),
			notifier,
			config.allocation.clone(),
		));
		let workers =
			AllocationWorkerPool::start(config.allocation.allocation_workers, receiver, allocator);

		Ok(Self {
			config,
			state: web::Data::new(state),
			workers,
		})
	}

	/// Run the HTTP server until it is stopped, then drain the worker pool
	pub async fn serve(self) -> Result<()> {
		let state = self.state.clone();
		let max_body_bytes = self.config.max_body_bytes;

		info!(
			target: "server",
			"Listening on {} with {} HTTP workers",
			self.config.bind_addr,
			self.config.workers
		);

		HttpServer::new(move || {
			App::new()
				.app_data(state.clone())
				.wrap(LoggingMiddleware)
				.configure(|cfg| routes::configure_routes(cfg, max_body_bytes))
		})
		.workers(self.config.workers.max(1))
		.bind(self.config.bind_addr)
		.with_context(|| format!("Failed to bind {}", self.config.bind_addr))?
		.run()
		.await
		.context("HTTP server error")?;

		self.workers.shutdown().await;
		Ok(())
	}
}
