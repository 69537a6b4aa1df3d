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

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::allocator::{AllocationError, Allocator};
use crate::queue::QueueReceiver;

/// Outcomes kept for slow subscribers before the oldest are dropped
const OUTCOME_CAPACITY: usize = 1024;

/// Result of one allocation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
	Allocated { demand_id: i64 },
	NoMatch,
	Failed(String),
}

/// Published once per dequeued job
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
	pub pre_book_code: String,
	pub status: OutcomeStatus,
}

/// Fixed set of tasks draining the allocation queue
///
/// Each job is handled by exactly one worker. Jobs run concurrently
/// across workers and are not ordered relative to one another. A failed
/// or panicking attempt is reported on the outcome channel and never
/// retried; the booking stays `Allocating`.
pub struct AllocationWorkerPool {
	handles: Vec<JoinHandle<()>>,
	outcomes: broadcast::Sender<AllocationOutcome>,
	shutdown: watch::Sender<bool>,
}

impl AllocationWorkerPool {
	/// Spawn `workers` tasks (at least one) on the current tokio runtime
	pub fn start(workers: usize, receiver: QueueReceiver, allocator: Arc<Allocator>) -> Self {
		let workers = workers.max(1);
		let receiver = Arc::new(Mutex::new(receiver));
		let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);
		let (shutdown, _) = watch::channel(false);

		let handles = (0..workers)
			.map(|worker_id| {
				tokio::spawn(run_worker(
					worker_id,
					receiver.clone(),
					allocator.clone(),
					outcomes.clone(),
					shutdown.subscribe(),
				))
			})
			.collect();

		info!(target: "allocation", workers, "Allocation worker pool started");

		Self {
			handles,
			outcomes,
			shutdown,
		}
	}

	/// Receive every outcome published after this call
	pub fn subscribe(&self) -> broadcast::Receiver<AllocationOutcome> {
		self.outcomes.subscribe()
	}

	pub fn worker_count(&self) -> usize {
		self.handles.len()
	}

	/// Stop all workers and wait for them to exit
	///
	/// A worker in the middle of an attempt finishes it first. Jobs still
	/// queued are abandoned.
	pub async fn shutdown(self) {
		let _ = self.shutdown.send(true);
		for handle in self.handles {
			if let Err(e) = handle.await {
				error!(target: "allocation", error = %e, "Allocation worker panicked");
			}
		}
		info!(target: "allocation", "Allocation worker pool stopped");
	}
}

async fn run_worker(
	worker_id: usize,
	receiver: Arc<Mutex<QueueReceiver>>,
	allocator: Arc<Allocator>,
	outcomes: broadcast::Sender<AllocationOutcome>,
	mut shutdown: watch::Receiver<bool>,
) {
	loop {
		let next = tokio::select! {
			biased;
			_ = shutdown.changed() => break,
			next = async { receiver.lock().await.recv().await } => next,
		};

		// Every sender is gone and the queue is drained
		let Ok(job) = next else {
			break;
		};

		let pre_book_code = job.booking.pre_book_code.clone();

		// A panicking attempt is contained in its own task so the worker survives it
		let attempt = {
			let allocator = allocator.clone();
			tokio::spawn(async move { allocator.allocate(job.booking).await })
		};

		let status = match attempt.await {
			Ok(Ok(booking)) => OutcomeStatus::Allocated {
				demand_id: booking.demand_id,
			},
			Ok(Err(AllocationError::NoMatch)) => {
				info!(target: "allocation", worker_id, code = %pre_book_code, "No compatible demand");
				OutcomeStatus::NoMatch
			}
			Ok(Err(e)) => {
				error!(target: "allocation", worker_id, code = %pre_book_code, error = %e, "Allocation failed");
				OutcomeStatus::Failed(e.to_string())
			}
			Err(e) => {
				error!(target: "allocation", worker_id, code = %pre_book_code, error = %e, "Allocation attempt aborted");
				OutcomeStatus::Failed(e.to_string())
			}
		};

		// No subscribers is not an error
		let _ = outcomes.send(AllocationOutcome {
			pre_book_code,
			status,
		});
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::time::Duration;

	use async_trait::async_trait;

	use super::*;
	use crate::config::AllocationConfig;
	use crate::geo::{GeoIndex, GeoIndexError, MemoryGeoIndex};
	use crate::notify::MemoryNotificationSink;
	use crate::queue::{AllocationJob, AllocationQueue};
	use crate::store::MemoryBookingStore;
	use crate::types::{BookingRecord, GeoLocation, GeoPoint};

	/// Index whose radius query panics for one city and is empty elsewhere
	struct PanickingIndex {
		city: &'static str,
	}

	#[async_trait]
	impl GeoIndex for PanickingIndex {
		async fn upsert(&self, _: &str, _: GeoPoint, _: &str) -> Result<(), GeoIndexError> {
			Ok(())
		}

		async fn radius_query(
			&self,
			namespace: &str,
			_: GeoPoint,
			_: f64,
		) -> Result<Vec<GeoLocation>, GeoIndexError> {
			if namespace == self.city {
				panic!("corrupt index for {}", namespace);
			}
			Ok(Vec::new())
		}

		async fn get_payload(&self, _: &str) -> Result<Option<Vec<u8>>, GeoIndexError> {
			Ok(None)
		}

		async fn put_payload(&self, _: &str, _: &[u8]) -> Result<(), GeoIndexError> {
			Ok(())
		}
	}

	fn empty_allocator() -> Arc<Allocator> {
		Arc::new(Allocator::new(
			Arc::new(MemoryGeoIndex::new()),
			Arc::new(MemoryBookingStore::new()),
			Arc::new(MemoryNotificationSink::new()),
			AllocationConfig::default(),
		))
	}

	fn job(code: &str) -> AllocationJob {
		AllocationJob {
			booking: BookingRecord::allocating(code, "rice", 20.0, 1, GeoPoint::new(1.29, 103.85)),
		}
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_every_job_yields_one_outcome() {
		let (sender, receiver) = AllocationQueue::new(64).split();
		let pool = AllocationWorkerPool::start(4, receiver, empty_allocator());
		let mut outcomes = pool.subscribe();
		assert_eq!(pool.worker_count(), 4);

		for i in 0..32 {
			sender.try_enqueue(job(&format!("ABC-{}", i))).unwrap();
		}

		let mut seen = HashSet::new();
		for _ in 0..32 {
			let outcome = tokio::time::timeout(Duration::from_secs(5), outcomes.recv())
				.await
				.unwrap()
				.unwrap();
			assert_eq!(outcome.status, OutcomeStatus::NoMatch);
			assert!(seen.insert(outcome.pre_book_code));
		}

		pool.shutdown().await;
	}

	#[tokio::test]
	async fn test_panicking_attempt_keeps_worker_alive() {
		let allocator = Arc::new(Allocator::new(
			Arc::new(PanickingIndex { city: "city:13" }),
			Arc::new(MemoryBookingStore::new()),
			Arc::new(MemoryNotificationSink::new()),
			AllocationConfig::default(),
		));
		let (sender, receiver) = AllocationQueue::new(8).split();
		let pool = AllocationWorkerPool::start(1, receiver, allocator);
		let mut outcomes = pool.subscribe();

		let mut bad = job("ABC-1");
		bad.booking.city_id = 13;
		sender.try_enqueue(bad).unwrap();
		sender.try_enqueue(job("ABC-2")).unwrap();

		let first = tokio::time::timeout(Duration::from_secs(5), outcomes.recv())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(first.pre_book_code, "ABC-1");
		assert!(matches!(first.status, OutcomeStatus::Failed(_)));

		let second = tokio::time::timeout(Duration::from_secs(5), outcomes.recv())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(second.pre_book_code, "ABC-2");
		assert_eq!(second.status, OutcomeStatus::NoMatch);

		pool.shutdown().await;
	}

	#[tokio::test]
	async fn test_shutdown_stops_idle_workers() {
		let (_sender, receiver) = AllocationQueue::new(4).split();
		let pool = AllocationWorkerPool::start(2, receiver, empty_allocator());

		tokio::time::timeout(Duration::from_secs(5), pool.shutdown())
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_workers_exit_when_senders_drop() {
		let (sender, receiver) = AllocationQueue::new(4).split();
		let pool = AllocationWorkerPool::start(0, receiver, empty_allocator());
		assert_eq!(pool.worker_count(), 1);
		drop(sender);

		for handle in pool.handles {
			tokio::time::timeout(Duration::from_secs(5), handle)
				.await
				.unwrap()
				.unwrap();
		}
	}
}
