//! Integration tests for the allocation engine
//!
//! These tests verify:
//! - End-to-end allocation through the queue and worker pool
//! - No-match handling (booking stays Allocating)
//! - Nearest-first selection among registered receivers
//! - Unique booking codes under concurrent submission

use std::{collections::HashSet, sync::Arc, time::Duration};

use gcs_allocation::{
	AllocationConfig, AllocationJob, AllocationOutcome, AllocationQueue, AllocationWorkerPool,
	Allocator, BookingRecord, BookingState, BookingStore, CodeGenerator, DemandRecord,
	DemandRegistry, MemoryBookingStore, MemoryCounter, MemoryGeoIndex, MemoryNotificationSink,
	OutcomeStatus, QueueSender,
};
use tokio::sync::broadcast;

const PICK_UP: (f64, f64) = (1.2966426, 103.7742052);

struct Harness {
	registry: DemandRegistry,
	store: Arc<MemoryBookingStore>,
	sink: Arc<MemoryNotificationSink>,
	sender: QueueSender,
	outcomes: broadcast::Receiver<AllocationOutcome>,
	pool: AllocationWorkerPool,
}

fn start_harness() -> Harness {
	let index = Arc::new(MemoryGeoIndex::new());
	let store = Arc::new(MemoryBookingStore::new());
	let sink = Arc::new(MemoryNotificationSink::new());
	let config = AllocationConfig::default();

	let allocator = Arc::new(Allocator::new(
		index.clone(),
		store.clone(),
		sink.clone(),
		config.clone(),
	));
	let (sender, receiver) = AllocationQueue::new(config.queue_capacity).split();
	let pool = AllocationWorkerPool::start(config.allocation_workers, receiver, allocator);
	let outcomes = pool.subscribe();

	Harness {
		registry: DemandRegistry::new(index),
		store,
		sink,
		sender,
		outcomes,
		pool,
	}
}

fn receiver(user_id: i64, lat: f64, lng: f64, demand: f64) -> DemandRecord {
	DemandRecord {
		city_id: 1,
		user_id,
		lat,
		lng,
		demand,
		time_ranges: Vec::new(),
	}
}

fn submit(harness: &Harness, code: &str, weight: f64) {
	let booking = BookingRecord::allocating(
		code,
		"rice",
		weight,
		1,
		gcs_allocation::GeoPoint::new(PICK_UP.0, PICK_UP.1),
	);
	harness.store.put(booking.clone()).unwrap();
	harness
		.sender
		.try_enqueue(AllocationJob { booking })
		.unwrap();
}

async fn next_outcome(harness: &mut Harness) -> AllocationOutcome {
	tokio::time::timeout(Duration::from_secs(5), harness.outcomes.recv())
		.await
		.expect("outcome within timeout")
		.expect("outcome channel open")
}

#[tokio::test]
async fn test_allocates_compatible_receiver() {
	let mut harness = start_harness();
	harness
		.registry
		.register(&receiver(1, 1.2970, 103.7745, 20.0))
		.await
		.unwrap();

	submit(&harness, "ABC-1", 20.0);

	let outcome = next_outcome(&mut harness).await;
	assert_eq!(outcome.pre_book_code, "ABC-1");
	assert_eq!(outcome.status, OutcomeStatus::Allocated { demand_id: 1 });

	let booking = harness.store.get("ABC-1").unwrap();
	assert_eq!(booking.state, BookingState::Allocated);
	assert_eq!(booking.demand_id, 1);
	assert!(booking.pick_up_time > 0);
	assert_eq!(booking.driver_name, "Driver A");

	let sent = harness.sink.sent();
	assert_eq!(sent.len(), 1);
	assert!(sent[0].body.contains("phone number: +6593004400"));

	harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_incompatible_weight_stays_allocating() {
	let mut harness = start_harness();
	harness
		.registry
		.register(&receiver(1, 1.2970, 103.7745, 20.0))
		.await
		.unwrap();

	submit(&harness, "ABC-1", 5.0);

	let outcome = next_outcome(&mut harness).await;
	assert_eq!(outcome.status, OutcomeStatus::NoMatch);

	let booking = harness.store.get("ABC-1").unwrap();
	assert_eq!(booking.state, BookingState::Allocating);
	assert_eq!(booking.pick_up_time, 0);
	assert!(harness.sink.sent().is_empty());

	harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_nearest_compatible_receiver_wins() {
	let mut harness = start_harness();
	// Nearest receiver asks for far more than is offered
	harness
		.registry
		.register(&receiver(1, 1.2967, 103.7742, 100.0))
		.await
		.unwrap();
	harness
		.registry
		.register(&receiver(2, 1.3000, 103.7742, 25.0))
		.await
		.unwrap();
	harness
		.registry
		.register(&receiver(3, 1.3100, 103.7742, 20.0))
		.await
		.unwrap();
	// Outside the search radius
	harness
		.registry
		.register(&receiver(4, 1.4000, 103.7742, 20.0))
		.await
		.unwrap();

	submit(&harness, "ABC-1", 20.0);

	let outcome = next_outcome(&mut harness).await;
	assert_eq!(outcome.status, OutcomeStatus::Allocated { demand_id: 2 });

	harness.pool.shutdown().await;
}

#[tokio::test]
async fn test_other_city_is_not_searched() {
	let mut harness = start_harness();
	let mut elsewhere = receiver(1, 1.2970, 103.7745, 20.0);
	elsewhere.city_id = 2;
	harness.registry.register(&elsewhere).await.unwrap();

	submit(&harness, "ABC-1", 20.0);

	let outcome = next_outcome(&mut harness).await;
	assert_eq!(outcome.status, OutcomeStatus::NoMatch);

	harness.pool.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_codes_are_unique() {
	let generator = Arc::new(CodeGenerator::new(
		Arc::new(MemoryCounter::new()),
		"ABC-",
		"booking:count",
	));

	let tasks: Vec<_> = (0..16)
		.map(|_| {
			let generator = generator.clone();
			tokio::spawn(async move {
				let mut codes = Vec::new();
				for _ in 0..100 {
					codes.push(generator.next().await.unwrap());
				}
				codes
			})
		})
		.collect();

	let mut seen = HashSet::new();
	for task in tasks {
		for code in task.await.unwrap() {
			assert!(code.starts_with("ABC-"));
			assert!(seen.insert(code));
		}
	}
	assert_eq!(seen.len(), 1600);
}
