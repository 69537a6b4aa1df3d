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

use gcs_allocation::{
	AllocationJob, BookingRecord, BookingStore, CodeGenError, CodeGenerator, GeoPoint, QueueError,
	QueueSender, StoreError,
};
use gcs_sdk::types::GiveRequest;
use thiserror::Error;
use tracing::info;

/// Error types for booking submission
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error("failed to generate prebook code: {0}")]
	CodeGen(#[from] CodeGenError),
	#[error("allocation queue is full")]
	QueueFull,
	#[error("allocation queue is closed")]
	QueueClosed,
	#[error("failed to store booking: {0}")]
	Store(#[from] StoreError),
}

impl From<QueueError> for DispatchError {
	fn from(e: QueueError) -> Self {
		match e {
			QueueError::Full => DispatchError::QueueFull,
			QueueError::Empty | QueueError::Disconnected => DispatchError::QueueClosed,
		}
	}
}

/// Turns accepted offers into stored bookings with a pending allocation job
///
/// Submission order:
/// 1. Reserve a queue slot (reject early when the queue is full)
/// 2. Issue the booking code
/// 3. Store the `Allocating` booking
/// 4. Hand the booking to the worker pool
///
/// A failure before step 3 leaves nothing behind. Once the booking is
/// stored the job is always enqueued.
pub struct BookingDispatcher {
	codes: CodeGenerator,
	store: Arc<dyn BookingStore>,
	queue: QueueSender,
}

impl BookingDispatcher {
	pub fn new(codes: CodeGenerator, store: Arc<dyn BookingStore>, queue: QueueSender) -> Self {
		Self {
			codes,
			store,
			queue,
		}
	}

	pub async fn submit(&self, request: GiveRequest) -> Result<BookingRecord, DispatchError> {
		let slot = self.queue.try_reserve()?;
		let code = self.codes.next().await?;

		let booking = BookingRecord::allocating(
			code,
			request.item,
			request.weight_kg,
			request.city_id,
			GeoPoint::new(request.lat, request.lng),
		);
		self.store.put(booking.clone())?;
		slot.send(AllocationJob {
			booking: booking.clone(),
		});

		info!(
			target: "server::dispatcher",
			code = %booking.pre_book_code,
			city_id = booking.city_id,
			weight = booking.weight,
			"Booking accepted"
		);
		Ok(booking)
	}
}

#[cfg(test)]
mod tests {
	use gcs_allocation::{AllocationQueue, BookingState, MemoryBookingStore, MemoryCounter};

	use super::*;

	fn give(weight_kg: f64) -> GiveRequest {
		GiveRequest {
			city_id: 1,
			user_id: 9,
			item: "bread".to_string(),
			lat: 1.2966426,
			lng: 103.7742052,
			weight_kg,
			expire_time: 0,
		}
	}

	fn dispatcher(capacity: usize) -> (BookingDispatcher, Arc<MemoryBookingStore>, gcs_allocation::QueueReceiver) {
		let store = Arc::new(MemoryBookingStore::new());
		let (sender, receiver) = AllocationQueue::new(capacity).split();
		let codes = CodeGenerator::new(Arc::new(MemoryCounter::new()), "ABC-", "booking:count");
		(BookingDispatcher::new(codes, store.clone(), sender), store, receiver)
	}

	#[tokio::test]
	async fn test_submit_stores_and_enqueues() {
		let (dispatcher, store, mut receiver) = dispatcher(4);

		let booking = dispatcher.submit(give(20.0)).await.unwrap();
		assert_eq!(booking.pre_book_code, "ABC-1");
		assert_eq!(booking.state, BookingState::Allocating);
		assert_eq!(booking.item, "bread");
		assert_eq!(store.get("ABC-1").unwrap(), booking);

		let job = receiver.recv().await.unwrap();
		assert_eq!(job.booking, booking);

		let second = dispatcher.submit(give(5.0)).await.unwrap();
		assert_eq!(second.pre_book_code, "ABC-2");
	}

	#[tokio::test]
	async fn test_full_queue_creates_no_booking() {
		let (dispatcher, store, _receiver) = dispatcher(1);

		dispatcher.submit(give(20.0)).await.unwrap();
		let result = dispatcher.submit(give(20.0)).await;

		assert!(matches!(result, Err(DispatchError::QueueFull)));
		assert_eq!(store.len(), 1);
	}
}
