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

use tokio::sync::mpsc::{self, Permit, error::TryRecvError, error::TrySendError};

use crate::types::BookingRecord;

/// One pending allocation attempt
#[derive(Debug, Clone)]
pub struct AllocationJob {
	pub booking: BookingRecord,
}

/// Allocation Queue between the HTTP ingress and the worker pool
///
/// Properties:
/// - Multiple producers (request handlers)
/// - One receiver, shared by the workers behind a lock
/// - Bounded capacity; a full queue is reported, never waited on
///
/// Producers reserve a slot before they persist the booking, so a
/// rejected request leaves no record behind.
pub struct AllocationQueue {
	sender: mpsc::Sender<AllocationJob>,
	receiver: mpsc::Receiver<AllocationJob>,
}

impl AllocationQueue {
	/// Create a new queue holding at most `capacity` jobs
	///
	/// A capacity of zero is raised to one.
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = mpsc::channel(capacity.max(1));
		Self { sender, receiver }
	}

	/// Split the queue into sender and receiver ends
	pub fn split(self) -> (QueueSender, QueueReceiver) {
		(
			QueueSender {
				sender: self.sender,
			},
			QueueReceiver {
				receiver: self.receiver,
			},
		)
	}
}

/// Sender end of the allocation queue
#[derive(Clone)]
pub struct QueueSender {
	sender: mpsc::Sender<AllocationJob>,
}

impl QueueSender {
	/// Reserve room for one job without waiting
	///
	/// Dropping the returned slot unused gives the room back.
	pub fn try_reserve(&self) -> Result<JobSlot<'_>, QueueError> {
		self.sender
			.try_reserve()
			.map(|permit| JobSlot { permit })
			.map_err(|e| match e {
				TrySendError::Full(_) => QueueError::Full,
				TrySendError::Closed(_) => QueueError::Disconnected,
			})
	}

	/// Try to enqueue a job (non-blocking)
	pub fn try_enqueue(&self, job: AllocationJob) -> Result<(), QueueError> {
		self.sender.try_send(job).map_err(|e| match e {
			TrySendError::Full(_) => QueueError::Full,
			TrySendError::Closed(_) => QueueError::Disconnected,
		})
	}

	/// Check if the queue is full
	pub fn is_full(&self) -> bool {
		self.sender.capacity() == 0
	}
}

/// Reserved room for exactly one job
pub struct JobSlot<'a> {
	permit: Permit<'a, AllocationJob>,
}

impl JobSlot<'_> {
	pub fn send(self, job: AllocationJob) {
		self.permit.send(job);
	}
}

/// Receiver end of the allocation queue
pub struct QueueReceiver {
	receiver: mpsc::Receiver<AllocationJob>,
}

impl QueueReceiver {
	/// Wait for the next job
	///
	/// Returns `Disconnected` once every sender is gone and the queue is drained.
	pub async fn recv(&mut self) -> Result<AllocationJob, QueueError> {
		self.receiver.recv().await.ok_or(QueueError::Disconnected)
	}

	/// Try to receive a job (non-blocking)
	pub fn try_recv(&mut self) -> Result<AllocationJob, QueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => QueueError::Empty,
			TryRecvError::Disconnected => QueueError::Disconnected,
		})
	}
}

/// Errors that can occur when interacting with the allocation queue
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
	#[error("Queue is full")]
	Full,
	#[error("Queue is empty")]
	Empty,
	#[error("Queue disconnected")]
	Disconnected,
}
