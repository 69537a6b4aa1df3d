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

//! GCS Allocation Engine
//!
//! This crate matches one-shot food offers ("give") against standing
//! receiver demand registered in a geo index, and drives the resulting
//! booking from `Allocating` to `Allocated`.
//!
//! Architecture:
//! - Code generator backed by an injected atomic counter
//! - Booking store with independent reader/writer locks for records and tokens
//! - Geo index contract with Redis and in-memory adapters
//! - Bounded allocation queue drained by a fixed worker pool
//! - First-fit-nearest allocator with a strict weight-compatibility window
//! - Notification sink for match summaries (delivery failures never roll back)

pub mod allocator;
pub mod codec;
pub mod codegen;
pub mod config;
pub mod geo;
pub mod notify;
pub mod queue;
pub mod registry;
pub mod store;
pub mod types;
pub mod worker;

pub use allocator::{AllocationError, Allocator, DriverIdentity, weight_compatible};
pub use codec::CodecError;
pub use codegen::{CodeGenError, CodeGenerator, Counter, MemoryCounter};
pub use config::AllocationConfig;
pub use geo::{GeoIndex, GeoIndexError, MemoryGeoIndex, RedisGeoIndex};
pub use notify::{
	LogNotificationSink, MemoryNotificationSink, Notification, NotificationSink, NotifyError,
	WebhookNotificationSink,
};
pub use queue::{AllocationJob, AllocationQueue, JobSlot, QueueError, QueueReceiver, QueueSender};
pub use registry::{DemandRegistry, RegistryError};
pub use store::{BookingStore, MemoryBookingStore, StoreError};
pub use types::*;
pub use worker::{AllocationOutcome, AllocationWorkerPool, OutcomeStatus};
