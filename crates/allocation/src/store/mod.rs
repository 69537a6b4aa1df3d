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

mod memory;

use thiserror::Error;

use crate::types::BookingRecord;
pub use memory::MemoryBookingStore;

/// Error types for Booking Store operations
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Booking not found: {0}")]
	NotFound(String),
}

/// Booking Store trait - the shared record of every allocation attempt
///
/// Records are addressed by booking code; a separate token map resolves
/// confirmation tokens back to booking codes.
///
/// Key semantic constraints:
/// - Whole-record reads and writes only, never field-level mutation
/// - `put` is last-write-wins
/// - `delete` of an absent code is a no-op
/// - All operations are safe under concurrent callers
///
/// This abstraction is implementation-agnostic: it can be backed by
/// in-process maps, an embedded ordered map, or a remote KV client.
pub trait BookingStore: Send + Sync {
	/// Insert or replace the record keyed by its booking code
	fn put(&self, record: BookingRecord) -> Result<(), StoreError>;

	/// Fetch a snapshot of the record
	fn get(&self, pre_book_code: &str) -> Result<BookingRecord, StoreError>;

	/// Remove the record if present
	fn delete(&self, pre_book_code: &str) -> Result<(), StoreError>;

	/// Resolve a confirmation token to a booking code
	fn get_by_token(&self, token: &str) -> Option<String>;
}
