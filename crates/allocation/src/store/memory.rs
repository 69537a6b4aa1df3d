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

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{BookingStore, StoreError};
use crate::types::BookingRecord;

/// In-memory Booking Store
///
/// Characteristics:
/// - Records and tokens live in two independent maps
/// - Each map has its own reader/writer lock, held for a single call only
/// - Records are cloned in and out, so readers never see a half-written record
/// - No durability; state is lost on restart
///
/// Nothing writes the token map yet, so `get_by_token` always returns `None`.
#[derive(Default)]
pub struct MemoryBookingStore {
	records: RwLock<HashMap<String, BookingRecord>>,
	tokens: RwLock<HashMap<String, String>>,
}

impl MemoryBookingStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}
}

impl BookingStore for MemoryBookingStore {
	fn put(&self, record: BookingRecord) -> Result<(), StoreError> {
		self.records
			.write()
			.insert(record.pre_book_code.clone(), record);
		Ok(())
	}

	fn get(&self, pre_book_code: &str) -> Result<BookingRecord, StoreError> {
		self.records
			.read()
			.get(pre_book_code)
			.cloned()
			.ok_or_else(|| StoreError::NotFound(pre_book_code.to_string()))
	}

	fn delete(&self, pre_book_code: &str) -> Result<(), StoreError> {
		self.records.write().remove(pre_book_code);
		Ok(())
	}

	fn get_by_token(&self, token: &str) -> Option<String> {
		self.tokens.read().get(token).cloned()
	}
}

#[cfg(test)]
mod tests {
	use std::{sync::Arc, thread};

	use super::*;
	use crate::types::GeoPoint;

	fn create_test_booking(code: &str, weight: f64) -> BookingRecord {
		BookingRecord::allocating(code, "rice", weight, 1, GeoPoint::new(1.2966, 103.7742))
	}

	#[test]
	fn test_put_and_get() {
		let store = MemoryBookingStore::new();
		let booking = create_test_booking("ABC-1", 20.0);

		store.put(booking.clone()).unwrap();
		assert_eq!(store.get("ABC-1").unwrap(), booking);
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn test_get_missing_is_not_found() {
		let store = MemoryBookingStore::new();
		let result = store.get("ABC-404");
		assert!(matches!(result, Err(StoreError::NotFound(code)) if code == "ABC-404"));
	}

	#[test]
	fn test_put_is_last_write_wins() {
		let store = MemoryBookingStore::new();
		store.put(create_test_booking("ABC-1", 20.0)).unwrap();
		store.put(create_test_booking("ABC-1", 35.0)).unwrap();

		assert_eq!(store.get("ABC-1").unwrap().weight, 35.0);
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn test_delete_is_idempotent() {
		let store = MemoryBookingStore::new();
		store.put(create_test_booking("ABC-1", 20.0)).unwrap();

		store.delete("ABC-1").unwrap();
		store.delete("ABC-1").unwrap();
		assert!(store.is_empty());
	}

	#[test]
	fn test_unknown_token_has_no_code() {
		let store = MemoryBookingStore::new();
		store.put(create_test_booking("ABC-1", 20.0)).unwrap();
		assert_eq!(store.get_by_token("ABC-1"), None);
		assert_eq!(store.get_by_token(""), None);
	}

	#[test]
	fn test_concurrent_puts_are_not_lost() {
		let store = Arc::new(MemoryBookingStore::new());
		let writers = 8;
		let per_writer = 250;

		let handles: Vec<_> = (0..writers)
			.map(|w| {
				let store = store.clone();
				thread::spawn(move || {
					for i in 0..per_writer {
						let code = format!("ABC-{}-{}", w, i);
						store
							.put(create_test_booking(&code, (w * per_writer + i) as f64))
							.unwrap();
						// Interleave reads with writes on the other threads.
						let _ = store.get(&code).unwrap();
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		assert_eq!(store.len(), writers * per_writer);
		for w in 0..writers {
			for i in 0..per_writer {
				let code = format!("ABC-{}-{}", w, i);
				let booking = store.get(&code).unwrap();
				assert_eq!(booking, create_test_booking(&code, (w * per_writer + i) as f64));
			}
		}
	}
}
