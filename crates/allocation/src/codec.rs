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

//! Binary payload codec
//!
//! Demand payloads are stored next to the geo index entry as opaque bytes.
//! The encoding is `bincode`; it is not self-describing, so the record
//! shapes must stay field-for-field compatible between writer and reader.

use thiserror::Error;

use crate::types::{BookingRecord, DemandRecord};

#[derive(Debug, Error)]
pub enum CodecError {
	#[error("Failed to encode payload: {0}")]
	Encode(String),
	#[error("Failed to decode payload: {0}")]
	Decode(String),
}

pub fn encode_demand(record: &DemandRecord) -> Result<Vec<u8>, CodecError> {
	bincode::serialize(record).map_err(|e| CodecError::Encode(e.to_string()))
}

pub fn decode_demand(bytes: &[u8]) -> Result<DemandRecord, CodecError> {
	bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

pub fn encode_booking(record: &BookingRecord) -> Result<Vec<u8>, CodecError> {
	bincode::serialize(record).map_err(|e| CodecError::Encode(e.to_string()))
}

pub fn decode_booking(bytes: &[u8]) -> Result<BookingRecord, CodecError> {
	bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{Assignment, GeoPoint, TimeRange};

	#[test]
	fn test_demand_round_trip_keeps_time_ranges() {
		let record = DemandRecord {
			city_id: 1,
			user_id: 4,
			lat: 1.30483,
			lng: 103.82387,
			demand: 30.0,
			time_ranges: vec![
				TimeRange {
					start_secs: 8 * 3600,
					end_secs: 12 * 3600,
				},
				TimeRange::whole_day(),
			],
		};

		let bytes = encode_demand(&record).unwrap();
		assert_eq!(decode_demand(&bytes).unwrap(), record);
	}

	#[test]
	fn test_allocated_booking_round_trip() {
		let mut booking =
			BookingRecord::allocating("ABC-9", "noodles", 12.5, 2, GeoPoint::new(1.3, 103.8));
		booking
			.mark_allocated(Assignment {
				driver_name: "Driver A".to_string(),
				driver_phone_number: "+6593004400".to_string(),
				plate_number: String::new(),
				pick_up_time: 42,
				demand_id: 6,
			})
			.unwrap();

		let bytes = encode_booking(&booking).unwrap();
		assert_eq!(decode_booking(&bytes).unwrap(), booking);
	}

	#[test]
	fn test_truncated_payload_is_rejected() {
		let record = DemandRecord {
			city_id: 1,
			user_id: 1,
			lat: 1.0,
			lng: 103.0,
			demand: 20.0,
			time_ranges: Vec::new(),
		};
		let bytes = encode_demand(&record).unwrap();

		let result = decode_demand(&bytes[..bytes.len() / 2]);
		assert!(matches!(result, Err(CodecError::Decode(_))));
	}
}
