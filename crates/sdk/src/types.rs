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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lng: f64,
}

impl GeoPoint {
	pub const fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}
}

/// Booking lifecycle state
///
/// The only transition is `Allocating -> Allocated`. There is no
/// cancellation or failure state: a booking that never matches stays
/// `Allocating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
	Allocating,
	Allocated,
}

/// Request to give food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiveRequest {
	#[serde(rename = "cityID")]
	pub city_id: i64,
	#[serde(rename = "userID")]
	pub user_id: i64,
	/// Free-text description of what is offered
	#[serde(default)]
	pub item: String,
	#[serde(rename = "latitude")]
	pub lat: f64,
	#[serde(rename = "longitude")]
	pub lng: f64,
	/// Offered quantity in kilograms
	#[serde(rename = "weight")]
	pub weight_kg: f64,
	/// Accepted but not used by allocation
	#[serde(rename = "expire", default)]
	pub expire_time: i64,
}

/// Daily availability window of a receiver, as offsets from midnight in seconds
///
/// Stored with the demand record but not consulted when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
	#[serde(rename = "startTime")]
	pub start_secs: u32,
	#[serde(rename = "endTime")]
	pub end_secs: u32,
}

impl TimeRange {
	/// Seconds in a day; the upper bound of any range
	pub const DAY_SECS: u32 = 24 * 60 * 60;

	pub const fn whole_day() -> Self {
		Self {
			start_secs: 0,
			end_secs: Self::DAY_SECS,
		}
	}
}

/// Request to register (or re-register) a receiver's standing demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveRegisterRequest {
	#[serde(rename = "cityID")]
	pub city_id: i64,
	#[serde(rename = "userID")]
	pub user_id: i64,
	#[serde(rename = "latitude")]
	pub lat: f64,
	#[serde(rename = "longitude")]
	pub lng: f64,
	/// Amount of food, in meal sets for one adult
	pub demand: f64,
	#[serde(rename = "timeRanges", default)]
	pub time_ranges: Vec<TimeRange>,
}

/// One hit of a radius query against the geo index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
	/// Member key, e.g. `user:42`
	pub name: String,
	/// Distance from the query center in kilometers
	pub distance: f64,
	pub coord: GeoPoint,
	/// 52-bit interleaved geohash reported by the index
	pub hash: i64,
}

/// Driver and pickup details written on a successful match
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
	pub driver_name: String,
	pub driver_phone_number: String,
	pub plate_number: String,
	/// Microseconds since the Unix epoch
	pub pick_up_time: i64,
	pub demand_id: i64,
}

/// Error returned by an invalid booking state transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
	#[error("Booking already allocated: {0}")]
	AlreadyAllocated(String),
}

/// One supply-to-demand allocation attempt
///
/// This is also the response body of `POST /give` and `GET /give/current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
	/// Generator-assigned code, immutable
	pub pre_book_code: String,
	pub item: String,
	pub state: BookingState,
	/// Offered quantity in kilograms
	pub weight: f64,
	pub driver_name: String,
	pub driver_phone_number: String,
	pub plate_number: String,
	/// Microseconds since the Unix epoch, 0 until allocated
	pub pick_up_time: i64,
	/// Matched receiver's user id, 0 until allocated
	#[serde(rename = "demandID")]
	pub demand_id: i64,
	#[serde(rename = "cityID")]
	pub city_id: i64,
	pub pick_up: GeoPoint,
	pub drop_off: Option<GeoPoint>,
}

impl BookingRecord {
	/// Build a fresh booking in the `Allocating` state
	pub fn allocating(
		pre_book_code: impl Into<String>,
		item: impl Into<String>,
		weight: f64,
		city_id: i64,
		pick_up: GeoPoint,
	) -> Self {
		Self {
			pre_book_code: pre_book_code.into(),
			item: item.into(),
			state: BookingState::Allocating,
			weight,
			driver_name: String::new(),
			driver_phone_number: String::new(),
			plate_number: String::new(),
			pick_up_time: 0,
			demand_id: 0,
			city_id,
			pick_up,
			drop_off: None,
		}
	}

	pub fn is_allocated(&self) -> bool {
		self.state == BookingState::Allocated
	}

	/// Advance the booking to `Allocated`
	///
	/// Fails without touching the record if it is already allocated.
	pub fn mark_allocated(&mut self, assignment: Assignment) -> Result<(), TransitionError> {
		if self.is_allocated() {
			return Err(TransitionError::AlreadyAllocated(self.pre_book_code.clone()));
		}

		self.state = BookingState::Allocated;
		self.driver_name = assignment.driver_name;
		self.driver_phone_number = assignment.driver_phone_number;
		self.plate_number = assignment.plate_number;
		self.pick_up_time = assignment.pick_up_time;
		self.demand_id = assignment.demand_id;
		Ok(())
	}
}
