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

pub use gcs_sdk::types::{
	Assignment, BookingRecord, BookingState, GeoLocation, GeoPoint, ReceiveRegisterRequest,
	TimeRange,
};
use serde::{Deserialize, Serialize};

/// Prefix of the per-city geo index namespace
pub const CITY_KEY_PREFIX: &str = "city:";

/// Prefix of the per-user member key (also the payload key)
pub const MEMBER_KEY_PREFIX: &str = "user:";

/// Standing offer of a receiver to take food
///
/// Identity is `(city_id, user_id)`. Re-registering the same identity
/// overwrites the previous record; there is no version check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
	pub city_id: i64,
	pub user_id: i64,
	pub lat: f64,
	pub lng: f64,
	/// Requested quantity; the basis of the weight-compatibility window
	pub demand: f64,
	/// Carried along with the record, never consulted by matching
	pub time_ranges: Vec<TimeRange>,
}

impl DemandRecord {
	pub fn location(&self) -> GeoPoint {
		GeoPoint::new(self.lat, self.lng)
	}

	pub fn namespace(&self) -> String {
		city_key(self.city_id)
	}

	pub fn member_key(&self) -> String {
		member_key(self.user_id)
	}
}

impl From<ReceiveRegisterRequest> for DemandRecord {
	fn from(req: ReceiveRegisterRequest) -> Self {
		Self {
			city_id: req.city_id,
			user_id: req.user_id,
			lat: req.lat,
			lng: req.lng,
			demand: req.demand,
			time_ranges: req.time_ranges,
		}
	}
}

/// Geo index namespace for a city, e.g. `city:1`
pub fn city_key(city_id: i64) -> String {
	format!("{}{}", CITY_KEY_PREFIX, city_id)
}

/// Member key for a receiver, e.g. `user:42`
pub fn member_key(user_id: i64) -> String {
	format!("{}{}", MEMBER_KEY_PREFIX, user_id)
}

/// Extract the numeric user id from a member key
///
/// Returns `None` when the key does not follow the `user:{id}` scheme.
pub fn parse_member_key(key: &str) -> Option<i64> {
	key.strip_prefix(MEMBER_KEY_PREFIX)?.parse().ok()
}
