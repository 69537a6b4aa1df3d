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

//! Allocation Engine
//!
//! Matches one booking against the registered demand of its city:
//!
//! 1. Radius query around the pickup point, nearest first
//! 2. Walk the candidates in index order, decoding each demand payload
//! 3. The first candidate inside the weight window wins
//! 4. Advance the booking to `Allocated`, persist it, notify
//!
//! The matched demand is not reserved or decremented. Two bookings that
//! are allocated concurrently may both land on the same receiver.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::AllocationConfig;
use crate::geo::{GeoIndex, GeoIndexError};
use crate::notify::{Notification, NotificationSink};
use crate::store::{BookingStore, StoreError};
use crate::types::{Assignment, BookingRecord, GeoLocation, city_key, parse_member_key};
use gcs_sdk::TransitionError;

/// Lower bound of the weight window, as a fraction of demand (exclusive)
const WEIGHT_LOWER_RATIO: f64 = 0.6;
/// Upper bound of the weight window, as a fraction of demand (exclusive)
const WEIGHT_UPPER_RATIO: f64 = 1.5;

/// Error types for allocation attempts
#[derive(Debug, Error)]
pub enum AllocationError {
	#[error("No compatible demand within range")]
	NoMatch,
	#[error("Geo index error: {0}")]
	Transport(#[from] GeoIndexError),
	#[error("Booking store error: {0}")]
	Store(#[from] StoreError),
	#[error("Invalid state transition: {0}")]
	Transition(#[from] TransitionError),
	#[error("Pickup offset of {0}s is out of range")]
	PickUpOffset(u64),
}

/// Driver details written onto every allocated booking
#[derive(Debug, Clone, PartialEq)]
pub struct DriverIdentity {
	pub name: String,
	pub phone_number: String,
	pub plate_number: String,
}

/// Whether an offer of `weight` fits a receiver asking for `demand`
///
/// Both bounds are strict: `0.6 * demand < weight < 1.5 * demand`.
pub fn weight_compatible(weight: f64, demand: f64) -> bool {
	weight > demand * WEIGHT_LOWER_RATIO && weight < demand * WEIGHT_UPPER_RATIO
}

/// Candidate picked by the selection pass
struct Selected {
	demand_id: i64,
	distance: f64,
}

pub struct Allocator {
	index: Arc<dyn GeoIndex>,
	store: Arc<dyn BookingStore>,
	notifier: Arc<dyn NotificationSink>,
	config: AllocationConfig,
}

impl Allocator {
	pub fn new(
		index: Arc<dyn GeoIndex>,
		store: Arc<dyn BookingStore>,
		notifier: Arc<dyn NotificationSink>,
		config: AllocationConfig,
	) -> Self {
		Self {
			index,
			store,
			notifier,
			config,
		}
	}

	pub fn config(&self) -> &AllocationConfig {
		&self.config
	}

	/// Run one allocation attempt for `booking`
	///
	/// On success the stored record is `Allocated` and carries the driver,
	/// the pickup time and the matched demand id. On any error the stored
	/// record is left untouched. A failed notification is logged and does
	/// not change the result.
	pub async fn allocate(&self, mut booking: BookingRecord) -> Result<BookingRecord, AllocationError> {
		let namespace = city_key(booking.city_id);
		let candidates = self
			.index
			.radius_query(&namespace, booking.pick_up, self.config.search_radius_km)
			.await?;

		debug!(
			target: "allocation",
			code = %booking.pre_book_code,
			candidates = candidates.len(),
			"Candidates selected"
		);

		let selected = self
			.select_candidate(booking.weight, &candidates)
			.await?
			.ok_or(AllocationError::NoMatch)?;

		let pick_up_time = self.pick_up_time()?;
		let driver = self.config.driver();
		booking.mark_allocated(Assignment {
			driver_name: driver.name,
			driver_phone_number: driver.phone_number,
			plate_number: driver.plate_number,
			pick_up_time,
			demand_id: selected.demand_id,
		})?;

		self.store.put(booking.clone())?;

		info!(
			target: "allocation",
			code = %booking.pre_book_code,
			demand_id = selected.demand_id,
			distance_km = selected.distance,
			"Booking allocated"
		);

		let message = Notification::allocation_summary(
			&booking,
			&self.config.notify_recipient,
			&self.config.confirm_url,
		);
		if let Err(e) = self.notifier.send(message).await {
			warn!(
				target: "allocation",
				code = %booking.pre_book_code,
				error = %e,
				"Match notification failed"
			);
		}

		Ok(booking)
	}

	/// Pickup time in microseconds since the epoch, one offset from now
	fn pick_up_time(&self) -> Result<i64, AllocationError> {
		let offset_secs = self.config.pick_up_offset_secs;
		chrono::Duration::from_std(self.config.pick_up_offset())
			.ok()
			.and_then(|offset| Utc::now().checked_add_signed(offset))
			.map(|at| at.timestamp_micros())
			.ok_or(AllocationError::PickUpOffset(offset_secs))
	}

	/// First candidate, in index order, whose demand fits `weight`
	async fn select_candidate(
		&self,
		weight: f64,
		candidates: &[GeoLocation],
	) -> Result<Option<Selected>, AllocationError> {
		for candidate in candidates {
			let Some(demand_id) = parse_member_key(&candidate.name) else {
				warn!(target: "allocation", member = %candidate.name, "Skipping malformed member key");
				continue;
			};

			let Some(payload) = self.index.get_payload(&candidate.name).await? else {
				warn!(target: "allocation", member = %candidate.name, "Skipping member without demand payload");
				continue;
			};

			let demand = match codec::decode_demand(&payload) {
				Ok(demand) => demand,
				Err(e) => {
					warn!(target: "allocation", member = %candidate.name, error = %e, "Skipping undecodable demand");
					continue;
				}
			};

			if weight_compatible(weight, demand.demand) {
				return Ok(Some(Selected {
					demand_id,
					distance: candidate.distance,
				}));
			}

			debug!(
				target: "allocation",
				member = %candidate.name,
				demand = demand.demand,
				weight,
				"Filtered out"
			);
		}

		Ok(None)
	}
}
