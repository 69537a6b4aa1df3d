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

//! Request validation for the gateway
//!
//! Rejects offers and registrations that could never take part in a
//! match. Nothing here looks at stored state.

use gcs_sdk::types::{GiveRequest, ReceiveRegisterRequest, TimeRange};
use thiserror::Error;

/// Error types for request validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
	#[error("Invalid weight: {0}")]
	InvalidWeight(f64),
	#[error("Invalid demand: {0}")]
	InvalidDemand(f64),
	#[error("Invalid coordinates: lat={lat}, lng={lng}")]
	InvalidCoordinates { lat: f64, lng: f64 },
	#[error("Invalid time range: {start}..{end}")]
	InvalidTimeRange { start: u32, end: u32 },
}

pub fn validate_give(request: &GiveRequest) -> Result<(), ValidationError> {
	if !is_positive(request.weight_kg) {
		return Err(ValidationError::InvalidWeight(request.weight_kg));
	}
	validate_coordinates(request.lat, request.lng)
}

pub fn validate_register(request: &ReceiveRegisterRequest) -> Result<(), ValidationError> {
	if !is_positive(request.demand) {
		return Err(ValidationError::InvalidDemand(request.demand));
	}
	validate_coordinates(request.lat, request.lng)?;
	request.time_ranges.iter().try_for_each(validate_time_range)
}

fn is_positive(value: f64) -> bool {
	value.is_finite() && value > 0.0
}

fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
	if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
		Ok(())
	} else {
		Err(ValidationError::InvalidCoordinates { lat, lng })
	}
}

fn validate_time_range(range: &TimeRange) -> Result<(), ValidationError> {
	if range.start_secs <= range.end_secs && range.end_secs <= TimeRange::DAY_SECS {
		Ok(())
	} else {
		Err(ValidationError::InvalidTimeRange {
			start: range.start_secs,
			end: range.end_secs,
		})
	}
}
