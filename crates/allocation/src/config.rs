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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::allocator::DriverIdentity;

/// Longest accepted pickup offset (one year)
pub const MAX_PICK_UP_OFFSET_SECS: u64 = 366 * 24 * 60 * 60;

/// Allocation engine configuration
///
/// Every field falls back to its default when absent, so a partial
/// environment or file is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
	/// Radius of the candidate search around the pickup point
	pub search_radius_km: f64,
	/// Pickup time is set this far after the moment of allocation
	pub pick_up_offset_secs: u64,
	/// Number of allocation workers draining the queue
	pub allocation_workers: usize,
	/// Maximum number of pending allocation jobs
	pub queue_capacity: usize,
	/// Prefix of every booking code
	pub code_prefix: String,
	/// Counter key backing the code sequence
	pub counter_key: String,
	pub driver_name: String,
	pub driver_phone_number: String,
	pub plate_number: String,
	/// Destination of match notifications
	pub notify_recipient: String,
	/// Link placed at the top of every match notification
	pub confirm_url: String,
}

impl Default for AllocationConfig {
	fn default() -> Self {
		Self {
			search_radius_km: 3.0,
			pick_up_offset_secs: 60,
			allocation_workers: 4,
			queue_capacity: 1024,
			code_prefix: "ABC-".to_string(),
			counter_key: "booking:count".to_string(),
			driver_name: "Driver A".to_string(),
			driver_phone_number: "+6593004400".to_string(),
			plate_number: String::new(),
			notify_recipient: "receiver@gcs.local".to_string(),
			confirm_url: "http://localhost:8080/receive/confirm".to_string(),
		}
	}
}

impl AllocationConfig {
	/// Load configuration from `GCS_*` environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("GCS").try_parsing(true))
			.build()?;

		cfg.try_deserialize::<Self>()?.validated()
	}

	/// Load configuration from file, with environment variables taking precedence
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("GCS").try_parsing(true))
			.build()?;

		cfg.try_deserialize::<Self>()?.validated()
	}

	fn validated(self) -> Result<Self, config::ConfigError> {
		if self.pick_up_offset_secs > MAX_PICK_UP_OFFSET_SECS {
			return Err(config::ConfigError::Message(format!(
				"pick_up_offset_secs must be at most {}, got {}",
				MAX_PICK_UP_OFFSET_SECS, self.pick_up_offset_secs
			)));
		}
		Ok(self)
	}

	pub fn pick_up_offset(&self) -> Duration {
		Duration::from_secs(self.pick_up_offset_secs)
	}

	/// Placeholder driver assigned to every allocation
	pub fn driver(&self) -> DriverIdentity {
		DriverIdentity {
			name: self.driver_name.clone(),
			phone_number: self.driver_phone_number.clone(),
			plate_number: self.plate_number.clone(),
		}
	}
}
