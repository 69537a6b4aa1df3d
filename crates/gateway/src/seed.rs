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

use gcs_allocation::{DemandRecord, DemandRegistry, RegistryError, TimeRange};
use tracing::info;

/// (user id, latitude, longitude, demand) of the demo receivers in city 1
const DEMO_RECEIVERS: [(i64, f64, f64, f64); 6] = [
	(1, 1.29396, 103.85334, 20.0),
	(2, 1.2973, 103.85106, 40.0),
	(3, 1.29436, 103.84903, 20.0),
	(4, 1.30483, 103.82387, 30.0),
	(5, 1.32094, 103.90547, 10.0),
	(6, 1.32064, 103.91009, 100.0),
];

const DEMO_CITY_ID: i64 = 1;

pub fn demo_receivers() -> Vec<DemandRecord> {
	DEMO_RECEIVERS
		.iter()
		.map(|&(user_id, lat, lng, demand)| DemandRecord {
			city_id: DEMO_CITY_ID,
			user_id,
			lat,
			lng,
			demand,
			time_ranges: vec![TimeRange::whole_day()],
		})
		.collect()
}

/// Register the demo receivers, overwriting any earlier registration
pub async fn seed_demo_receivers(registry: &DemandRegistry) -> Result<usize, RegistryError> {
	let receivers = demo_receivers();
	for receiver in &receivers {
		registry.register(receiver).await?;
	}

	info!(target: "server", count = receivers.len(), "Demo receivers registered");
	Ok(receivers.len())
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use gcs_allocation::{GeoPoint, MemoryGeoIndex};

	use super::*;

	#[tokio::test]
	async fn test_seed_registers_all_receivers() {
		let index = Arc::new(MemoryGeoIndex::new());
		let registry = DemandRegistry::new(index.clone());

		assert_eq!(seed_demo_receivers(&registry).await.unwrap(), 6);
		// Seeding twice leaves the same six members
		seed_demo_receivers(&registry).await.unwrap();
		assert_eq!(index.member_count("city:1"), 6);

		let nearby = registry
			.list(1, GeoPoint::new(1.29396, 103.85334), 3.0)
			.await
			.unwrap();
		assert_eq!(nearby[0].name, "user:1");
		assert_eq!(nearby.len(), 3);
	}
}
