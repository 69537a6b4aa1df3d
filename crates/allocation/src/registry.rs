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

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::codec::{self, CodecError};
use crate::geo::{GeoIndex, GeoIndexError};
use crate::types::{DemandRecord, GeoLocation, GeoPoint, city_key};

/// Error types for demand registration
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("Geo index error: {0}")]
	Index(#[from] GeoIndexError),
	#[error("Codec error: {0}")]
	Codec(#[from] CodecError),
}

/// Write side of receiver demand
///
/// A registration places the receiver in its city namespace and stores
/// the encoded record under the member key. Both steps are last write
/// wins; if the second step fails the location is already updated while
/// the payload still holds the previous record.
pub struct DemandRegistry {
	index: Arc<dyn GeoIndex>,
}

impl DemandRegistry {
	pub fn new(index: Arc<dyn GeoIndex>) -> Self {
		Self { index }
	}

	pub async fn register(&self, record: &DemandRecord) -> Result<(), RegistryError> {
		let member = record.member_key();
		let payload = codec::encode_demand(record)?;

		self.index
			.upsert(&record.namespace(), record.location(), &member)
			.await?;
		self.index.put_payload(&member, &payload).await?;

		info!(
			target: "geo",
			city_id = record.city_id,
			user_id = record.user_id,
			demand = record.demand,
			"Receiver registered"
		);
		Ok(())
	}

	/// Registered receivers of a city within `radius_km` of `center`, nearest first
	pub async fn list(
		&self,
		city_id: i64,
		center: GeoPoint,
		radius_km: f64,
	) -> Result<Vec<GeoLocation>, RegistryError> {
		Ok(self
			.index
			.radius_query(&city_key(city_id), center, radius_km)
			.await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geo::MemoryGeoIndex;
	use crate::types::TimeRange;

	fn record(user_id: i64, lat: f64, lng: f64, demand: f64) -> DemandRecord {
		DemandRecord {
			city_id: 1,
			user_id,
			lat,
			lng,
			demand,
			time_ranges: vec![TimeRange::whole_day()],
		}
	}

	#[tokio::test]
	async fn test_register_stores_location_and_payload() {
		let index = Arc::new(MemoryGeoIndex::new());
		let registry = DemandRegistry::new(index.clone());
		let demand = record(7, 1.29396, 103.85334, 40.0);

		registry.register(&demand).await.unwrap();

		let payload = index.get_payload("user:7").await.unwrap().unwrap();
		assert_eq!(codec::decode_demand(&payload).unwrap(), demand);

		let hits = registry
			.list(1, GeoPoint::new(1.29396, 103.85334), 1.0)
			.await
			.unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].name, "user:7");
	}

	#[tokio::test]
	async fn test_reregistration_keeps_one_entry() {
		let index = Arc::new(MemoryGeoIndex::new());
		let registry = DemandRegistry::new(index.clone());

		registry
			.register(&record(7, 1.30, 103.80, 40.0))
			.await
			.unwrap();
		let latest = record(7, 1.29396, 103.85334, 25.0);
		registry.register(&latest).await.unwrap();

		assert_eq!(index.member_count("city:1"), 1);
		let hits = registry
			.list(1, GeoPoint::new(1.29396, 103.85334), 0.5)
			.await
			.unwrap();
		assert_eq!(hits.len(), 1);

		let payload = index.get_payload("user:7").await.unwrap().unwrap();
		assert_eq!(codec::decode_demand(&payload).unwrap().demand, 25.0);
	}

	#[tokio::test]
	async fn test_swapped_coordinates_are_rejected() {
		let registry = DemandRegistry::new(Arc::new(MemoryGeoIndex::new()));
		let result = registry.register(&record(1, 103.85334, 1.29396, 20.0)).await;
		assert!(matches!(
			result,
			Err(RegistryError::Index(GeoIndexError::InvalidCoordinates { .. }))
		));
	}
}
