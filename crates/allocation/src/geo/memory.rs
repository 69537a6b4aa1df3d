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

use async_trait::async_trait;
use dashmap::DashMap;

use super::{GeoIndex, GeoIndexError, distance};
use crate::types::{GeoLocation, GeoPoint};

/// In-process geo index
///
/// Mirrors the observable behaviour of the Redis adapter: same coordinate
/// limits, same distance formula and hash encoding, ascending results.
/// Suitable for development, tests and single-instance deployments.
#[derive(Default)]
pub struct MemoryGeoIndex {
	/// Namespace -> (member key -> location)
	namespaces: DashMap<String, HashMap<String, GeoPoint>>,
	/// Member key -> opaque payload
	payloads: DashMap<String, Vec<u8>>,
}

impl MemoryGeoIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of members registered in a namespace
	pub fn member_count(&self, namespace: &str) -> usize {
		self.namespaces
			.get(namespace)
			.map(|members| members.len())
			.unwrap_or(0)
	}
}

#[async_trait]
impl GeoIndex for MemoryGeoIndex {
	async fn upsert(
		&self,
		namespace: &str,
		point: GeoPoint,
		key: &str,
	) -> Result<(), GeoIndexError> {
		if !distance::is_indexable(point) {
			return Err(GeoIndexError::InvalidCoordinates {
				lat: point.lat,
				lng: point.lng,
			});
		}

		self.namespaces
			.entry(namespace.to_string())
			.or_default()
			.insert(key.to_string(), point);
		Ok(())
	}

	async fn radius_query(
		&self,
		namespace: &str,
		center: GeoPoint,
		radius_km: f64,
	) -> Result<Vec<GeoLocation>, GeoIndexError> {
		let Some(members) = self.namespaces.get(namespace) else {
			return Ok(Vec::new());
		};

		let mut hits: Vec<GeoLocation> = members
			.iter()
			.filter_map(|(key, point)| {
				let distance = distance::haversine_km(center, *point);
				(distance <= radius_km).then(|| GeoLocation {
					name: key.clone(),
					distance,
					coord: *point,
					hash: distance::geohash_52(*point),
				})
			})
			.collect();
		drop(members);

		hits.sort_by(|a, b| {
			a.distance
				.total_cmp(&b.distance)
				.then_with(|| a.name.cmp(&b.name))
		});
		Ok(hits)
	}

	async fn get_payload(&self, key: &str) -> Result<Option<Vec<u8>>, GeoIndexError> {
		Ok(self.payloads.get(key).map(|payload| payload.clone()))
	}

	async fn put_payload(&self, key: &str, payload: &[u8]) -> Result<(), GeoIndexError> {
		self.payloads.insert(key.to_string(), payload.to_vec());
		Ok(())
	}
}
