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

//! Geo index contract consumed by the allocator
//!
//! The index holds, per city namespace, a set of `(point, member key)`
//! pairs plus an opaque payload per member key. The allocator relies on
//! radius queries coming back nearest-first and never re-sorts them.
//!
//! Adapters:
//! - [`RedisGeoIndex`]: `GEOADD` / `GEORADIUS` / `GET` / `SET` / `INCR` over a pooled connection
//! - [`MemoryGeoIndex`]: in-process maps with Redis-compatible distances and hashes
//!
//! Neither adapter retries. Callers see every backend failure as a
//! [`GeoIndexError`].

mod distance;
mod memory;
mod redis_index;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{GeoLocation, GeoPoint};
pub use distance::{geohash_52, haversine_km, is_indexable};
pub use memory::MemoryGeoIndex;
pub use redis_index::{RedisGeoIndex, parse_geo_locations};

/// Error types for geo index operations
#[derive(Debug, Error)]
pub enum GeoIndexError {
	#[error("Geo index connection error: {0}")]
	Connection(String),
	#[error("Geo index command error: {0}")]
	Command(String),
	#[error("Unexpected geo index reply: {0}")]
	Protocol(String),
	#[error("Invalid coordinates: lat={lat}, lng={lng}")]
	InvalidCoordinates { lat: f64, lng: f64 },
}

/// Geo index adapter
#[async_trait]
pub trait GeoIndex: Send + Sync {
	/// Register or move `key` to `point` within `namespace`
	///
	/// Idempotent; a second call with the same key replaces the location.
	async fn upsert(
		&self,
		namespace: &str,
		point: GeoPoint,
		key: &str,
	) -> Result<(), GeoIndexError>;

	/// Members of `namespace` within `radius_km` of `center`
	///
	/// Results carry distance, coordinates and hash and are sorted by
	/// ascending distance.
	async fn radius_query(
		&self,
		namespace: &str,
		center: GeoPoint,
		radius_km: f64,
	) -> Result<Vec<GeoLocation>, GeoIndexError>;

	/// Opaque payload stored under `key`, if any
	async fn get_payload(&self, key: &str) -> Result<Option<Vec<u8>>, GeoIndexError>;

	/// Store the opaque payload for `key`, replacing any previous value
	async fn put_payload(&self, key: &str, payload: &[u8]) -> Result<(), GeoIndexError>;
}
