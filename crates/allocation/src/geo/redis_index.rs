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

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use redis::Value;
use tracing::debug;

use super::{GeoIndex, GeoIndexError};
use crate::{
	codegen::Counter,
	types::{GeoLocation, GeoPoint},
};

/// Maximum pooled connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Wait/create/recycle timeout for pooled connections
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(1);

/// Redis-backed geo index and booking counter
///
/// Locations live in one sorted set per namespace (`GEOADD`), payloads in
/// plain string keys (`SET`/`GET`) and counters in integer keys (`INCR`).
/// A connection is checked out of the pool for each call and returned when
/// the call's scope ends, on success and error paths alike.
#[derive(Clone)]
pub struct RedisGeoIndex {
	pool: Pool,
}

impl RedisGeoIndex {
	/// Build a pool for `redis_url` with the default limits
	///
	/// No connection is opened until the first command.
	pub fn new(redis_url: &str) -> Result<Self, GeoIndexError> {
		Self::with_pool_size(redis_url, DEFAULT_MAX_CONNECTIONS)
	}

	pub fn with_pool_size(redis_url: &str, max_connections: usize) -> Result<Self, GeoIndexError> {
		let mut cfg = Config::from_url(redis_url);
		let mut pool_cfg = PoolConfig::new(max_connections);
		pool_cfg.timeouts.wait = Some(DEFAULT_CONNECTION_TIMEOUT);
		pool_cfg.timeouts.create = Some(DEFAULT_CONNECTION_TIMEOUT);
		pool_cfg.timeouts.recycle = Some(DEFAULT_CONNECTION_TIMEOUT);
		cfg.pool = Some(pool_cfg);

		let pool = cfg
			.create_pool(Some(Runtime::Tokio1))
			.map_err(|e| GeoIndexError::Connection(format!("Failed to create pool: {}", e)))?;
		Ok(Self { pool })
	}

	async fn conn(&self) -> Result<Connection, GeoIndexError> {
		self.pool
			.get()
			.await
			.map_err(|e| GeoIndexError::Connection(e.to_string()))
	}
}

fn command_error(e: redis::RedisError) -> GeoIndexError {
	GeoIndexError::Command(e.to_string())
}

#[async_trait]
impl GeoIndex for RedisGeoIndex {
	async fn upsert(
		&self,
		namespace: &str,
		point: GeoPoint,
		key: &str,
	) -> Result<(), GeoIndexError> {
		let mut conn = self.conn().await?;
		let added: i64 = redis::cmd("GEOADD")
			.arg(namespace)
			.arg(point.lng)
			.arg(point.lat)
			.arg(key)
			.query_async(&mut conn)
			.await
			.map_err(command_error)?;

		debug!(target: "geo", namespace, key, added, "GEOADD");
		Ok(())
	}

	async fn radius_query(
		&self,
		namespace: &str,
		center: GeoPoint,
		radius_km: f64,
	) -> Result<Vec<GeoLocation>, GeoIndexError> {
		let mut conn = self.conn().await?;
		let reply: Value = redis::cmd("GEORADIUS")
			.arg(namespace)
			.arg(center.lng)
			.arg(center.lat)
			.arg(radius_km)
			.arg("km")
			.arg("WITHCOORD")
			.arg("WITHDIST")
			.arg("WITHHASH")
			.arg("ASC")
			.query_async(&mut conn)
			.await
			.map_err(command_error)?;

		parse_geo_locations(reply)
	}

	async fn get_payload(&self, key: &str) -> Result<Option<Vec<u8>>, GeoIndexError> {
		let mut conn = self.conn().await?;
		redis::cmd("GET")
			.arg(key)
			.query_async(&mut conn)
			.await
			.map_err(command_error)
	}

	async fn put_payload(&self, key: &str, payload: &[u8]) -> Result<(), GeoIndexError> {
		let mut conn = self.conn().await?;
		redis::cmd("SET")
			.arg(key)
			.arg(payload)
			.query_async(&mut conn)
			.await
			.map_err(command_error)
	}
}

#[async_trait]
impl Counter for RedisGeoIndex {
	async fn increment(&self, key: &str) -> Result<i64, GeoIndexError> {
		let mut conn = self.conn().await?;
		redis::cmd("INCR")
			.arg(key)
			.query_async(&mut conn)
			.await
			.map_err(command_error)
	}
}

/// Decode a `GEORADIUS ... WITHCOORD WITHDIST WITHHASH` reply
///
/// Each hit is an array whose first element is the member name; the
/// remaining elements are recognised by type: bulk string = distance,
/// integer = hash, nested array = `[lng, lat]`. Hits missing any of the
/// three are rejected.
pub fn parse_geo_locations(reply: Value) -> Result<Vec<GeoLocation>, GeoIndexError> {
	let items = match reply {
		Value::Bulk(items) => items,
		Value::Nil => return Ok(Vec::new()),
		other => {
			return Err(GeoIndexError::Protocol(format!(
				"expected array of hits, got {:?}",
				other
			)));
		}
	};

	items.into_iter().map(parse_geo_location).collect()
}

fn parse_geo_location(item: Value) -> Result<GeoLocation, GeoIndexError> {
	let fields = match item {
		Value::Bulk(fields) => fields,
		other => {
			return Err(GeoIndexError::Protocol(format!(
				"expected hit array, got {:?}",
				other
			)));
		}
	};
	if fields.is_empty() || fields.len() > 4 {
		return Err(GeoIndexError::Protocol(format!(
			"hit has {} fields",
			fields.len()
		)));
	}

	let mut fields = fields.into_iter();
	let name = match fields.next() {
		Some(Value::Data(bytes)) => String::from_utf8(bytes)
			.map_err(|e| GeoIndexError::Protocol(format!("member name: {}", e)))?,
		other => {
			return Err(GeoIndexError::Protocol(format!(
				"expected member name, got {:?}",
				other
			)));
		}
	};

	let mut distance = None;
	let mut hash = None;
	let mut coord = None;
	for field in fields {
		match field {
			Value::Int(h) => hash = Some(h),
			Value::Data(bytes) => distance = Some(parse_float(&bytes)?),
			Value::Bulk(pair) => coord = Some(parse_coord(pair)?),
			other => {
				return Err(GeoIndexError::Protocol(format!(
					"unexpected field in hit {}: {:?}",
					name, other
				)));
			}
		}
	}

	match (distance, hash, coord) {
		(Some(distance), Some(hash), Some(coord)) => Ok(GeoLocation {
			name,
			distance,
			coord,
			hash,
		}),
		_ => Err(GeoIndexError::Protocol(format!(
			"hit {} is missing distance, hash or coordinates",
			name
		))),
	}
}

fn parse_coord(pair: Vec<Value>) -> Result<GeoPoint, GeoIndexError> {
	match pair.as_slice() {
		[Value::Data(lng), Value::Data(lat)] => {
			Ok(GeoPoint::new(parse_float(lat)?, parse_float(lng)?))
		}
		_ => Err(GeoIndexError::Protocol(format!(
			"expected [lng, lat], got {:?}",
			pair
		))),
	}
}

fn parse_float(bytes: &[u8]) -> Result<f64, GeoIndexError> {
	std::str::from_utf8(bytes)
		.ok()
		.and_then(|s| s.parse().ok())
		.ok_or_else(|| {
			GeoIndexError::Protocol(format!(
				"invalid float: {}",
				String::from_utf8_lossy(bytes)
			))
		})
}
