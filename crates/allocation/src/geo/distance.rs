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

use crate::types::GeoPoint;

/// Earth radius used by Redis geo commands, in kilometers
const EARTH_RADIUS_KM: f64 = 6372.797560856;

/// Latitude bounds of the Redis geo encoding (Web Mercator limits)
pub const GEO_LAT_MIN: f64 = -85.05112878;
pub const GEO_LAT_MAX: f64 = 85.05112878;
pub const GEO_LNG_MIN: f64 = -180.0;
pub const GEO_LNG_MAX: f64 = 180.0;

/// Bits per axis of the 52-bit geohash
const GEO_STEP: u32 = 26;

/// Great-circle distance between two points in kilometers
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
	let lat1_rad = a.lat.to_radians();
	let lat2_rad = b.lat.to_radians();
	let delta_lat = (b.lat - a.lat).to_radians();
	let delta_lng = (b.lng - a.lng).to_radians();

	let h = (delta_lat / 2.0).sin().powi(2)
		+ lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);

	2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Whether a point can be stored in the geo index
pub fn is_indexable(point: GeoPoint) -> bool {
	(GEO_LAT_MIN..=GEO_LAT_MAX).contains(&point.lat)
		&& (GEO_LNG_MIN..=GEO_LNG_MAX).contains(&point.lng)
}

/// 52-bit interleaved geohash, bit-compatible with the Redis sorted-set score
///
/// Latitude bits occupy the even positions, longitude bits the odd ones.
/// Points outside the indexable range are clamped to the nearest cell.
pub fn geohash_52(point: GeoPoint) -> i64 {
	let cells = (1u64 << GEO_STEP) as f64;
	let max_cell = (1u32 << GEO_STEP) - 1;

	let lat_offset = (point.lat - GEO_LAT_MIN) / (GEO_LAT_MAX - GEO_LAT_MIN) * cells;
	let lng_offset = (point.lng - GEO_LNG_MIN) / (GEO_LNG_MAX - GEO_LNG_MIN) * cells;

	let lat_cell = (lat_offset.max(0.0) as u32).min(max_cell);
	let lng_cell = (lng_offset.max(0.0) as u32).min(max_cell);

	interleave(lat_cell, lng_cell) as i64
}

fn interleave(even: u32, odd: u32) -> u64 {
	let mut bits = 0u64;
	for i in 0..GEO_STEP {
		bits |= u64::from((even >> i) & 1) << (2 * i);
		bits |= u64::from((odd >> i) & 1) << (2 * i + 1);
	}
	bits
}
