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

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::geo::GeoIndexError;

/// Error types for booking code generation
#[derive(Debug, Error)]
pub enum CodeGenError {
	#[error("Counter unavailable: {0}")]
	Counter(#[from] GeoIndexError),
}

/// Atomic, monotonically increasing counter
///
/// Each call to `increment` must add exactly one and return the new value,
/// atomically with respect to every other caller of the same key. Values
/// are never reused; gaps left by failed callers are allowed.
#[async_trait]
pub trait Counter: Send + Sync {
	async fn increment(&self, key: &str) -> Result<i64, GeoIndexError>;
}

/// In-process counter, one value per key
///
/// Starts every key at zero, so the first issued value is 1. State is lost
/// on restart; use the Redis backend when codes must survive restarts.
#[derive(Default)]
pub struct MemoryCounter {
	values: DashMap<String, i64>,
}

impl MemoryCounter {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Counter for MemoryCounter {
	async fn increment(&self, key: &str) -> Result<i64, GeoIndexError> {
		// The entry guard holds the shard lock for the read-modify-write.
		let mut value = self.values.entry(key.to_string()).or_insert(0);
		*value += 1;
		Ok(*value)
	}
}

/// Issues human-readable booking codes, e.g. `ABC-17`
///
/// Built once at startup; the counter handle it owns is not shared with
/// any other component.
pub struct CodeGenerator {
	counter: Arc<dyn Counter>,
	prefix: String,
	counter_key: String,
}

impl CodeGenerator {
	pub fn new(
		counter: Arc<dyn Counter>,
		prefix: impl Into<String>,
		counter_key: impl Into<String>,
	) -> Self {
		Self {
			counter,
			prefix: prefix.into(),
			counter_key: counter_key.into(),
		}
	}

	/// Issue the next booking code
	///
	/// On error no code was issued and the caller must not create a booking.
	pub async fn next(&self) -> Result<String, CodeGenError> {
		let count = self.counter.increment(&self.counter_key).await?;
		let code = format!("{}{}", self.prefix, count);
		debug!(target: "allocation::codegen", code = %code, "Issued booking code");
		Ok(code)
	}
}
