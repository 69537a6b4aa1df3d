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

use reqwest::{Client as ReqwestClient, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::{BookingRecord, GeoLocation, GiveRequest, ReceiveRegisterRequest};

/// Error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Server error: {0}")]
	Server(String),
	#[error("Client setup error: {0}")]
	Setup(String),
}

/// Client for interacting with the GCS gateway
///
/// This is an async client interface using reqwest for HTTP communication.
pub struct Client {
	base_url: String,
	client: ReqwestClient,
}

impl Client {
	/// Create a new client with the given base URL and a 30s timeout
	pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
		Self::with_config(base_url, Duration::from_secs(30))
	}

	/// Create a new client with custom request timeout
	pub fn with_config(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ClientError::Setup(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			client,
		})
	}

	/// Offer food for allocation
	///
	/// The returned booking is still `Allocating`; poll [`Client::current`]
	/// to observe the outcome.
	pub async fn give(&self, request: &GiveRequest) -> Result<BookingRecord, ClientError> {
		let url = format!("{}/give", self.base_url);
		let response = self
			.client
			.post(&url)
			.json(request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::parse_json(response).await
	}

	/// Fetch the current state of a booking
	pub async fn current(&self, pre_book_code: &str) -> Result<BookingRecord, ClientError> {
		let url = format!("{}/give/current", self.base_url);
		let response = self
			.client
			.get(&url)
			.query(&[("preBookCode", pre_book_code)])
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::parse_json(response).await
	}

	/// Register or update a receiver's demand
	pub async fn register(&self, request: &ReceiveRegisterRequest) -> Result<(), ClientError> {
		let url = format!("{}/receive/register", self.base_url);
		let response = self
			.client
			.post(&url)
			.json(request)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::check_status(response).await.map(|_| ())
	}

	/// List registered receivers of a city
	pub async fn list(&self, city_id: i64) -> Result<Vec<GeoLocation>, ClientError> {
		let url = format!("{}/receive/list", self.base_url);
		let response = self
			.client
			.get(&url)
			.query(&[("cityID", city_id)])
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::parse_json(response).await
	}

	/// Confirm a delivery by token
	pub async fn confirm(&self, token: &str) -> Result<(), ClientError> {
		let url = format!("{}/receive/confirm", self.base_url);
		let response = self
			.client
			.get(&url)
			.query(&[("token", token)])
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Self::check_status(response).await.map(|_| ())
	}

	/// Check gateway health
	pub async fn health_check(&self) -> Result<bool, ClientError> {
		let url = format!("{}/health", self.base_url);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| ClientError::Network(format!("Request failed: {}", e)))?;

		Ok(response.status().is_success())
	}

	async fn check_status(response: Response) -> Result<Response, ClientError> {
		if response.status().is_success() {
			return Ok(response);
		}

		let status = response.status();
		let error_text = response
			.text()
			.await
			.unwrap_or_else(|_| format!("HTTP {}", status));
		Err(ClientError::Server(format!("{}: {}", status, error_text)))
	}

	async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
		Self::check_status(response)
			.await?
			.json()
			.await
			.map_err(|e| ClientError::Serialization(format!("Failed to parse response: {}", e)))
	}
}

/// Synchronous client wrapper
///
/// This wraps the async client and runs it in a tokio runtime.
/// For new code, prefer using the async Client directly.
pub struct SyncClient {
	client: Client,
	runtime: tokio::runtime::Runtime,
}

impl SyncClient {
	pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
		let runtime = tokio::runtime::Runtime::new()
			.map_err(|e| ClientError::Setup(format!("Failed to create tokio runtime: {}", e)))?;
		Ok(Self {
			client: Client::new(base_url)?,
			runtime,
		})
	}

	pub fn give(&self, request: &GiveRequest) -> Result<BookingRecord, ClientError> {
		self.runtime.block_on(self.client.give(request))
	}

	pub fn current(&self, pre_book_code: &str) -> Result<BookingRecord, ClientError> {
		self.runtime.block_on(self.client.current(pre_book_code))
	}

	pub fn register(&self, request: &ReceiveRegisterRequest) -> Result<(), ClientError> {
		self.runtime.block_on(self.client.register(request))
	}
}
