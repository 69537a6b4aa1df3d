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

use actix_web::{
	HttpRequest, HttpResponse, Responder,
	error::{JsonPayloadError, QueryPayloadError},
	http::{StatusCode, header::ContentType},
	web,
};
use gcs_allocation::{DemandRecord, RegistryError, StoreError};
use gcs_sdk::types::{GiveRequest, ReceiveRegisterRequest};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::{
	config::{LIST_CENTER, LIST_RADIUS_KM},
	dispatcher::DispatchError,
	server::GatewayState,
	validation::{self, ValidationError},
};

/// Error types for gateway operations
///
/// Every variant is reported as `500` with the message as plain text.
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("failed to read request: {0}")]
	BadRequest(String),
	#[error("invalid request: {0}")]
	Validation(#[from] ValidationError),
	#[error("{0}")]
	Dispatch(#[from] DispatchError),
	#[error("failed to get prebook data: {0}")]
	Store(#[from] StoreError),
	#[error("failed to update receivers: {0}")]
	Registry(#[from] RegistryError),
	#[error("token is invalid")]
	InvalidToken,
}

impl actix_web::ResponseError for GatewayError {
	fn status_code(&self) -> StatusCode {
		StatusCode::INTERNAL_SERVER_ERROR
	}

	fn error_response(&self) -> HttpResponse {
		HttpResponse::build(self.status_code())
			.insert_header(ContentType::plaintext())
			.body(self.to_string())
	}
}

/// Maps malformed JSON bodies onto the plain-text error response
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
	GatewayError::BadRequest(err.to_string()).into()
}

/// Maps malformed query strings onto the plain-text error response
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
	GatewayError::BadRequest(err.to_string()).into()
}

#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
	#[serde(rename = "preBookCode")]
	pub pre_book_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
	#[serde(rename = "cityID")]
	pub city_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
	#[serde(default)]
	pub token: String,
}

/// Health check endpoint
pub async fn health() -> impl Responder {
	HttpResponse::Ok().json(serde_json::json!({
		"status": "ok",
		"service": "gcs-gateway"
	}))
}

/// Accept a food offer
///
/// Responds `201` with the new `Allocating` booking. Allocation runs in
/// the background; poll `/give/current` for the result.
pub async fn give(
	state: web::Data<GatewayState>,
	request: web::Json<GiveRequest>,
) -> Result<HttpResponse, GatewayError> {
	validation::validate_give(&request)?;

	let booking = state.dispatcher.submit(request.into_inner()).await?;
	Ok(HttpResponse::Created().json(booking))
}

/// Current state of a booking
pub async fn give_current(
	state: web::Data<GatewayState>,
	query: web::Query<CurrentQuery>,
) -> Result<HttpResponse, GatewayError> {
	let booking = state.store.get(&query.pre_book_code)?;
	Ok(HttpResponse::Ok().json(booking))
}

/// Register or update a receiver's standing demand
pub async fn receive_register(
	state: web::Data<GatewayState>,
	request: web::Json<ReceiveRegisterRequest>,
) -> Result<HttpResponse, GatewayError> {
	validation::validate_register(&request)?;

	let record = DemandRecord::from(request.into_inner());
	state.registry.register(&record).await?;
	Ok(HttpResponse::Ok().finish())
}

/// Every receiver registered in a city, nearest to the reference point first
pub async fn receive_list(
	state: web::Data<GatewayState>,
	query: web::Query<ListQuery>,
) -> Result<HttpResponse, GatewayError> {
	let locations = state
		.registry
		.list(query.city_id, LIST_CENTER, LIST_RADIUS_KM)
		.await?;
	Ok(HttpResponse::Ok().json(locations))
}

/// Resolve a confirmation token
pub async fn receive_confirm(
	state: web::Data<GatewayState>,
	query: web::Query<ConfirmQuery>,
) -> Result<HttpResponse, GatewayError> {
	match state.store.get_by_token(&query.token) {
		Some(_) => Ok(HttpResponse::Ok().finish()),
		None => {
			warn!(target: "server", "Rejected confirmation token");
			Err(GatewayError::InvalidToken)
		}
	}
}

#[cfg(test)]
mod tests {
	use actix_web::{App, test};
	use gcs_allocation::{
		AllocationConfig, BookingRecord, BookingState, GeoLocation, QueueReceiver,
	};

	use super::*;
	use crate::{config::GatewayRuntimeConfig, routes, server::GatewayState};

	fn test_state() -> (web::Data<GatewayState>, QueueReceiver) {
		let (state, receiver) = GatewayState::in_memory(&AllocationConfig::default());
		(web::Data::new(state), receiver)
	}

	macro_rules! test_app {
		($state:expr) => {
			test::init_service(App::new().app_data($state.clone()).configure(|cfg| {
				routes::configure_routes(cfg, GatewayRuntimeConfig::default().max_body_bytes)
			}))
			.await
		};
	}

	#[actix_web::test]
	async fn test_give_returns_created_booking() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/give")
			.set_json(serde_json::json!({
				"cityID": 1,
				"userID": 7,
				"item": "rice",
				"latitude": 1.2966426,
				"longitude": 103.7742052,
				"weight": 20.0,
				"expire": 0
			}))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::CREATED);

		let booking: BookingRecord = test::read_body_json(resp).await;
		assert_eq!(booking.pre_book_code, "ABC-1");
		assert_eq!(booking.state, BookingState::Allocating);

		let req = test::TestRequest::get()
			.uri("/give/current?preBookCode=ABC-1")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
		let current: BookingRecord = test::read_body_json(resp).await;
		assert_eq!(current, booking);
	}

	#[actix_web::test]
	async fn test_malformed_body_is_plain_text_500() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/give")
			.insert_header(ContentType::json())
			.set_payload("{not json")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

		let body = test::read_body(resp).await;
		assert!(String::from_utf8_lossy(&body).starts_with("failed to read request"));
	}

	#[actix_web::test]
	async fn test_invalid_weight_is_rejected() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::post()
			.uri("/give")
			.set_json(serde_json::json!({
				"cityID": 1,
				"userID": 7,
				"latitude": 1.29,
				"longitude": 103.77,
				"weight": 0.0
			}))
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(state.store.get("ABC-1").is_err());
	}

	#[actix_web::test]
	async fn test_unknown_code_is_500() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::get()
			.uri("/give/current?preBookCode=ABC-404")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[actix_web::test]
	async fn test_register_then_list() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		for (user_id, lat) in [(1, 1.30), (2, 1.2967)] {
			let req = test::TestRequest::post()
				.uri("/receive/register")
				.set_json(serde_json::json!({
					"cityID": 1,
					"userID": user_id,
					"latitude": lat,
					"longitude": 103.7742,
					"demand": 20.0,
					"timeRanges": [{"startTime": 0, "endTime": 86400}]
				}))
				.to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::OK);
		}

		let req = test::TestRequest::get()
			.uri("/receive/list?cityID=1")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);

		let locations: Vec<GeoLocation> = test::read_body_json(resp).await;
		let names: Vec<_> = locations.iter().map(|l| l.name.as_str()).collect();
		assert_eq!(names, vec!["user:2", "user:1"]);
	}

	#[actix_web::test]
	async fn test_list_requires_city() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::get()
			.uri("/receive/list?cityID=abc")
			.to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[actix_web::test]
	async fn test_confirm_rejects_unknown_token() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		for uri in ["/receive/confirm?token=abc", "/receive/confirm"] {
			let req = test::TestRequest::get().uri(uri).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

			let body = test::read_body(resp).await;
			assert_eq!(&body[..], b"token is invalid");
		}
	}

	#[actix_web::test]
	async fn test_health() {
		let (state, _receiver) = test_state();
		let app = test_app!(state);

		let req = test::TestRequest::get().uri("/health").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);
	}
}
