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

use actix_web::web;

use crate::handlers;

/// Configure HTTP routes for the gateway
///
/// - `/give`, `/give/current` - food offers and their bookings
/// - `/receive/register`, `/receive/list`, `/receive/confirm` - receivers
/// - `/health` - health check
///
/// Body and query extraction failures are answered like every other
/// error: `500` with a plain-text message.
pub fn configure_routes(cfg: &mut web::ServiceConfig, max_body_bytes: usize) {
	cfg.app_data(
		web::JsonConfig::default()
			.limit(max_body_bytes)
			.error_handler(handlers::json_error_handler),
	)
	.app_data(web::QueryConfig::default().error_handler(handlers::query_error_handler))
	.route("/give", web::post().to(handlers::give))
	.route("/give/current", web::get().to(handlers::give_current))
	.route("/receive/register", web::post().to(handlers::receive_register))
	.route("/receive/list", web::get().to(handlers::receive_list))
	.route("/receive/confirm", web::get().to(handlers::receive_confirm))
	.route("/health", web::get().to(handlers::health));
}
