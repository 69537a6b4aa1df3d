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

//! Match notifications
//!
//! After a successful allocation the allocator hands a plain-text summary
//! to a [`NotificationSink`]. Delivery is best effort: a failed send is
//! logged by the caller and never undoes the allocation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::types::BookingRecord;

/// Subject line of the match summary
pub const ALLOCATION_SUBJECT: &str = "GCS Click the link to Confirm your food delivery";

/// Error types for notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("Notification delivery failed: {0}")]
	Delivery(String),
	#[error("Notification rejected: {0}")]
	Rejected(String),
}

/// Outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
	pub destination: String,
	pub subject: String,
	pub body: String,
}

impl Notification {
	/// Summary of a matched booking for the pickup contact
	pub fn allocation_summary(booking: &BookingRecord, recipient: &str, confirm_url: &str) -> Self {
		let body = format!(
			"{}\n\nphone number: {}\n\ncourier plate: {}\n\npick up time: {}\n\ndriver: {}",
			confirm_url,
			booking.driver_phone_number,
			booking.plate_number,
			format_pick_up_time(booking.pick_up_time),
			booking.driver_name,
		);

		Self {
			destination: recipient.to_string(),
			subject: ALLOCATION_SUBJECT.to_string(),
			body,
		}
	}
}

/// RFC 822 style rendering of a pickup time given in epoch microseconds
pub fn format_pick_up_time(micros: i64) -> String {
	DateTime::<Utc>::from_timestamp(micros.div_euclid(1_000_000), 0)
		.map(|t| t.format("%d %b %y %H:%M UTC").to_string())
		.unwrap_or_else(|| micros.to_string())
}

/// Delivery channel for notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
	async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
	async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
		info!(
			target: "notify",
			destination = %notification.destination,
			subject = %notification.subject,
			body = %notification.body,
			"Notification (log sink)"
		);
		Ok(())
	}
}

/// POSTs each notification as JSON to a fixed webhook URL
pub struct WebhookNotificationSink {
	client: reqwest::Client,
	url: String,
}

impl WebhookNotificationSink {
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| NotifyError::Delivery(format!("Failed to create HTTP client: {}", e)))?;

		Ok(Self {
			client,
			url: url.into(),
		})
	}
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
	async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
		let response = self
			.client
			.post(&self.url)
			.json(&notification)
			.send()
			.await
			.map_err(|e| NotifyError::Delivery(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(NotifyError::Rejected(format!("webhook returned {}", status)));
		}

		info!(target: "notify", destination = %notification.destination, "Notification sent");
		Ok(())
	}
}

/// Keeps every notification in memory, optionally failing each send
#[derive(Default)]
pub struct MemoryNotificationSink {
	sent: Mutex<Vec<Notification>>,
	fail: bool,
}

impl MemoryNotificationSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sink whose every send fails after recording the attempt
	pub fn failing() -> Self {
		Self {
			sent: Mutex::new(Vec::new()),
			fail: true,
		}
	}

	pub fn sent(&self) -> Vec<Notification> {
		self.sent.lock().clone()
	}
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
	async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
		self.sent.lock().push(notification);
		if self.fail {
			return Err(NotifyError::Delivery("sink configured to fail".to_string()));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{Assignment, GeoPoint};

	#[test]
	fn test_summary_body() {
		let mut booking =
			BookingRecord::allocating("ABC-5", "rice", 20.0, 1, GeoPoint::new(1.29, 103.85));
		booking
			.mark_allocated(Assignment {
				driver_name: "Driver A".to_string(),
				driver_phone_number: "+6593004400".to_string(),
				plate_number: "SGX1234A".to_string(),
				// 2026-10-16T08:30:00Z
				pick_up_time: 1_792_139_400_000_000,
				demand_id: 1,
			})
			.unwrap();

		let message = Notification::allocation_summary(
			&booking,
			"ops@example.org",
			"http://localhost:8080/receive/confirm",
		);

		assert_eq!(message.destination, "ops@example.org");
		assert_eq!(message.subject, ALLOCATION_SUBJECT);
		assert_eq!(
			message.body,
			"http://localhost:8080/receive/confirm\n\n\
			 phone number: +6593004400\n\n\
			 courier plate: SGX1234A\n\n\
			 pick up time: 16 Oct 26 08:30 UTC\n\n\
			 driver: Driver A"
		);
	}

	#[tokio::test]
	async fn test_memory_sink_records_even_when_failing() {
		let sink = MemoryNotificationSink::failing();
		let message = Notification {
			destination: "a@b".to_string(),
			subject: "s".to_string(),
			body: "b".to_string(),
		};

		assert!(sink.send(message.clone()).await.is_err());
		assert_eq!(sink.sent(), vec![message]);
	}
}
