/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! Sending email through a transactional email service.
//!
//! The service is treated as opaque: give it a message, get back whether it
//! was accepted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const SENDGRID_API_KEY_ENV: &str = "SENDGRID_API_KEY";
pub const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    pub subject: String,
    pub html: String,
}

/// Outcome of a send. Failures are reported here rather than as an `Err`
/// so callers can log and carry on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    pub fn sent() -> SendResult {
        SendResult {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> SendResult {
        SendResult {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Addresses used for contact form email
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Where contact form notifications are delivered
    pub dealer_address: String,
    pub from_address: String,
    /// Sender name on notifications to the dealership
    pub site_sender_name: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        EmailSettings {
            dealer_address: "mujdeauto@gmail.com".to_string(),
            from_address: "noreply@mujdeauto.com".to_string(),
            site_sender_name: "MÜJDE AUTO Web Sitesi".to_string(),
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> SendResult;
}

/// Sends through the SendGrid v3 API
pub struct SendGridSender {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl SendGridSender {
    pub fn new(api_key: String) -> SendGridSender {
        SendGridSender {
            api_key,
            endpoint: SENDGRID_SEND_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use the API key from the environment, if set
    pub fn from_env() -> Option<SendGridSender> {
        match std::env::var(SENDGRID_API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Some(SendGridSender::new(key)),
            _ => None,
        }
    }

    /// Send somewhere other than the public API, e.g. a sandbox
    pub fn with_endpoint(mut self, endpoint: &str) -> SendGridSender {
        self.endpoint = endpoint.to_string();
        self
    }

    fn request_body(message: &EmailMessage) -> serde_json::Value {
        let mut from = json!({ "email": message.from });
        if let Some(name) = &message.from_name {
            from["name"] = json!(name);
        }
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": from,
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        })
    }
}

#[async_trait]
impl EmailSender for SendGridSender {
    async fn send(&self, message: &EmailMessage) -> SendResult {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&SendGridSender::request_body(message))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => SendResult::sent(),
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                log::error!("SendGrid error: {status} {detail}");
                SendResult::failed(format!("SendGrid returned {status}"))
            }
            Err(e) => {
                log::error!("SendGrid error: {e}");
                SendResult::failed(e)
            }
        }
    }
}

/// Used when no email service is configured: the message is logged and
/// counted as sent
#[derive(Default)]
pub struct LogOnlySender;

#[async_trait]
impl EmailSender for LogOnlySender {
    async fn send(&self, message: &EmailMessage) -> SendResult {
        log::info!(
            "email not sent (no email service configured) to: {} subject: {}",
            message.to,
            message.subject
        );
        SendResult::sent()
    }
}
