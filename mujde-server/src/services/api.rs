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

use std::time::Instant;

use actix_web::{web, web::Data, HttpRequest, HttpResponse};
use chrono::{Local, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use mujde::analytics::{new_session_id, AnalyticsPayload};
use mujde::contact::{ContactError, ContactForm};

use crate::services::helpers::client_id;
use crate::services::SiteState;

pub const CONTACT_ROUTE: &str = "/api/contact";
pub const ANALYTICS_ROUTE: &str = "/api/analytics";

pub const CONTACT_SENT: &str = "Mesajınız başarıyla gönderildi!";
pub const CONTACT_FAILED: &str = "Mesaj gönderilirken bir hata oluştu. Lütfen tekrar deneyin.";
pub const CONTACT_TOO_MANY: &str =
    "Çok fazla mesaj gönderdiniz. Lütfen bir dakika bekleyip tekrar deneyin.";

/// The format used for the submission time in the dealership's email
const SENT_AT_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiSuccess {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    /// Required fields which were missing or blank
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl ApiError {
    fn new(error: impl Into<String>) -> ApiError {
        ApiError {
            error: error.into(),
            fields: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiMessage {
    pub message: String,
}

/// Send a contact form submission to the dealership
///
/// The submission is validated, emailed to the dealership and acknowledged
/// to the sender with an automatic reply. A client may submit at most three
/// times a minute.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body(content = String, content_type = "application/json",
        description = "A JSON object with <b>name</b>, <b>email</b>, <b>phone</b> and <b>message</b> (all required) and an optional <b>subject</b>"),
    responses(
        (status = 200, description = "The message was sent", body = ApiSuccess),
        (status = 400, description = "Missing required fields, invalid email format or a body which isn't JSON", body = ApiError),
        (status = 405, description = "Only POST is supported", body = ApiMessage),
        (status = 429, description = "Too many submissions from this client in the last minute", body = ApiError),
        (status = 500, description = "The email could not be sent", body = ApiError),
    ),
    tags = ["api"],
)]
pub async fn contact(request: HttpRequest, body: web::Bytes, state: Data<SiteState>) -> HttpResponse {
    let form: ContactForm = match serde_json::from_slice(&body) {
        Ok(form) => form,
        Err(e) => {
            log::debug!("{CONTACT_ROUTE} invalid body: {e}");
            return HttpResponse::BadRequest().json(ApiError::new("Invalid JSON body"));
        }
    };

    if let Err(e) = form.validate() {
        let fields = match &e {
            ContactError::MissingFields(fields) => {
                fields.iter().map(|field| field.to_string()).collect()
            }
            ContactError::InvalidEmail => Vec::new(),
        };
        return HttpResponse::BadRequest().json(ApiError {
            error: e.to_string(),
            fields,
        });
    }

    let client = client_id(&request);
    if state.limiter.is_spam_attempt(&client, Instant::now()) {
        log::warn!("contact form rate limited for {client}");
        return HttpResponse::TooManyRequests().json(ApiError::new(CONTACT_TOO_MANY));
    }

    match serde_json::to_string(&form) {
        Ok(json) => log::info!("Contact Form Submission: {json} at {}", Utc::now().to_rfc3339()),
        Err(e) => log::warn!("Contact Form Submission (not logged): {e}"),
    }

    let sent_at = Local::now().format(SENT_AT_FORMAT).to_string();
    let notification = form.notification_email(&state.email, &sent_at);
    let result = state.email_sender.send(&notification).await;
    if !result.success {
        log::error!(
            "Contact form error: {}",
            result.error.as_deref().unwrap_or("unknown")
        );
        return HttpResponse::InternalServerError().json(ApiError::new(CONTACT_FAILED));
    }

    // The sender's copy is a courtesy so failure only gets a warning
    let reply = form.auto_reply_email(&state.email);
    let result = state.email_sender.send(&reply).await;
    if !result.success {
        log::warn!(
            "auto-reply to {} failed: {}",
            form.email,
            result.error.as_deref().unwrap_or("unknown")
        );
    }

    HttpResponse::Ok().json(ApiSuccess {
        success: true,
        message: Some(CONTACT_SENT.to_string()),
    })
}

/// Record an analytics event
///
/// Events are logged and kept in a capped event log. An event without a
/// session id is given a new one.
#[utoipa::path(
    post,
    path = "/api/analytics",
    request_body(content = String, content_type = "application/json",
        description = "A JSON object with an <b>event</b> name and optionally <b>page</b>, <b>sessionId</b>, <b>userAgent</b> and any other fields"),
    responses(
        (status = 200, description = "The event was recorded", body = ApiSuccess),
        (status = 400, description = "The body isn't a JSON object", body = ApiError),
        (status = 405, description = "Only POST is supported", body = ApiMessage),
    ),
    tags = ["api"],
)]
pub async fn analytics(body: web::Bytes, state: Data<SiteState>) -> HttpResponse {
    let payload: AnalyticsPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            log::debug!("{ANALYTICS_ROUTE} invalid body: {e}");
            return HttpResponse::BadRequest().json(ApiError::new("Invalid JSON body"));
        }
    };

    let mut event = payload.received_at(Utc::now());
    if event.session_id.is_none() {
        event.session_id = Some(new_session_id());
    }
    log::info!(
        "Analytics Event: {} page: {} session: {}",
        event.event,
        event.page.as_deref().unwrap_or("-"),
        event.session_id.as_deref().unwrap_or("-")
    );

    // A failure to save is not the page's problem
    if let Err(e) = state.analytics.lock().record(event) {
        log::warn!("{e}");
    }

    HttpResponse::Ok().json(ApiSuccess {
        success: true,
        message: None,
    })
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ApiMessage {
        message: "Method not allowed".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use mujde::analytics::EventLog;
    use mujde::email::{EmailMessage, EmailSender, EmailSettings, SendResult};
    use mujde::rate_limit::SubmissionLimiter;

    use crate::services::configure_site;

    /// Keeps sent messages, failing every send if asked to
    #[derive(Default)]
    struct RecordingSender {
        fail: bool,
        sent: std::sync::Arc<Mutex<Vec<EmailMessage>>>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, message: &EmailMessage) -> SendResult {
            if self.fail {
                return SendResult::failed("service unavailable");
            }
            self.sent.lock().push(message.clone());
            SendResult::sent()
        }
    }

    fn state(sender: RecordingSender) -> Data<SiteState> {
        Data::new(SiteState {
            site_root: PathBuf::from("."),
            email: EmailSettings::default(),
            email_sender: Box::new(sender),
            limiter: SubmissionLimiter::default(),
            analytics: Mutex::new(EventLog::in_memory()),
        })
    }

    const VALID_FORM: &str = r#"{"name": "Ayşe Yılmaz", "email": "ayse@example.com",
        "phone": "0532 000 00 00", "subject": "Test sürüşü", "message": "Merhaba,\nBMW hâlâ satılık mı?"}"#;

    #[actix_web::test]
    async fn contact_sends_notification_and_reply() {
        let sent = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sender = RecordingSender {
            fail: false,
            sent: std::sync::Arc::clone(&sent),
        };
        let app = test::init_service(App::new().app_data(state(sender)).configure(configure_site)).await;

        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .insert_header(("content-type", "application/json"))
            .set_payload(VALID_FORM)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], CONTACT_SENT);

        let sent = sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "mujdeauto@gmail.com");
        assert_eq!(sent[0].subject, "Yeni İletişim Formu: Test sürüşü");
        assert!(sent[0].html.contains("Merhaba,<br>BMW"));
        assert_eq!(sent[1].to, "ayse@example.com");
    }

    #[actix_web::test]
    async fn contact_rejects_bad_submissions() {
        let app = test::init_service(
            App::new()
                .app_data(state(RecordingSender::default()))
                .configure(configure_site),
        )
        .await;

        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload(r#"{"name": "Ali", "email": "ali@example.com"}"#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(body["fields"], serde_json::json!(["phone", "message"]));

        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload(r#"{"name": "Ali", "email": "ali@", "phone": "1", "message": "x"}"#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], "Invalid email format");

        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload("name=Ali")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn contact_only_accepts_post() {
        let app = test::init_service(
            App::new()
                .app_data(state(RecordingSender::default()))
                .configure(configure_site),
        )
        .await;

        let request = test::TestRequest::get().uri(CONTACT_ROUTE).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Method not allowed");
    }

    #[actix_web::test]
    async fn contact_is_rate_limited() {
        let app = test::init_service(
            App::new()
                .app_data(state(RecordingSender::default()))
                .configure(configure_site),
        )
        .await;

        for _ in 0..3 {
            let request = test::TestRequest::post()
                .uri(CONTACT_ROUTE)
                .set_payload(VALID_FORM)
                .to_request();
            assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);
        }
        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload(VALID_FORM)
            .to_request();
        assert_eq!(
            test::call_service(&app, request).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[actix_web::test]
    async fn contact_limit_is_per_peer_not_per_forwarded_header() {
        let app = test::init_service(
            App::new()
                .app_data(state(RecordingSender::default()))
                .configure(configure_site),
        )
        .await;
        let peer: std::net::SocketAddr = "203.0.113.7:40000".parse().unwrap();

        for n in 0..4 {
            let request = test::TestRequest::post()
                .uri(CONTACT_ROUTE)
                .peer_addr(peer)
                .insert_header(("x-forwarded-for", format!("198.51.100.{n}")))
                .set_payload(VALID_FORM)
                .to_request();
            let expected = if n < 3 {
                StatusCode::OK
            } else {
                StatusCode::TOO_MANY_REQUESTS
            };
            assert_eq!(test::call_service(&app, request).await.status(), expected);
        }

        let other: std::net::SocketAddr = "203.0.113.8:40000".parse().unwrap();
        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .peer_addr(other)
            .set_payload(VALID_FORM)
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn contact_reports_email_failure() {
        let sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        let app = test::init_service(App::new().app_data(state(sender)).configure(configure_site)).await;

        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload(VALID_FORM)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["error"], CONTACT_FAILED);
    }

    #[actix_web::test]
    async fn analytics_records_events() {
        let state = state(RecordingSender::default());
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_site)).await;

        let request = test::TestRequest::post()
            .uri(ANALYTICS_ROUTE)
            .set_payload(r#"{"event": "page_view", "page": "/", "sessionId": "session_1_abc"}"#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body, serde_json::json!({"success": true}));

        let request = test::TestRequest::post()
            .uri(ANALYTICS_ROUTE)
            .set_payload("[1, 2")
            .to_request();
        assert_eq!(
            test::call_service(&app, request).await.status(),
            StatusCode::BAD_REQUEST
        );

        let request = test::TestRequest::put().uri(ANALYTICS_ROUTE).to_request();
        assert_eq!(
            test::call_service(&app, request).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );

        let request = test::TestRequest::post()
            .uri(ANALYTICS_ROUTE)
            .set_payload(r#"{"event": "click", "element": "whatsapp"}"#)
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

        let log = state.analytics.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].event, "page_view");
        assert_eq!(log.events()[0].session_id.as_deref(), Some("session_1_abc"));
        let session = log.events()[1].session_id.as_deref().unwrap();
        assert!(session.starts_with("session_"), "{session}");
        assert_eq!(log.events()[1].extra["element"], "whatsapp");
    }
}
