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

use actix_web::{http::StatusCode, web, web::Data, HttpRequest, HttpResponse};

use mujde::contact::ContactForm;
use mujde::net::Request;
use mujde::{FetchDisposition, WorkerHandler};

use crate::services::api::{ApiSuccess, CONTACT_ROUTE};
use crate::services::helpers::{client_response, make_error_response_page, worker_request};
use crate::services::EdgeState;

pub const CONTACT_QUEUED: &str =
    "Şu anda çevrimdışısınız. Mesajınız bağlantı sağlandığında gönderilecek.";

/// Every request to the edge goes through the cache worker
pub async fn edge_handler(
    request: HttpRequest,
    body: web::Bytes,
    state: Data<EdgeState>,
) -> HttpResponse {
    let worker_request = match worker_request(&request, body, &state.worker.config().scope) {
        Ok(worker_request) => worker_request,
        Err(e) => {
            return make_error_response_page(
                Some(StatusCode::BAD_REQUEST),
                &mut HttpResponse::BadRequest(),
                request.path().to_string(),
                &e.to_string(),
            )
        }
    };

    match state.worker.on_fetch(&worker_request).await {
        Ok(FetchDisposition::Respond(response)) => client_response(response),
        Ok(FetchDisposition::PassThrough) => pass_through(&state, worker_request).await,
        Err(e) => {
            log::warn!("{e}");
            make_error_response_page(
                Some(StatusCode::BAD_GATEWAY),
                &mut HttpResponse::BadGateway(),
                request.path().to_string(),
                &e.to_string(),
            )
        }
    }
}

/// Send a request the worker didn't handle straight to the origin.
///
/// A contact form which can't be delivered is kept in the outbox for the
/// next form sync.
async fn pass_through(state: &EdgeState, request: Request) -> HttpResponse {
    let error = match state.network.fetch(&request).await {
        Ok(response) => return client_response(response),
        Err(e) => e,
    };
    log::warn!("origin unavailable for {} {}: {error}", request.method, request.url);

    if request.method == http::Method::POST && request.url.path().ends_with(CONTACT_ROUTE) {
        if let Ok(form) = serde_json::from_slice::<ContactForm>(&request.body) {
            if form.validate().is_ok() {
                state.outbox.push(form);
                log::info!("contact form queued ({} waiting)", state.outbox.len());
                return HttpResponse::Accepted().json(ApiSuccess {
                    success: true,
                    message: Some(CONTACT_QUEUED.to_string()),
                });
            }
        }
    }

    make_error_response_page(
        Some(StatusCode::BAD_GATEWAY),
        &mut HttpResponse::BadGateway(),
        request.url.path().to_string(),
        &error.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use actix_web::{http::header, test, App};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use url::Url;

    use mujde::cache::PartitionSummary;
    use mujde::net::{FetchError, Network, Response};
    use mujde::WorkerConfig;

    use crate::services::configure_edge;
    use crate::services::worker_api::SyncResult;

    const ORIGIN: &str = "http://origin.test/";

    #[derive(Default)]
    struct Origin {
        files: Mutex<HashMap<String, Response>>,
        down: AtomicBool,
    }

    impl Origin {
        fn serve(&self, path: &str, body: &str, content_type: &str) {
            let url = format!("{ORIGIN}{path}");
            let response =
                Response::ok(body.to_string()).with_header(http::header::CONTENT_TYPE, content_type);
            self.files.lock().insert(url, response);
        }
    }

    #[async_trait]
    impl Network for Origin {
        async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(FetchError::Offline(request.url.to_string()));
            }
            Ok(self
                .files
                .lock()
                .get(request.url.as_str())
                .cloned()
                .unwrap_or_else(|| Response::new(http::StatusCode::NOT_FOUND, "not found")))
        }
    }

    async fn edge() -> (Data<EdgeState>, Arc<Origin>) {
        let origin = Arc::new(Origin::default());
        origin.serve("", "<html>home</html>", "text/html");
        origin.serve("index.html", "<html>home</html>", "text/html");
        origin.serve("about.html", "<html>about</html>", "text/html");
        origin.serve("css/style.css", "body {}", "text/css");

        let mut config = WorkerConfig::default().with_scope(Url::parse(ORIGIN).unwrap());
        config.static_manifest = vec![
            "./".to_string(),
            "./index.html".to_string(),
            "./about.html".to_string(),
            "./css/style.css".to_string(),
        ];
        config.image_manifest = Vec::new();

        let state = Data::new(EdgeState::new(
            config,
            Arc::clone(&origin) as Arc<dyn Network>,
        ));
        let (installed, activated) = state.start_worker().await;
        assert_eq!(installed.cached.len(), 4);
        assert!(activated.claim_clients);
        (state, origin)
    }

    #[actix_web::test]
    async fn pages_are_served_while_origin_is_down() {
        let (state, origin) = edge().await;
        let app = test::init_service(App::new().app_data(state).configure(configure_edge)).await;

        let request = test::TestRequest::get().uri("/about.html").to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(&body[..], b"<html>about</html>");

        origin.down.store(true, Ordering::SeqCst);

        let request = test::TestRequest::get().uri("/about.html").to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(&body[..], b"<html>about</html>");

        let request = test::TestRequest::get()
            .uri("/contact.html")
            .insert_header((header::ACCEPT, "text/html"))
            .to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(&body[..], b"<html>home</html>");

        let request = test::TestRequest::get()
            .uri("/img/new-arrival.jpg")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/svg+xml"
        );

        let request = test::TestRequest::get().uri("/api/vehicles").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn contact_form_is_queued_then_synced() {
        let (state, origin) = edge().await;
        origin.down.store(true, Ordering::SeqCst);
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure_edge)).await;

        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload(
                r#"{"name": "Ali", "email": "ali@example.com", "phone": "1", "message": "Merhaba"}"#,
            )
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(state.outbox.len(), 1);

        // Invalid forms aren't kept
        let request = test::TestRequest::post()
            .uri(CONTACT_ROUTE)
            .set_payload(r#"{"name": "Ali"}"#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(state.outbox.len(), 1);

        let request = test::TestRequest::post()
            .uri("/sw/sync/form-submission")
            .to_request();
        let result: SyncResult = test::call_and_read_body_json(&app, request).await;
        assert_eq!(result.synced, 1);
        assert!(state.outbox.is_empty());
    }

    #[actix_web::test]
    async fn worker_endpoints() {
        let (state, _origin) = edge().await;
        let app = test::init_service(App::new().app_data(state).configure(configure_edge)).await;

        let request = test::TestRequest::post()
            .uri("/sw/push")
            .set_payload("Yeni araçlar geldi")
            .to_request();
        let notification: serde_json::Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(notification["body"], "Yeni araçlar geldi");
        assert_eq!(notification["actions"][0]["action"], "explore");

        let request = test::TestRequest::get()
            .uri("/sw/notification-click/contact")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/contact.html"
        );

        let request = test::TestRequest::get()
            .uri("/sw/notification-click")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

        let request = test::TestRequest::get().uri("/sw/caches").to_request();
        let caches: Vec<PartitionSummary> = test::call_and_read_body_json(&app, request).await;
        let names: Vec<&str> = caches.iter().map(|cache| cache.name.as_str()).collect();
        assert_eq!(names, vec!["mujde-auto-static-v1.0.0", "mujde-auto-dynamic-v1.0.0"]);
        assert_eq!(caches[0].urls.len(), 4);
    }
}
