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

use actix_web::{
    http::{header, StatusCode},
    HttpRequest, HttpResponse, HttpResponseBuilder,
};
use color_eyre::eyre::{eyre, Result};
use url::Url;

use mujde::helpers::escape_html;
use mujde::net::{forwardable_headers, Destination, Request, Response};

pub(crate) fn make_error_response_page(
    status_code: Option<StatusCode>,
    response_builder: &mut HttpResponseBuilder,
    heading: String,
    message: &str,
) -> HttpResponse {
    let status_code = status_code
        .map(|status_code| status_code.to_string())
        .unwrap_or_default();

    let heading = escape_html(&heading);
    let message = escape_html(message);
    let body = format!(
        "
    <!DOCTYPE html><head><meta charset='utf-8'></head><body>
    <h3>{heading} error</h3>
    {status_code} {message}
    <br/><br/><a href='/'>{}</a>
    </body>",
        mujde::SITE_NAME
    );

    response_builder
        .insert_header(header::ContentType(mime::TEXT_HTML_UTF_8))
        .body(body)
}

/// An identifier for the client making a request, used for rate limiting.
///
/// This is the IP address of the connection's peer. `X-Forwarded-For` and
/// `Forwarded` are ignored as any client can set them.
pub(crate) fn client_id(request: &HttpRequest) -> String {
    request
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Turn an incoming request into one for the same path and query within `scope`
pub(crate) fn worker_request(request: &HttpRequest, body: bytes::Bytes, scope: &Url) -> Result<Request> {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    // Always relative, so a path can't name another host or scheme
    let relative = format!("./{}", path_and_query.trim_start_matches('/'));
    let url = scope
        .join(&relative)
        .map_err(|e| eyre!("cannot resolve '{path_and_query}' against '{scope}': {e}"))?;

    let method = http::Method::from_bytes(request.method().as_str().as_bytes())
        .map_err(|e| eyre!("unsupported method '{}': {e}", request.method()))?;

    let mut headers = http::HeaderMap::with_capacity(request.headers().len());
    for (name, value) in request.headers() {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_str().as_bytes()),
            http::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }
    let headers = forwardable_headers(&headers);
    let destination = Destination::from_headers(&headers);

    Ok(Request::new(method, url)
        .with_destination(destination)
        .with_headers(headers)
        .with_body(body))
}

/// Convert a worker or network response into one for the client
pub(crate) fn client_response(response: Response) -> HttpResponse {
    let status = StatusCode::from_u16(response.status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    for (name, value) in forwardable_headers(&response.headers).iter() {
        builder.append_header((name.as_str(), value.as_bytes()));
    }
    builder.body(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn worker_request_resolves_within_scope() {
        let scope = Url::parse("http://127.0.0.1:8080/").unwrap();
        let request = test::TestRequest::get()
            .uri("/about.html?lang=tr")
            .insert_header(("sec-fetch-dest", "document"))
            .insert_header(("connection", "keep-alive"))
            .to_http_request();

        let request = worker_request(&request, bytes::Bytes::new(), &scope).unwrap();
        assert_eq!(request.url.as_str(), "http://127.0.0.1:8080/about.html?lang=tr");
        assert_eq!(request.method, http::Method::GET);
        assert_eq!(request.destination, Destination::Document);
        assert!(request.headers.get("connection").is_none());

        let request = test::TestRequest::get()
            .uri("/https://elsewhere.test/x")
            .to_http_request();
        let request = worker_request(&request, bytes::Bytes::new(), &scope).unwrap();
        assert_eq!(request.url.host_str(), Some("127.0.0.1"));
    }

    #[actix_web::test]
    async fn client_id_ignores_forwarding_headers() {
        let peer: std::net::SocketAddr = "203.0.113.7:50123".parse().unwrap();
        let request = test::TestRequest::get()
            .peer_addr(peer)
            .insert_header(("x-forwarded-for", "198.51.100.1"))
            .insert_header(("forwarded", "for=198.51.100.2"))
            .to_http_request();
        assert_eq!(client_id(&request), "203.0.113.7");

        let request = test::TestRequest::get().to_http_request();
        assert_eq!(client_id(&request), "unknown");
    }

    #[actix_web::test]
    async fn client_response_keeps_status_and_headers() {
        let response = Response::new(http::StatusCode::NOT_FOUND, "missing")
            .with_header(http::header::CONTENT_TYPE, "text/plain")
            .with_header(http::header::TRANSFER_ENCODING, "chunked");

        let response = client_response(response);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
    }
}
