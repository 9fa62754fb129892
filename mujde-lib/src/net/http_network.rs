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

use async_trait::async_trait;
use http::{header, HeaderMap, StatusCode};

use super::{FetchError, Network, Request, Response};

// Headers which describe the connection to us rather than the request
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// The real network: `reqwest` for http(s) URLs and the local filesystem
/// for `file:` URLs, which is what a worker started from a local copy of
/// the site sees.
///
/// No timeout is set, a hang is left to the OS network stack.
#[derive(Clone, Default)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new() -> HttpNetwork {
        HttpNetwork {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_http(&self, request: &Request) -> Result<Response, FetchError> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(forwardable_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;
        Ok(Response {
            status,
            headers,
            body,
            url: Some(url),
        })
    }

    async fn fetch_file(&self, request: &Request) -> Result<Response, FetchError> {
        let path = request
            .url
            .to_file_path()
            .map_err(|_| FetchError::UnsupportedScheme(request.url.to_string()))?;
        let path = if path.is_dir() {
            path.join("index.html")
        } else {
            path
        };

        let body = tokio::fs::read(&path).await?;
        let content_type = mime_guess::from_path(&path).first_or_octet_stream();
        Ok(Response::new(StatusCode::OK, body)
            .with_header(header::CONTENT_TYPE, content_type.as_ref())
            .with_url(request.url.clone()))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        match request.url.scheme() {
            "http" | "https" => self.fetch_http(request).await,
            "file" => self.fetch_file(request).await,
            _ => Err(FetchError::UnsupportedScheme(request.url.to_string())),
        }
    }
}

/// Copy headers to pass on, leaving out hop-by-hop headers and those set
/// from the URL or body when the message is sent (`Host`, `Content-Length`)
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name_str = name.as_str();
        if *name == header::HOST
            || *name == header::CONTENT_LENGTH
            || HOP_BY_HOP_HEADERS.contains(&name_str)
        {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}
