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

//! The network seam used by the cache worker.
//!
//! Requests and responses are plain values built on the `http` types so
//! that they can be stored in a cache partition, cloned cheaply (the body
//! is `Bytes`) and handed to whatever [`Network`] the host provides.

mod http_network;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

pub use http_network::{forwardable_headers, HttpNetwork};

/// What a request is for, mirroring the fetch `destination` of a browser request.
///
/// Only `Document` and `Image` change worker behaviour (offline page and
/// placeholder fallbacks) but the rest are kept so that they can be logged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Image,
    Style,
    Script,
    Manifest,
    Font,
    #[default]
    Empty,
}

impl Destination {
    /// Parse the value of a `Sec-Fetch-Dest` header
    pub fn from_fetch_dest(value: &str) -> Destination {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Destination::Document,
            "image" => Destination::Image,
            "style" => Destination::Style,
            "script" | "worker" | "serviceworker" | "sharedworker" => Destination::Script,
            "manifest" => Destination::Manifest,
            "font" => Destination::Font,
            _ => Destination::Empty,
        }
    }

    /// Work out the destination of an incoming request.
    ///
    /// Browsers send `Sec-Fetch-Dest`. Older clients and tools don't, in which
    /// case `Accept` is used: a navigation asks for `text/html` first and an
    /// `<img>` load asks for `image/*`.
    pub fn from_headers(headers: &HeaderMap) -> Destination {
        if let Some(dest) = headers
            .get("sec-fetch-dest")
            .and_then(|value| value.to_str().ok())
        {
            return Destination::from_fetch_dest(dest);
        }

        let accept = headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if accept.starts_with("text/html") {
            Destination::Document
        } else if accept.starts_with("image/") {
            Destination::Image
        } else {
            Destination::Empty
        }
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Request {
        Request {
            method,
            url,
            destination: Destination::Empty,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(url: Url) -> Request {
        Request::new(Method::GET, url)
    }

    pub fn with_destination(mut self, destination: Destination) -> Request {
        self.destination = destination;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Request {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Request {
        self.body = body;
        self
    }
}

/// A response as returned by a [`Network`] or stored in a cache partition
#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// The URL the response was fetched from, if known
    pub url: Option<Url>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Response {
        Response {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            url: None,
        }
    }

    pub fn ok(body: impl Into<Bytes>) -> Response {
        Response::new(StatusCode::OK, body)
    }

    /// Set a header, ignoring values which are not valid header text
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Response {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => log::warn!("ignoring invalid value for header {name}: {e}"),
        }
        self
    }

    pub fn with_url(mut self, url: Url) -> Response {
        self.url = Some(url);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read local file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot fetch '{0}': unsupported URL scheme")]
    UnsupportedScheme(String),
    #[error("network unavailable: {0}")]
    Offline(String),
}

/// Where the worker gets responses from when it goes to the network.
///
/// A failed fetch is an `Err`. A response with an error status (404, 500...)
/// is still an `Ok` in the same way that a browser fetch resolves for them.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}
