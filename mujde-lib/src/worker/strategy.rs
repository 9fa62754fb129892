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

//! The two fetch strategies.
//!
//! Both store successful network responses in the target partition but
//! read from any partition, so an image cached by an older strategy choice
//! is still found.

use http::{header, StatusCode};

use super::{CacheWorker, WorkerError};
use crate::cache::RequestKey;
use crate::helpers::escape_html;
use crate::net::{Request, Response};

pub const PLACEHOLDER_CONTENT_TYPE: &str = "image/svg+xml";

impl CacheWorker {
    /// Try the network, falling back to the cache and then, for documents,
    /// to the offline page
    pub(super) async fn network_first(
        &self,
        request: &Request,
        cache_name: &str,
        is_document: bool,
    ) -> Result<Response, WorkerError> {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(cache_name, request, &response);
                Ok(response)
            }
            Err(error) => {
                log::debug!("network failed for {}: {error}", request.url);
                if let Some(cached) = self.storage.match_any(&RequestKey::from(request)) {
                    return Ok(cached);
                }

                if is_document {
                    if let Some(offline) = self.offline_document() {
                        log::info!("offline, serving cached site root for {}", request.url);
                        return Ok(offline);
                    }
                }

                Err(WorkerError::Network {
                    url: request.url.to_string(),
                    source: error,
                })
            }
        }
    }

    /// Use the cache if possible, otherwise the network. An image which
    /// can't be had from either is replaced by a placeholder.
    pub(super) async fn cache_first(
        &self,
        request: &Request,
        cache_name: &str,
        is_image: bool,
    ) -> Result<Response, WorkerError> {
        if let Some(cached) = self.storage.match_any(&RequestKey::from(request)) {
            return Ok(cached);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(cache_name, request, &response);
                Ok(response)
            }
            Err(error) if is_image => {
                log::debug!("serving placeholder for {}: {error}", request.url);
                Ok(placeholder_image(&self.config.placeholder_label))
            }
            Err(error) => Err(WorkerError::Network {
                url: request.url.to_string(),
                source: error,
            }),
        }
    }

    // Error responses are passed on to the page but not kept
    fn store(&self, cache_name: &str, request: &Request, response: &Response) {
        if response.is_success() {
            self.storage
                .put(cache_name, RequestKey::from(request), response.clone());
        } else {
            log::debug!(
                "not caching {} response for {}",
                response.status,
                request.url
            );
        }
    }

    fn offline_document(&self) -> Option<Response> {
        self.offline_document_keys
            .iter()
            .find_map(|key| self.storage.match_any(key))
    }
}

/// A grey 200x200 SVG with a label, used in place of an image that
/// couldn't be loaded
pub fn placeholder_image(label: &str) -> Response {
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200"><rect width="200" height="200" fill="#f0f0f0"/><text x="100" y="100" text-anchor="middle" fill="#999">{}</text></svg>"##,
        escape_html(label)
    );
    Response::new(StatusCode::OK, svg).with_header(header::CONTENT_TYPE, PLACEHOLDER_CONTENT_TYPE)
}

#[test]
fn check_placeholder_image() {
    let response = placeholder_image("Resim <Yok>");
    assert_eq!(response.content_type(), Some(PLACEHOLDER_CONTENT_TYPE));
    let body = String::from_utf8(response.body.to_vec()).unwrap();
    assert!(body.starts_with("<svg"));
    assert!(body.contains("Resim &lt;Yok&gt;"));
}
