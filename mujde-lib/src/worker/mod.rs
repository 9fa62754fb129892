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

//! The offline cache worker.
//!
//! A worker sits between the site's pages and the network. The host calls
//! one [`WorkerHandler`] method per lifecycle event and awaits the returned
//! future, which is what keeps the work (cache population, a fetch, a cache
//! write) alive until it completes. There is no cancellation: once started
//! a fetch runs to completion or failure.
//!
//! Lifecycle:
//!   install  - populate the static and dynamic partitions from the
//!              manifests. Fail-open: errors are logged and install completes.
//!   activate - delete partitions left by other versions.
//!   fetch    - GET requests are answered network-first (documents and
//!              anything unclassified) or cache-first (images, css and js).
//!
//! Push, notification click and background sync events are handled too.

pub mod classify;
pub mod notification;
pub mod outbox;
pub mod strategy;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use http::Method;
use serde::Serialize;
use url::Url;

use crate::cache::{CacheStorage, RequestKey};
use crate::config::{WorkerConfig, FORM_SUBMISSION_SYNC_TAG};
use crate::net::{Destination, FetchError, Network, Request, Response};

pub use classify::{classify, RequestClass};
pub use notification::Notification;
pub use outbox::FormOutbox;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Neither the network nor the cache could answer the request
    #[error("failed to fetch '{url}' and no cached copy is available: {source}")]
    Network {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// What the worker did with an intercepted request
#[derive(Debug)]
pub enum FetchDisposition {
    /// Not intercepted. The host should send the request as if there were
    /// no worker.
    PassThrough,
    /// The worker's answer to the request
    Respond(Response),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstallFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct InstallReport {
    pub static_cache: String,
    pub dynamic_cache: String,
    /// URLs now cached, static partition first
    pub cached: Vec<String>,
    /// Manifest entries left out because they can't be fetched in this context
    pub skipped: Vec<String>,
    pub failed: Vec<InstallFailure>,
    /// Take over from any previous worker without waiting for pages to close
    pub skip_waiting: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ActivateReport {
    /// Partitions deleted because they belong to another version
    pub deleted: Vec<String>,
    /// Take control of already open pages without waiting for a navigation
    pub claim_clients: bool,
}

/// The events a worker responds to
#[async_trait]
pub trait WorkerHandler: Send + Sync {
    async fn on_install(&self) -> InstallReport;

    async fn on_activate(&self) -> ActivateReport;

    async fn on_fetch(&self, request: &Request) -> Result<FetchDisposition, WorkerError>;

    /// The notification to show for a push message
    fn on_push(&self, payload: Option<&str>) -> Notification;

    /// The URL to open when a notification (or one of its actions) is clicked
    fn on_notification_click(&self, action: Option<&str>) -> String;

    /// Returns the number of queued items dealt with
    async fn on_sync(&self, tag: &str) -> usize;
}

/// The site's worker. It keeps no state of its own between events, only
/// its configuration and handles to the storage, network and outbox it
/// was given.
pub struct CacheWorker {
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    outbox: Arc<FormOutbox>,
    offline_document_keys: Vec<RequestKey>,
}

impl CacheWorker {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> CacheWorker {
        // The offline page is resolved within the scope, with the scope root
        // as a second choice since the install manifest caches both
        let mut offline_document_keys = Vec::new();
        match config
            .scope
            .join(config.offline_document.trim_start_matches('/'))
        {
            Ok(url) => offline_document_keys.push(RequestKey::get(&url)),
            Err(e) => log::warn!(
                "invalid offline document '{}': {e}",
                config.offline_document
            ),
        }
        let root = RequestKey::get(&config.scope);
        if !offline_document_keys.contains(&root) {
            offline_document_keys.push(root);
        }

        CacheWorker {
            config,
            storage,
            network,
            outbox: Arc::new(FormOutbox::new()),
            offline_document_keys,
        }
    }

    /// Share an outbox with whoever queues submissions
    pub fn with_outbox(mut self, outbox: Arc<FormOutbox>) -> CacheWorker {
        self.outbox = outbox;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn outbox(&self) -> &Arc<FormOutbox> {
        &self.outbox
    }

    /// Resolve manifest entries against the scope, leaving out those which
    /// don't apply. From a local copy of the site only local entries can be
    /// fetched, so CDN URLs are skipped.
    fn manifest_urls(&self, manifest: &[String], report: &mut InstallReport) -> Vec<Url> {
        let local_only = self.config.is_local_file_context();
        let mut urls = Vec::with_capacity(manifest.len());
        for entry in manifest {
            if local_only && !(entry.starts_with('/') || entry.starts_with("./")) {
                report.skipped.push(entry.clone());
                continue;
            }
            match self.config.scope.join(entry) {
                Ok(url) => urls.push(url),
                Err(e) => report.failed.push(InstallFailure {
                    url: entry.clone(),
                    reason: format!("invalid URL: {e}"),
                }),
            }
        }
        urls
    }

    /// Fetch and store each URL. Every entry is independent so one failure
    /// doesn't stop the rest.
    async fn add_all(&self, cache_name: &str, urls: Vec<Url>, report: &mut InstallReport) {
        let fetches = urls.into_iter().map(|url| async move {
            let request = Request::get(url);
            let result = self.network.fetch(&request).await;
            (request, result)
        });

        for (request, result) in join_all(fetches).await {
            match result {
                Ok(response) if response.is_success() => {
                    self.storage
                        .put(cache_name, RequestKey::from(&request), response);
                    report.cached.push(request.url.to_string());
                }
                Ok(response) => report.failed.push(InstallFailure {
                    url: request.url.to_string(),
                    reason: format!("bad response status {}", response.status),
                }),
                Err(e) => report.failed.push(InstallFailure {
                    url: request.url.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

#[async_trait]
impl WorkerHandler for CacheWorker {
    async fn on_install(&self) -> InstallReport {
        log::info!("cache worker installing...");
        let mut report = InstallReport {
            static_cache: self.config.static_cache_name(),
            dynamic_cache: self.config.dynamic_cache_name(),
            ..Default::default()
        };

        self.storage.open(&report.static_cache);
        log::info!("caching static files");
        let urls = self.manifest_urls(&self.config.static_manifest, &mut report);
        let static_cache = report.static_cache.clone();
        self.add_all(&static_cache, urls, &mut report).await;

        self.storage.open(&report.dynamic_cache);
        log::info!("caching images");
        let urls = self.manifest_urls(&self.config.image_manifest, &mut report);
        let dynamic_cache = report.dynamic_cache.clone();
        self.add_all(&dynamic_cache, urls, &mut report).await;

        for failure in &report.failed {
            log::warn!("cache worker install warning: {} - {}", failure.url, failure.reason);
        }
        log::info!(
            "cache worker installed ({} cached, {} skipped, {} failed)",
            report.cached.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report.skip_waiting = true;
        report
    }

    async fn on_activate(&self) -> ActivateReport {
        log::info!("cache worker activating...");
        let static_cache = self.config.static_cache_name();
        let dynamic_cache = self.config.dynamic_cache_name();

        let mut deleted = Vec::new();
        for name in self.storage.keys() {
            if name != static_cache && name != dynamic_cache {
                log::info!("deleting old cache: {name}");
                if self.storage.delete(&name) {
                    deleted.push(name);
                }
            }
        }

        log::info!("cache worker activated");
        ActivateReport {
            deleted,
            claim_clients: true,
        }
    }

    async fn on_fetch(&self, request: &Request) -> Result<FetchDisposition, WorkerError> {
        if request.method != Method::GET {
            return Ok(FetchDisposition::PassThrough);
        }

        // From a local copy of the site, requests to other schemes (e.g. the
        // CDNs over https) can't be proxied
        if self.config.is_local_file_context()
            && request.url.scheme() != self.config.scope.scheme()
        {
            return Ok(FetchDisposition::PassThrough);
        }

        let class = classify(&request.url, &self.config.image_dir_marker);
        log::debug!("fetch {} ({class:?}, {:?})", request.url, request.destination);

        let is_document =
            class == RequestClass::Document || request.destination == Destination::Document;
        let is_image = class == RequestClass::Image || request.destination == Destination::Image;

        let response = match class {
            RequestClass::Document => {
                self.network_first(request, &self.config.static_cache_name(), is_document)
                    .await?
            }
            RequestClass::Image => {
                self.cache_first(request, &self.config.dynamic_cache_name(), is_image)
                    .await?
            }
            RequestClass::StaticAsset => {
                self.cache_first(request, &self.config.static_cache_name(), is_image)
                    .await?
            }
            RequestClass::Dynamic => {
                self.network_first(request, &self.config.dynamic_cache_name(), is_document)
                    .await?
            }
        };
        Ok(FetchDisposition::Respond(response))
    }

    fn on_push(&self, payload: Option<&str>) -> Notification {
        notification::push_notification(
            &self.config.notifications,
            payload,
            crate::helpers::now_millis(),
        )
    }

    fn on_notification_click(&self, action: Option<&str>) -> String {
        notification::click_target(&self.config.notifications, action).to_string()
    }

    /// Queued submissions are written to the log and dropped. Nothing is
    /// sent anywhere.
    async fn on_sync(&self, tag: &str) -> usize {
        if tag != FORM_SUBMISSION_SYNC_TAG {
            log::debug!("ignoring sync event '{tag}'");
            return 0;
        }

        let forms = self.outbox.take_all();
        for form in &forms {
            match serde_json::to_string(form) {
                Ok(json) => log::info!("form sync (offline log): {json}"),
                Err(e) => log::warn!("form sync skipped: {e}"),
            }
        }
        forms.len()
    }
}
