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

//! Immutable configuration handed to the cache worker when it is created.
//!
//! Every field has a default matching the MÜJDE AUTO site, so a config file
//! only needs the values which differ, e.g. `{"version": "v1.0.1"}`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::PARTITION_CAPACITY;

pub const DEFAULT_CACHE_PREFIX: &str = "mujde-auto";
pub const DEFAULT_CACHE_VERSION: &str = "v1.0.0";
pub const DEFAULT_SCOPE: &str = "http://127.0.0.1:8080/";

/// Tag used when the page asks for queued form submissions to be synced
pub const FORM_SUBMISSION_SYNC_TAG: &str = "form-submission";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read worker config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid worker config '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// First part of both partition names
    pub cache_prefix: String,
    /// Last part of both partition names. Changing it orphans the old partitions.
    pub version: String,
    /// The URL the worker was loaded from. Relative manifest entries are
    /// resolved against it and its scheme decides the execution context.
    pub scope: Url,
    /// Pages, stylesheet, script, icons, app manifest and CDN assets
    pub static_manifest: Vec<String>,
    /// Vehicle photos
    pub image_manifest: Vec<String>,
    /// Served for a document request when both network and cache fail
    pub offline_document: String,
    /// Any path containing this is treated as an image
    pub image_dir_marker: String,
    /// Text shown in the placeholder for an image that can't be loaded
    pub placeholder_label: String,
    /// Maximum entries per partition
    pub partition_capacity: u32,
    pub notifications: NotificationConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            version: DEFAULT_CACHE_VERSION.to_string(),
            scope: default_scope(),
            static_manifest: to_strings(&[
                "./",
                "./index.html",
                "./about.html",
                "./contact.html",
                "./css/style.css",
                "./js/script.js",
                "./favicon.svg",
                "./apple-touch-icon.png",
                "./manifest.json",
                "https://cdn.jsdelivr.net/npm/bootstrap@5.1.3/dist/css/bootstrap.min.css",
                "https://cdn.jsdelivr.net/npm/bootstrap@5.1.3/dist/js/bootstrap.bundle.min.js",
                "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
            ]),
            image_manifest: to_strings(&[
                "./img/bmw320i.jpg",
                "./img/mercedes.jpg",
                "./img/audia4.jpg",
                "./img/passat3.jpg",
                "./img/tesla.jpg",
                "./img/opelastra.jpg",
                "./img/fiat.png",
                "./img/clio.png",
            ]),
            offline_document: "/index.html".to_string(),
            image_dir_marker: "/görseller/".to_string(),
            placeholder_label: "Resim Yüklenemedi".to_string(),
            partition_capacity: PARTITION_CAPACITY,
            notifications: NotificationConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<WorkerConfig, ConfigError> {
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn with_scope(mut self, scope: Url) -> WorkerConfig {
        self.scope = scope;
        self
    }

    pub fn with_version(mut self, version: &str) -> WorkerConfig {
        self.version = version.to_string();
        self
    }

    pub fn static_cache_name(&self) -> String {
        format!("{}-static-{}", self.cache_prefix, self.version)
    }

    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-dynamic-{}", self.cache_prefix, self.version)
    }

    /// True when the worker was loaded from a local copy of the site
    /// rather than over the network
    pub fn is_local_file_context(&self) -> bool {
        self.scope.scheme() == "file"
    }
}

/// Texts and targets used for push notifications
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    pub default_body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub explore_title: String,
    pub explore_url: String,
    pub contact_title: String,
    pub contact_url: String,
    pub action_icon: String,
    /// Opened when a notification is clicked without a recognised action
    pub default_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            title: crate::SITE_NAME.to_string(),
            default_body: "MÜJDE AUTO'dan yeni bir bildirim!".to_string(),
            icon: "./favicon.svg".to_string(),
            badge: "./favicon.svg".to_string(),
            vibrate: vec![100, 50, 100],
            explore_title: "Araçları İncele".to_string(),
            explore_url: "/#vehicles".to_string(),
            contact_title: "İletişim".to_string(),
            contact_url: "/contact.html".to_string(),
            action_icon: "/favicon.svg".to_string(),
            default_url: "/".to_string(),
        }
    }
}

fn default_scope() -> Url {
    Url::parse(DEFAULT_SCOPE).expect("DEFAULT_SCOPE is a valid URL")
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
