/*
*   Copyright (c) 2025 Mark Hughes

*   This program is free software: you can redistribute it and/or modify
*   it under the terms of the GNU Affero General Public License as published by
*   the Free Software Foundation, either version 3 of the License, or
*   (at your option) any later version.

*   This program is distributed in the hope that it will be useful,
*   but WITHOUT ANY WARRANTY; without even the implied warranty of
*   MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*   GNU Affero General Public License for more details.

*   You should have received a copy of the GNU Affero General Public License
*   along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

pub mod services;

use std::path::PathBuf;

use mujde::email::EmailSettings;
use mujde::WorkerConfig;

pub use services::{serve_edge, serve_site};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_SITE_PORT: u16 = 8080;
pub const DEFAULT_EDGE_PORT: u16 = 8081;

/// The site origin: static files plus the contact and analytics APIs
#[derive(Clone, Debug)]
pub struct SiteSettings {
    pub host: String,
    pub port: u16,
    /// Directory holding index.html and the rest of the site
    pub site_root: PathBuf,
    /// Where analytics events are saved. None keeps them in memory only.
    pub analytics_log: Option<PathBuf>,
    pub email: EmailSettings,
}

impl SiteSettings {
    pub fn new(site_root: PathBuf) -> SiteSettings {
        SiteSettings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_SITE_PORT,
            site_root,
            analytics_log: None,
            email: EmailSettings::default(),
        }
    }
}

/// The offline edge: every request goes through the cache worker, whose
/// scope is the origin being fronted
#[derive(Clone, Debug)]
pub struct EdgeSettings {
    pub host: String,
    pub port: u16,
    pub worker: WorkerConfig,
}

impl EdgeSettings {
    pub fn new(worker: WorkerConfig) -> EdgeSettings {
        EdgeSettings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_EDGE_PORT,
            worker,
        }
    }
}
