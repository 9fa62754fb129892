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

use std::path::Path;

use color_eyre::{eyre::eyre, Result};
use url::Url;

use mujde::WorkerConfig;
use mujde_server::{EdgeSettings, SiteSettings};

use crate::cli_options::{Opt, Subcommands};
use crate::commands::{cmd_analytics, cmd_caches};

pub async fn cli_commands(opt: Opt) -> Result<()> {
    match opt.cmd {
        Subcommands::Serve {
            site_root,
            host,
            port,
            analytics_log,
        } => {
            if !site_root.is_dir() {
                return Err(eyre!(
                    "site root '{}' is not a directory",
                    site_root.display()
                ));
            }
            let settings = SiteSettings {
                host,
                port,
                analytics_log,
                ..SiteSettings::new(site_root)
            };
            mujde_server::serve_site(&settings).await?;
        }

        Subcommands::Edge {
            origin,
            config,
            cache_version,
            host,
            port,
        } => {
            let worker = edge_worker_config(config.as_deref(), origin, cache_version.as_deref())?;
            let settings = EdgeSettings {
                host,
                port,
                ..EdgeSettings::new(worker)
            };
            mujde_server::serve_edge(&settings).await?;
        }

        Subcommands::Analytics { log, recent, clear } => {
            cmd_analytics::handle_analytics(&log, recent, clear)?;
        }

        Subcommands::Caches { edge, urls } => {
            cmd_caches::handle_caches(&edge, urls).await?;
        }

        Subcommands::Config { config } => {
            let config = load_worker_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_worker_config(path: Option<&Path>) -> Result<WorkerConfig> {
    match path {
        Some(path) => Ok(WorkerConfig::from_file(path)?),
        None => Ok(WorkerConfig::default()),
    }
}

/// The worker config for an edge, with the origin as its scope
pub(crate) fn edge_worker_config(
    path: Option<&Path>,
    origin: Url,
    cache_version: Option<&str>,
) -> Result<WorkerConfig> {
    let origin = as_directory_url(origin);
    let mut config = load_worker_config(path)?.with_scope(origin);
    if let Some(version) = cache_version {
        config = config.with_version(version);
    }
    Ok(config)
}

/// Relative manifest entries resolve against the origin, so it must end in '/'
fn as_directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
