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

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use mujde_server::{DEFAULT_EDGE_PORT, DEFAULT_HOST, DEFAULT_SITE_PORT};

// Match the default ports of the site and edge servers
const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080/";
const DEFAULT_EDGE: &str = "http://127.0.0.1:8081/";

#[derive(Parser, Debug)]
#[command(
    name = "mujde",
    version,
    about = "Serve the MÜJDE AUTO website, with contact and analytics APIs, and an offline caching edge in front of it"
)]
pub struct Opt {
    #[command(subcommand)]
    pub cmd: Subcommands,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Serve the site's files and its /api endpoints
    ///
    /// Contact form email is sent with SendGrid when SENDGRID_API_KEY is set,
    /// and otherwise only logged.
    Serve {
        /// Directory containing index.html and the rest of the site
        #[arg(long, default_value = ".")]
        site_root: PathBuf,

        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        #[arg(long, default_value_t = DEFAULT_SITE_PORT)]
        port: u16,

        /// Save analytics events to this JSON file
        #[arg(long)]
        analytics_log: Option<PathBuf>,
    },

    /// Serve a site through the offline cache worker
    ///
    /// The worker caches the site when it starts and then answers every
    /// request from the network or its caches, so pages keep working while
    /// the origin is down.
    Edge {
        /// The site to cache. Either a URL or a file:// URL of a local copy.
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: Url,

        /// Worker configuration as JSON. Fields left out take their defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the cache version, e.g. to drop everything cached so far
        #[arg(long)]
        cache_version: Option<String>,

        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        #[arg(long, default_value_t = DEFAULT_EDGE_PORT)]
        port: u16,
    },

    /// Summarise a saved analytics event log
    Analytics {
        /// The log written by 'mujde serve --analytics-log'
        #[arg(long)]
        log: PathBuf,

        /// Also list this many of the most recent events
        #[arg(long, default_value_t = 0)]
        recent: usize,

        /// Delete all events from the log
        #[arg(long, default_value_t = false)]
        clear: bool,
    },

    /// List the cache partitions of a running edge
    Caches {
        /// Address of the edge
        #[arg(long, default_value = DEFAULT_EDGE)]
        edge: Url,

        /// Show every cached URL rather than just a count
        #[arg(long, default_value_t = false)]
        urls: bool,
    },

    /// Print the worker configuration (the defaults unless a file is given) as JSON
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
