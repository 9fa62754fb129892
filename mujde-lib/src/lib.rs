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

//! # mujde
//!
//! Library for the MÜJDE AUTO website. The main part is the offline
//! cache worker (see [`worker`]), which decides per request whether to
//! answer from the network or from one of two versioned cache partitions.
//!
//! The rest is the small amount of domain the site has: contact form
//! validation and email, analytics events and spam protection.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod contact;
pub mod email;
pub mod helpers;
pub mod net;
pub mod rate_limit;
pub mod worker;

pub use cache::{CacheStorage, MemoryCacheStorage, RequestKey};
pub use config::WorkerConfig;
pub use net::{Destination, FetchError, HttpNetwork, Network, Request, Response};
pub use worker::{CacheWorker, FetchDisposition, WorkerError, WorkerHandler};

/// Name used in notifications, emails and logs
pub const SITE_NAME: &str = "MÜJDE AUTO";
