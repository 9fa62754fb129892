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

//! Named cache partitions holding responses keyed by request identity.
//!
//! A partition name embeds a version (e.g. `mujde-auto-static-v1.0.0`) so
//! bumping the version leaves the old partitions behind, to be deleted when
//! the new worker activates.
//!
//! Access is always one get or one put at a time. Nothing holds a partition
//! lock across a network request, and two writers for the same key simply
//! overwrite each other.

mod memory;

use http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::net::{Request, Response};

pub use memory::MemoryCacheStorage;

/// Default number of entries held per partition before the least recently
/// used entry is dropped
pub const PARTITION_CAPACITY: u32 = 1000;

/// Request identity: method plus URL (without any fragment)
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RequestKey {
    pub method: Method,
    pub url: Url,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> RequestKey {
        let mut url = url.clone();
        url.set_fragment(None);
        RequestKey { method, url }
    }

    pub fn get(url: &Url) -> RequestKey {
        RequestKey::new(Method::GET, url)
    }
}

impl From<&Request> for RequestKey {
    fn from(request: &Request) -> RequestKey {
        RequestKey::new(request.method.clone(), &request.url)
    }
}

/// Storage for named cache partitions.
///
/// The worker only ever sees this trait so a host can supply whatever
/// backing it likes. Operations are best-effort and do not fail: a missing
/// partition reads as empty.
pub trait CacheStorage: Send + Sync {
    /// Create the named partition if it does not already exist
    fn open(&self, name: &str);

    fn has(&self, name: &str) -> bool;

    /// Names of all partitions in creation order
    fn keys(&self) -> Vec<String>;

    /// Delete a partition, returning true if it existed
    fn delete(&self, name: &str) -> bool;

    /// Store a response, creating the partition if needed
    fn put(&self, name: &str, key: RequestKey, response: Response);

    /// Look up a response in one partition
    fn match_in(&self, name: &str, key: &RequestKey) -> Option<Response>;

    /// Look up a response in every partition, oldest partition first
    fn match_any(&self, key: &RequestKey) -> Option<Response>;

    /// The request keys currently stored in a partition
    fn entries(&self, name: &str) -> Vec<RequestKey>;
}

/// A partition and the URLs it holds, as reported to tools
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub name: String,
    pub urls: Vec<String>,
}

/// Every partition in creation order
pub fn summarise(storage: &dyn CacheStorage) -> Vec<PartitionSummary> {
    storage
        .keys()
        .into_iter()
        .map(|name| {
            let urls = storage
                .entries(&name)
                .into_iter()
                .map(|key| key.url.to_string())
                .collect();
            PartitionSummary { name, urls }
        })
        .collect()
}
