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

use parking_lot::Mutex;
use schnellru::{ByLength, LruMap};

use super::{CacheStorage, RequestKey, PARTITION_CAPACITY};
use crate::net::Response;

struct Partition {
    name: String,
    entries: LruMap<RequestKey, Response>,
}

/// In memory cache partitions.
///
/// Partitions are kept in a Vec so that lookups across all of them search
/// in creation order. Each partition is an LRU bounded by entry count.
pub struct MemoryCacheStorage {
    capacity: u32,
    partitions: Mutex<Vec<Partition>>,
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        MemoryCacheStorage::new(PARTITION_CAPACITY)
    }
}

impl MemoryCacheStorage {
    pub fn new(capacity: u32) -> MemoryCacheStorage {
        MemoryCacheStorage {
            capacity,
            partitions: Mutex::new(Vec::new()),
        }
    }

    fn new_partition(&self, name: &str) -> Partition {
        Partition {
            name: name.to_string(),
            entries: LruMap::new(ByLength::new(self.capacity)),
        }
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn open(&self, name: &str) {
        let mut partitions = self.partitions.lock();
        if !partitions.iter().any(|partition| partition.name == name) {
            log::debug!("creating cache partition '{name}'");
            partitions.push(self.new_partition(name));
        }
    }

    fn has(&self, name: &str) -> bool {
        self.partitions
            .lock()
            .iter()
            .any(|partition| partition.name == name)
    }

    fn keys(&self) -> Vec<String> {
        self.partitions
            .lock()
            .iter()
            .map(|partition| partition.name.clone())
            .collect()
    }

    fn delete(&self, name: &str) -> bool {
        let mut partitions = self.partitions.lock();
        let before = partitions.len();
        partitions.retain(|partition| partition.name != name);
        partitions.len() != before
    }

    fn put(&self, name: &str, key: RequestKey, response: Response) {
        let mut partitions = self.partitions.lock();
        let index = match partitions
            .iter()
            .position(|partition| partition.name == name)
        {
            Some(index) => index,
            None => {
                partitions.push(self.new_partition(name));
                partitions.len() - 1
            }
        };

        if !partitions[index].entries.insert(key, response) {
            log::warn!("cache partition '{name}' refused an entry (capacity {})", self.capacity);
        }
    }

    fn match_in(&self, name: &str, key: &RequestKey) -> Option<Response> {
        let mut partitions = self.partitions.lock();
        partitions
            .iter_mut()
            .find(|partition| partition.name == name)
            .and_then(|partition| partition.entries.get(key).cloned())
    }

    fn match_any(&self, key: &RequestKey) -> Option<Response> {
        let mut partitions = self.partitions.lock();
        for partition in partitions.iter_mut() {
            if let Some(response) = partition.entries.get(key) {
                return Some(response.clone());
            }
        }
        None
    }

    fn entries(&self, name: &str) -> Vec<RequestKey> {
        self.partitions
            .lock()
            .iter()
            .find(|partition| partition.name == name)
            .map(|partition| partition.entries.iter().map(|(key, _)| key.clone()).collect())
            .unwrap_or_default()
    }
}
