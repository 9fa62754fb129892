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

//! Lightweight analytics: page events posted by the site are logged and
//! kept in a small capped log, optionally saved to a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Only the most recent events are kept
pub const MAX_EVENTS: usize = 100;

const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("failed to write event log '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to encode event log: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An event as posted by the page. Anything beyond the named fields (for
/// example a performance metric and its value) is kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalyticsPayload {
    /// Stamp the payload with the time it was received. A timestamp sent by
    /// the page is dropped in favour of ours.
    pub fn received_at(mut self, timestamp: DateTime<Utc>) -> AnalyticsEvent {
        self.extra.remove("timestamp");
        AnalyticsEvent {
            event: self.event,
            page: self.page,
            session_id: self.session_id,
            user_agent: self.user_agent,
            timestamp,
            extra: self.extra,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The most recent events, oldest first
pub struct EventLog {
    events: Vec<AnalyticsEvent>,
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn in_memory() -> EventLog {
        EventLog {
            events: Vec::new(),
            path: None,
        }
    }

    /// Open a log saved at `path`.
    ///
    /// A missing file starts an empty log. So does one which can't be read
    /// or parsed, after logging a warning, so that a damaged file never
    /// stops events being recorded.
    pub fn open(path: &Path) -> EventLog {
        let events = match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Vec<AnalyticsEvent>>(&json) {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("ignoring unreadable event log '{}': {e}", path.display());
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::warn!("could not read event log '{}': {e}", path.display());
                Vec::new()
            }
        };

        let mut log = EventLog {
            events,
            path: Some(path.to_path_buf()),
        };
        log.trim();
        log
    }

    pub fn events(&self) -> &[AnalyticsEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Add an event, dropping the oldest beyond [`MAX_EVENTS`], and save
    pub fn record(&mut self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events.push(event);
        self.trim();
        self.save()
    }

    pub fn clear(&mut self) -> Result<(), AnalyticsError> {
        self.events.clear();
        self.save()
    }

    /// Number of events of each type
    pub fn counts_by_event(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.event.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn trim(&mut self) {
        if self.events.len() > MAX_EVENTS {
            let excess = self.events.len() - MAX_EVENTS;
            self.events.drain(..excess);
        }
    }

    fn save(&self) -> Result<(), AnalyticsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(&self.events)?;
        std::fs::write(path, json).map_err(|source| AnalyticsError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

/// A new session id of the form `session_<epoch millis>_<9 base36 chars>`
pub fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("session_{}_{suffix}", crate::helpers::now_millis())
}
