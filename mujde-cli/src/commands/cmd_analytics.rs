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
use prettytable::{format, row, Table};

use mujde::analytics::{EventLog, MAX_EVENTS};

pub fn handle_analytics(log_path: &Path, recent: usize, clear: bool) -> Result<()> {
    if !log_path.exists() {
        return Err(eyre!("no event log at '{}'", log_path.display()));
    }

    let mut log = EventLog::open(log_path);
    if clear {
        let count = log.len();
        log.clear()?;
        println!("Deleted {count} events from {}", log_path.display());
        return Ok(());
    }

    println!(
        "{} events in {} (the most recent {MAX_EVENTS} are kept)",
        log.len(),
        log_path.display()
    );
    if log.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["EVENT", "COUNT"]);
    for (event, count) in log.counts_by_event() {
        table.add_row(row![event, r->count]);
    }
    table.printstd();

    if recent > 0 {
        println!();
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.set_titles(row!["TIME", "EVENT", "PAGE", "SESSION"]);
        for event in log.events().iter().rev().take(recent) {
            table.add_row(row![
                event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                event.event,
                event.page.as_deref().unwrap_or("-"),
                event.session_id.as_deref().unwrap_or("-")
            ]);
        }
        table.printstd();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mujde::analytics::AnalyticsPayload;

    #[test]
    fn clear_empties_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        let mut log = EventLog::open(&path);
        let payload = AnalyticsPayload {
            event: "page_view".to_string(),
            ..Default::default()
        };
        log.record(payload.received_at(chrono::Utc::now())).unwrap();

        handle_analytics(&path, 5, false).unwrap();
        handle_analytics(&path, 0, true).unwrap();
        assert!(EventLog::open(&path).is_empty());
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(handle_analytics(&dir.path().join("none.json"), 0, false).is_err());
    }
}
