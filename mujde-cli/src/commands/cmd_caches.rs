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

use color_eyre::{eyre::eyre, Result};
use prettytable::{format, row, Table};
use url::Url;

use mujde::cache::PartitionSummary;

const CACHES_PATH: &str = "sw/caches";

pub async fn handle_caches(edge: &Url, show_urls: bool) -> Result<()> {
    let url = edge.join(CACHES_PATH)?;
    let response = reqwest::get(url.clone())
        .await
        .map_err(|e| eyre!("unable to reach the edge at {edge}: {e}"))?;
    if !response.status().is_success() {
        return Err(eyre!("{url} returned {}", response.status()));
    }
    let partitions: Vec<PartitionSummary> = response.json().await?;

    if partitions.is_empty() {
        println!("No cache partitions");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    if show_urls {
        table.set_titles(row!["PARTITION", "URL"]);
        for partition in &partitions {
            for cached in &partition.urls {
                table.add_row(row![partition.name, cached]);
            }
        }
    } else {
        table.set_titles(row!["PARTITION", "ENTRIES"]);
        for partition in &partitions {
            table.add_row(row![partition.name, r->partition.urls.len()]);
        }
    }
    table.printstd();
    Ok(())
}
