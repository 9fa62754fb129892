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

//! Endpoints for the worker events which don't come from a page fetch:
//! push messages, notification clicks and background sync. Also a listing
//! of the cache partitions.

use actix_web::{http::header, web, web::Data, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use mujde::cache::summarise;
use mujde::WorkerHandler;

use crate::services::EdgeState;

pub const WORKER_API_ROUTE: &str = "/sw";

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResult {
    pub tag: String,
    pub synced: usize,
}

/// The body is the push message text, which may be empty
pub async fn push(body: web::Bytes, state: Data<EdgeState>) -> HttpResponse {
    let payload = std::str::from_utf8(&body).ok();
    HttpResponse::Ok().json(state.worker.on_push(payload))
}

/// Redirects to the page for the clicked action
pub async fn notification_click(request: HttpRequest, state: Data<EdgeState>) -> HttpResponse {
    let action = request.match_info().get("action");
    let target = state.worker.on_notification_click(action);
    log::debug!("notification click {action:?} opens {target}");

    HttpResponse::Found()
        .insert_header((header::LOCATION, target))
        .finish()
}

pub async fn sync(tag: web::Path<String>, state: Data<EdgeState>) -> HttpResponse {
    let tag = tag.into_inner();
    let synced = state.worker.on_sync(&tag).await;
    HttpResponse::Ok().json(SyncResult { tag, synced })
}

pub async fn caches(state: Data<EdgeState>) -> HttpResponse {
    HttpResponse::Ok().json(summarise(state.worker.storage().as_ref()))
}
