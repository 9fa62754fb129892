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

use std::path::{Component, Path, PathBuf};

use actix_web::{
    http::{header, Method, StatusCode},
    web,
    web::Data,
    HttpRequest, HttpResponse,
};
use percent_encoding::percent_decode_str;

use crate::services::helpers::make_error_response_page;
use crate::services::SiteState;

const INDEX_FILE: &str = "index.html";

/// Map a URL path to a file within `root`.
///
/// Returns None for paths which aren't valid UTF-8 once decoded or which
/// would escape the root.
pub(crate) fn resolve_site_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path).decode_utf8().ok()?;

    let mut path = root.to_path_buf();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }

    if path.is_dir() {
        path.push(INDEX_FILE);
    }
    Some(path)
}

/// WWW service - serves the site's files
pub async fn www_handler(request: HttpRequest, state: Data<SiteState>) -> HttpResponse {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return make_error_response_page(
            Some(StatusCode::METHOD_NOT_ALLOWED),
            &mut HttpResponse::MethodNotAllowed(),
            request.method().to_string(),
            "only GET is supported for site files",
        );
    }

    let Some(path) = resolve_site_path(&state.site_root, request.path()) else {
        return make_error_response_page(
            Some(StatusCode::BAD_REQUEST),
            &mut HttpResponse::BadRequest(),
            request.path().to_string(),
            "invalid path",
        );
    };

    let file_path = path.clone();
    let content = match web::block(move || std::fs::read(&file_path)).await {
        Ok(Ok(content)) => content,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("not found: {}", path.display());
            return make_error_response_page(
                Some(StatusCode::NOT_FOUND),
                &mut HttpResponse::NotFound(),
                request.path().to_string(),
                "page not found",
            );
        }
        Ok(Err(e)) => {
            log::warn!("failed to read {}: {e}", path.display());
            return make_error_response_page(
                Some(StatusCode::INTERNAL_SERVER_ERROR),
                &mut HttpResponse::InternalServerError(),
                request.path().to_string(),
                "failed to read file",
            );
        }
        Err(e) => {
            log::warn!("failed to read {}: {e}", path.display());
            return make_error_response_page(
                Some(StatusCode::INTERNAL_SERVER_ERROR),
                &mut HttpResponse::InternalServerError(),
                request.path().to_string(),
                "failed to read file",
            );
        }
    };

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    HttpResponse::Ok()
        .insert_header(header::ContentType(content_type))
        .body(content)
}
