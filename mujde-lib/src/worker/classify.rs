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

use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::Url;

/// The kind of resource a request is for, decided from its path alone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// `.html` or the site root
    Document,
    /// In the image directory, or `.jpg` / `.png`
    Image,
    /// `.css` / `.js`
    StaticAsset,
    /// Anything else
    Dynamic,
}

/// Classify a request URL. The checks are made in order so for example
/// `/görseller/brochure.html` is a `Document`.
///
/// `image_dir_marker` is compared with both the path as sent (percent
/// encoded) and the decoded path, so a marker with non-ASCII characters
/// such as `/görseller/` matches either way.
pub fn classify(url: &Url, image_dir_marker: &str) -> RequestClass {
    let path = url.path();

    if path.ends_with(".html") || path == "/" {
        return RequestClass::Document;
    }

    let in_image_dir = !image_dir_marker.is_empty()
        && (path.contains(image_dir_marker)
            || percent_decode_str(path)
                .decode_utf8_lossy()
                .contains(image_dir_marker));
    if in_image_dir || path.ends_with(".jpg") || path.ends_with(".png") {
        return RequestClass::Image;
    }

    if path.ends_with(".css") || path.ends_with(".js") {
        return RequestClass::StaticAsset;
    }

    RequestClass::Dynamic
}
