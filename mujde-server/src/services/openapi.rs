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

use utoipa::OpenApi;

use crate::services::api;

pub(crate) const JSON_PATH: &str = "/api/openapi.json";

#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "MÜJDE AUTO",
        description = "
### Contact and analytics APIs for the MÜJDE AUTO website
<p>
The site posts its contact form to <b>/api/contact</b>, which validates it and emails
it to the dealership, and sends page events to <b>/api/analytics</b>.
</p>"
    ),
    paths(api::contact, api::analytics),
    components(schemas(api::ApiSuccess, api::ApiError, api::ApiMessage)),
    tags(
        [name = "api", description = "website APIs"],
    ),
)]
pub(crate) struct SiteApiDoc;

#[test]
fn check_openapi_paths() {
    let doc = SiteApiDoc::openapi();
    assert!(doc.paths.paths.contains_key("/api/contact"));
    assert!(doc.paths.paths.contains_key("/api/analytics"));
}
