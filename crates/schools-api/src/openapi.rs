//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Directory API",
        version = "1.0.0",
        description = "JSON CRUD for school records with optimistic concurrency and filtered, paginated listing."
    ),
    paths(
        crate::routes::healthcheck::healthcheck,
        crate::routes::schools::create_school,
        crate::routes::schools::list_schools,
        crate::routes::schools::show_school,
        crate::routes::schools::replace_school,
        crate::routes::schools::update_school,
        crate::routes::schools::delete_school,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorMessage,
        crate::routes::healthcheck::HealthReport,
        crate::routes::schools::CreateSchoolRequest,
        crate::routes::schools::ReplaceSchoolRequest,
        crate::routes::schools::UpdateSchoolRequest,
        crate::routes::schools::SchoolEnvelope,
        crate::routes::schools::SchoolListEnvelope,
        crate::routes::schools::MessageEnvelope,
    )),
    tags(
        (name = "schools", description = "School records"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/v1/healthcheck", "/v1/schools", "/v1/schools/{id}"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn request_bodies_have_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        for name in ["CreateSchoolRequest", "ReplaceSchoolRequest", "UpdateSchoolRequest"] {
            assert!(schemas.contains_key(name), "missing {name}");
        }
    }
}
