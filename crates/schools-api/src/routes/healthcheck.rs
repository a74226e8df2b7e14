//! # Healthcheck
//!
//! Liveness report: the process is up and serving. Does not touch the
//! database.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    pub status: String,
    pub environment: String,
    pub version: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/healthcheck", get(healthcheck))
}

/// GET /v1/healthcheck: Report availability, environment and version.
#[utoipa::path(
    get,
    path = "/v1/healthcheck",
    responses(
        (status = 200, description = "Service available", body = HealthReport),
    ),
    tag = "health"
)]
pub(crate) async fn healthcheck(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "available".to_string(),
        environment: state.environment.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::Environment;
    use crate::db::memory::MemorySchoolRepository;

    #[tokio::test]
    async fn reports_environment_and_version() {
        let state = AppState::with_repository(Environment::Staging, MemorySchoolRepository::new());
        let app = router().with_state(state);

        let resp = app
            .oneshot(Request::builder().uri("/v1/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let report: HealthReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report.status, "available");
        assert_eq!(report.environment, "staging");
        assert_eq!(report.version, "1.0.0");
    }
}
