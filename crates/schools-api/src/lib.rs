//! # schools-api: Axum API Service for the School Directory
//!
//! JSON CRUD over school records with optimistic concurrency control and a
//! filtered, paginated listing, backed by PostgreSQL (or an in-memory store
//! when no database is configured).
//!
//! ## API Surface
//!
//! | Route                 | Module                     | Methods                   |
//! |-----------------------|----------------------------|---------------------------|
//! | `/v1/healthcheck`     | [`routes::healthcheck`]    | GET                       |
//! | `/v1/schools`         | [`routes::schools`]        | GET, POST                 |
//! | `/v1/schools/{id}`    | [`routes::schools`]        | GET, PUT, PATCH, DELETE   |
//! | `/openapi.json`       | [`openapi`]                | GET                       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CatchPanicLayer → DefaultBodyLimit → Handler
//! ```
//!
//! Unknown routes answer 404 and known routes with the wrong method answer
//! 405, both in the standard error envelope.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::Router;

use crate::error::AppError;
use crate::extractors::MAX_BODY_BYTES;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::healthcheck::router())
        .merge(routes::schools::router())
        .merge(openapi::router())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::panic::layer())
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}
