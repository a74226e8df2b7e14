//! # API Error Types
//!
//! [`AppError`] is the single error type returned by handlers. It maps
//! repository and validation failures to HTTP status codes and renders the
//! JSON envelope `{"error": ...}`, where the payload is either a message or a
//! map of field names to messages. 500-class errors never expose their cause;
//! the cause is logged instead.

use std::collections::BTreeMap;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::RepositoryError;

/// Body returned for every 500-class response.
pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
const EDIT_CONFLICT_MESSAGE: &str =
    "unable to update the record due to an edit conflict, please try again";

/// JSON error envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

/// Either a single message or per-field validation messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    Fields(BTreeMap<String, String>),
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown route, unknown id or an id that can never exist (404).
    #[error("resource not found")]
    NotFound,

    /// The record changed since the client read it (409).
    #[error("edit conflict")]
    EditConflict,

    /// One or more fields failed validation (422).
    #[error("validation failed: {0:?}")]
    Validation(BTreeMap<String, String>),

    /// The request body or query could not be decoded (400).
    #[error("{0}")]
    BadRequest(String),

    /// Route exists but not for this method (405).
    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    /// An internal invariant was violated (500). Logged, never exposed.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Any other server-side failure (500). Logged, never exposed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::EditConflict => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Invariant(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            Self::NotFound => ErrorMessage::Text(NOT_FOUND_MESSAGE.to_string()),
            Self::EditConflict => ErrorMessage::Text(EDIT_CONFLICT_MESSAGE.to_string()),
            Self::Validation(fields) => ErrorMessage::Fields(fields.clone()),
            Self::BadRequest(_) | Self::MethodNotAllowed(_) => {
                ErrorMessage::Text(self.to_string())
            }
            Self::Invariant(_) | Self::Internal(_) => {
                ErrorMessage::Text(SERVER_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Invariant(cause) => {
                tracing::error!(cause = %cause, "invariant violation");
            }
            Self::Internal(cause) => {
                tracing::error!(cause = %cause, "internal server error");
            }
            _ => {}
        }

        let body = ErrorBody {
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::EditConflict => Self::EditConflict,
            RepositoryError::Invariant(e) => Self::Invariant(e.to_string()),
            other @ (RepositoryError::Timeout(_) | RepositoryError::Database(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use schools_core::FilterError;

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EditConflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Validation(BTreeMap::new()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MethodNotAllowed(Method::PATCH).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::Invariant("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn repository_errors_map_to_app_errors() {
        assert!(matches!(AppError::from(RepositoryError::NotFound), AppError::NotFound));
        assert!(matches!(
            AppError::from(RepositoryError::EditConflict),
            AppError::EditConflict
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Invariant(FilterError::UnsafeSort("x".into()))),
            AppError::Invariant(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
            AppError::Internal(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Timeout(crate::db::QUERY_TIMEOUT)),
            AppError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn into_response_not_found() {
        let (status, body) = response_parts(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn into_response_edit_conflict() {
        let (status, body) = response_parts(AppError::EditConflict).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], EDIT_CONFLICT_MESSAGE);
    }

    #[tokio::test]
    async fn into_response_validation_is_field_map() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), "must be provided".to_string());
        let (status, body) = response_parts(AppError::Validation(fields)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, serde_json::json!({"error": {"email": "must be provided"}}));
    }

    #[tokio::test]
    async fn into_response_method_not_allowed() {
        let (status, body) = response_parts(AppError::MethodNotAllowed(Method::PATCH)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body["error"],
            "the PATCH method is not supported for this resource"
        );
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], SERVER_ERROR_MESSAGE);

        let (status, body) =
            response_parts(AppError::Invariant("unsafe sort parameter".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn error_message_round_trips_both_shapes() {
        let text: ErrorBody = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(text.error, ErrorMessage::Text("nope".into()));

        let fields: ErrorBody = serde_json::from_str(r#"{"error":{"name":"bad"}}"#).unwrap();
        assert!(matches!(fields.error, ErrorMessage::Fields(ref m) if m["name"] == "bad"));
    }
}
