//! # Custom Extractors & Request Parsing
//!
//! [`JsonBody`] replaces `axum::Json` for request bodies so that every decode
//! failure becomes an [`AppError::BadRequest`] with a message a client can
//! act on. Unknown fields are rejected by the request types themselves
//! (`#[serde(deny_unknown_fields)]`); this module turns the serde error into
//! text.
//!
//! The remaining helpers read path and query-string values.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use schools_core::Validator;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::error::Category;

use crate::error::AppError;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// JSON request body decoded with strict error reporting.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::BadRequest(format!(
                    "body must not be larger than {MAX_BODY_BYTES} bytes"
                ))
            } else {
                AppError::BadRequest(rejection.body_text())
            }
        })?;

        decode_json(&bytes).map(JsonBody)
    }
}

/// Decode exactly one JSON value from `bytes`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("body must not be empty".to_string()));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(describe_json_error)?;
    de.end().map_err(|_| {
        AppError::BadRequest("body must only contain a single JSON value".to_string())
    })?;
    Ok(value)
}

fn describe_json_error(err: serde_json::Error) -> AppError {
    let (line, column) = (err.line(), err.column());
    let message = match err.classify() {
        Category::Syntax => {
            format!("body contains badly formed JSON (at line {line}, column {column})")
        }
        Category::Eof | Category::Io => "body contains badly formed JSON".to_string(),
        Category::Data => {
            let text = err.to_string();
            if let Some(key) = backticked(&text, "unknown field") {
                format!("body contains unknown key \"{key}\"")
            } else if let Some(field) = backticked(&text, "missing field") {
                format!("body is missing required field \"{field}\"")
            } else {
                format!("body contains incorrect JSON type (at line {line}, column {column})")
            }
        }
    };
    AppError::BadRequest(message)
}

/// The first `` `name` `` following `prefix` in a serde message.
fn backticked<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)?.split('`').nth(1)
}

/// A field of a partial update.
///
/// `Absent` leaves the stored value alone, `Null` resets it to its empty
/// value, and `Value` replaces it. Pair with `#[serde(default)]` so a
/// missing key deserializes as `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T: Default> Patch<T> {
    /// Apply this change to `target`.
    pub fn apply_to(self, target: &mut T) {
        match self {
            Self::Absent => {}
            Self::Null => *target = T::default(),
            Self::Value(v) => *target = v,
        }
    }
}

impl<T> Patch<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_some(v),
            Self::Absent | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Self::Value(v),
            None => Self::Null,
        })
    }
}

/// Deserialize a key that must be present but may be `null`. Unlike a bare
/// `Option` field, a missing key is still reported as a missing field.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Parse a record id from a path segment. Anything that is not a positive
/// integer can never name a record, so it is reported as not found.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

/// Query-string value, or `default` when absent or empty.
pub fn read_string(value: Option<&str>, default: &str) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or(default).to_string()
}

/// Comma-separated query-string value. Blank entries are dropped.
pub fn read_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Integer query-string value, or `default` when absent or empty. A
/// non-integer value is recorded in `v` under `key` and `default` is returned.
pub fn read_int(value: Option<&str>, default: i64, key: &str, v: &mut Validator) -> i64 {
    let Some(raw) = value.filter(|s| !s.is_empty()) else {
        return default;
    };
    match raw.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            v.add_error(key, "must be an integer value");
            default
        }
    }
}
