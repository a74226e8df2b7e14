//! # School Record
//!
//! The only persisted entity. `id`, `created_at` and `version` are assigned
//! by the store; every other field is client supplied and checked by
//! [`validate_school`] before it reaches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validator::{self, Validator};

/// Maximum length, in bytes, of `name`, `level` and `contact`.
pub const MAX_SHORT_TEXT: usize = 200;
/// Maximum length, in bytes, of `address`.
pub const MAX_ADDRESS: usize = 500;
/// Maximum number of delivery-mode tags.
pub const MAX_MODES: usize = 5;

/// A school directory entry.
///
/// `version` starts at 1 and is incremented by exactly one on every
/// successful update; it is the token for optimistic concurrency control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub level: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub mode: Vec<String>,
    pub version: i32,
}

/// Check every client-supplied field of `school`, recording failures in `v`.
///
/// Checks run in a fixed order and the first failure per field wins.
pub fn validate_school(v: &mut Validator, school: &School) {
    check_short_text(v, "name", &school.name);
    check_short_text(v, "level", &school.level);
    check_short_text(v, "contact", &school.contact);

    v.check(!school.phone.is_empty(), "phone", "must be provided");
    v.check(
        validator::matches(&school.phone, validator::phone_rx()),
        "phone",
        "must be a valid phone number",
    );

    v.check(!school.email.is_empty(), "email", "must be provided");
    v.check(
        validator::matches(&school.email, validator::email_rx()),
        "email",
        "must be a valid email address",
    );

    v.check(!school.website.is_empty(), "website", "must be provided");
    v.check(validator::valid_url(&school.website), "website", "must be a valid URL");

    v.check(!school.address.is_empty(), "address", "must be provided");
    v.check(
        school.address.len() <= MAX_ADDRESS,
        "address",
        "must not be more than 500 bytes long",
    );

    v.check(!school.mode.is_empty(), "mode", "must contain at least 1 entry");
    v.check(school.mode.len() <= MAX_MODES, "mode", "must contain at most 5 entries");
    v.check(
        validator::unique(&school.mode),
        "mode",
        "must not contain duplicate entries",
    );
}

fn check_short_text(v: &mut Validator, field: &str, value: &str) {
    v.check(!value.is_empty(), field, "must be provided");
    v.check(
        value.len() <= MAX_SHORT_TEXT,
        field,
        "must not be more than 200 bytes long",
    );
}
