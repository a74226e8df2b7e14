//! # List Filters & Pagination Metadata
//!
//! [`Filters`] carries the paging and sort parameters of a list request.
//! The sort key is checked against a per-endpoint allow-list twice: once
//! as user input in [`validate_filters`], and again when the SQL column is
//! resolved in [`Filters::sort_column`]. A failure at the second point is
//! an internal invariant violation, reported as [`FilterError::UnsafeSort`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::{self, Validator};

/// Sort keys accepted by `GET /v1/schools`. A leading `-` means descending.
pub const SCHOOL_SORT_SAFELIST: &[&str] = &["id", "name", "level", "-id", "-name", "-level"];

/// Largest page number a client may request.
pub const MAX_PAGE: i64 = 1_000;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Page size used when the client does not supply one.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Errors raised while turning filters into a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The sort key is not in the allow-list. User input is validated
    /// before this point, so reaching it means the two checks disagree.
    #[error("unsafe sort parameter: {0:?}")]
    UnsafeSort(String),
}

/// Ordering applied to the primary sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Paging and sort parameters for a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    /// Filters for the school listing endpoint.
    pub fn for_schools(page: i64, page_size: i64, sort: impl Into<String>) -> Self {
        Self {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist: SCHOOL_SORT_SAFELIST,
        }
    }

    /// Column named by the sort key, with any `-` prefix removed.
    pub fn sort_column(&self) -> Result<&str, FilterError> {
        if validator::permitted_value(self.sort.as_str(), self.sort_safelist) {
            Ok(self.sort.trim_start_matches('-'))
        } else {
            Err(FilterError::UnsafeSort(self.sort.clone()))
        }
    }

    /// `DESC` when the sort key starts with `-`, `ASC` otherwise.
    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    /// Maximum rows returned for one page.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Rows skipped before the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self::for_schools(1, DEFAULT_PAGE_SIZE, "id")
    }
}

/// Check user-supplied filter values, recording failures in `v`.
pub fn validate_filters(v: &mut Validator, f: &Filters) {
    v.check(f.page > 0, "page", "must be greater than 0");
    v.check(f.page <= MAX_PAGE, "page", "must be a maximum of 1000");
    v.check(f.page_size > 0, "page_size", "must be greater than 0");
    v.check(f.page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");
    v.check(
        validator::permitted_value(f.sort.as_str(), f.sort_safelist),
        "sort",
        "invalid sort value",
    );
}

/// Pagination summary returned alongside a page of results.
///
/// The zero value means "no results"; all of its fields are omitted from
/// JSON rather than reporting page 1 of 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Build the pagination summary for `total_records` matching rows.
pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records == 0 || page_size <= 0 {
        return Metadata::default();
    }
    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_column_strips_descending_prefix() {
        let f = Filters::for_schools(1, 10, "-name");
        assert_eq!(f.sort_column(), Ok("name"));
        assert_eq!(f.sort_direction(), SortDirection::Desc);

        let f = Filters::for_schools(1, 10, "level");
        assert_eq!(f.sort_column(), Ok("level"));
        assert_eq!(f.sort_direction(), SortDirection::Asc);
    }

    #[test]
    fn sort_column_outside_safelist_is_invariant_violation() {
        let f = Filters::for_schools(1, 10, "name; DROP TABLE schools");
        assert_eq!(
            f.sort_column(),
            Err(FilterError::UnsafeSort("name; DROP TABLE schools".to_string()))
        );
    }

    #[test]
    fn limit_and_offset() {
        let f = Filters::for_schools(3, 25, "id");
        assert_eq!(f.limit(), 25);
        assert_eq!(f.offset(), 50);
        assert_eq!(Filters::default().offset(), 0);
    }

    #[test]
    fn validate_filters_accepts_defaults() {
        let mut v = Validator::new();
        validate_filters(&mut v, &Filters::default());
        assert!(v.is_valid());
    }

    #[test]
    fn validate_filters_bounds() {
        let mut v = Validator::new();
        validate_filters(&mut v, &Filters::for_schools(0, 101, "-version"));
        let errors = v.into_errors();
        assert_eq!(errors["page"], "must be greater than 0");
        assert_eq!(errors["page_size"], "must be a maximum of 100");
        assert_eq!(errors["sort"], "invalid sort value");

        let mut v = Validator::new();
        validate_filters(&mut v, &Filters::for_schools(1001, 0, "id"));
        let errors = v.into_errors();
        assert_eq!(errors["page"], "must be a maximum of 1000");
        assert_eq!(errors["page_size"], "must be greater than 0");
        assert!(!errors.contains_key("sort"));
    }

    #[test]
    fn metadata_for_partial_last_page() {
        let m = calculate_metadata(25, 2, 10);
        assert_eq!(
            m,
            Metadata {
                current_page: 2,
                page_size: 10,
                first_page: 1,
                last_page: 3,
                total_records: 25,
            }
        );
    }

    #[test]
    fn metadata_for_exact_multiple() {
        assert_eq!(calculate_metadata(20, 1, 10).last_page, 2);
        assert_eq!(calculate_metadata(1, 1, 100).last_page, 1);
    }

    #[test]
    fn empty_metadata_serializes_to_empty_object() {
        let m = calculate_metadata(0, 4, 10);
        assert_eq!(m, Metadata::default());
        assert_eq!(serde_json::to_string(&m).unwrap(), "{}");
    }

    #[test]
    fn populated_metadata_serializes_all_fields() {
        let json = serde_json::to_value(calculate_metadata(25, 2, 10)).unwrap();
        assert_eq!(json["current_page"], 2);
        assert_eq!(json["first_page"], 1);
        assert_eq!(json["last_page"], 3);
        assert_eq!(json["total_records"], 25);
    }
}
