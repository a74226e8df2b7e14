//! # Field Validation
//!
//! [`Validator`] accumulates human-readable failures keyed by field name.
//! A validator is created per request and passed by `&mut` into the
//! validation functions; there is no shared state between requests.
//!
//! Only the first failure recorded for a field is kept, so checks on the
//! same field should be ordered from most to least fundamental
//! (presence before format).

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::OnceLock;

use regex::Regex;

const PHONE_PATTERN: &str = r"^\+?\(?[0-9]{3}\)?\s?-\s?[0-9]{3}\s?-\s?[0-9]{4}$";

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

/// Phone numbers such as `501-555-1234` or `+(501) - 555 - 1234`.
pub fn phone_rx() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is a valid regex"))
}

/// Email addresses (local part, `@`, dot-separated DNS labels).
pub fn email_rx() -> &'static Regex {
    static RX: OnceLock<Regex> = OnceLock::new();
    RX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
}

/// Accumulator for field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no failures have been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` under `field` unless that field already has one.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record `message` under `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    /// Borrow the recorded failures.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Consume the validator, returning the failure map.
    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

/// True when `value` matches `rx`.
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// True when `value` is one of `list`.
pub fn permitted_value<T: PartialEq + ?Sized>(value: &T, list: &[&T]) -> bool {
    list.iter().any(|candidate| *candidate == value)
}

/// True when no element of `values` repeats.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

/// True when `value` parses as an absolute URL (scheme required).
pub fn valid_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_validator_is_valid() {
        let v = Validator::new();
        assert!(v.is_valid());
        assert!(v.errors().is_empty());
    }

    #[test]
    fn check_records_failure() {
        let mut v = Validator::new();
        v.check(false, "name", "must be provided");
        assert!(!v.is_valid());
        assert_eq!(v.errors().get("name").map(String::as_str), Some("must be provided"));
    }

    #[test]
    fn check_passing_condition_is_noop() {
        let mut v = Validator::new();
        v.check(true, "name", "must be provided");
        assert!(v.is_valid());
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "mode", "must be provided");
        v.check(false, "mode", "must contain at least 1 entry");
        v.add_error("mode", "must not contain duplicate entries");
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["mode"], "must be provided");
    }

    #[test]
    fn errors_are_keyed_independently() {
        let mut v = Validator::new();
        v.check(false, "name", "must be provided");
        v.check(false, "email", "must be a valid email address");
        let errors = v.into_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
    }

    #[test]
    fn phone_pattern_accepts_common_forms() {
        for phone in ["501-555-1234", "+501-555-1234", "(501) - 555 - 1234", "+(501)-555-1234"] {
            assert!(matches(phone, phone_rx()), "{phone} should match");
        }
    }

    #[test]
    fn phone_pattern_rejects_garbage() {
        for phone in ["", "5015551234", "501-555-123", "abc-def-ghij", "501-555-12345"] {
            assert!(!matches(phone, phone_rx()), "{phone} should not match");
        }
    }

    #[test]
    fn email_pattern() {
        assert!(matches("registrar@ub.edu.bz", email_rx()));
        assert!(matches("first.last+tag@example.com", email_rx()));
        assert!(!matches("no-at-sign.example.com", email_rx()));
        assert!(!matches("trailing@", email_rx()));
        assert!(!matches("two@@example.com", email_rx()));
    }

    #[test]
    fn permitted_value_membership() {
        let list = ["id", "name", "-id"];
        let refs: Vec<&str> = list.to_vec();
        assert!(permitted_value("name", &refs));
        assert!(permitted_value("-id", &refs));
        assert!(!permitted_value("-name", &refs));
        assert!(!permitted_value("", &refs));
    }

    #[test]
    fn unique_detects_duplicates() {
        assert!(unique::<String>(&[]));
        assert!(unique(&["online", "blended"]));
        assert!(!unique(&["online", "blended", "online"]));
    }

    #[test]
    fn valid_url_requires_absolute_url() {
        assert!(valid_url("https://www.ub.edu.bz"));
        assert!(valid_url("http://localhost:4000/v1/schools"));
        assert!(!valid_url("www.ub.edu.bz"));
        assert!(!valid_url("/relative/path"));
        assert!(!valid_url(""));
    }

    proptest! {
        #[test]
        fn unique_agrees_with_dedup(values in proptest::collection::vec("[a-c]{1,2}", 0..8)) {
            let mut deduped = values.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(unique(&values), deduped.len() == values.len());
        }

        #[test]
        fn matches_is_deterministic(s in "\\PC{0,32}") {
            prop_assert_eq!(matches(&s, email_rx()), matches(&s, email_rx()));
            prop_assert_eq!(valid_url(&s), valid_url(&s));
        }

        #[test]
        fn only_first_message_is_kept(messages in proptest::collection::vec("[a-z ]{1,16}", 1..6)) {
            let mut v = Validator::new();
            for m in &messages {
                v.check(false, "field", m);
            }
            prop_assert_eq!(v.errors().len(), 1);
            prop_assert_eq!(&v.errors()["field"], &messages[0]);
        }
    }
}
