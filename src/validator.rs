use std::{collections::BTreeMap, collections::HashSet, hash::Hash};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ModelError;

/// Field name to the first message recorded against it.
pub type FieldErrors = BTreeMap<String, String>;

lazy_static! {
    pub static ref EMAIL_RX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .unwrap();
}

/// Collects field errors across many checks instead of stopping at the first.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Records `message` unless `field` already has one.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), ModelError> {
        if self.valid() {
            Ok(())
        } else {
            Err(ModelError::ValidationFailed(self.errors))
        }
    }
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "title", "must be provided");
        v.check(false, "title", "must not be more than 500 bytes long");
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["title"], "must be provided");
    }

    #[test]
    fn passing_checks_record_nothing() {
        let mut v = Validator::new();
        v.check(true, "title", "must be provided");
        assert!(v.valid());
        assert!(v.into_result().is_ok());
    }

    #[test]
    fn failures_accumulate_across_fields() {
        let mut v = Validator::new();
        v.check(false, "title", "must be provided");
        v.check(false, "year", "must be provided");
        v.add_error("email", "taken");
        match v.into_result() {
            Err(ModelError::ValidationFailed(fields)) => {
                assert_eq!(fields.len(), 3);
                assert_eq!(fields["email"], "taken");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn unique_and_permitted() {
        assert!(unique(&["drama", "comedy"]));
        assert!(!unique(&["drama", "drama"]));
        assert!(unique::<&str>(&[]));
        assert!(permitted_value(&"title", &["id", "title"]));
        assert!(!permitted_value(&"rating", &["id", "title"]));
    }

    #[test]
    fn email_pattern() {
        assert!(matches("a@example.com", &EMAIL_RX));
        assert!(matches("first.last+tag@sub.example.org", &EMAIL_RX));
        assert!(!matches("not-an-email", &EMAIL_RX));
        assert!(!matches("a@", &EMAIL_RX));
        assert!(!matches("a b@example.com", &EMAIL_RX));
    }
}
