//! Shared input validation helpers.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

/// Digits with an optional leading `+`, spaces, dashes and parentheses;
/// 10 to 15 digits in total.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9\s\-()]{10,20}$").expect("phone pattern is valid")
});

/// Validate a phone number.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if PHONE_RE.is_match(value.trim()) && (10..=15).contains(&digits) {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("must be a valid phone number".into()))
    }
}

/// Reject empty and whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("must not be blank".into()))
    } else {
        Ok(())
    }
}

/// Trim a string and turn an empty result into `None`.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
