// Validation utilities module
// Provides custom validation functions for domain-specific rules

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

use crate::logs::models::{Feature, SpringType, DATE_FORMAT};

pub const MIN_PASSWORD_LENGTH: usize = 8;

fn letter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]").expect("valid regex"))
}

fn digit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]").expect("valid regex"))
}

/// Validates password strength
/// At least 8 characters with at least one letter and one digit
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_short"));
    }
    if !letter_regex().is_match(password) {
        return Err(ValidationError::new("password_missing_letter"));
    }
    if !digit_regex().is_match(password) {
        return Err(ValidationError::new("password_missing_digit"));
    }
    Ok(())
}

/// Validates a `YYYY-MM-DD` calendar date
pub fn validate_visit_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_date"))
}

/// Validates that a spring type is one of the accepted values
pub fn validate_spring_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<SpringType>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_spring_type"))
}

/// Validates every feature against the fixed feature list
pub fn validate_features(features: &[String]) -> Result<(), ValidationError> {
    if features.iter().all(|f| f.parse::<Feature>().is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_feature"))
    }
}

/// Validates that a field is not just whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}
