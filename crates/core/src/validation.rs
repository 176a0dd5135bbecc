//! Explicit input validation helpers.
//!
//! Each request DTO has a `validate_*` function (in `tally-db` models) that
//! runs these checks and collects every failure into a [`FieldErrors`]
//! list, so a client sees all problems at once instead of the first one.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CoreError, FieldError};
use crate::types::Date;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length of project and task names.
pub const MAX_NAME_LEN: usize = 200;
/// Maximum length of member names.
pub const MAX_MEMBER_NAME_LEN: usize = 100;
/// Maximum length of member emails.
pub const MAX_EMAIL_LEN: usize = 255;
/// Maximum length of member roles.
pub const MAX_ROLE_LEN: usize = 50;
/// Maximum length of member departments.
pub const MAX_DEPARTMENT_LEN: usize = 100;
/// Hours recorded in one time entry cannot exceed a day.
pub const MAX_ENTRY_HOURS: f64 = 24.0;

/// ISO 8601 calendar date format used on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Accumulates field errors for one request body.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record the error from a `Result` if it failed, returning the value otherwise.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.push(field, message);
                None
            }
        }
    }

    /// `Ok(())` when nothing was recorded, `CoreError::InvalidInput` otherwise.
    pub fn finish(self) -> Result<(), CoreError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidInput(self.errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// Require a trimmed, non-empty string of at most `max` characters.
pub fn validate_required_text(value: &str, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err("must not be empty".to_string());
    }
    if len > max {
        return Err(format!("must be at most {max} characters"));
    }
    Ok(())
}

/// Optional string of at most `max` characters.
pub fn validate_optional_text(value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max => Err(format!("must be at most {max} characters")),
        _ => Ok(()),
    }
}

/// A finite, non-negative amount (hours, rates, money).
pub fn validate_non_negative(value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err("must be a finite number".to_string());
    }
    if value < 0.0 {
        return Err(format!("must be greater than or equal to 0, got {value}"));
    }
    Ok(())
}

/// Hours for a single time entry: `0 < hours <= 24`.
pub fn validate_entry_hours(hours: f64) -> Result<(), String> {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_ENTRY_HOURS {
        return Err(format!(
            "must be greater than 0 and at most {MAX_ENTRY_HOURS}, got {hours}"
        ));
    }
    Ok(())
}

/// A value within `[0.0, 1.0]`, e.g. an allocation rate.
pub fn validate_unit_range(value: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("must be between 0.0 and 1.0, got {value}"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > MAX_EMAIL_LEN {
        return Err(format!("must be at most {MAX_EMAIL_LEN} characters"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err("must be a valid email address".to_string());
    }
    Ok(())
}

/// Three uppercase ASCII letters (ISO 4217 shape).
pub fn validate_currency(code: &str) -> Result<(), String> {
    if !CURRENCY_RE.is_match(code) {
        return Err(format!("must be a 3-letter uppercase currency code, got '{code}'"));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| format!("must be a date in YYYY-MM-DD format, got '{value}'"))
}

/// Parse an optional `YYYY-MM-DD` date.
pub fn parse_optional_date(value: Option<&str>) -> Result<Option<Date>, String> {
    value.map(parse_date).transpose()
}

/// End date must not precede start date when both are present.
pub fn validate_date_range(start: Option<Date>, end: Option<Date>) -> Result<(), String> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err("end_date must not be before start_date".to_string()),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
