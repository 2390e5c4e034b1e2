//! Field validation for dashboard forms
//!
//! Every check records a per-field message instead of failing fast, so one
//! response can report all offending inputs at once.

use crate::utils::error::{DashboardError, FieldErrors, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("Invalid phone regex"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));
static RECORD_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("Invalid record id regex"));

/// Longest accepted free-text note
pub const MAX_NOTES_LEN: usize = 500;
/// Shortest accepted account password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Collects field errors across several checks
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required display name with length bounds (in characters)
    pub fn name(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len < min {
            self.errors
                .add(field, format!("Name must be at least {} characters", min));
        } else if len > max {
            self.errors
                .add(field, format!("Name must be less than {} characters", max));
        }
        self
    }

    /// Phone number, checked only when present
    pub fn phone(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.trim().is_empty() && !is_valid_phone(value) {
            self.errors.add(field, "Please enter a valid phone number");
        }
        self
    }

    /// Email address, checked only when present
    pub fn optional_email(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.trim().is_empty() {
            self.email(field, value);
        }
        self
    }

    /// Required email address
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.errors.add(field, "Please enter a valid email address");
        }
        self
    }

    pub fn notes(&mut self, field: &str, value: &str) -> &mut Self {
        if value.chars().count() > MAX_NOTES_LEN {
            self.errors.add(
                field,
                format!("Notes must be less than {} characters", MAX_NOTES_LEN),
            );
        }
        self
    }

    pub fn capacity(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() || value < 0.0 {
            self.errors.add(field, "Capacity must be a positive number");
        }
        self
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        if value.chars().count() < MIN_PASSWORD_LEN {
            self.errors.add(
                field,
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        self
    }

    /// Caller-supplied record identifier
    pub fn record_id(&mut self, field: &str, value: &str) -> &mut Self {
        if !RECORD_ID_PATTERN.is_match(value) {
            self.errors.add(
                field,
                "IDs may only contain letters, digits, '-' and '_' (max 64)",
            );
        }
        self
    }

    /// Record an arbitrary message
    pub fn add(&mut self, field: &str, message: &str) -> &mut Self {
        self.errors.add(field, message);
        self
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DashboardError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Phone check after stripping spaces, parentheses and dashes
pub fn is_valid_phone(value: &str) -> bool {
    let digits: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect();
    PHONE_PATTERN.is_match(&digits)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Canonical form used to key credentials by email
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
