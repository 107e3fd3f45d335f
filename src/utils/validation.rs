//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidationError, ValidationErrors};

/// Inventory identifiers: letters, digits and a few separators
static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/\-]*$").unwrap());

/// Validate an inventory/registration/serial/document number
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.len() > 64 || !IDENTIFIER_REGEX.is_match(value) {
        let mut err = ValidationError::new("identifier");
        err.message = Some(
            "must start with a letter or digit and contain only letters, digits, '.', '_', '/' or '-'"
                .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Reject strings that are empty after trimming
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Reject negative or non-finite prices
pub fn validate_price(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        let mut err = ValidationError::new("price");
        err.message = Some("must be a non-negative number".into());
        return Err(err);
    }
    Ok(())
}

/// Single-field validation failure
pub fn field_error(
    field: &'static str,
    code: &'static str,
    message: impl Into<String>,
) -> ValidationErrors {
    let message: String = message.into();
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
