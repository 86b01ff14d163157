//! Contact-form validation for the reservation step.
//!
//! All rules run on every submission and every failure is collected, so the
//! form can be redisplayed with one message per offending field.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Contact fields submitted on `POST /make-reservation`.
///
/// Missing fields deserialize as empty strings so that the `required` rule
/// reports them instead of the form extractor rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ReservationForm {
    #[validate(
        custom(function = "required"),
        length(min = 3, message = "This field must be at least 3 characters long")
    )]
    pub first_name: String,

    #[validate(custom(function = "required"))]
    pub last_name: String,

    #[validate(
        custom(function = "required"),
        email(message = "Invalid email address")
    )]
    pub email: String,

    pub phone: String,
}

impl ReservationForm {
    /// Run every rule, returning the collected failures if any rule fails.
    pub fn check(&self) -> Result<(), FormErrors> {
        self.validate().map_err(|e| FormErrors::from(&e))
    }
}

/// Rejects empty and whitespace-only values.
fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("This field cannot be blank"));
        return Err(err);
    }
    Ok(())
}

/// A single rule failure on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Rule identifier (`required`, `length`, `email`).
    pub code: String,
    /// Human-readable message shown next to the field.
    pub message: String,
}

/// Field name to failures, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<FieldError>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, code: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(FieldError {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    /// First message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|errors| errors.first())
            .map(|e| e.message.as_str())
    }

    /// Whether `field` failed the rule identified by `code`.
    pub fn has(&self, field: &str, code: &str) -> bool {
        self.0
            .get(field)
            .is_some_and(|errors| errors.iter().any(|e| e.code == code))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            // A blank field reports only that it is blank.
            let blank = field_errors.iter().any(|e| e.code == "required");
            for err in field_errors.iter().filter(|e| !blank || e.code == "required") {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"));
                out.add(&field, &err.code, &message);
            }
        }
        out
    }
}
