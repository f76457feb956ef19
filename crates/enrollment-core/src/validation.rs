//! Field-level validation for enrollment submissions.
//!
//! Rules are plain functions run in a fixed field order. Every field is
//! checked and all violations are collected before returning, so a caller
//! sees every problem with a submission in one response.

use std::fmt;

use serde::Serialize;

use crate::models::{NewStudent, StudentSubmission};

/// Number of digits a mobile number must have.
pub const MOBILE_NUMBER_DIGITS: usize = 10;

/// A single violated constraint on a named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Wire name of the offending field
    pub field: String,
    /// Human-readable description of the violation
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Ordered list of violations for one submission. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Returns the violations in field order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.errors
    }

    /// Returns the names of the fields that failed, in order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|v| v.field.as_str()).collect()
    }

    /// Returns true if `field` has at least one violation.
    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|v| v.field == field)
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the collection, returning the violations.
    pub fn into_inner(self) -> Vec<FieldViolation> {
        self.errors
    }
}

impl From<Vec<FieldViolation>> for ValidationErrors {
    fn from(errors: Vec<FieldViolation>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Checks a raw submission and returns the trimmed, validated fields.
///
/// # Errors
///
/// Returns every violation found, in field order. Each field contributes
/// at most one violation.
pub fn validate(submission: &StudentSubmission) -> Result<NewStudent, ValidationErrors> {
    let mut errors = Vec::new();

    let name = required(&mut errors, "name", submission.name.as_deref(), "Name is required");
    let address =
        required(&mut errors, "address", submission.address.as_deref(), "Address is required");
    let class_appearing_for = required(
        &mut errors,
        "classAppearingFor",
        submission.class_appearing_for.as_deref(),
        "Class is required",
    );
    let previous_school = required(
        &mut errors,
        "previousSchool",
        submission.previous_school.as_deref(),
        "Previous School is required",
    );
    let mobile_number = required(
        &mut errors,
        "mobileNumber",
        submission.mobile_number.as_deref(),
        "Mobile Number is required",
    )
    .and_then(|number| {
        if is_mobile_number(&number) {
            Some(number)
        } else {
            errors.push(FieldViolation::new(
                "mobileNumber",
                "Mobile Number must be a valid 10-digit number",
            ));
            None
        }
    });

    match (name, address, class_appearing_for, previous_school, mobile_number) {
        (
            Some(name),
            Some(address),
            Some(class_appearing_for),
            Some(previous_school),
            Some(mobile_number),
        ) if errors.is_empty() => Ok(NewStudent {
            name,
            address,
            class_appearing_for,
            previous_school,
            mobile_number,
        }),
        _ => Err(ValidationErrors::from(errors)),
    }
}

/// Returns true if `value` is exactly ten ASCII digits.
pub fn is_mobile_number(value: &str) -> bool {
    value.len() == MOBILE_NUMBER_DIGITS && value.bytes().all(|b| b.is_ascii_digit())
}

/// Trims `value`, recording `message` against `field` when nothing is left.
fn required(
    errors: &mut Vec<FieldViolation>,
    field: &str,
    value: Option<&str>,
    message: &str,
) -> Option<String> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Some(trimmed.to_string()),
        _ => {
            errors.push(FieldViolation::new(field, message));
            None
        },
    }
}
