//! Format and range checks for extracted records

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::schema::{ExtractedRecord, ExtractionField};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s\-\+\(\)]{7,}$").expect("valid phone regex"));

/// Inclusive age range accepted as plausible
pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 0..=150;

/// Quality report for one extracted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub extracted_fields: Vec<ExtractionField>,
    pub field_count: usize,
    pub validation_errors: Vec<String>,
}

/// Check email shape, age range and phone shape.
///
/// A bad phone number is reported in `validation_errors` but leaves
/// `is_valid` untouched; bad email and age flip it to false. Name and
/// location are not checked.
///
/// Only integral ages reach this check: non-integer ages such as `"thirty"`
/// or `30.5` are dropped earlier by [`ExtractedRecord::from_payload`] and
/// never appear in `validation_errors`.
pub fn validate_extraction(record: &ExtractedRecord) -> ValidationReport {
    let extracted_fields = record.fields();
    let mut report = ValidationReport {
        is_valid: true,
        field_count: extracted_fields.len(),
        extracted_fields,
        validation_errors: Vec::new(),
    };

    if let Some(email) = &record.email {
        if !EMAIL_RE.is_match(email) {
            report
                .validation_errors
                .push(format!("Invalid email format: {}", email));
            report.is_valid = false;
        }
    }

    if let Some(phone) = &record.phone {
        if !PHONE_RE.is_match(phone) {
            report
                .validation_errors
                .push(format!("Invalid phone format: {}", phone));
        }
    }

    if let Some(age) = record.age {
        if !AGE_RANGE.contains(&age) {
            report.validation_errors.push(format!("Invalid age: {}", age));
            report.is_valid = false;
        }
    }

    report
}
