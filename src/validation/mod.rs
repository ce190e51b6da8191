/// Review record validation
///
/// Structural checks only; signatures and blockchain anchors are verified by
/// whoever publishes the record.
use crate::{identifier, store::ReviewRecord};
use serde::Serialize;
use serde_json::{json, Value};

/// Highest rating on the default scale
const DEFAULT_MAX_RATING: f64 = 5.0;

/// Validation issue detail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Review record validator
#[derive(Debug, Clone, Default)]
pub struct ReviewValidator;

impl ReviewValidator {
    pub fn new() -> Self {
        Self
    }

    /// Collect every structural issue of `record`; empty means valid
    pub fn validate(&self, record: &ReviewRecord) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let max_rating = record
            .get("popr")
            .and_then(|popr| popr.get("max_rating"))
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_MAX_RATING);

        match record.get("rating").and_then(Value::as_f64) {
            Some(rating) if (0.0..=max_rating).contains(&rating) => {}
            Some(rating) => issues.push(ValidationIssue::new(
                "$.rating",
                format!("Rating {} is outside 0..={}", rating, max_rating),
            )),
            None => issues.push(ValidationIssue::new("$.rating", "Rating must be a number")),
        }

        for field in ["review_text", "detailed_review"] {
            if let Some(value) = record.get(field) {
                if !value.is_string() {
                    issues.push(ValidationIssue::new(
                        &format!("$.{}", field),
                        format!("{} must be a string", field),
                    ));
                }
            }
        }

        match record.get("popr") {
            Some(Value::Object(_)) => {}
            Some(_) => issues.push(ValidationIssue::new("$.popr", "PoPR must be an object")),
            None => issues.push(ValidationIssue::new("$.popr", "Missing PoPR")),
        }

        if let Some(creator) = record.get("customer_signature").and_then(|sig| sig.get("creator")) {
            let valid = creator.as_str().map(identifier::is_did_identifier).unwrap_or(false);
            if !valid {
                issues.push(ValidationIssue::new(
                    "$.customer_signature.creator",
                    "Signature creator must be a DID",
                ));
            }
        }

        if let Some(previous) = record.previous_version() {
            if !identifier::is_content_identifier(previous) {
                issues.push(ValidationIssue::new(
                    "$.previous_version_multihash",
                    format!("Multihash {} is invalid", previous),
                ));
            }
        }

        issues
    }

    /// Attach the outcome to the record so clients can see why it is invalid
    pub fn annotate(record: &mut ReviewRecord, issues: &[ValidationIssue]) {
        record.insert("isValid", Value::Bool(issues.is_empty()));
        record.insert("errors", json!(issues));
    }
}

/// Join issues into a single error message
pub fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.path, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}
