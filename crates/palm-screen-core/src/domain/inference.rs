//! Classification returned by the inference endpoint.

use serde::Serialize;
use serde_json::Value;

use crate::error::SubmissionError;

/// Validated inference response.
///
/// Only `is_anemic` drives the workflow. The raw payload is kept for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    is_anemic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    raw: Value,
}

impl InferenceResult {
    /// Builds a result directly, e.g. from a test double.
    #[must_use]
    pub fn new(is_anemic: bool, confidence: Option<f64>) -> Self {
        let mut raw = serde_json::json!({ "isAnemic": is_anemic });
        if let Some(c) = confidence {
            raw["confidence_level"] = Value::from(c);
        }
        Self {
            is_anemic,
            confidence,
            raw,
        }
    }

    /// Validates a JSON response body.
    ///
    /// `isAnemic` must be a boolean or the integer 0/1. `confidence_level`
    /// may be a number or a numeric string; anything else is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::InvalidResponse`] if the body is not an
    /// object or `isAnemic` is missing or malformed.
    pub fn from_json(raw: Value) -> Result<Self, SubmissionError> {
        if !raw.is_object() {
            return Err(SubmissionError::InvalidResponse(
                "expected a JSON object".to_string(),
            ));
        }

        let is_anemic = match raw.get("isAnemic") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => false,
                Some(1) => true,
                _ => {
                    return Err(SubmissionError::InvalidResponse(format!(
                        "isAnemic must be 0 or 1, got {n}"
                    )))
                }
            },
            Some(other) => {
                return Err(SubmissionError::InvalidResponse(format!(
                    "isAnemic has unexpected value {other}"
                )))
            }
            None => {
                return Err(SubmissionError::InvalidResponse(
                    "missing isAnemic".to_string(),
                ))
            }
        };

        let confidence = match raw.get("confidence_level") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        Ok(Self {
            is_anemic,
            confidence,
            raw,
        })
    }

    /// Whether the palm was classified as anemic.
    #[must_use]
    pub const fn is_anemic(&self) -> bool {
        self.is_anemic
    }

    /// Model confidence in percent, when reported.
    #[must_use]
    pub const fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Original response body.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Label stored with patient records.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        if self.is_anemic {
            "Anemic"
        } else {
            "Non-Anemic"
        }
    }
}
