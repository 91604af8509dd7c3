//! Sample statistics and the quality verdict derived from them.

use serde::{Deserialize, Serialize};

/// Aggregate brightness and tone statistics for the sampled window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStatistics {
    /// Mean of the per-pixel (R+G+B)/3 brightness, 0-255.
    pub average_brightness: f64,
    /// Fraction of samples matching the skin-tone rule.
    pub skin_tone_ratio: f64,
    /// Fraction of samples darker than the dark cutoff.
    pub dark_ratio: f64,
    /// Fraction of samples brighter than the overexposure cutoff.
    pub overexposed_ratio: f64,
    /// Number of pixels sampled.
    pub sample_count: usize,
}

/// Outcome class of a quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// Image is fit for submission.
    Success,
    /// Reserved for soft failures. No current rule produces it.
    Warning,
    /// At least one rule failed.
    Error,
}

/// A single pre-screen finding.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    /// Low average brightness or too many dark pixels.
    TooDark,
    /// Too many blown-out pixels.
    Overexposed,
    /// Too few skin-tone pixels in the center window.
    PalmNotVisible,
    /// The image could not be decoded or sampled.
    Unreadable,
}

impl QualityIssue {
    /// Operator-facing description.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TooDark => "Image appears too dark",
            Self::Overexposed => "Image is overexposed or has flash glare",
            Self::PalmNotVisible => "Palm may not be clearly visible",
            Self::Unreadable => "Unable to analyze image quality",
        }
    }

    /// Operator-facing remedy.
    #[must_use]
    pub const fn suggestion(self) -> &'static str {
        match self {
            Self::TooDark => "Try taking the photo in better lighting conditions",
            Self::Overexposed => "Avoid using flash or direct bright light",
            Self::PalmNotVisible => "Make sure your palm fills most of the frame",
            Self::Unreadable => "Try capturing the photo again",
        }
    }
}

/// Suggestion attached to a passing verdict.
pub const LOOKS_GOOD: &str = "Image looks good for analysis!";

/// Pass/fail judgment shown before the image may be submitted.
///
/// `is_valid == (status == Success)` and `issues` is non-empty exactly when
/// the status is not `Success`. Both hold by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityVerdict {
    status: VerdictStatus,
    is_valid: bool,
    issues: Vec<String>,
    suggestions: Vec<String>,
}

impl QualityVerdict {
    /// A passing verdict with the standard suggestion.
    #[must_use]
    pub fn passed() -> Self {
        Self {
            status: VerdictStatus::Success,
            is_valid: true,
            issues: Vec::new(),
            suggestions: vec![LOOKS_GOOD.to_string()],
        }
    }

    /// Builds a verdict from findings, in order. No findings means a pass.
    ///
    /// Suggestions are kept one per finding, without deduplication.
    #[must_use]
    pub fn from_issues(found: &[QualityIssue]) -> Self {
        if found.is_empty() {
            return Self::passed();
        }
        Self {
            status: VerdictStatus::Error,
            is_valid: false,
            issues: found.iter().map(|i| i.message().to_string()).collect(),
            suggestions: found.iter().map(|i| i.suggestion().to_string()).collect(),
        }
    }

    /// Outcome class.
    #[must_use]
    pub const fn status(&self) -> VerdictStatus {
        self.status
    }

    /// Whether the image may be submitted.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Problems found, in rule order.
    #[must_use]
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Remedies, in rule order.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_invariant() {
        let verdict = QualityVerdict::passed();
        assert_eq!(verdict.status(), VerdictStatus::Success);
        assert!(verdict.is_valid());
        assert!(verdict.issues().is_empty());
        assert_eq!(verdict.suggestions(), [LOOKS_GOOD]);
    }

    #[test]
    fn test_empty_issues_is_pass() {
        assert_eq!(QualityVerdict::from_issues(&[]), QualityVerdict::passed());
    }

    #[test]
    fn test_failed_invariant() {
        let verdict =
            QualityVerdict::from_issues(&[QualityIssue::TooDark, QualityIssue::PalmNotVisible]);
        assert_eq!(verdict.status(), VerdictStatus::Error);
        assert!(!verdict.is_valid());
        assert_eq!(
            verdict.issues(),
            ["Image appears too dark", "Palm may not be clearly visible"]
        );
        assert_eq!(verdict.suggestions().len(), 2);
    }

    #[test]
    fn test_verdict_serializes_snake_case() {
        let json = serde_json::to_value(QualityVerdict::from_issues(&[QualityIssue::Overexposed]))
            .unwrap_or_default();
        assert_eq!(json["status"], "error");
        assert_eq!(json["is_valid"], false);
        assert_eq!(json["issues"][0], "Image is overexposed or has flash glare");
    }
}
