//! Threshold rules turning sample statistics into a verdict.

use serde::{Deserialize, Serialize};

use crate::domain::{QualityIssue, QualityVerdict, SampleStatistics};

/// Thresholds for the quality rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Average brightness below this is too dark (0-255).
    pub min_brightness: f64,
    /// Dark-pixel ratio above this is too dark.
    pub max_dark_ratio: f64,
    /// Overexposed-pixel ratio above this is glare.
    pub max_overexposed_ratio: f64,
    /// Skin-tone ratio below this means the palm is not visible.
    pub min_skin_tone_ratio: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_brightness: 80.0,
            max_dark_ratio: 0.5,
            max_overexposed_ratio: 0.3,
            min_skin_tone_ratio: 0.1,
        }
    }
}

/// Applies the darkness, glare and palm-visibility rules.
#[derive(Debug, Clone, Default)]
pub struct QualityClassifier {
    config: QualityConfig,
}

impl QualityClassifier {
    /// Creates a classifier with the given thresholds.
    #[must_use]
    pub const fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Returns the thresholds.
    #[must_use]
    pub const fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Evaluates every rule independently and collects failures in order.
    #[must_use]
    pub fn classify(&self, stats: &SampleStatistics) -> QualityVerdict {
        QualityVerdict::from_issues(&self.findings(stats))
    }

    /// Rules that fired, in evaluation order.
    #[must_use]
    pub fn findings(&self, stats: &SampleStatistics) -> Vec<QualityIssue> {
        let c = &self.config;
        let mut found = Vec::new();

        if stats.average_brightness < c.min_brightness || stats.dark_ratio > c.max_dark_ratio {
            found.push(QualityIssue::TooDark);
        }
        if stats.overexposed_ratio > c.max_overexposed_ratio {
            found.push(QualityIssue::Overexposed);
        }
        if stats.skin_tone_ratio < c.min_skin_tone_ratio {
            found.push(QualityIssue::PalmNotVisible);
        }

        found
    }
}
