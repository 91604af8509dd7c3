//! Batch pre-screen result types.

use serde::{Deserialize, Serialize};

use super::{QualityVerdict, SampleStatistics};

/// Pre-screen result for a single image file.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Path to the analyzed image.
    pub path: String,
    /// Timestamp of analysis (RFC 3339).
    pub timestamp: String,
    /// Image dimensions.
    pub dimensions: ImageDimensions,
    /// Sampled statistics. Absent when the image could not be sampled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<SampleStatistics>,
    /// Quality verdict.
    pub verdict: QualityVerdict,
}

impl AnalysisResult {
    /// Whether the image passed the pre-screen.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.verdict.is_valid()
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A decoded image loaded from an [`ImageSource`](crate::ports::ImageSource).
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path to the image file.
    pub path: String,
    /// Decoded pixels.
    pub buffer: super::ImageBuffer,
}

impl ImageInfo {
    /// Pairs a path with its decoded pixels.
    #[must_use]
    pub fn new(path: impl Into<String>, buffer: super::ImageBuffer) -> Self {
        Self {
            path: path.into(),
            buffer,
        }
    }

    /// Dimensions of the decoded image.
    #[must_use]
    pub const fn dimensions(&self) -> ImageDimensions {
        ImageDimensions {
            width: self.buffer.width(),
            height: self.buffer.height(),
        }
    }
}
