//! Decode, sample and classify in one step.

use tracing::{debug, warn};

use super::{PixelSampler, QualityClassifier};
use crate::domain::{EncodedImage, ImageBuffer, QualityIssue, QualityVerdict, SampleStatistics};

/// Statistics and verdict for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Absent when the image could not be decoded or sampled.
    pub statistics: Option<SampleStatistics>,
    pub verdict: QualityVerdict,
}

/// Runs the quality pre-screen. Never fails: unreadable images get an error
/// verdict.
#[derive(Debug, Clone, Default)]
pub struct QualityAnalyzer {
    sampler: PixelSampler,
    classifier: QualityClassifier,
}

impl QualityAnalyzer {
    /// Creates an analyzer from its parts.
    #[must_use]
    pub const fn new(sampler: PixelSampler, classifier: QualityClassifier) -> Self {
        Self {
            sampler,
            classifier,
        }
    }

    /// Assesses decoded pixels.
    #[must_use]
    pub fn assess(&self, image: &ImageBuffer) -> Assessment {
        match self.sampler.sample(image) {
            Ok(stats) => {
                let verdict = self.classifier.classify(&stats);
                debug!(
                    brightness = stats.average_brightness,
                    skin = stats.skin_tone_ratio,
                    dark = stats.dark_ratio,
                    overexposed = stats.overexposed_ratio,
                    valid = verdict.is_valid(),
                    "Quality assessed"
                );
                Assessment {
                    statistics: Some(stats),
                    verdict,
                }
            }
            Err(e) => {
                warn!("Quality analysis failed: {e}");
                unreadable()
            }
        }
    }

    /// Decodes and assesses an encoded image.
    #[must_use]
    pub fn assess_encoded(&self, image: &EncodedImage) -> Assessment {
        match image.decode() {
            Ok(buffer) => self.assess(&buffer),
            Err(e) => {
                warn!("Could not decode {}: {e}", image.name());
                unreadable()
            }
        }
    }

    /// Verdict for an encoded image.
    #[must_use]
    pub fn analyze(&self, image: &EncodedImage) -> QualityVerdict {
        self.assess_encoded(image).verdict
    }
}

fn unreadable() -> Assessment {
    Assessment {
        statistics: None,
        verdict: QualityVerdict::from_issues(&[QualityIssue::Unreadable]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VerdictStatus;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(rgb: [u8; 3]) -> EncodedImage {
        let img = RgbaImage::from_pixel(120, 90, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap_or_default();
        EncodedImage::new("palm.png", "image/png", bytes)
    }

    #[test]
    fn test_palm_passes() {
        let verdict = QualityAnalyzer::default().analyze(&png([200, 150, 120]));
        assert!(verdict.is_valid());
    }

    #[test]
    fn test_dark_frame_fails() {
        let assessment = QualityAnalyzer::default().assess_encoded(&png([10, 10, 10]));
        assert!(!assessment.verdict.is_valid());
        assert!(assessment.statistics.is_some());
    }

    #[test]
    fn test_garbage_bytes_yield_unreadable_verdict() {
        let encoded = EncodedImage::new("palm.jpg", "image/jpeg", vec![0xFF, 0xD8, 0x00]);
        let assessment = QualityAnalyzer::default().assess_encoded(&encoded);

        assert!(assessment.statistics.is_none());
        assert_eq!(assessment.verdict.status(), VerdictStatus::Error);
        assert_eq!(
            assessment.verdict.issues(),
            ["Unable to analyze image quality"]
        );
        assert_eq!(
            assessment.verdict.suggestions(),
            ["Try capturing the photo again"]
        );
    }

    #[test]
    fn test_unsampleable_buffer_yields_unreadable_verdict() {
        let tiny = ImageBuffer::from_rgba(RgbaImage::from_pixel(1, 1, Rgba([200, 150, 120, 255])));
        let assessment = QualityAnalyzer::default().assess(&tiny);
        assert_eq!(
            assessment.verdict.issues(),
            ["Unable to analyze image quality"]
        );
    }
}
