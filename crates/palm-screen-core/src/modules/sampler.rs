//! Center-window pixel sampling.
//!
//! A square window around the image center is sampled on a coarse grid and
//! reduced to brightness and tone ratios. Sampling is cheap enough to run on
//! every capture.

use crate::domain::{ImageBuffer, SampleStatistics};
use crate::error::ImageAnalysisError;

/// Average brightness below which a pixel counts as dark.
pub const DARK_CUTOFF: f64 = 60.0;
/// Average brightness above which a pixel counts as overexposed.
pub const OVEREXPOSED_CUTOFF: f64 = 230.0;

/// Configuration for the pixel sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Window half-size as a fraction of `min(width, height)`.
    pub window_fraction: f64,
    /// Distance between sampled pixels on both axes.
    pub stride: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            window_fraction: 0.3,
            stride: 8,
        }
    }
}

/// Samples the center window of an image.
#[derive(Debug, Clone, Default)]
pub struct PixelSampler {
    config: SamplerConfig,
}

impl PixelSampler {
    /// Creates a sampler with the given configuration.
    #[must_use]
    pub const fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Computes statistics over the center window.
    ///
    /// The window is centered at `(width / 2, height / 2)` with radius
    /// `floor(window_fraction * min(width, height))` and covers
    /// `[c - r, c + r)` on each axis. Coordinates outside the image are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ImageAnalysisError::NoSamples`] if no pixel was sampled,
    /// e.g. for images smaller than two pixels on a side.
    pub fn sample(&self, image: &ImageBuffer) -> Result<SampleStatistics, ImageAnalysisError> {
        let width = i64::from(image.width());
        let height = i64::from(image.height());
        let (cx, cy) = (width / 2, height / 2);
        let radius = self.radius(image.width().min(image.height()));
        let stride = self.config.stride.max(1) as usize;

        let mut tally = Tally::default();
        for y in ((cy - radius)..(cy + radius)).step_by(stride) {
            let Ok(y) = u32::try_from(y) else { continue };
            for x in ((cx - radius)..(cx + radius)).step_by(stride) {
                let Ok(x) = u32::try_from(x) else { continue };
                if let Some(px) = image.pixel(x, y) {
                    tally.add(px);
                }
            }
        }

        tally.finish().ok_or(ImageAnalysisError::NoSamples {
            width: image.width(),
            height: image.height(),
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn radius(&self, min_side: u32) -> i64 {
        // fraction clamped to [0, 1] (NaN maps to 0), so the radius stays within min_side
        let fraction = self.config.window_fraction.max(0.0).min(1.0);
        (fraction * f64::from(min_side)).floor() as i64
    }
}

#[derive(Debug, Default)]
struct Tally {
    count: usize,
    brightness_sum: f64,
    skin: usize,
    dark: usize,
    overexposed: usize,
}

impl Tally {
    fn add(&mut self, [r, g, b, _]: [u8; 4]) {
        let brightness = (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0;

        self.count += 1;
        self.brightness_sum += brightness;
        if is_skin_tone(r, g, b) {
            self.skin += 1;
        }
        if brightness < DARK_CUTOFF {
            self.dark += 1;
        }
        if brightness > OVEREXPOSED_CUTOFF {
            self.overexposed += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> Option<SampleStatistics> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(SampleStatistics {
            average_brightness: self.brightness_sum / n,
            skin_tone_ratio: self.skin as f64 / n,
            dark_ratio: self.dark as f64 / n,
            overexposed_ratio: self.overexposed as f64 / n,
            sample_count: self.count,
        })
    }
}

/// Simple RGB skin-tone rule.
#[must_use]
pub const fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    r > 95 && g > 40 && b > 20 && r > g && r > b
}
