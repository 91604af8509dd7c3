//! Pre-screen tuning flags shared by `check` and `scan`.

use clap::Args;
use palm_screen_core::{
    PixelSampler, QualityAnalyzer, QualityClassifier, QualityConfig, SamplerConfig,
};

use crate::config::AppConfig;

/// Parse and validate a ratio (0.0-1.0).
pub fn parse_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse and validate a brightness level (0-255).
fn parse_brightness(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=255.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0..=255"))
    }
}

/// Parse the window fraction, which must be positive.
fn parse_window_fraction(s: &str) -> Result<f64, String> {
    let value = parse_ratio(s)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err("window fraction must be greater than 0".to_string())
    }
}

/// Quality thresholds and sampling window.
#[derive(Args, Clone, Debug, Default)]
pub struct QualityArgs {
    /// Minimum average brightness (0-255)
    #[arg(long, value_parser = parse_brightness)]
    pub min_brightness: Option<f64>,

    /// Maximum share of dark pixels (0.0-1.0)
    #[arg(long, value_parser = parse_ratio)]
    pub max_dark_ratio: Option<f64>,

    /// Maximum share of overexposed pixels (0.0-1.0)
    #[arg(long, value_parser = parse_ratio)]
    pub max_overexposed_ratio: Option<f64>,

    /// Minimum share of skin-toned pixels (0.0-1.0)
    #[arg(long, value_parser = parse_ratio)]
    pub min_skin_tone_ratio: Option<f64>,

    /// Sampling window half-size as a fraction of the shorter side
    #[arg(long, value_parser = parse_window_fraction)]
    pub window_fraction: Option<f64>,

    /// Distance in pixels between samples
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub stride: Option<u32>,
}

impl QualityArgs {
    /// Fill unset flags from the config file.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        let q = &config.quality;
        self.min_brightness = self.min_brightness.or(q.min_brightness);
        self.max_dark_ratio = self.max_dark_ratio.or(q.max_dark_ratio);
        self.max_overexposed_ratio = self.max_overexposed_ratio.or(q.max_overexposed_ratio);
        self.min_skin_tone_ratio = self.min_skin_tone_ratio.or(q.min_skin_tone_ratio);
        self.window_fraction = self.window_fraction.or(config.sampler.window_fraction);
        self.stride = self.stride.or(config.sampler.stride);
        self
    }

    /// Thresholds with library defaults for anything unset.
    pub fn quality_config(&self) -> QualityConfig {
        let defaults = QualityConfig::default();
        QualityConfig {
            min_brightness: self.min_brightness.unwrap_or(defaults.min_brightness),
            max_dark_ratio: self.max_dark_ratio.unwrap_or(defaults.max_dark_ratio),
            max_overexposed_ratio: self
                .max_overexposed_ratio
                .unwrap_or(defaults.max_overexposed_ratio),
            min_skin_tone_ratio: self
                .min_skin_tone_ratio
                .unwrap_or(defaults.min_skin_tone_ratio),
        }
    }

    /// Sampler settings with library defaults for anything unset.
    pub fn sampler_config(&self) -> SamplerConfig {
        let defaults = SamplerConfig::default();
        SamplerConfig {
            window_fraction: self.window_fraction.unwrap_or(defaults.window_fraction),
            stride: self.stride.unwrap_or(defaults.stride),
        }
    }

    /// Builds the analyzer these flags describe.
    pub fn analyzer(&self) -> QualityAnalyzer {
        QualityAnalyzer::new(
            PixelSampler::new(self.sampler_config()),
            QualityClassifier::new(self.quality_config()),
        )
    }
}
