//! Quality pre-screen stages.
//!
//! [`PixelSampler`] reduces the center of an image to statistics,
//! [`QualityClassifier`] turns them into a verdict and [`QualityAnalyzer`]
//! runs both on encoded images.

mod analyzer;
mod classifier;
mod sampler;

pub use analyzer::{Assessment, QualityAnalyzer};
pub use classifier::{QualityClassifier, QualityConfig};
pub use sampler::{is_skin_tone, PixelSampler, SamplerConfig, DARK_CUTOFF, OVEREXPOSED_CUTOFF};
