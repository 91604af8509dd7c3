//! Synthetic palm image builders for testing.

use std::io::Cursor;

use anyhow::Context;
use image::{ImageFormat, Rgba, RgbaImage};
use palm_screen_core::domain::{EncodedImage, ImageBuffer, ImageInfo};

/// RGB of a well-lit palm: passes the skin-tone rule at brightness ~157.
pub const PALM_TONE: [u8; 3] = [200, 150, 120];

/// Builder for creating synthetic test images.
///
/// Provides convenience methods for generating images that hit each
/// pre-screen rule (dark, glare, palm not visible) or pass cleanly.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    // === Uniform Images ===

    /// Creates a single-color image.
    #[must_use]
    pub fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> ImageInfo {
        let img = RgbaImage::from_pixel(width, height, opaque(rgb));
        ImageInfo::new("synthetic://uniform", ImageBuffer::from_rgba(img))
    }

    /// Creates a mid-gray image: bright enough, but no skin tone.
    #[must_use]
    pub fn mid_gray(width: u32, height: u32) -> ImageInfo {
        Self::uniform(width, height, [128, 128, 128])
    }

    /// Creates a completely black image (too dark, no palm).
    #[must_use]
    pub fn black(width: u32, height: u32) -> ImageInfo {
        Self::uniform(width, height, [0, 0, 0])
    }

    /// Creates a completely white image (glare, no palm).
    #[must_use]
    pub fn overexposed(width: u32, height: u32) -> ImageInfo {
        Self::uniform(width, height, [255, 255, 255])
    }

    // === Palm Images ===

    /// Creates a palm-toned image with slight variation that passes every rule.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn palm(width: u32, height: u32) -> ImageInfo {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let jitter = ((x * 3 + y * 5) % 16) as u8;
            opaque([
                PALM_TONE[0] + jitter,
                PALM_TONE[1] - jitter,
                PALM_TONE[2] - jitter / 2,
            ])
        });
        ImageInfo::new("synthetic://palm", ImageBuffer::from_rgba(img))
    }

    /// Creates an underlit palm: still skin-toned and above the dark-pixel
    /// cutoff, but with an average brightness of about 72.
    #[must_use]
    pub fn dim_palm(width: u32, height: u32) -> ImageInfo {
        let mut info = Self::uniform(width, height, [110, 60, 45]);
        info.path = "synthetic://dim_palm".into();
        info
    }

    /// Creates a palm with a white flash hotspot covering the center.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn glare_palm(width: u32, height: u32) -> ImageInfo {
        let (cx, cy) = ((width / 2) as i64, (height / 2) as i64);
        let hotspot = i64::from(width.min(height) / 5);
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let dx = (i64::from(x) - cx).abs();
            let dy = (i64::from(y) - cy).abs();
            if dx.max(dy) < hotspot {
                opaque([255, 255, 255])
            } else {
                opaque(PALM_TONE)
            }
        });
        ImageInfo::new("synthetic://glare_palm", ImageBuffer::from_rgba(img))
    }

    /// Creates an image whose palm sits in a corner, outside the sampled
    /// center window.
    #[must_use]
    pub fn palm_in_corner(width: u32, height: u32) -> ImageInfo {
        let (qw, qh) = (width / 6, height / 6);
        let img = RgbaImage::from_fn(width, height, |x, y| {
            if x < qw && y < qh {
                opaque(PALM_TONE)
            } else {
                opaque([110, 120, 130])
            }
        });
        ImageInfo::new("synthetic://palm_in_corner", ImageBuffer::from_rgba(img))
    }

    // === Special Test Images ===

    /// Creates a 1x1 pixel image (too small to sample).
    #[must_use]
    pub fn single_pixel(rgb: [u8; 3]) -> ImageInfo {
        let mut info = Self::uniform(1, 1, rgb);
        info.path = "synthetic://1x1".into();
        info
    }

    // === Encoding ===

    /// Encodes an image as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG encoder fails.
    pub fn png_bytes(info: &ImageInfo) -> anyhow::Result<Vec<u8>> {
        let buffer = &info.buffer;
        let img = RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.pixels().to_vec())
            .context("pixel buffer does not match dimensions")?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode PNG")?;
        Ok(bytes)
    }

    /// Encodes an image as a PNG [`EncodedImage`] with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG encoder fails.
    pub fn encoded(info: &ImageInfo, name: &str) -> anyhow::Result<EncodedImage> {
        Ok(EncodedImage::new(name, "image/png", Self::png_bytes(info)?))
    }
}

/// Convenience functions for common test images.
///
/// These return PNG-encoded images directly for workflow tests.
impl SyntheticImageBuilder {
    /// Returns a standard passing palm (160x120 PNG).
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG encoder fails.
    pub fn palm_png() -> anyhow::Result<EncodedImage> {
        Self::encoded(&Self::palm(160, 120), "palm.png")
    }
}

const fn opaque([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}
