//! Encoded and decoded palm images.

use std::fmt;
use std::sync::Arc;

use crate::error::ImageAnalysisError;

/// Decoded pixel data, 4 bytes per pixel in R, G, B, A order.
///
/// Immutable once built. The sampler only ever borrows it.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 4;

    /// Wraps a raw RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ImageAnalysisError::BufferSize`] if `pixels` does not hold
    /// exactly `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageAnalysisError> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if pixels.len() != expected {
            return Err(ImageAnalysisError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Takes ownership of an RGBA image.
    #[must_use]
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Converts any decoded image to RGBA.
    #[must_use]
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        Self::from_rgba(image.to_rgba8())
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the RGBA value at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let px = self.pixels.get(offset..offset + Self::CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// An image as selected or captured: original bytes plus MIME type.
///
/// This is what gets displayed and submitted. Cloning is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl EncodedImage {
    /// Creates an encoded image.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// File name used for display and upload.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type, e.g. `image/jpeg`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the encoded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the encoded payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes into an RGBA pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ImageAnalysisError::Decode`] if the bytes are not a
    /// supported image format.
    pub fn decode(&self) -> Result<ImageBuffer, ImageAnalysisError> {
        let decoded = image::load_from_memory(&self.bytes)
            .map_err(|e| ImageAnalysisError::Decode(e.to_string()))?;
        Ok(ImageBuffer::from_dynamic(&decoded))
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
