//! Camera port.

use crate::domain::EncodedImage;
use crate::error::CameraError;

/// An open video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStream {
    /// Device-assigned stream identifier.
    pub id: u64,
    /// Human-readable device label.
    pub label: String,
}

/// Port for a rear-facing camera.
///
/// Callers must pair every successful [`acquire_stream`](Self::acquire_stream)
/// with a [`release`](Self::release).
pub trait CameraDevice: Send + Sync {
    /// Opens a video stream.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::PermissionDenied`] if the device is unavailable
    /// or access was refused.
    fn acquire_stream(&self) -> Result<VideoStream, CameraError>;

    /// Grabs a single frame, encoded as JPEG or PNG.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::Capture`] if no frame could be read.
    fn capture_frame(&self, stream: &VideoStream) -> Result<EncodedImage, CameraError>;

    /// Stops all tracks of the stream.
    fn release(&self, stream: &VideoStream);
}
