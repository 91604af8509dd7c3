//! Snapshot-file camera.
//!
//! Reads frames from a file that an external capture daemon keeps
//! overwriting with the latest still, e.g. `/run/palm-cam/latest.jpg`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use palm_screen_core::error::CameraError;
use palm_screen_core::{CameraDevice, EncodedImage, VideoStream};
use tracing::{debug, info};

use crate::fs::mime_for_path;

/// A camera backed by a snapshot file.
pub struct SnapshotCamera {
    path: PathBuf,
    next_stream: AtomicU64,
    open: AtomicUsize,
}

impl SnapshotCamera {
    /// Creates a camera reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_stream: AtomicU64::new(1),
            open: AtomicUsize::new(0),
        }
    }

    /// Streams acquired and not yet released.
    #[must_use]
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl CameraDevice for SnapshotCamera {
    fn acquire_stream(&self) -> Result<VideoStream, CameraError> {
        if !self.path.is_file() {
            return Err(CameraError::PermissionDenied(format!(
                "no camera snapshot at {}",
                self.path.display()
            )));
        }
        let id = self.next_stream.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);
        info!(stream = id, device = %self.path.display(), "Camera stream opened");
        Ok(VideoStream {
            id,
            label: self.path.display().to_string(),
        })
    }

    fn capture_frame(&self, stream: &VideoStream) -> Result<EncodedImage, CameraError> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| CameraError::Capture(format!("{}: {e}", self.path.display())))?;
        if bytes.is_empty() {
            return Err(CameraError::Capture("snapshot is empty".into()));
        }
        debug!(stream = stream.id, bytes = bytes.len(), "Frame captured");

        let mime = match mime_for_path(&self.path) {
            m if m.starts_with("image/") => m,
            _ => "image/jpeg",
        };
        let name = format!("capture-{}.{}", stream.id, mime.trim_start_matches("image/"));
        Ok(EncodedImage::new(name, mime, bytes))
    }

    fn release(&self, stream: &VideoStream) {
        self.open.fetch_sub(1, Ordering::SeqCst);
        debug!(stream = stream.id, "Camera stream released");
    }
}
