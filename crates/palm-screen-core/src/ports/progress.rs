//! Progress reporting port for batch pre-screening.

use crate::domain::AnalysisResult;

/// Events emitted while a batch is checked.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Checking started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// Checking completed for an image.
    Completed {
        /// The pre-screen result.
        result: AnalysisResult,
    },
    /// An image could not be loaded.
    Skipped {
        /// Path to the image.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All images have been processed.
    Finished {
        /// Images checked.
        processed: usize,
        /// Images skipped.
        skipped: usize,
        /// Checked images that failed the pre-screen.
        rejected: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
