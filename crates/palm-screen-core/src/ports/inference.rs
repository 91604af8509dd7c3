//! Inference submission port.

use crate::domain::{EncodedImage, InferenceResult};
use crate::error::SubmissionError;

/// Port for the remote anemia classifier.
pub trait InferenceClient: Send + Sync {
    /// Submits the encoded image exactly as captured.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmissionError`] on transport failure, a non-success
    /// status, or a body that fails validation.
    fn submit(&self, image: &EncodedImage) -> Result<InferenceResult, SubmissionError>;
}
