//! Error taxonomy for the screening workflow.
//!
//! Every variant is recoverable from the operator's point of view: the
//! workflow reports it as a notice and stays in a well-defined state.

use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// Bad operator input: wrong file type, oversized file, incomplete form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The selected file is not an image.
    #[error("Please select an image file (got {mime_type})")]
    NotAnImage {
        /// MIME type reported for the selection.
        mime_type: String,
    },
    /// The selected file exceeds the upload limit.
    #[error("File size must be less than {}MB", .limit / MIB)]
    TooLarge {
        /// File size in bytes.
        size: u64,
        /// Upload limit in bytes.
        limit: u64,
    },
    /// The selected file could not be read.
    #[error("Could not read the selected file: {0}")]
    Unreadable(String),
    /// A required form field was left empty.
    #[error("Please fill in all required fields ({0} is missing)")]
    MissingField(&'static str),
    /// Age is not a whole number.
    #[error("Age must be a whole number, got '{0}'")]
    InvalidAge(String),
    /// Gender is not one of the offered options.
    #[error("Gender must be Male, Female or Other, got '{0}'")]
    InvalidGender(String),
    /// Campaign identifiers are opaque but must be URL-safe.
    #[error("Invalid campaign id '{0}'")]
    InvalidCampaignId(String),
}

/// The pixel sampler could not produce statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageAnalysisError {
    /// No pixel fell inside the sampling window.
    #[error("no pixels sampled from {width}x{height} image")]
    NoSamples {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Raw buffer length does not match the declared dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// Bytes required for the dimensions.
        expected: usize,
        /// Bytes provided.
        actual: usize,
    },
    /// The encoded image could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Camera collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// Access to the device was refused. Fatal to camera mode only.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// A frame could not be grabbed from an open stream.
    #[error("camera capture failed: {0}")]
    Capture(String),
}

/// Inference submission failures. The workflow treats all of them alike.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The request could not be built.
    #[error("could not build inference request: {0}")]
    Request(String),
    /// The endpoint could not be reached.
    #[error("could not reach the inference endpoint: {0}")]
    Network(String),
    /// The endpoint answered with a non-success status.
    #[error("inference endpoint returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the status reason.
        message: String,
    },
    /// The endpoint answered 2xx with a body we cannot interpret.
    #[error("inference response was not understood: {0}")]
    InvalidResponse(String),
}

/// Workflow-level misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The requested event is not allowed in the current state.
    #[error("cannot {event} while in {state}")]
    InvalidTransition {
        /// Name of the current state.
        state: &'static str,
        /// Name of the rejected event.
        event: &'static str,
    },
    /// No authenticated session was supplied.
    #[error("not authenticated")]
    NoSession,
    /// Patient records are only kept for anemic results.
    #[error("patient details can only be saved for anemic results")]
    NotAnemic,
}

/// Any failure surfaced by a [`crate::ScanSession`] operation.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Analysis(#[from] ImageAnalysisError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("failed to save patient: {0:#}")]
    Persistence(anyhow::Error),
}
