//! Palm Screen Core - Domain logic for palm-image anemia pre-screening
//!
//! This crate contains the pre-screen heuristic (pixel sampling and quality
//! classification), the capture workflow state machine with its session
//! driver, and the ports that adapters implement.

pub mod domain;
pub mod error;
pub mod modules;
pub mod ports;
pub mod workflow;

pub use domain::{
    AnalysisResult, CampaignId, EncodedImage, ImageBuffer, ImageInfo, InferenceResult,
    PatientDetails, PatientRecord, QualityVerdict, SampleStatistics, Session, VerdictStatus,
};
pub use error::{
    CameraError, ImageAnalysisError, ScreenError, SubmissionError, ValidationError, WorkflowError,
};
pub use modules::{PixelSampler, QualityAnalyzer, QualityClassifier, QualityConfig, SamplerConfig};
pub use ports::{
    CameraDevice, ImageSource, InferenceClient, Notice, NoticeLevel, NoticeSink,
    PersistenceService, ProgressEvent, ProgressSink, ResultOutput, VideoStream,
};
pub use workflow::{CaptureWorkflow, ScanSession, SelectedFile, WorkflowConfig, WorkflowState};
