//! Capture → preview → analyzing → results workflow.

mod session;
mod state;

pub use session::{
    Collaborators, FileContents, ScanSession, SelectedFile, WorkflowConfig,
    DEFAULT_MAX_UPLOAD_BYTES,
};
pub use state::{
    CaptureId, CaptureWorkflow, SubmitFailurePolicy, Transition, WorkflowEvent, WorkflowState,
};
