//! Capture workflow state machine.
//!
//! The held image lives inside the state, so every transition back to
//! [`WorkflowState::Capture`] drops it.

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{EncodedImage, InferenceResult, QualityVerdict};
use crate::error::WorkflowError;

/// Identifies one acquisition. Verdicts carry it so late results can be
/// matched against the image currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureId(u64);

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a failed submission sends the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitFailurePolicy {
    /// Discard the image and start over.
    #[default]
    Capture,
    /// Keep the image and its verdict so the operator can resubmit.
    Preview,
}

/// Current screen of the workflow.
#[derive(Debug, Clone, Default)]
pub enum WorkflowState {
    /// Waiting for a file or camera frame.
    #[default]
    Capture,
    /// Image held, quality verdict pending or shown.
    Preview {
        capture: CaptureId,
        image: EncodedImage,
        verdict: Option<QualityVerdict>,
    },
    /// Image submitted, waiting on inference.
    Analyzing {
        capture: CaptureId,
        image: EncodedImage,
        verdict: QualityVerdict,
    },
    /// Inference result shown.
    Results {
        image: EncodedImage,
        result: InferenceResult,
    },
}

impl WorkflowState {
    /// Short lowercase name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Preview { .. } => "preview",
            Self::Analyzing { .. } => "analyzing",
            Self::Results { .. } => "results",
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A file was selected or a frame captured.
    Acquired(EncodedImage),
    /// Background quality analysis finished.
    VerdictReady {
        capture: CaptureId,
        verdict: QualityVerdict,
    },
    /// Operator asked to submit.
    Analyze,
    SubmissionSucceeded(InferenceResult),
    SubmissionFailed,
    Retake,
    ScanNext,
    PatientSaved,
}

impl WorkflowEvent {
    /// Verb phrase used in transition errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Acquired(_) => "acquire an image",
            Self::VerdictReady { .. } => "apply a verdict",
            Self::Analyze => "analyze",
            Self::SubmissionSucceeded(_) => "show results",
            Self::SubmissionFailed => "recover from a failed submission",
            Self::Retake => "retake",
            Self::ScanNext => "scan next",
            Self::PatientSaved => "save a patient",
        }
    }
}

/// What an accepted event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state changed.
    Applied,
    /// The event was stale and ignored.
    Discarded,
}

enum Step {
    Next(WorkflowState, Transition),
    Reject(WorkflowState, WorkflowError),
}

/// Capture → preview → analyzing → results state machine.
#[derive(Debug, Default)]
pub struct CaptureWorkflow {
    state: WorkflowState,
    next_capture: u64,
    on_submit_failure: SubmitFailurePolicy,
}

impl CaptureWorkflow {
    /// Creates a workflow in the capture state.
    #[must_use]
    pub fn new(on_submit_failure: SubmitFailurePolicy) -> Self {
        Self {
            on_submit_failure,
            ..Self::default()
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Applies an event.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] if the event is not
    /// allowed in the current state, or [`WorkflowError::NotAnemic`] for a
    /// patient save on a non-anemic result. The state is left unchanged.
    pub fn handle(&mut self, event: WorkflowEvent) -> Result<Transition, WorkflowError> {
        let from = self.state.name();
        let current = mem::take(&mut self.state);
        match self.step(current, event) {
            Step::Next(next, transition) => {
                if transition == Transition::Applied {
                    debug!(from, to = next.name(), "Workflow transition");
                }
                self.state = next;
                Ok(transition)
            }
            Step::Reject(unchanged, err) => {
                self.state = unchanged;
                Err(err)
            }
        }
    }

    fn step(&mut self, state: WorkflowState, event: WorkflowEvent) -> Step {
        use WorkflowEvent as E;
        use WorkflowState as S;

        match (state, event) {
            (S::Capture, E::Acquired(image)) => {
                self.next_capture += 1;
                let next = S::Preview {
                    capture: CaptureId(self.next_capture),
                    image,
                    verdict: None,
                };
                Step::Next(next, Transition::Applied)
            }

            (
                S::Preview {
                    capture,
                    image,
                    verdict: None,
                },
                E::VerdictReady {
                    capture: ready,
                    verdict,
                },
            ) if ready == capture => Step::Next(
                S::Preview {
                    capture,
                    image,
                    verdict: Some(verdict),
                },
                Transition::Applied,
            ),
            (state, E::VerdictReady { .. }) => Step::Next(state, Transition::Discarded),

            (
                S::Preview {
                    capture,
                    image,
                    verdict: Some(verdict),
                },
                E::Analyze,
            ) if verdict.is_valid() => Step::Next(
                S::Analyzing {
                    capture,
                    image,
                    verdict,
                },
                Transition::Applied,
            ),

            (S::Preview { .. } | S::Results { .. }, E::Retake)
            | (S::Results { .. }, E::ScanNext) => {
                Step::Next(S::Capture, Transition::Applied)
            }

            (S::Analyzing { image, .. }, E::SubmissionSucceeded(result)) => {
                Step::Next(S::Results { image, result }, Transition::Applied)
            }

            (
                S::Analyzing {
                    capture,
                    image,
                    verdict,
                },
                E::SubmissionFailed,
            ) => {
                let next = match self.on_submit_failure {
                    SubmitFailurePolicy::Capture => S::Capture,
                    SubmitFailurePolicy::Preview => S::Preview {
                        capture,
                        image,
                        verdict: Some(verdict),
                    },
                };
                Step::Next(next, Transition::Applied)
            }

            (S::Results { image, result }, E::PatientSaved) => {
                if result.is_anemic() {
                    Step::Next(S::Capture, Transition::Applied)
                } else {
                    Step::Reject(S::Results { image, result }, WorkflowError::NotAnemic)
                }
            }

            (state, event) => {
                let err = WorkflowError::InvalidTransition {
                    state: state.name(),
                    event: event.name(),
                };
                Step::Reject(state, err)
            }
        }
    }

    /// Whether `Analyze` would be accepted: a verdict is present and valid.
    #[must_use]
    pub fn can_analyze(&self) -> bool {
        matches!(
            &self.state,
            WorkflowState::Preview {
                verdict: Some(v),
                ..
            } if v.is_valid()
        )
    }

    /// Whether an image is held and its verdict has not arrived yet.
    #[must_use]
    pub const fn is_quality_pending(&self) -> bool {
        matches!(self.state, WorkflowState::Preview { verdict: None, .. })
    }

    /// The image currently held, if any.
    #[must_use]
    pub const fn held_image(&self) -> Option<&EncodedImage> {
        match &self.state {
            WorkflowState::Capture => None,
            WorkflowState::Preview { image, .. }
            | WorkflowState::Analyzing { image, .. }
            | WorkflowState::Results { image, .. } => Some(image),
        }
    }

    /// The verdict for the held image, if one has arrived.
    #[must_use]
    pub const fn verdict(&self) -> Option<&QualityVerdict> {
        match &self.state {
            WorkflowState::Preview { verdict, .. } => verdict.as_ref(),
            WorkflowState::Analyzing { verdict, .. } => Some(verdict),
            WorkflowState::Capture | WorkflowState::Results { .. } => None,
        }
    }

    /// The inference result, in the results state.
    #[must_use]
    pub const fn result(&self) -> Option<&InferenceResult> {
        match &self.state {
            WorkflowState::Results { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Identifier of the held acquisition, before submission completes.
    #[must_use]
    pub const fn current_capture(&self) -> Option<CaptureId> {
        match &self.state {
            WorkflowState::Preview { capture, .. } | WorkflowState::Analyzing { capture, .. } => {
                Some(*capture)
            }
            WorkflowState::Capture | WorkflowState::Results { .. } => None,
        }
    }
}
