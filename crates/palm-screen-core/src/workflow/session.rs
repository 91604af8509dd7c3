//! Drives a [`CaptureWorkflow`] against its collaborators.
//!
//! Quality analysis runs on a background thread per acquisition and reports
//! back over a channel, tagged with the [`CaptureId`] it was started for.
//! Scan-count updates are fire-and-forget; their handles are kept so
//! [`ScanSession::wait_background`] can join them.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::state::{
    CaptureId, CaptureWorkflow, SubmitFailurePolicy, Transition, WorkflowEvent, WorkflowState,
};
use crate::domain::{
    CampaignId, EncodedImage, InferenceResult, PatientDetails, PatientRecord, QualityVerdict,
    Session,
};
use crate::error::{ScreenError, ValidationError, WorkflowError};
use crate::modules::QualityAnalyzer;
use crate::ports::{CameraDevice, InferenceClient, Notice, NoticeSink, PersistenceService, VideoStream};

/// Largest file accepted by [`ScanSession::select_file`] unless configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const CAMERA_UNAVAILABLE: &str =
    "Could not access the camera. Please check camera permissions or upload a photo instead.";
const SUBMISSION_FAILED: &str = "Error analyzing image. Please try again.";
const PATIENT_SAVED: &str = "Patient saved successfully!";

/// Workflow tuning.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Upload size limit in bytes.
    pub max_upload_bytes: u64,
    /// Minimum time spent in the analyzing state.
    pub min_analyzing: Duration,
    /// Where a failed submission leads.
    pub on_submit_failure: SubmitFailurePolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            min_analyzing: Duration::from_millis(3000),
            on_submit_failure: SubmitFailurePolicy::default(),
        }
    }
}

/// Where the bytes of a selected file live.
#[derive(Debug, Clone)]
pub enum FileContents {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A file picked by the operator, described before it is read.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    /// Size as reported by the picker or file metadata.
    pub size: u64,
    pub contents: FileContents,
}

impl SelectedFile {
    /// A file already in memory.
    #[must_use]
    pub fn in_memory(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            contents: FileContents::Bytes(bytes),
        }
    }

    /// A file on disk, read only after validation passes.
    #[must_use]
    pub fn on_disk(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            contents: FileContents::Path(path.into()),
        }
    }

    /// Checks type and size without touching the contents.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnImage`] for non-`image/*` types and
    /// [`ValidationError::TooLarge`] above `limit`.
    pub fn validate(&self, limit: u64) -> Result<(), ValidationError> {
        if !self.mime_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage {
                mime_type: self.mime_type.clone(),
            });
        }
        if self.size > limit {
            return Err(ValidationError::TooLarge {
                size: self.size,
                limit,
            });
        }
        Ok(())
    }

    fn read(self) -> Result<EncodedImage, ValidationError> {
        let bytes = match self.contents {
            FileContents::Bytes(bytes) => bytes,
            FileContents::Path(path) => std::fs::read(&path)
                .map_err(|e| ValidationError::Unreadable(format!("{}: {e}", path.display())))?,
        };
        Ok(EncodedImage::new(self.name, self.mime_type, bytes))
    }
}

/// External services a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub inference: Arc<dyn InferenceClient>,
    pub persistence: Arc<dyn PersistenceService>,
    pub notices: Arc<dyn NoticeSink>,
}

/// Releases a camera stream when dropped.
struct StreamGuard<'a> {
    camera: &'a dyn CameraDevice,
    stream: VideoStream,
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        debug!(stream = self.stream.id, "Releasing camera stream");
        self.camera.release(&self.stream);
    }
}

/// One operator's scanning session within a campaign.
pub struct ScanSession {
    campaign: CampaignId,
    workflow: CaptureWorkflow,
    collaborators: Collaborators,
    analyzer: Arc<QualityAnalyzer>,
    config: WorkflowConfig,
    verdict_tx: Sender<(CaptureId, QualityVerdict)>,
    verdict_rx: Receiver<(CaptureId, QualityVerdict)>,
    background: Vec<JoinHandle<()>>,
}

impl ScanSession {
    /// Starts a session in the capture state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NoSession`] if `session` is not present.
    pub fn start(
        campaign: CampaignId,
        session: &Session,
        collaborators: Collaborators,
        analyzer: QualityAnalyzer,
        config: WorkflowConfig,
    ) -> Result<Self, WorkflowError> {
        if !session.is_present() {
            return Err(WorkflowError::NoSession);
        }
        let (verdict_tx, verdict_rx) = mpsc::channel();
        info!(%campaign, "Scan session started");
        Ok(Self {
            campaign,
            workflow: CaptureWorkflow::new(config.on_submit_failure),
            collaborators,
            analyzer: Arc::new(analyzer),
            config,
            verdict_tx,
            verdict_rx,
            background: Vec::new(),
        })
    }

    /// Campaign this session scans for.
    #[must_use]
    pub const fn campaign(&self) -> &CampaignId {
        &self.campaign
    }

    /// The underlying state machine, for queries.
    #[must_use]
    pub const fn workflow(&self) -> &CaptureWorkflow {
        &self.workflow
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        self.workflow.state()
    }

    /// Validates and loads a picked file, then starts quality analysis.
    ///
    /// Type and size are checked before the contents are read.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for rejected files, or a
    /// [`WorkflowError`] outside the capture state.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ScreenError> {
        self.require_capture("select a file")?;

        let loaded = file
            .validate(self.config.max_upload_bytes)
            .and_then(|()| file.read());
        match loaded {
            Ok(image) => self.acquire(image),
            Err(e) => {
                warn!("Rejected selection: {e}");
                self.notify(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Captures one frame from the camera, then starts quality analysis.
    ///
    /// The stream is released before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`CameraError`](crate::error::CameraError) if the camera is
    /// unavailable or the capture fails. The session stays in capture, so
    /// the operator can fall back to file upload.
    pub fn capture_from_camera(&mut self, camera: &dyn CameraDevice) -> Result<(), ScreenError> {
        self.require_capture("use the camera")?;

        let stream = match camera.acquire_stream() {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Camera unavailable: {e}");
                self.notify(Notice::error(CAMERA_UNAVAILABLE));
                return Err(e.into());
            }
        };

        let frame = {
            let guard = StreamGuard { camera, stream };
            camera.capture_frame(&guard.stream)
        };

        match frame {
            Ok(image) => self.acquire(image),
            Err(e) => {
                warn!("Frame capture failed: {e}");
                self.notify(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Applies any verdicts that have arrived, without blocking.
    ///
    /// Returns `true` if the held image now has a verdict.
    pub fn poll_verdict(&mut self) -> bool {
        while let Ok((capture, verdict)) = self.verdict_rx.try_recv() {
            self.apply_verdict(capture, verdict);
        }
        self.workflow.verdict().is_some()
    }

    /// Blocks until the held image has a verdict or `timeout` elapses.
    ///
    /// Returns `true` if the held image has a verdict.
    pub fn wait_for_verdict(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.workflow.is_quality_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.verdict_rx.recv_timeout(remaining) {
                Ok((capture, verdict)) => self.apply_verdict(capture, verdict),
                Err(_) => break,
            }
        }
        self.workflow.verdict().is_some()
    }

    /// Submits the held image for inference.
    ///
    /// Only allowed once a valid verdict is present. The analyzing state
    /// lasts at least `min_analyzing`, on success and on failure. A
    /// successful result also bumps the campaign's scan counter in the
    /// background; a failed bump is only logged.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] if analysis is not allowed yet, or the
    /// [`SubmissionError`](crate::error::SubmissionError) after moving to the
    /// configured fallback state.
    pub fn analyze(&mut self) -> Result<InferenceResult, ScreenError> {
        let image = match self.workflow.state() {
            WorkflowState::Preview { image, .. } if self.workflow.can_analyze() => image.clone(),
            state => {
                return Err(WorkflowError::InvalidTransition {
                    state: state.name(),
                    event: WorkflowEvent::Analyze.name(),
                }
                .into())
            }
        };
        self.workflow.handle(WorkflowEvent::Analyze)?;
        let entered = Instant::now();

        info!(image = image.name(), bytes = image.len(), "Submitting for analysis");
        let outcome = self.collaborators.inference.submit(&image);

        let elapsed = entered.elapsed();
        if elapsed < self.config.min_analyzing {
            thread::sleep(self.config.min_analyzing - elapsed);
        }

        match outcome {
            Ok(result) => {
                info!(
                    anemic = result.is_anemic(),
                    confidence = result.confidence(),
                    "Analysis complete"
                );
                self.workflow
                    .handle(WorkflowEvent::SubmissionSucceeded(result.clone()))?;
                self.spawn_scan_count();
                Ok(result)
            }
            Err(e) => {
                warn!("Inference failed: {e}");
                self.notify(Notice::error(SUBMISSION_FAILED));
                self.workflow.handle(WorkflowEvent::SubmissionFailed)?;
                Err(e.into())
            }
        }
    }

    /// Discards the held image (and any result) and returns to capture.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] outside the preview and results states.
    pub fn retake(&mut self) -> Result<(), ScreenError> {
        self.workflow.handle(WorkflowEvent::Retake)?;
        Ok(())
    }

    /// Leaves the results screen without saving.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] outside the results state.
    pub fn scan_next(&mut self) -> Result<(), ScreenError> {
        self.workflow.handle(WorkflowEvent::ScanNext)?;
        Ok(())
    }

    /// Saves an anemic patient against the campaign and returns to capture.
    ///
    /// On failure the session stays on the results screen.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAnemic`] for non-anemic results, a
    /// [`ValidationError`] for an incomplete form, or
    /// [`ScreenError::Persistence`] if the backend rejects the record.
    pub fn save_patient(&mut self, details: PatientDetails) -> Result<PatientRecord, ScreenError> {
        let result = match self.workflow.state() {
            WorkflowState::Results { result, .. } => result.clone(),
            state => {
                return Err(WorkflowError::InvalidTransition {
                    state: state.name(),
                    event: WorkflowEvent::PatientSaved.name(),
                }
                .into())
            }
        };
        if !result.is_anemic() {
            return Err(WorkflowError::NotAnemic.into());
        }

        let record = match details.into_record(&self.campaign, &result) {
            Ok(record) => record,
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                return Err(e.into());
            }
        };

        if let Err(e) = self.collaborators.persistence.save_patient(&record) {
            warn!("Saving patient failed: {e:#}");
            self.notify(Notice::error(format!("Error saving patient: {e:#}")));
            return Err(ScreenError::Persistence(e));
        }

        info!(campaign = %self.campaign, "Patient saved");
        self.notify(Notice::success(PATIENT_SAVED));
        self.workflow.handle(WorkflowEvent::PatientSaved)?;
        Ok(record)
    }

    /// Background task handles still held. Finished ones are dropped
    /// whenever a new task starts.
    #[must_use]
    pub fn background_handles(&self) -> usize {
        self.background.len()
    }

    /// Joins outstanding background tasks.
    pub fn wait_background(&mut self) {
        for handle in self.background.drain(..) {
            if handle.join().is_err() {
                warn!("Background task panicked");
            }
        }
    }

    fn require_capture(&self, event: &'static str) -> Result<(), WorkflowError> {
        match self.workflow.state() {
            WorkflowState::Capture => Ok(()),
            state => Err(WorkflowError::InvalidTransition {
                state: state.name(),
                event,
            }),
        }
    }

    fn acquire(&mut self, image: EncodedImage) -> Result<(), ScreenError> {
        self.workflow
            .handle(WorkflowEvent::Acquired(image.clone()))?;
        if let Some(capture) = self.workflow.current_capture() {
            info!(image = image.name(), %capture, "Image acquired");
            self.spawn_quality_check(capture, image);
        }
        Ok(())
    }

    fn spawn_quality_check(&mut self, capture: CaptureId, image: EncodedImage) {
        let analyzer = Arc::clone(&self.analyzer);
        let tx = self.verdict_tx.clone();
        let task_image = image.clone();

        let spawned = thread::Builder::new()
            .name("quality-check".into())
            .spawn(move || {
                let verdict = analyzer.analyze(&task_image);
                // The session may already be gone.
                let _ = tx.send((capture, verdict));
            });

        if let Err(e) = spawned {
            warn!("Could not spawn quality check, running inline: {e}");
            let verdict = self.analyzer.analyze(&image);
            self.apply_verdict(capture, verdict);
        }
    }

    fn apply_verdict(&mut self, capture: CaptureId, verdict: QualityVerdict) {
        let valid = verdict.is_valid();
        match self
            .workflow
            .handle(WorkflowEvent::VerdictReady { capture, verdict })
        {
            Ok(Transition::Applied) => info!(%capture, valid, "Quality verdict ready"),
            Ok(Transition::Discarded) => debug!(%capture, "Discarding stale verdict"),
            Err(e) => warn!("Verdict not applied: {e}"),
        }
    }

    fn spawn_scan_count(&mut self) {
        let persistence = Arc::clone(&self.collaborators.persistence);
        let campaign = self.campaign.clone();

        let spawned = thread::Builder::new()
            .name("scan-count".into())
            .spawn(move || increment_scan_count(persistence.as_ref(), &campaign));

        match spawned {
            Ok(handle) => {
                self.background.retain(|h| !h.is_finished());
                self.background.push(handle);
            }
            Err(e) => {
                warn!("Could not spawn scan-count update, running inline: {e}");
                increment_scan_count(self.collaborators.persistence.as_ref(), &self.campaign);
            }
        }
    }

    fn notify(&self, notice: Notice) {
        self.collaborators.notices.notify(notice);
    }
}

fn increment_scan_count(persistence: &dyn PersistenceService, campaign: &CampaignId) {
    match persistence.increment_scan_count(campaign) {
        Ok(()) => debug!(%campaign, "Scan count updated"),
        Err(e) => warn!(%campaign, "Failed to update campaign stats: {e:#}"),
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("campaign", &self.campaign)
            .field("state", &self.workflow.state().name())
            .field("background", &self.background.len())
            .finish_non_exhaustive()
    }
}
