//! Mock implementations of core port traits.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use palm_screen_core::domain::{
    CampaignId, EncodedImage, ImageInfo, InferenceResult, PatientRecord,
};
use palm_screen_core::error::{CameraError, SubmissionError};
use palm_screen_core::ports::{
    CameraDevice, ImageSource, InferenceClient, Notice, NoticeLevel, NoticeSink,
    PersistenceService, ProgressEvent, ProgressSink, VideoStream,
};

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built images, followed by any load failures.
pub struct MockImageSource {
    images: Vec<ImageInfo>,
    failures: Vec<String>,
}

impl MockImageSource {
    /// Creates a new mock source with the given images.
    #[must_use]
    pub const fn new(images: Vec<ImageInfo>) -> Self {
        Self {
            images,
            failures: Vec::new(),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Adds an item that fails to load with `reason`.
    #[must_use]
    pub fn with_unreadable(mut self, reason: impl Into<String>) -> Self {
        self.failures.push(reason.into());
        self
    }
}

impl ImageSource for MockImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInfo>> + Send + '_> {
        let failures = self
            .failures
            .iter()
            .map(|reason| Err(anyhow::anyhow!("{reason}")));
        Box::new(self.images.iter().cloned().map(Ok).chain(failures))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.images.len() + self.failures.len())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        locked(&self.events).clone()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns `(processed, skipped, rejected)` from the `Finished` event.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished {
                processed,
                skipped,
                rejected,
            } => Some((*processed, *skipped, *rejected)),
            _ => None,
        })
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        locked(&self.events).push(event);
    }
}

/// Mock implementation of `InferenceClient` for testing.
///
/// Returns a fixed outcome, optionally after a delay, and records the names
/// of submitted images.
pub struct MockInferenceClient {
    outcome: Result<InferenceResult, SubmissionError>,
    delay: Duration,
    submissions: Mutex<Vec<String>>,
}

impl MockInferenceClient {
    /// Always classifies as anemic.
    #[must_use]
    pub fn anemic(confidence: f64) -> Self {
        Self::returning(Ok(InferenceResult::new(true, Some(confidence))))
    }

    /// Always classifies as not anemic.
    #[must_use]
    pub fn healthy(confidence: f64) -> Self {
        Self::returning(Ok(InferenceResult::new(false, Some(confidence))))
    }

    /// Always fails with `error`.
    #[must_use]
    pub fn failing(error: SubmissionError) -> Self {
        Self::returning(Err(error))
    }

    fn returning(outcome: Result<InferenceResult, SubmissionError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Names of submitted images, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<String> {
        locked(&self.submissions).clone()
    }
}

impl InferenceClient for MockInferenceClient {
    fn submit(&self, image: &EncodedImage) -> Result<InferenceResult, SubmissionError> {
        locked(&self.submissions).push(image.name().to_string());
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.outcome.clone()
    }
}

/// Mock implementation of `PersistenceService` for testing.
#[derive(Default)]
pub struct MockPersistence {
    fail_increment: bool,
    fail_save: bool,
    increment_delay: Duration,
    increments: Mutex<Vec<CampaignId>>,
    saved: Mutex<Vec<PatientRecord>>,
}

impl MockPersistence {
    /// Creates a mock that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `increment_scan_count` fail.
    #[must_use]
    pub fn failing_increment(mut self) -> Self {
        self.fail_increment = true;
        self
    }

    /// Makes `save_patient` fail.
    #[must_use]
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Sleeps for `delay` inside `increment_scan_count`.
    #[must_use]
    pub fn with_increment_delay(mut self, delay: Duration) -> Self {
        self.increment_delay = delay;
        self
    }

    /// Campaigns whose counter was incremented (including failed attempts).
    #[must_use]
    pub fn increments(&self) -> Vec<CampaignId> {
        locked(&self.increments).clone()
    }

    /// Successfully saved patients.
    #[must_use]
    pub fn saved(&self) -> Vec<PatientRecord> {
        locked(&self.saved).clone()
    }
}

impl PersistenceService for MockPersistence {
    fn increment_scan_count(&self, campaign: &CampaignId) -> anyhow::Result<()> {
        if !self.increment_delay.is_zero() {
            thread::sleep(self.increment_delay);
        }
        locked(&self.increments).push(campaign.clone());
        if self.fail_increment {
            anyhow::bail!("stats endpoint unavailable");
        }
        Ok(())
    }

    fn save_patient(&self, record: &PatientRecord) -> anyhow::Result<()> {
        if self.fail_save {
            anyhow::bail!("patients endpoint unavailable");
        }
        locked(&self.saved).push(record.clone());
        Ok(())
    }
}

/// Mock implementation of `CameraDevice` for testing.
///
/// Tracks acquired and released streams so tests can assert nothing leaks.
pub struct MockCamera {
    frame: Option<EncodedImage>,
    deny: bool,
    acquired: Mutex<usize>,
    released: Mutex<Vec<u64>>,
}

impl MockCamera {
    /// A camera that returns `frame` on every capture.
    #[must_use]
    pub const fn with_frame(frame: EncodedImage) -> Self {
        Self {
            frame: Some(frame),
            deny: false,
            acquired: Mutex::new(0),
            released: Mutex::new(Vec::new()),
        }
    }

    /// A camera whose permission is denied.
    #[must_use]
    pub const fn denied() -> Self {
        Self {
            frame: None,
            deny: true,
            acquired: Mutex::new(0),
            released: Mutex::new(Vec::new()),
        }
    }

    /// A camera that opens streams but fails to capture.
    #[must_use]
    pub const fn broken() -> Self {
        Self {
            frame: None,
            deny: false,
            acquired: Mutex::new(0),
            released: Mutex::new(Vec::new()),
        }
    }

    /// Number of streams opened.
    #[must_use]
    pub fn acquired_count(&self) -> usize {
        *locked(&self.acquired)
    }

    /// Streams opened but not yet released.
    #[must_use]
    pub fn open_streams(&self) -> usize {
        self.acquired_count() - locked(&self.released).len()
    }
}

impl CameraDevice for MockCamera {
    fn acquire_stream(&self) -> Result<VideoStream, CameraError> {
        if self.deny {
            return Err(CameraError::PermissionDenied("user dismissed prompt".into()));
        }
        let mut acquired = locked(&self.acquired);
        *acquired += 1;
        Ok(VideoStream {
            id: *acquired as u64,
            label: "mock rear camera".into(),
        })
    }

    fn capture_frame(&self, _stream: &VideoStream) -> Result<EncodedImage, CameraError> {
        self.frame
            .clone()
            .ok_or_else(|| CameraError::Capture("no frame available".into()))
    }

    fn release(&self, stream: &VideoStream) {
        locked(&self.released).push(stream.id);
    }
}

/// Mock implementation of `NoticeSink` for testing.
#[derive(Default)]
pub struct MockNoticeSink {
    notices: Mutex<Vec<Notice>>,
}

impl MockNoticeSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices received.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        locked(&self.notices).clone()
    }

    /// Messages of notices at `level`.
    #[must_use]
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl NoticeSink for MockNoticeSink {
    fn notify(&self, notice: Notice) {
        locked(&self.notices).push(notice);
    }
}
