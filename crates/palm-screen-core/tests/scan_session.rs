//! End-to-end tests of the scan session against mock collaborators.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use palm_screen_core::domain::{CampaignId, PatientDetails, Session};
use palm_screen_core::error::{CameraError, ScreenError, SubmissionError, ValidationError, WorkflowError};
use palm_screen_core::ports::NoticeLevel;
use palm_screen_core::workflow::{
    Collaborators, ScanSession, SelectedFile, SubmitFailurePolicy, WorkflowConfig, WorkflowState,
};
use palm_screen_core::QualityAnalyzer;
use palm_screen_test_support::{
    MockCamera, MockInferenceClient, MockNoticeSink, MockPersistence, SyntheticImageBuilder,
};

const VERDICT_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    session: ScanSession,
    inference: Arc<MockInferenceClient>,
    persistence: Arc<MockPersistence>,
    notices: Arc<MockNoticeSink>,
}

fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        min_analyzing: Duration::ZERO,
        ..WorkflowConfig::default()
    }
}

fn harness_with(
    inference: MockInferenceClient,
    persistence: MockPersistence,
    config: WorkflowConfig,
) -> Harness {
    let inference = Arc::new(inference);
    let persistence = Arc::new(persistence);
    let notices = Arc::new(MockNoticeSink::new());
    let collaborators = Collaborators {
        inference: inference.clone(),
        persistence: persistence.clone(),
        notices: notices.clone(),
    };
    let session = ScanSession::start(
        CampaignId::new("camp-1").unwrap(),
        &Session::with_token("token"),
        collaborators,
        QualityAnalyzer::default(),
        config,
    )
    .expect("session present");

    Harness {
        session,
        inference,
        persistence,
        notices,
    }
}

fn harness(inference: MockInferenceClient) -> Harness {
    harness_with(inference, MockPersistence::new(), fast_config())
}

fn palm_file() -> SelectedFile {
    let png = SyntheticImageBuilder::png_bytes(&SyntheticImageBuilder::palm(160, 120)).unwrap();
    SelectedFile::in_memory("palm.png", "image/png", png)
}

fn dark_file() -> SelectedFile {
    let png = SyntheticImageBuilder::png_bytes(&SyntheticImageBuilder::black(160, 120)).unwrap();
    SelectedFile::in_memory("dark.png", "image/png", png)
}

fn details() -> PatientDetails {
    PatientDetails {
        name: "Asha".into(),
        age: "34".into(),
        gender: "Female".into(),
        phone: "555-0101".into(),
    }
}

/// Selects a good palm and waits for its verdict.
fn ready_palm(h: &mut Harness) {
    h.session.select_file(palm_file()).expect("select");
    assert!(h.session.wait_for_verdict(VERDICT_TIMEOUT));
    assert!(h.session.workflow().can_analyze());
}

#[test]
fn test_missing_session_is_rejected() {
    let collaborators = Collaborators {
        inference: Arc::new(MockInferenceClient::anemic(90.0)),
        persistence: Arc::new(MockPersistence::new()),
        notices: Arc::new(MockNoticeSink::new()),
    };
    let err = ScanSession::start(
        CampaignId::new("camp-1").unwrap(),
        &Session::anonymous(),
        collaborators,
        QualityAnalyzer::default(),
        fast_config(),
    )
    .expect_err("no session");
    assert_eq!(err, WorkflowError::NoSession);
}

#[test]
fn test_oversized_file_rejected_before_reading() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    // The path does not exist: any read attempt would surface as Unreadable.
    let file = SelectedFile::on_disk(
        "huge.jpg",
        "image/jpeg",
        15 * 1024 * 1024,
        "/nonexistent/huge.jpg",
    );

    let err = h.session.select_file(file).expect_err("too large");
    assert!(matches!(
        err,
        ScreenError::Validation(ValidationError::TooLarge { .. })
    ));
    assert!(matches!(h.session.state(), WorkflowState::Capture));
    assert_eq!(
        h.notices.messages(NoticeLevel::Error),
        ["File size must be less than 10MB"]
    );
}

#[test]
fn test_non_image_rejected() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    let file = SelectedFile::in_memory("notes.pdf", "application/pdf", vec![1, 2, 3]);

    let err = h.session.select_file(file).expect_err("not an image");
    assert!(matches!(
        err,
        ScreenError::Validation(ValidationError::NotAnImage { .. })
    ));
    assert!(h.session.workflow().held_image().is_none());
}

#[test]
fn test_unreadable_image_gets_error_verdict() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    let file = SelectedFile::in_memory("broken.jpg", "image/jpeg", vec![0xFF, 0xD8, 0x00, 0x01]);

    h.session.select_file(file).expect("accepted for preview");
    assert!(h.session.wait_for_verdict(VERDICT_TIMEOUT));

    let verdict = h.session.workflow().verdict().expect("verdict");
    assert_eq!(verdict.issues(), ["Unable to analyze image quality"]);
    assert!(!h.session.workflow().can_analyze());
}

#[test]
fn test_full_scan_reaches_results_and_counts() {
    let mut h = harness(MockInferenceClient::anemic(91.5));
    ready_palm(&mut h);

    let result = h.session.analyze().expect("analysis");
    assert!(result.is_anemic());
    assert_eq!(result.confidence(), Some(91.5));
    assert_eq!(h.session.state().name(), "results");
    assert_eq!(h.inference.submissions(), ["palm.png"]);

    h.session.wait_background();
    assert_eq!(
        h.persistence.increments(),
        [CampaignId::new("camp-1").unwrap()]
    );
}

#[test]
fn test_failed_increment_still_shows_results() {
    let mut h = harness_with(
        MockInferenceClient::healthy(80.0),
        MockPersistence::new().failing_increment(),
        fast_config(),
    );
    ready_palm(&mut h);

    h.session.analyze().expect("analysis");
    h.session.wait_background();

    assert_eq!(h.session.state().name(), "results");
    assert_eq!(h.persistence.increments().len(), 1);
    assert!(h.notices.messages(NoticeLevel::Error).is_empty());
}

#[test]
fn test_increment_does_not_block_results() {
    let mut h = harness_with(
        MockInferenceClient::anemic(90.0),
        MockPersistence::new().with_increment_delay(Duration::from_millis(300)),
        fast_config(),
    );
    ready_palm(&mut h);

    let started = Instant::now();
    h.session.analyze().expect("analysis");
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(h.session.state().name(), "results");

    h.session.wait_background();
    assert_eq!(h.persistence.increments().len(), 1);
}

#[test]
fn test_finished_increments_are_not_retained() {
    let mut h = harness(MockInferenceClient::healthy(75.0));

    for scan in 1..=5 {
        ready_palm(&mut h);
        h.session.analyze().expect("analysis");
        h.session.scan_next().expect("scan next");

        let deadline = Instant::now() + VERDICT_TIMEOUT;
        while h.persistence.increments().len() < scan && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(h.session.background_handles() <= 2);
    h.session.wait_background();
    assert_eq!(h.session.background_handles(), 0);
    assert_eq!(h.persistence.increments().len(), 5);
}

#[test]
fn test_retake_from_results() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    ready_palm(&mut h);
    h.session.analyze().expect("analysis");

    h.session.retake().expect("retake from results");
    assert!(matches!(h.session.state(), WorkflowState::Capture));
    assert!(h.session.workflow().result().is_none());

    ready_palm(&mut h);
    h.session.wait_background();
}

#[test]
fn test_dark_image_cannot_be_analyzed() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    h.session.select_file(dark_file()).expect("select");
    assert!(h.session.wait_for_verdict(VERDICT_TIMEOUT));

    assert!(!h.session.workflow().can_analyze());
    let err = h.session.analyze().expect_err("gate closed");
    assert!(matches!(
        err,
        ScreenError::Workflow(WorkflowError::InvalidTransition { .. })
    ));
    assert!(h.inference.submissions().is_empty());
}

#[test]
fn test_stale_verdict_after_retake_is_ignored() {
    let mut h = harness(MockInferenceClient::anemic(90.0));

    h.session.select_file(palm_file()).expect("select palm");
    h.session.retake().expect("retake");
    h.session.select_file(dark_file()).expect("select dark");

    assert!(h.session.wait_for_verdict(VERDICT_TIMEOUT));
    // Drain anything still in flight; the palm verdict must not apply.
    std::thread::sleep(Duration::from_millis(50));
    h.session.poll_verdict();

    let verdict = h.session.workflow().verdict().expect("verdict");
    assert!(!verdict.is_valid());
    assert_eq!(
        h.session.workflow().held_image().map(|i| i.name().to_string()),
        Some("dark.png".to_string())
    );
    assert!(!h.session.workflow().can_analyze());
}

#[test]
fn test_analyzing_lasts_at_least_the_minimum() {
    let min = Duration::from_millis(250);
    let mut h = harness_with(
        MockInferenceClient::anemic(90.0),
        MockPersistence::new(),
        WorkflowConfig {
            min_analyzing: min,
            ..WorkflowConfig::default()
        },
    );
    ready_palm(&mut h);

    let started = Instant::now();
    h.session.analyze().expect("analysis");
    assert!(started.elapsed() >= min);
}

#[test]
fn test_slow_inference_is_not_padded_further() {
    let mut h = harness_with(
        MockInferenceClient::anemic(90.0).with_delay(Duration::from_millis(200)),
        MockPersistence::new(),
        WorkflowConfig {
            min_analyzing: Duration::from_millis(100),
            ..WorkflowConfig::default()
        },
    );
    ready_palm(&mut h);

    let started = Instant::now();
    h.session.analyze().expect("analysis");
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(2000));
}

#[test]
fn test_submission_failure_returns_to_capture() {
    let mut h = harness(MockInferenceClient::failing(SubmissionError::Server {
        status: 500,
        message: "model crashed".into(),
    }));
    ready_palm(&mut h);

    let err = h.session.analyze().expect_err("failure");
    assert!(matches!(
        err,
        ScreenError::Submission(SubmissionError::Server { status: 500, .. })
    ));
    assert!(matches!(h.session.state(), WorkflowState::Capture));
    assert!(h.session.workflow().held_image().is_none());
    assert_eq!(
        h.notices.messages(NoticeLevel::Error),
        ["Error analyzing image. Please try again."]
    );

    h.session.wait_background();
    assert!(h.persistence.increments().is_empty());
}

#[test]
fn test_submission_failure_can_keep_preview() {
    let mut h = harness_with(
        MockInferenceClient::failing(SubmissionError::Network("refused".into())),
        MockPersistence::new(),
        WorkflowConfig {
            min_analyzing: Duration::ZERO,
            on_submit_failure: SubmitFailurePolicy::Preview,
            ..WorkflowConfig::default()
        },
    );
    ready_palm(&mut h);

    assert!(h.session.analyze().is_err());
    assert_eq!(h.session.state().name(), "preview");
    assert!(h.session.workflow().can_analyze());
}

#[test]
fn test_camera_capture_releases_stream() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    let camera = MockCamera::with_frame(SyntheticImageBuilder::palm_png().unwrap());

    h.session.capture_from_camera(&camera).expect("capture");
    assert_eq!(camera.acquired_count(), 1);
    assert_eq!(camera.open_streams(), 0);
    assert_eq!(h.session.state().name(), "preview");
    assert!(h.session.wait_for_verdict(VERDICT_TIMEOUT));
}

#[test]
fn test_camera_failure_releases_stream() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    let camera = MockCamera::broken();

    let err = h.session.capture_from_camera(&camera).expect_err("broken");
    assert!(matches!(err, ScreenError::Camera(CameraError::Capture(_))));
    assert_eq!(camera.acquired_count(), 1);
    assert_eq!(camera.open_streams(), 0);
    assert!(matches!(h.session.state(), WorkflowState::Capture));
}

#[test]
fn test_camera_denied_falls_back_to_upload() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    let camera = MockCamera::denied();

    let err = h.session.capture_from_camera(&camera).expect_err("denied");
    assert!(matches!(
        err,
        ScreenError::Camera(CameraError::PermissionDenied(_))
    ));
    assert_eq!(h.notices.messages(NoticeLevel::Error).len(), 1);

    // Upload still works.
    ready_palm(&mut h);
}

#[test]
fn test_save_patient_for_anemic_result() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    ready_palm(&mut h);
    h.session.analyze().expect("analysis");

    let record = h.session.save_patient(details()).expect("saved");
    assert_eq!(record.result, "Anemic");
    assert_eq!(record.campaign_id.as_str(), "camp-1");
    assert_eq!(h.persistence.saved(), [record]);
    assert_eq!(
        h.notices.messages(NoticeLevel::Success),
        ["Patient saved successfully!"]
    );
    assert!(matches!(h.session.state(), WorkflowState::Capture));
}

#[test]
fn test_save_patient_refused_for_non_anemic() {
    let mut h = harness(MockInferenceClient::healthy(95.0));
    ready_palm(&mut h);
    h.session.analyze().expect("analysis");

    let err = h.session.save_patient(details()).expect_err("not anemic");
    assert!(matches!(err, ScreenError::Workflow(WorkflowError::NotAnemic)));
    assert!(h.persistence.saved().is_empty());

    h.session.scan_next().expect("scan next");
    assert!(matches!(h.session.state(), WorkflowState::Capture));
}

#[test]
fn test_save_patient_failure_stays_on_results() {
    let mut h = harness_with(
        MockInferenceClient::anemic(90.0),
        MockPersistence::new().failing_save(),
        fast_config(),
    );
    ready_palm(&mut h);
    h.session.analyze().expect("analysis");

    let err = h.session.save_patient(details()).expect_err("backend down");
    assert!(matches!(err, ScreenError::Persistence(_)));
    assert_eq!(h.session.state().name(), "results");
    assert_eq!(h.notices.messages(NoticeLevel::Error).len(), 1);
}

#[test]
fn test_incomplete_patient_form_stays_on_results() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    ready_palm(&mut h);
    h.session.analyze().expect("analysis");

    let mut form = details();
    form.age = String::new();
    let err = h.session.save_patient(form).expect_err("missing age");
    assert!(matches!(
        err,
        ScreenError::Validation(ValidationError::MissingField("age"))
    ));
    assert_eq!(h.session.state().name(), "results");
}

#[test]
fn test_select_outside_capture_is_rejected() {
    let mut h = harness(MockInferenceClient::anemic(90.0));
    ready_palm(&mut h);

    let err = h.session.select_file(palm_file()).expect_err("already previewing");
    assert!(matches!(err, ScreenError::Workflow(_)));
}
