//! Scan command - run one palm through the full screening workflow.
//!
//! Acquire (file or camera snapshot), wait for the quality verdict, submit to
//! the inference endpoint and, for anemic results with patient details given,
//! save the patient against the campaign.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use palm_screen_adapters::{select_file, HttpInferenceClient, HttpPersistence, SnapshotCamera};
use palm_screen_core::workflow::{Collaborators, SubmitFailurePolicy};
use palm_screen_core::{
    CampaignId, InferenceResult, PatientDetails, PatientRecord, QualityVerdict, ScanSession,
    Session, WorkflowConfig,
};
use serde::Serialize;
use tracing::{info, warn};

use super::quality::QualityArgs;
use super::ExitCode;
use crate::config::{AppConfig, MAX_UPLOAD_MB_LIMIT};
use crate::output::{ConsoleNotices, JsonOutput};

/// Hardcoded defaults for values that may come from config.
mod defaults {
    pub const INFERENCE_TIMEOUT_SECS: u64 = 30;
    pub const PERSISTENCE_TIMEOUT_SECS: u64 = 10;
    pub const VERDICT_TIMEOUT_MS: u64 = 5000;
    pub const MIN_ANALYZING_MS: u64 = 3000;
    pub const MAX_UPLOAD_MB: u64 = 10;
}

/// Where a failed submission leaves the workflow.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FailurePolicy {
    /// Discard the image
    Capture,
    /// Keep the image for another attempt
    Preview,
}

impl From<FailurePolicy> for SubmitFailurePolicy {
    fn from(policy: FailurePolicy) -> Self {
        match policy {
            FailurePolicy::Capture => Self::Capture,
            FailurePolicy::Preview => Self::Preview,
        }
    }
}

/// Arguments for a single scan.
#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    /// Campaign the scan is counted against
    #[arg(long)]
    pub campaign: String,

    /// Palm photo to upload
    #[arg(long, conflicts_with = "camera", required_unless_present = "camera")]
    pub file: Option<PathBuf>,

    /// Camera snapshot file to capture from
    #[arg(long, value_name = "SNAPSHOT")]
    pub camera: Option<PathBuf>,

    /// Inference endpoint receiving the image upload
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Base URL of the campaign API
    #[arg(long)]
    pub api_base: Option<String>,

    /// Bearer token of the signed-in operator
    #[arg(long, env = "PALM_SCREEN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Minimum time spent analyzing, in milliseconds
    #[arg(long)]
    pub min_analyzing_ms: Option<u64>,

    /// How long to wait for the quality check, in milliseconds
    #[arg(long)]
    pub verdict_timeout_ms: Option<u64>,

    /// Where a failed submission leaves the workflow
    #[arg(long, value_enum)]
    pub on_submit_failure: Option<FailurePolicy>,

    /// Patient name (saved only for anemic results)
    #[arg(long)]
    pub patient_name: Option<String>,

    /// Patient age in years
    #[arg(long)]
    pub patient_age: Option<String>,

    /// Patient gender (Male, Female or Other)
    #[arg(long)]
    pub patient_gender: Option<String>,

    /// Patient phone number
    #[arg(long)]
    pub patient_phone: Option<String>,

    #[command(flatten)]
    pub quality: QualityArgs,

    /// Only print error notices
    #[arg(short, long)]
    pub quiet: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    #[arg(skip)]
    max_upload_mb: Option<u64>,

    #[arg(skip)]
    inference_timeout_secs: Option<u64>,

    #[arg(skip)]
    persistence_timeout_secs: Option<u64>,
}

impl ScanArgs {
    /// Apply configuration file values, respecting CLI precedence.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.quality = args.quality.with_config(config);

        if args.endpoint.is_none() {
            args.endpoint.clone_from(&config.inference.endpoint);
        }
        if args.api_base.is_none() {
            args.api_base.clone_from(&config.persistence.api_base);
        }

        let w = &config.workflow;
        args.min_analyzing_ms = args.min_analyzing_ms.or(w.min_analyzing_ms);
        args.verdict_timeout_ms = args.verdict_timeout_ms.or(w.verdict_timeout_ms);
        if args.on_submit_failure.is_none() {
            args.on_submit_failure = w
                .on_submit_failure
                .as_deref()
                .and_then(|s| FailurePolicy::from_str(s, true).ok());
        }
        args.max_upload_mb = w.max_upload_mb;
        args.inference_timeout_secs = config.inference.timeout_secs;
        args.persistence_timeout_secs = config.persistence.timeout_secs;

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }

        args
    }

    fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            max_upload_bytes: self.max_upload_bytes(),
            min_analyzing: Duration::from_millis(
                self.min_analyzing_ms.unwrap_or(defaults::MIN_ANALYZING_MS),
            ),
            on_submit_failure: self
                .on_submit_failure
                .map(SubmitFailurePolicy::from)
                .unwrap_or_default(),
        }
    }

    fn max_upload_bytes(&self) -> u64 {
        let mb = self.max_upload_mb.unwrap_or(defaults::MAX_UPLOAD_MB);
        if (1..=MAX_UPLOAD_MB_LIMIT).contains(&mb) {
            mb * 1024 * 1024
        } else {
            warn!(
                "Ignoring max_upload_mb = {mb}, using {}MB",
                defaults::MAX_UPLOAD_MB
            );
            defaults::MAX_UPLOAD_MB * 1024 * 1024
        }
    }

    fn verdict_timeout(&self) -> Duration {
        Duration::from_millis(
            self.verdict_timeout_ms
                .unwrap_or(defaults::VERDICT_TIMEOUT_MS),
        )
    }

    fn session(&self) -> Session {
        self.token
            .as_deref()
            .map_or_else(Session::anonymous, Session::with_token)
    }

    /// Patient form, if any patient flag was given.
    fn patient(&self) -> Option<PatientDetails> {
        let given = [
            &self.patient_name,
            &self.patient_age,
            &self.patient_gender,
            &self.patient_phone,
        ];
        if given.iter().all(|f| f.is_none()) {
            return None;
        }
        Some(PatientDetails {
            name: self.patient_name.clone().unwrap_or_default(),
            age: self.patient_age.clone().unwrap_or_default(),
            gender: self.patient_gender.clone().unwrap_or_default(),
            phone: self.patient_phone.clone().unwrap_or_default(),
        })
    }
}

/// What the scan produced, printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub campaign: CampaignId,
    /// Name of the submitted image.
    pub image: Option<String>,
    pub verdict: Option<QualityVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InferenceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientRecord>,
    /// Workflow state after the scan.
    pub state: &'static str,
}

/// Result of running the scan command.
pub struct ScanOutcome {
    pub report: ScanReport,
    pub exit_code: ExitCode,
}

/// Run the scan command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &ScanArgs) -> Result<ScanOutcome> {
    let campaign = CampaignId::new(args.campaign.as_str())?;
    let session = args.session();

    let Some(endpoint) = args.endpoint.as_deref() else {
        bail!("No inference endpoint configured (use --endpoint or [inference] endpoint)");
    };
    let Some(api_base) = args.api_base.as_deref() else {
        bail!("No campaign API configured (use --api-base or [persistence] api_base)");
    };

    let inference = HttpInferenceClient::new(
        endpoint,
        Duration::from_secs(
            args.inference_timeout_secs
                .unwrap_or(defaults::INFERENCE_TIMEOUT_SECS),
        ),
    )?;
    let persistence = HttpPersistence::new(
        api_base,
        &session,
        Duration::from_secs(
            args.persistence_timeout_secs
                .unwrap_or(defaults::PERSISTENCE_TIMEOUT_SECS),
        ),
    )?;
    let collaborators = Collaborators {
        inference: Arc::new(inference),
        persistence: Arc::new(persistence),
        notices: Arc::new(ConsoleNotices::new(args.quiet)),
    };

    let mut scan = ScanSession::start(
        campaign,
        &session,
        collaborators,
        args.quality.analyzer(),
        args.workflow_config(),
    )?;

    let outcome = drive(&mut scan, args);
    scan.wait_background();
    let outcome = outcome?;

    JsonOutput::stdout().write_value(&outcome.report, args.pretty)?;
    Ok(outcome)
}

fn drive(scan: &mut ScanSession, args: &ScanArgs) -> Result<ScanOutcome> {
    if let Some(camera) = &args.camera {
        info!("Capturing from camera snapshot {}", camera.display());
        scan.capture_from_camera(&SnapshotCamera::new(camera))?;
    } else if let Some(file) = &args.file {
        scan.select_file(select_file(file)?)?;
    }

    if !scan.wait_for_verdict(args.verdict_timeout()) {
        bail!(
            "Quality check did not finish within {} ms",
            args.verdict_timeout().as_millis()
        );
    }

    let image = scan.workflow().held_image().map(|i| i.name().to_string());
    let verdict = scan.workflow().verdict().cloned();

    if !scan.workflow().can_analyze() {
        if let Some(v) = &verdict {
            for suggestion in v.suggestions() {
                eprintln!("suggestion: {suggestion}");
            }
        }
        return Ok(ScanOutcome {
            report: ScanReport {
                campaign: scan.campaign().clone(),
                image,
                verdict,
                result: None,
                patient: None,
                state: scan.state().name(),
            },
            exit_code: ExitCode::IssuesFound,
        });
    }

    let result = scan.analyze().context("Analysis failed")?;

    let patient = match args.patient() {
        Some(details) if result.is_anemic() => Some(scan.save_patient(details)?),
        Some(_) => {
            warn!("Result is not anemic; patient details were not saved");
            scan.scan_next()?;
            None
        }
        None => None,
    };

    Ok(ScanOutcome {
        report: ScanReport {
            campaign: scan.campaign().clone(),
            image,
            verdict,
            result: Some(result),
            patient,
            state: scan.state().name(),
        },
        exit_code: ExitCode::Success,
    })
}
