//! Configuration file support for palm-screen.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/palm-screen/config.toml` (lowest priority)
//! - Project-local: `.palm-screen.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

const PROJECT_FILE: &str = ".palm-screen.toml";

/// Largest accepted `workflow.max_upload_mb`.
pub const MAX_UPLOAD_MB_LIMIT: u64 = 1024;

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Quality rule thresholds.
    pub quality: QualityConfig,
    /// Center-window sampling.
    pub sampler: SamplerConfig,
    /// Scan workflow tuning.
    pub workflow: WorkflowConfig,
    /// Inference endpoint.
    pub inference: InferenceConfig,
    /// Campaign backend.
    pub persistence: PersistenceConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Quality rule thresholds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum average brightness (0-255).
    pub min_brightness: Option<f64>,
    /// Maximum dark-pixel ratio (0.0-1.0).
    pub max_dark_ratio: Option<f64>,
    /// Maximum overexposed-pixel ratio (0.0-1.0).
    pub max_overexposed_ratio: Option<f64>,
    /// Minimum skin-tone ratio (0.0-1.0).
    pub min_skin_tone_ratio: Option<f64>,
}

/// Sampling window settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Window half-size as a fraction of the shorter side.
    pub window_fraction: Option<f64>,
    /// Pixel stride inside the window.
    pub stride: Option<u32>,
}

/// Scan workflow settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Upload size limit in megabytes.
    pub max_upload_mb: Option<u64>,
    /// Minimum time in the analyzing state, in milliseconds.
    pub min_analyzing_ms: Option<u64>,
    /// How long to wait for the quality verdict, in milliseconds.
    pub verdict_timeout_ms: Option<u64>,
    /// "capture" or "preview".
    pub on_submit_failure: Option<String>,
}

/// Inference endpoint settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Prediction URL receiving the multipart upload.
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Campaign backend settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Base URL of the campaign API.
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if let Some(b) = self.quality.min_brightness {
            if !(0.0..=255.0).contains(&b) {
                return Err(format!("quality.min_brightness must be 0-255, got {b}"));
            }
        }
        let ratios = [
            ("quality.max_dark_ratio", self.quality.max_dark_ratio),
            ("quality.max_overexposed_ratio", self.quality.max_overexposed_ratio),
            ("quality.min_skin_tone_ratio", self.quality.min_skin_tone_ratio),
        ];
        for (key, value) in ratios {
            if let Some(r) = value {
                if !(0.0..=1.0).contains(&r) {
                    return Err(format!("{key} must be 0.0-1.0, got {r}"));
                }
            }
        }

        if let Some(f) = self.sampler.window_fraction {
            if !(f > 0.0 && f <= 1.0) {
                return Err(format!("sampler.window_fraction must be in (0.0, 1.0], got {f}"));
            }
        }
        if self.sampler.stride == Some(0) {
            return Err("sampler.stride must be at least 1".to_string());
        }

        if let Some(mb) = self.workflow.max_upload_mb {
            if !(1..=MAX_UPLOAD_MB_LIMIT).contains(&mb) {
                return Err(format!(
                    "workflow.max_upload_mb must be 1-{MAX_UPLOAD_MB_LIMIT}, got {mb}"
                ));
            }
        }

        if let Some(ref p) = self.workflow.on_submit_failure {
            if p != "capture" && p != "preview" {
                return Err(format!(
                    "workflow.on_submit_failure must be 'capture' or 'preview', got '{p}'"
                ));
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        let q = &mut self.quality;
        q.min_brightness = other.quality.min_brightness.or(q.min_brightness);
        q.max_dark_ratio = other.quality.max_dark_ratio.or(q.max_dark_ratio);
        q.max_overexposed_ratio = other
            .quality
            .max_overexposed_ratio
            .or(q.max_overexposed_ratio);
        q.min_skin_tone_ratio = other.quality.min_skin_tone_ratio.or(q.min_skin_tone_ratio);

        self.sampler.window_fraction = other
            .sampler
            .window_fraction
            .or(self.sampler.window_fraction);
        self.sampler.stride = other.sampler.stride.or(self.sampler.stride);

        let w = &mut self.workflow;
        w.max_upload_mb = other.workflow.max_upload_mb.or(w.max_upload_mb);
        w.min_analyzing_ms = other.workflow.min_analyzing_ms.or(w.min_analyzing_ms);
        w.verdict_timeout_ms = other.workflow.verdict_timeout_ms.or(w.verdict_timeout_ms);
        w.on_submit_failure = other
            .workflow
            .on_submit_failure
            .or_else(|| w.on_submit_failure.take());

        self.inference.endpoint = other
            .inference
            .endpoint
            .or_else(|| self.inference.endpoint.take());
        self.inference.timeout_secs = other.inference.timeout_secs.or(self.inference.timeout_secs);

        self.persistence.api_base = other
            .persistence
            .api_base
            .or_else(|| self.persistence.api_base.take());
        self.persistence.timeout_secs = other
            .persistence
            .timeout_secs
            .or(self.persistence.timeout_secs);

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("palm-screen").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.palm-screen.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|path| path.exists())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
