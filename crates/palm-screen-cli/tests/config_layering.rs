//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use palm_screen_test_support::SyntheticImageBuilder;
use predicates::prelude::*;
use tempfile::TempDir;

/// Working directory, XDG root and one gray image (fails only the palm rule).
struct Workspace {
    dir: TempDir,
    image: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("gray.png");
        let bytes = SyntheticImageBuilder::png_bytes(&SyntheticImageBuilder::mid_gray(96, 96));
        fs::write(&image, bytes.unwrap()).unwrap();
        fs::create_dir_all(dir.path().join("xdg/palm-screen")).unwrap();
        Self { dir, image }
    }

    fn project_config(&self, toml: &str) {
        fs::write(self.dir.path().join(".palm-screen.toml"), toml).unwrap();
    }

    fn xdg_config(&self, toml: &str) {
        fs::write(self.dir.path().join("xdg/palm-screen/config.toml"), toml).unwrap();
    }

    fn command_in(&self, cwd: &Path) -> Command {
        let mut cmd = Command::cargo_bin("palm-screen").unwrap();
        cmd.current_dir(cwd)
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"));
        cmd
    }

    fn command(&self) -> Command {
        self.command_in(self.dir.path())
    }
}

#[test]
fn test_defaults_without_config() {
    let ws = Workspace::new();
    ws.command()
        .arg(&ws.image)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_applies_format() {
    let ws = Workspace::new();
    ws.project_config(
        r"
[output]
format = 'json'
",
    );

    ws.command()
        .arg(&ws.image)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let ws = Workspace::new();
    ws.project_config(
        r"
[output]
format = 'json'
",
    );

    ws.command()
        .args(["--format", "jsonl"])
        .arg(&ws.image)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_thresholds() {
    let ws = Workspace::new();
    ws.project_config(
        r"
[quality]
min_skin_tone_ratio = 0.0
",
    );

    ws.command().arg(&ws.image).assert().code(0);

    // CLI flag beats the project file
    ws.command()
        .args(["--min-skin-tone-ratio", "0.5"])
        .arg(&ws.image)
        .assert()
        .code(1);
}

#[test]
fn test_project_config_found_in_parent() {
    let ws = Workspace::new();
    ws.project_config(
        r"
[quality]
min_skin_tone_ratio = 0.0
",
    );
    let nested = ws.dir.path().join("campaign/day-1");
    fs::create_dir_all(&nested).unwrap();

    ws.command_in(&nested).arg(&ws.image).assert().code(0);
}

#[cfg(target_os = "linux")]
#[test]
fn test_xdg_config_applies() {
    let ws = Workspace::new();
    ws.xdg_config(
        r"
[output]
format = 'json'
",
    );

    ws.command()
        .arg(&ws.image)
        .assert()
        .stdout(predicate::str::starts_with("["));
}

#[cfg(target_os = "linux")]
#[test]
fn test_project_config_beats_xdg() {
    let ws = Workspace::new();
    ws.xdg_config(
        r"
[quality]
min_skin_tone_ratio = 0.0

[output]
format = 'json'
",
    );
    ws.project_config(
        r"
[quality]
min_skin_tone_ratio = 0.5
",
    );

    // Threshold from the project file, format still from XDG
    ws.command()
        .arg(&ws.image)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_out_of_range_value_warns() {
    let ws = Workspace::new();
    ws.project_config(
        r"
[quality]
max_dark_ratio = 2.0
",
    );

    ws.command()
        .arg(&ws.image)
        .assert()
        .stderr(predicate::str::contains(
            "warning: quality.max_dark_ratio must be 0.0-1.0",
        ));
}

#[test]
fn test_malformed_config_is_ignored() {
    let ws = Workspace::new();
    ws.project_config("[output\nformat = 'json'");

    ws.command()
        .arg(&ws.image)
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("{"))
        .stderr(predicate::str::contains("Failed to parse config file"));
}
