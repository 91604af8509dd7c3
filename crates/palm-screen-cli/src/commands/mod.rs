//! CLI command definitions and handlers.

pub mod check;
pub mod quality;
pub mod scan;

use clap::{Parser, Subcommand};

/// Palm Screen - palm photo pre-screening for anemia campaigns
#[derive(Parser)]
#[command(name = "palm-screen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared check arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub check: check::CheckArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Pre-screen palm photos for capture quality
    Check(check::CheckArgs),
    /// Run one palm through capture, analysis and patient saving
    Scan(scan::ScanArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything passed.
    Success = 0,
    /// At least one image failed the pre-screen.
    IssuesFound = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
