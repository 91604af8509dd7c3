//! Output formatting for CLI.

mod json;
mod notice;
mod progress;

pub use json::JsonOutput;
pub use notice::ConsoleNotices;
pub use progress::ProgressBar;
