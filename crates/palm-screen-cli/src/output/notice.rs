//! Operator notices printed to stderr.

use palm_screen_core::{Notice, NoticeLevel, NoticeSink};
use tracing::debug;

/// Prints each notice on its own line, prefixed by level.
pub struct ConsoleNotices {
    quiet: bool,
}

impl ConsoleNotices {
    /// With `quiet`, only errors are printed.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl NoticeSink for ConsoleNotices {
    fn notify(&self, notice: Notice) {
        debug!(level = %notice.level, "Notice raised");
        if self.quiet && notice.level != NoticeLevel::Error {
            return;
        }
        eprintln!("{}: {}", notice.level, notice.message);
    }
}
