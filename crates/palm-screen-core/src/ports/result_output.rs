//! Result output port for pre-screen results.

use crate::domain::AnalysisResult;

/// Port for writing pre-screen results.
pub trait ResultOutput: Send + Sync {
    /// Writes a single result.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
