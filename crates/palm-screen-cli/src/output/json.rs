//! JSON output adapter.

use anyhow::Result;
use palm_screen_core::{AnalysisResult, ResultOutput};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON Lines output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Creates a new JSON output writing to the given writer.
    #[cfg_attr(not(test), allow(dead_code))]
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes any serializable value as a single document.
    pub fn write_value<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        self.write_line(&json)
    }

    /// Writes a batch of results as a JSON array.
    pub fn write_array(&self, results: &[AnalysisResult], pretty: bool) -> Result<()> {
        self.write_value(results, pretty)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, result: &AnalysisResult) -> Result<()> {
        let json = serde_json::to_string(result)?;
        self.write_line(&json)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared buffer so tests can read back what was written.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_write_value_compact_and_pretty() {
        let captured = Captured::default();
        let output = JsonOutput::new(Box::new(captured.clone()));

        output
            .write_value(&serde_json::json!({"state": "results"}), false)
            .unwrap();
        output
            .write_value(&serde_json::json!({"state": "capture"}), true)
            .unwrap();

        let text = captured.text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(r#"{"state":"results"}"#));
        assert_eq!(lines.next(), Some("{"));
    }

    #[test]
    fn test_empty_array() {
        let captured = Captured::default();
        let output = JsonOutput::new(Box::new(captured.clone()));

        output.write_array(&[], false).unwrap();
        assert_eq!(captured.text(), "[]\n");
    }
}
