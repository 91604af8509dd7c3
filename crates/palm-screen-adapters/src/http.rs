//! Shared HTTP helpers.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Builds a blocking client with a request timeout.
pub(crate) fn client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Extracts the `error` field from a JSON failure body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.is_empty())
}

/// Joins a base URL and a path without doubling slashes.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error": "No image file provided"}"#),
            Some("No image file provided".to_string())
        );
        assert_eq!(
            error_message(r#"{"success": false, "error": "Campaign not found"}"#),
            Some("Campaign not found".to_string())
        );
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"error": ""}"#), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(
            join("http://host:3000/", "/api/patients"),
            "http://host:3000/api/patients"
        );
        assert_eq!(join("http://host", "api/x"), "http://host/api/x");
    }
}
