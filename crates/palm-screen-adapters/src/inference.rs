//! HTTP client for the anemia inference endpoint.

use std::time::Duration;

use palm_screen_core::error::SubmissionError;
use palm_screen_core::{EncodedImage, InferenceClient, InferenceResult};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use tracing::debug;

use crate::http;

/// Multipart field the endpoint reads the image from.
const IMAGE_FIELD: &str = "image";

/// Posts images as multipart form data and validates the JSON reply.
pub struct HttpInferenceClient {
    endpoint: String,
    client: Client,
}

impl HttpInferenceClient {
    /// Creates a client for `endpoint`, e.g. `http://localhost:5000/predict`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: http::client(timeout)?,
        })
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InferenceClient for HttpInferenceClient {
    fn submit(&self, image: &EncodedImage) -> Result<InferenceResult, SubmissionError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| SubmissionError::Request(e.to_string()))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        debug!(endpoint = %self.endpoint, bytes = image.len(), "POST inference");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = http::error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(SubmissionError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let value = serde_json::from_str(&body)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;
        InferenceResult::from_json(value)
    }
}
