//! HTTP client for the campaign backend.

use std::time::Duration;

use anyhow::{bail, Context};
use palm_screen_core::{CampaignId, PatientRecord, PersistenceService, Session};
use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::http;

/// Talks to the campaign REST routes:
/// `PUT {base}/api/campaigns/{id}/stats` and `POST {base}/api/patients`.
pub struct HttpPersistence {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpPersistence {
    /// Creates a client for `base_url`, authenticating with the session's
    /// bearer token when one is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        session: &Session,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            token: session.token().map(str::to_string),
            client: http::client(timeout)?,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn check(response: Response, what: &str) -> anyhow::Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().unwrap_or_default();
    match http::error_message(&body) {
        Some(message) => bail!("{what} failed with {status}: {message}"),
        None => bail!("{what} failed with {status}"),
    }
}

impl PersistenceService for HttpPersistence {
    fn increment_scan_count(&self, campaign: &CampaignId) -> anyhow::Result<()> {
        let url = http::join(
            &self.base_url,
            &format!("api/campaigns/{}/stats", campaign.as_str()),
        );
        debug!(%url, "PUT scan count");
        let response = self
            .authorized(self.client.put(&url))
            .send()
            .with_context(|| format!("Failed to reach {url}"))?;
        check(response, "Scan count update")
    }

    fn save_patient(&self, record: &PatientRecord) -> anyhow::Result<()> {
        let url = http::join(&self.base_url, "api/patients");
        debug!(%url, campaign = %record.campaign_id, "POST patient");
        let response = self
            .authorized(self.client.post(&url))
            .json(record)
            .send()
            .with_context(|| format!("Failed to reach {url}"))?;
        check(response, "Saving patient")
    }
}
