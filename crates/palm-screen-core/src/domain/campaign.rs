//! Campaign, session and patient types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::InferenceResult;
use crate::error::ValidationError;

/// Opaque campaign identifier.
///
/// Restricted to ASCII alphanumerics, `-` and `_` so it can be placed in a
/// URL path as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCampaignId`] for empty or non
    /// URL-safe identifiers.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(ValidationError::InvalidCampaignId(id))
        }
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated session handed to the workflow by its host.
///
/// The workflow only checks whether a session is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    /// A session backed by an access token. Blank tokens count as absent.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    /// No session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { token: None }
    }

    /// Whether an authenticated session is present.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.token.is_some()
    }

    /// The access token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Gender options offered when saving a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::InvalidGender(s.to_string())),
        }
    }
}

/// Patient details as entered by the operator, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientDetails {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub phone: String,
}

impl PatientDetails {
    /// Validates the form and attaches the campaign and result label.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for blank fields, a non-numeric age or
    /// an unknown gender.
    pub fn into_record(
        self,
        campaign: &CampaignId,
        result: &InferenceResult,
    ) -> Result<PatientRecord, ValidationError> {
        let name = required("name", self.name)?;
        let age_raw = required("age", self.age)?;
        let gender_raw = required("gender", self.gender)?;
        let phone = required("phone", self.phone)?;

        let age = age_raw
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidAge(age_raw.clone()))?;
        let gender = gender_raw.parse()?;

        Ok(PatientRecord {
            campaign_id: campaign.clone(),
            name,
            age,
            gender,
            phone,
            result: result.label().to_string(),
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// A flagged patient, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub campaign_id: CampaignId,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub phone: String,
    /// `"Anemic"` or `"Non-Anemic"`.
    pub result: String,
}
