//! Campaign persistence port.

use crate::domain::{CampaignId, PatientRecord};

/// Port for the campaign backend.
pub trait PersistenceService: Send + Sync {
    /// Adds one to the campaign's scanned counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects or cannot receive the update.
    fn increment_scan_count(&self, campaign: &CampaignId) -> anyhow::Result<()>;

    /// Stores a flagged patient.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be stored.
    fn save_patient(&self, record: &PatientRecord) -> anyhow::Result<()>;
}
