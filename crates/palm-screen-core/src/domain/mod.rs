//! Core domain types for palm pre-screening and screening campaigns.

mod campaign;
mod image;
mod inference;
mod result;
mod verdict;

pub use campaign::{CampaignId, Gender, PatientDetails, PatientRecord, Session};
pub use self::image::{EncodedImage, ImageBuffer};
pub use inference::InferenceResult;
pub use result::{AnalysisResult, ImageDimensions, ImageInfo};
pub use verdict::{QualityIssue, QualityVerdict, SampleStatistics, VerdictStatus, LOOKS_GOOD};
