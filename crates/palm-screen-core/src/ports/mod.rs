//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod camera;
mod image_source;
mod inference;
mod notice;
mod persistence;
mod progress;
mod result_output;

pub use camera::{CameraDevice, VideoStream};
pub use image_source::ImageSource;
pub use inference::InferenceClient;
pub use notice::{Notice, NoticeLevel, NoticeSink};
pub use persistence::PersistenceService;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
