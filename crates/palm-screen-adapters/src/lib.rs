//! Palm Screen Adapters - External adapters for palm-screen.
//!
//! This crate provides adapters for:
//! - Filesystem image source and file selection
//! - HTTP inference submission
//! - HTTP campaign persistence
//! - Snapshot-file camera

pub mod camera;
pub mod fs;
mod http;
pub mod inference;
pub mod persistence;

pub use camera::SnapshotCamera;
pub use fs::{mime_for_path, select_file, FsImageSource};
pub use inference::HttpInferenceClient;
pub use persistence::HttpPersistence;
