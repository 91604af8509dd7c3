//! Filesystem adapter for loading and selecting images.

use anyhow::{Context, Result};
use palm_screen_core::workflow::SelectedFile;
use palm_screen_core::{ImageBuffer, ImageInfo, ImageSource};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported image extensions and their MIME types.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

const UNKNOWN_MIME: &str = "application/octet-stream";

/// Filesystem image source adapter.
pub struct FsImageSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsImageSource {
    /// Creates a new filesystem image source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all image files from the configured paths.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl ImageSource for FsImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = Result<ImageInfo>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} image files", files.len());

        Box::new(files.into_iter().map(|path| load_image(&path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Returns the MIME type implied by a path's extension.
///
/// Unknown extensions map to `application/octet-stream`, which the
/// workflow rejects as not an image.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(ext) = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
    else {
        return UNKNOWN_MIME;
    };
    IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or(UNKNOWN_MIME, |&(_, mime)| mime)
}

/// Describes a file for [`ScanSession::select_file`](palm_screen_core::ScanSession::select_file)
/// using only its metadata. The contents are read later, after validation.
///
/// # Errors
///
/// Returns an error if the file's metadata cannot be read.
pub fn select_file(path: &Path) -> Result<SelectedFile> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    Ok(SelectedFile::on_disk(
        name,
        mime_for_path(path),
        metadata.len(),
        path,
    ))
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    mime_for_path(path) != UNKNOWN_MIME
}

/// Loads and decodes an image from the filesystem.
fn load_image(path: &Path) -> Result<ImageInfo> {
    let image =
        image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?;

    Ok(ImageInfo::new(
        path.to_string_lossy(),
        ImageBuffer::from_dynamic(&image),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("palm.jpg")));
        assert!(is_supported_image(Path::new("palm.JPEG")));
        assert!(is_supported_image(Path::new("palm.png")));
        assert!(is_supported_image(Path::new("palm.webp")));
        assert!(!is_supported_image(Path::new("palm.cr2")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("palm")));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b/palm.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("palm.tif")), "image/tiff");
        assert_eq!(
            mime_for_path(Path::new("report.pdf")),
            "application/octet-stream"
        );
    }
}
