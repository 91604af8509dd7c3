//! Integration tests for raster image loading and file selection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};
use palm_screen_adapters::{select_file, FsImageSource};
use palm_screen_core::workflow::FileContents;
use palm_screen_core::{ImageInfo, ImageSource};
use tempfile::TempDir;

fn write_palm(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    let img = RgbaImage::from_pixel(8, 8, Rgba([200, 150, 120, 255]));
    match format {
        // JPEG and BMP encoders take RGB only
        ImageFormat::Jpeg | ImageFormat::Bmp => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .save_with_format(&path, format)
            .unwrap(),
        _ => img.save_with_format(&path, format).unwrap(),
    }
    path
}

fn load_single(path: PathBuf) -> ImageInfo {
    let source = FsImageSource::new(vec![path], false);
    let images: Vec<_> = source.images().collect();
    assert_eq!(images.len(), 1);
    images.into_iter().next().unwrap().expect("should load")
}

#[test]
fn test_load_jpeg() {
    let dir = TempDir::new().unwrap();
    let info = load_single(write_palm(dir.path(), "palm.jpg", ImageFormat::Jpeg));

    assert_eq!(info.buffer.width(), 8);
    assert_eq!(info.buffer.height(), 8);
    assert!(info.path.ends_with("palm.jpg"));
}

#[test]
fn test_load_png_is_lossless() {
    let dir = TempDir::new().unwrap();
    let info = load_single(write_palm(dir.path(), "palm.png", ImageFormat::Png));

    assert_eq!(info.buffer.pixel(3, 3), Some([200, 150, 120, 255]));
    assert!(info.path.ends_with("palm.png"));
}

#[test]
fn test_load_tiff_and_bmp() {
    let dir = TempDir::new().unwrap();
    let tiff = load_single(write_palm(dir.path(), "palm.tiff", ImageFormat::Tiff));
    let bmp = load_single(write_palm(dir.path(), "palm.bmp", ImageFormat::Bmp));

    assert_eq!(tiff.dimensions().width, 8);
    assert_eq!(bmp.buffer.pixel(0, 0), Some([200, 150, 120, 255]));
}

#[test]
fn test_directory_scan_skips_unsupported() {
    let dir = TempDir::new().unwrap();
    write_palm(dir.path(), "a.png", ImageFormat::Png);
    write_palm(dir.path(), "b.jpg", ImageFormat::Jpeg);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    assert_eq!(source.count_hint(), Some(2));

    let paths: Vec<String> = source.images().map(|r| r.unwrap().path).collect();
    assert!(paths[0].ends_with("a.png"));
    assert!(paths[1].ends_with("b.jpg"));
}

#[test]
fn test_recursive_scan() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("day-2");
    std::fs::create_dir(&nested).unwrap();
    write_palm(dir.path(), "a.png", ImageFormat::Png);
    write_palm(&nested, "b.png", ImageFormat::Png);

    let flat = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    let deep = FsImageSource::new(vec![dir.path().to_path_buf()], true);

    assert_eq!(flat.count_hint(), Some(1));
    assert_eq!(deep.count_hint(), Some(2));
}

#[test]
fn test_corrupt_image_yields_error_item() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, [0xFF, 0xD8, 0x00]).unwrap();

    let source = FsImageSource::new(vec![path], false);
    let items: Vec<_> = source.images().collect();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_err());
}

#[test]
fn test_missing_path_is_skipped() {
    let source = FsImageSource::new(vec![PathBuf::from("/nonexistent/palm.jpg")], false);
    assert_eq!(source.images().count(), 0);
}

#[test]
fn test_select_file_reads_metadata_only() {
    let dir = TempDir::new().unwrap();
    let path = write_palm(dir.path(), "palm.png", ImageFormat::Png);
    let size = std::fs::metadata(&path).unwrap().len();

    let selected = select_file(&path).unwrap();
    assert_eq!(selected.name, "palm.png");
    assert_eq!(selected.mime_type, "image/png");
    assert_eq!(selected.size, size);
    assert!(matches!(selected.contents, FileContents::Path(ref p) if p == &path));
}

#[test]
fn test_select_file_unknown_type() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, b"%PDF-1.4").unwrap();

    let selected = select_file(&path).unwrap();
    assert_eq!(selected.mime_type, "application/octet-stream");
    assert!(selected.validate(10 * 1024 * 1024).is_err());
}

#[test]
fn test_select_missing_file_fails() {
    assert!(select_file(Path::new("/nonexistent/palm.jpg")).is_err());
}
