//! Image source: turns files or raw bytes into [`RasterImage`]s.
//!
//! Format detection tries the filename extension first and falls back to
//! magic bytes, so files with a missing or wrong extension still load.

use std::path::Path;

use image::ImageFormat;

use crate::data::error::ImageLoadError;
use crate::data::raster::RasterImage;

/// File extensions accepted by the image source (lowercase, without dots).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Check whether a filename has a supported image extension.
pub fn is_image_filename(filename: &str) -> bool {
    format_from_extension(filename).is_some()
}

/// Load an image file from disk.
pub fn load_image(path: &Path) -> Result<RasterImage, ImageLoadError> {
    let data = std::fs::read(path).map_err(|source| ImageLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path.file_name().and_then(|n| n.to_str());
    let image = load_image_from_bytes(&data, filename)?;
    log::info!(
        "Loaded {:?}: {}x{} ({} channel(s))",
        path,
        image.width(),
        image.height(),
        image.channels()
    );
    Ok(image)
}

/// Decode an image from raw bytes.
///
/// `filename` is only used as a format hint.
pub fn load_image_from_bytes(
    data: &[u8],
    filename: Option<&str>,
) -> Result<RasterImage, ImageLoadError> {
    let format = filename
        .and_then(format_from_extension)
        .or_else(|| detect_format(data))
        .ok_or_else(|| ImageLoadError::UnsupportedFormat {
            filename: filename.map(str::to_string),
        })?;

    let decoded = match image::load_from_memory_with_format(data, format) {
        Ok(img) => img,
        Err(e) => {
            // Extension lied; give magic-byte detection one more chance.
            match detect_format(data) {
                Some(detected) if detected != format => {
                    log::debug!(
                        "Decoding as {:?} failed ({}), retrying as {:?}",
                        format,
                        e,
                        detected
                    );
                    image::load_from_memory_with_format(data, detected)?
                }
                _ => return Err(e.into()),
            }
        }
    };

    let raster = RasterImage::from(decoded);
    if raster.is_empty() {
        return Err(ImageLoadError::Empty {
            width: raster.width(),
            height: raster.height(),
        });
    }
    Ok(raster)
}

/// Map a filename's extension to an image format.
fn format_from_extension(filename: &str) -> Option<ImageFormat> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "bmp" => Some(ImageFormat::Bmp),
        "tiff" | "tif" => Some(ImageFormat::Tiff),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Identify a format by its magic bytes.
fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    if data.len() < 8 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageFormat::Png);
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }

    // BMP: 42 4D (BM)
    if data.starts_with(&[0x42, 0x4D]) {
        return Some(ImageFormat::Bmp);
    }

    // TIFF: 49 49 2A 00 (little endian) or 4D 4D 00 2A (big endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some(ImageFormat::Tiff);
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(&[0x52, 0x49, 0x46, 0x46]) && &data[8..12] == b"WEBP" {
        return Some(ImageFormat::WebP);
    }

    None
}
