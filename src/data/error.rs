//! Error types for image loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning a file into a [`RasterImage`](super::RasterImage).
#[derive(Error, Debug)]
pub enum ImageLoadError {
    /// I/O error while reading the file
    #[error("IO error reading {path:?}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The codec rejected the bytes
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Neither the extension nor the magic bytes identify a supported format
    #[error("Unsupported image format (file: {filename:?})")]
    UnsupportedFormat {
        /// Filename hint, if one was provided
        filename: Option<String>,
    },

    /// The decoded image has zero width or height
    #[error("Image is empty ({width}x{height})")]
    Empty {
        /// Decoded width
        width: u32,
        /// Decoded height
        height: u32,
    },
}
