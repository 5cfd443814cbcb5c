//! Error types for selection export.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting the selection.
///
/// A failed export never leaves a partially written file behind.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The selection is empty
    #[error("Nothing selected")]
    NothingSelected,

    /// I/O error while writing the output
    #[error("IO error writing {path:?}: {source}")]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Raster encoding failed
    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    /// XML serialization failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Selected regions disagree on their dimensions
    #[error("Selected regions have mismatched dimensions: {expected:?} vs {found:?}")]
    DimensionMismatch {
        /// Dimensions of the first selected region
        expected: (u32, u32),
        /// Dimensions of the offending region
        found: (u32, u32),
    },
}
