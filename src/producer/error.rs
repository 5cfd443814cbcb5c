//! Error types for region production.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while producing a region collection.
///
/// A failed production never replaces the active collection.
#[derive(Error, Debug)]
pub enum ProductionError {
    /// The input image has no pixels
    #[error("Cannot segment an empty image ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// A mask or auxiliary input does not match the image size
    #[error("Dimension mismatch: image is {image_width}x{image_height}, {what} is {width}x{height}")]
    DimensionMismatch {
        /// What had the wrong size
        what: String,
        /// Image width
        image_width: u32,
        /// Image height
        image_height: u32,
        /// Offending width
        width: usize,
        /// Offending height
        height: usize,
    },

    /// The model artifact could not be loaded
    #[error("Failed to load model artifact {path:?}: {message}")]
    ModelLoad {
        /// Artifact location
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// The model ran but failed
    #[error("Model failure: {0}")]
    Model(String),

    /// The background worker is gone or could not be started
    #[error("Production worker unavailable: {0}")]
    WorkerUnavailable(String),
}

impl ProductionError {
    /// Create a model failure error with a message.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// Create a model load error.
    pub fn model_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error for a `(rows, cols)` grid.
    pub fn dimension_mismatch(
        what: impl Into<String>,
        image: (u32, u32),
        grid_dim: (usize, usize),
    ) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            image_width: image.0,
            image_height: image.1,
            width: grid_dim.1,
            height: grid_dim.0,
        }
    }
}
