//! Region producers: strategies that partition an image into regions.
//!
//! Two strategies share the [`RegionProducer`] interface:
//!
//! - **Threshold**: one region covering every pixel whose luma is at least
//!   the threshold
//! - **Model-based**: wraps an opaque [`SegmentationModel`] that returns
//!   arbitrary, possibly overlapping masks
//!
//! Model-based production can take seconds, so [`ProductionWorker`] runs any
//! producer on a background thread and hands finished collections back over
//! a channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use maskselect::producer::{RegionProducer, ThresholdProducer};
//!
//! let producer = ThresholdProducer::new(128);
//! let collection = producer.produce(&image)?;
//! ```

mod error;
mod model_based;
mod npy_model;
mod threshold;
mod worker;

use crate::data::RasterImage;
use crate::model::RegionCollection;

pub use error::ProductionError;
pub use model_based::{GeneratedMask, ModelProducer, SegmentationModel};
pub use npy_model::NpyMaskModel;
pub use threshold::ThresholdProducer;
pub use worker::{ProductionOutcome, ProductionWorker};

/// Trait for region-producing strategies.
///
/// Implementations must be deterministic for a given image and configuration
/// and must not modify the image.
pub trait RegionProducer: Send + Sync {
    /// Short identifier used in logs (e.g., "threshold", "npy-masks").
    fn id(&self) -> &'static str;

    /// Partition `image` into an ordered region collection.
    fn produce(&self, image: &RasterImage) -> Result<RegionCollection, ProductionError>;
}

/// Reject images with no pixels.
pub(crate) fn ensure_not_empty(image: &RasterImage) -> Result<(), ProductionError> {
    if image.is_empty() {
        return Err(ProductionError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}
