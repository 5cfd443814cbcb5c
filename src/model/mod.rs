//! Region data model.

mod collection;
mod region;

pub use collection::RegionCollection;
pub use region::{BoundingBox, MaskScores, Region, RegionId, SourceAttributes};
