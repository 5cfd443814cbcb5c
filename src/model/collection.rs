//! Ordered, immutable collections of regions.

use std::sync::Arc;

use crate::model::region::{Region, RegionId};

/// All regions produced from one image in one production pass.
///
/// Order is significant: point lookup returns the first region that covers a
/// pixel and compositing paints in this order. Regions are shared behind
/// `Arc` so selections can hold identities without copying grids.
#[derive(Debug, Clone, Default)]
pub struct RegionCollection {
    width: u32,
    height: u32,
    regions: Vec<Arc<Region>>,
}

impl RegionCollection {
    /// Build a collection, assigning each region its index as id.
    ///
    /// Every region's grid must be `width` x `height`; producers check this
    /// before building, and debug builds assert it here.
    pub fn new(width: u32, height: u32, regions: Vec<Region>) -> Self {
        debug_assert!(
            regions
                .iter()
                .all(|r| (r.width(), r.height()) == (width, height)),
            "region grid does not match the {}x{} collection",
            width,
            height
        );
        let regions = regions
            .into_iter()
            .enumerate()
            .map(|(id, mut region)| {
                region.set_id(id);
                Arc::new(region)
            })
            .collect();
        Self {
            width,
            height,
            regions,
        }
    }

    /// A collection with no regions for an image of the given size.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(width, height, Vec::new())
    }

    /// `(width, height)` of the source image.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the collection holds no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate regions in production order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.regions.iter()
    }

    /// Get a region by id.
    pub fn get(&self, id: RegionId) -> Option<&Arc<Region>> {
        self.regions.get(id)
    }

    /// Whether `region` is one of this collection's regions (identity, not equality).
    pub fn contains(&self, region: &Arc<Region>) -> bool {
        self.regions.iter().any(|r| Arc::ptr_eq(r, region))
    }
}
