//! The set of regions the user has picked.

use std::sync::Arc;

use crate::model::{Region, RegionCollection};
use crate::selection::locator::locate;

/// Selected regions of one [`RegionCollection`], in the order they were picked.
///
/// A selection is bound to the collection it was created for and only ever
/// holds identities of that collection's regions. When the collection is
/// replaced, the selection is dropped with it and a fresh one is created.
#[derive(Debug, Clone)]
pub struct SelectionSet {
    collection: Arc<RegionCollection>,
    members: Vec<Arc<Region>>,
}

impl SelectionSet {
    /// Create an empty selection over `collection`.
    pub fn new(collection: Arc<RegionCollection>) -> Self {
        Self {
            collection,
            members: Vec::new(),
        }
    }

    /// The collection this selection draws from.
    pub fn collection(&self) -> &Arc<RegionCollection> {
        &self.collection
    }

    /// Select the region under `(x, y)`.
    ///
    /// Returns the region found there, or `None` for uncovered or
    /// out-of-bounds points. Picking an already-selected region is a no-op
    /// (it is not deselected).
    pub fn toggle_at(&mut self, x: i64, y: i64) -> Option<Arc<Region>> {
        let region = locate(&self.collection, x, y)?.clone();
        if self.select(&region) {
            log::debug!("Selected region {} at ({}, {})", region.id(), x, y);
        } else {
            log::debug!("Region {} at ({}, {}) already selected", region.id(), x, y);
        }
        Some(region)
    }

    /// Add `region` to the selection.
    ///
    /// Returns `true` if the selection changed. Regions from another
    /// collection are refused.
    pub fn select(&mut self, region: &Arc<Region>) -> bool {
        if !self.collection.contains(region) {
            log::warn!(
                "Refusing to select region {} from a different collection",
                region.id()
            );
            return false;
        }
        if self.contains(region) {
            return false;
        }
        self.members.push(Arc::clone(region));
        true
    }

    /// Remove every region from the selection.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Whether `region` is selected (identity comparison).
    pub fn contains(&self, region: &Arc<Region>) -> bool {
        self.members.iter().any(|m| Arc::ptr_eq(m, region))
    }

    /// Number of selected regions.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate selected regions in pick order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.members.iter()
    }

    /// Immutable copy of the member list for readers on other threads.
    pub fn snapshot(&self) -> Vec<Arc<Region>> {
        self.members.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RasterImage;
    use crate::model::{MaskScores, SourceAttributes};
    use ndarray::{Array2, array};

    fn region(image: &RasterImage, occupancy: Array2<bool>) -> Region {
        let attrs = SourceAttributes::measure(&occupancy, image, MaskScores::default()).unwrap();
        Region::new(occupancy, [10, 20, 30], attrs)
    }

    fn collection() -> Arc<RegionCollection> {
        let image = RasterImage::gray_from_fn(2, 2, |_, _| 0);
        let left = region(&image, array![[true, false], [true, false]]);
        let right = region(&image, array![[false, true], [false, true]]);
        Arc::new(RegionCollection::new(2, 2, vec![left, right]))
    }

    #[test]
    fn test_toggle_appends_in_pick_order() {
        let mut selection = SelectionSet::new(collection());
        selection.toggle_at(1, 0);
        selection.toggle_at(0, 1);
        let ids: Vec<_> = selection.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![1, 0]);
    }

    #[test]
    fn test_toggle_twice_is_noop() {
        let mut selection = SelectionSet::new(collection());
        let first = selection.toggle_at(0, 0).unwrap();
        let second = selection.toggle_at(0, 1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(selection.len(), 1);

        // Re-picking an earlier region keeps both length and pick order.
        selection.toggle_at(1, 0).unwrap();
        selection.toggle_at(0, 0).unwrap();
        selection.toggle_at(0, 1).unwrap();
        let ids: Vec<_> = selection.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_toggle_out_of_bounds() {
        let mut selection = SelectionSet::new(collection());
        assert!(selection.toggle_at(5, 0).is_none());
        assert!(selection.toggle_at(-1, -1).is_none());
        assert!(selection.is_empty());
    }

    #[test]
    fn test_clear_keeps_collection() {
        let collection = collection();
        let mut selection = SelectionSet::new(collection.clone());
        selection.toggle_at(0, 0);
        selection.toggle_at(1, 1);
        selection.clear();
        assert!(selection.is_empty());
        assert!(Arc::ptr_eq(selection.collection(), &collection));
        assert_eq!(selection.collection().len(), 2);
    }

    #[test]
    fn test_rejects_foreign_region() {
        let mut selection = SelectionSet::new(collection());
        let other = collection();
        assert!(!selection.select(other.get(0).unwrap()));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut selection = SelectionSet::new(collection());
        selection.toggle_at(0, 0);
        let snapshot = selection.snapshot();
        selection.clear();
        assert_eq!(snapshot.len(), 1);
    }
}
