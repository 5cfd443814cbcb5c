//! Point-to-region lookup.

use std::sync::Arc;

use crate::model::{Region, RegionCollection};

/// Resolve a pixel coordinate to the first region covering it.
///
/// Coordinates outside `[0, width) x [0, height)` (including negative ones
/// from clicks beside the canvas) return `None` rather than an error.
/// Overlaps resolve in collection order: the earliest region wins.
pub fn locate(collection: &RegionCollection, x: i64, y: i64) -> Option<&Arc<Region>> {
    let (width, height) = collection.dimensions();
    if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
        log::trace!("Point ({}, {}) is outside {}x{}", x, y, width, height);
        return None;
    }
    let (x, y) = (x as u32, y as u32);
    collection.iter().find(|region| region.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RasterImage;
    use crate::model::{MaskScores, SourceAttributes};
    use ndarray::{Array2, array};

    fn region(image: &RasterImage, occupancy: Array2<bool>) -> Region {
        let attrs = SourceAttributes::measure(&occupancy, image, MaskScores::default()).unwrap();
        Region::new(occupancy, [0, 0, 0], attrs)
    }

    fn overlapping() -> RegionCollection {
        let image = RasterImage::gray_from_fn(3, 2, |_, _| 0);
        let a = region(&image, array![[true, true, false], [false, false, false]]);
        let b = region(&image, array![[false, true, true], [false, true, false]]);
        RegionCollection::new(3, 2, vec![a, b])
    }

    #[test]
    fn test_first_match_wins() {
        let collection = overlapping();
        assert_eq!(locate(&collection, 1, 0).map(|r| r.id()), Some(0));
        assert_eq!(locate(&collection, 2, 0).map(|r| r.id()), Some(1));
        assert_eq!(locate(&collection, 1, 1).map(|r| r.id()), Some(1));
    }

    #[test]
    fn test_uncovered_pixel() {
        assert!(locate(&overlapping(), 0, 1).is_none());
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let collection = overlapping();
        assert!(locate(&collection, -1, 0).is_none());
        assert!(locate(&collection, 0, -1).is_none());
        assert!(locate(&collection, 3, 0).is_none());
        assert!(locate(&collection, 0, 2).is_none());
        assert!(locate(&collection, i64::MAX, i64::MIN).is_none());
    }

    #[test]
    fn test_deterministic() {
        let collection = overlapping();
        let first = locate(&collection, 1, 0).cloned();
        for _ in 0..10 {
            let again = locate(&collection, 1, 0).cloned();
            assert!(Arc::ptr_eq(first.as_ref().unwrap(), again.as_ref().unwrap()));
        }
    }
}
