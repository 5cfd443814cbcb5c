//! Raster union export: the OR of all selected occupancy grids as a 0/255 mask.

use std::io::Cursor;
use std::sync::Arc;

use image::{GrayImage, ImageFormat, Luma};

use crate::constants::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::export::ExportError;
use crate::model::Region;

/// Combine the selected regions into one binary mask.
pub fn union_mask(selection: &[Arc<Region>]) -> Result<GrayImage, ExportError> {
    let first = selection.first().ok_or(ExportError::NothingSelected)?;
    let (width, height) = (first.width(), first.height());

    let mut mask = GrayImage::from_pixel(width, height, Luma([MASK_BACKGROUND]));
    for region in selection {
        if (region.width(), region.height()) != (width, height) {
            return Err(ExportError::DimensionMismatch {
                expected: (width, height),
                found: (region.width(), region.height()),
            });
        }
        for ((y, x), _) in region
            .occupancy()
            .indexed_iter()
            .filter(|(_, occupied)| **occupied)
        {
            mask.put_pixel(x as u32, y as u32, Luma([MASK_FOREGROUND]));
        }
    }
    Ok(mask)
}

/// Encode a mask as PNG bytes.
pub fn encode_png(mask: &GrayImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    mask.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RasterImage;
    use crate::model::{MaskScores, RegionCollection, SourceAttributes};
    use ndarray::{Array2, array};

    fn collection(masks: Vec<Array2<bool>>) -> RegionCollection {
        let image = RasterImage::gray_from_fn(3, 2, |_, _| 0);
        let regions = masks
            .into_iter()
            .map(|m| {
                let attrs = SourceAttributes::measure(&m, &image, MaskScores::default()).unwrap();
                Region::new(m, [0, 0, 0], attrs)
            })
            .collect();
        RegionCollection::new(3, 2, regions)
    }

    #[test]
    fn test_union_of_two_regions() {
        let a = array![[true, false, false], [false, false, false]];
        let b = array![[false, false, false], [false, true, true]];
        let collection = collection(vec![a.clone(), b.clone()]);
        let selection: Vec<_> = collection.iter().cloned().collect();

        let mask = union_mask(&selection).unwrap();
        for y in 0..2usize {
            for x in 0..3usize {
                let expected = if a[[y, x]] || b[[y, x]] { 255 } else { 0 };
                assert_eq!(mask.get_pixel(x as u32, y as u32)[0], expected);
            }
        }
    }

    #[test]
    fn test_empty_selection_fails() {
        assert!(matches!(union_mask(&[]), Err(ExportError::NothingSelected)));
    }

    #[test]
    fn test_png_encoding_is_deterministic_and_decodes() {
        let collection = collection(vec![array![[true, true, false], [false, true, false]]]);
        let selection: Vec<_> = collection.iter().cloned().collect();
        let mask = union_mask(&selection).unwrap();

        let first = encode_png(&mask).unwrap();
        let second = encode_png(&union_mask(&selection).unwrap()).unwrap();
        assert_eq!(first, second);

        let decoded = image::load_from_memory(&first).unwrap().into_luma8();
        assert_eq!(decoded, mask);
    }
}
