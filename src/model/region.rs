//! Region (mask) data structures.

use ndarray::Array2;

use crate::data::RasterImage;

/// Index of a region within its collection.
pub type RegionId = usize;

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Quality scores reported by a segmentation model for one mask.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaskScores {
    /// Model's own estimate of mask quality
    pub predicted_iou: Option<f32>,
    /// Stability of the mask under threshold perturbation
    pub stability_score: Option<f32>,
}

/// Metadata a producer attaches to a region.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttributes {
    /// Number of occupied pixels.
    pub area: usize,
    /// `area` divided by the image's pixel count.
    pub relative_area: f32,
    /// Tight bounding box around the occupied pixels.
    pub bbox: BoundingBox,
    /// Occupied pixel closest to the centroid.
    pub reference_point: (u32, u32),
    /// Source image color at `reference_point`.
    pub sample_color: [u8; 3],
    /// Scores from the producing model, if any.
    pub scores: MaskScores,
}

impl SourceAttributes {
    /// Measure an occupancy grid against the image it was produced from.
    ///
    /// Returns `None` if the grid is empty or its shape differs from the image.
    pub fn measure(
        occupancy: &Array2<bool>,
        image: &RasterImage,
        scores: MaskScores,
    ) -> Option<Self> {
        let (rows, cols) = occupancy.dim();
        if (cols, rows) != (image.width() as usize, image.height() as usize) {
            return None;
        }

        let mut area = 0usize;
        let (mut sum_x, mut sum_y) = (0f64, 0f64);
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        for ((y, x), _) in occupancy.indexed_iter().filter(|(_, occupied)| **occupied) {
            area += 1;
            sum_x += x as f64;
            sum_y += y as f64;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if area == 0 {
            return None;
        }

        let (cx, cy) = (sum_x / area as f64, sum_y / area as f64);
        let mut best = (0usize, 0usize);
        let mut best_dist = f64::INFINITY;
        for ((y, x), _) in occupancy.indexed_iter().filter(|(_, occupied)| **occupied) {
            let dist = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
            // Strict comparison keeps the first pixel in row-major order on ties.
            if dist < best_dist {
                best_dist = dist;
                best = (x, y);
            }
        }

        let reference_point = (best.0 as u32, best.1 as u32);
        let sample_color = image
            .pixel(reference_point.0, reference_point.1)
            .map(|p| p.to_rgb())
            .unwrap_or_default();

        Some(Self {
            area,
            relative_area: area as f32 / (rows * cols) as f32,
            bbox: BoundingBox {
                x: min_x as u32,
                y: min_y as u32,
                width: (max_x - min_x + 1) as u32,
                height: (max_y - min_y + 1) as u32,
            },
            reference_point,
            sample_color,
            scores,
        })
    }
}

/// One selectable area of an image.
///
/// The occupancy grid is indexed `[[y, x]]` and always has the dimensions of
/// the image it was produced from; it is never resized after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    occupancy: Array2<bool>,
    display_color: [u8; 3],
    attributes: SourceAttributes,
}

impl Region {
    /// Create a region. The id is assigned when it joins a collection.
    pub fn new(
        occupancy: Array2<bool>,
        display_color: [u8; 3],
        attributes: SourceAttributes,
    ) -> Self {
        Self {
            id: 0,
            occupancy,
            display_color,
            attributes,
        }
    }

    pub(crate) fn set_id(&mut self, id: RegionId) {
        self.id = id;
    }

    /// Position of this region in its collection.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Boolean occupancy grid, indexed `[[y, x]]`.
    pub fn occupancy(&self) -> &Array2<bool> {
        &self.occupancy
    }

    /// Color used for visualization.
    pub fn display_color(&self) -> [u8; 3] {
        self.display_color
    }

    /// Producer metadata.
    pub fn attributes(&self) -> &SourceAttributes {
        &self.attributes
    }

    /// Width of the occupancy grid in pixels.
    pub fn width(&self) -> u32 {
        self.occupancy.ncols() as u32
    }

    /// Height of the occupancy grid in pixels.
    pub fn height(&self) -> u32 {
        self.occupancy.nrows() as u32
    }

    /// Number of occupied pixels.
    pub fn area(&self) -> usize {
        self.attributes.area
    }

    /// Whether `(x, y)` is inside the grid and occupied.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.occupancy
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_measure_small_blob() {
        let image = RasterImage::rgb_from_fn(4, 3, |x, y| [x as u8, y as u8, 9]);
        let occupancy = array![
            [false, false, false, false],
            [false, true, true, true],
            [false, false, true, false],
        ];
        let attrs = SourceAttributes::measure(&occupancy, &image, MaskScores::default()).unwrap();

        assert_eq!(attrs.area, 4);
        assert!((attrs.relative_area - 4.0 / 12.0).abs() < 1e-6);
        assert_eq!(
            attrs.bbox,
            BoundingBox {
                x: 1,
                y: 1,
                width: 3,
                height: 2
            }
        );
        // Centroid is (2, 1.25); the closest occupied pixel is (2, 1).
        assert_eq!(attrs.reference_point, (2, 1));
        assert_eq!(attrs.sample_color, [2, 1, 9]);
    }

    #[test]
    fn test_measure_rejects_empty_and_mismatched() {
        let image = RasterImage::gray_from_fn(2, 2, |_, _| 0);
        let empty = Array2::from_elem((2, 2), false);
        assert!(SourceAttributes::measure(&empty, &image, MaskScores::default()).is_none());

        let wrong = Array2::from_elem((3, 2), true);
        assert!(SourceAttributes::measure(&wrong, &image, MaskScores::default()).is_none());
    }

    #[test]
    fn test_contains_is_bounds_checked() {
        let image = RasterImage::gray_from_fn(2, 2, |_, _| 50);
        let occupancy = array![[true, false], [false, false]];
        let attrs = SourceAttributes::measure(&occupancy, &image, MaskScores::default()).unwrap();
        let region = Region::new(occupancy, [1, 2, 3], attrs);

        assert!(region.contains(0, 0));
        assert!(!region.contains(1, 0));
        assert!(!region.contains(5, 5));
        assert_eq!((region.width(), region.height()), (2, 2));
    }
}
