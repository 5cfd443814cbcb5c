//! Model-based producer wrapping an opaque segmentation model.

use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::color_utils::random_color;
use crate::constants::DEFAULT_COLOR_SEED;
use crate::data::RasterImage;
use crate::model::{MaskScores, Region, RegionCollection, SourceAttributes};
use crate::producer::{ProductionError, RegionProducer, ensure_not_empty};

/// One mask returned by a segmentation model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMask {
    /// Occupancy grid indexed `[[y, x]]`.
    pub segmentation: Array2<bool>,
    /// Optional quality scores.
    pub scores: MaskScores,
}

impl GeneratedMask {
    /// Create a mask without scores.
    pub fn new(segmentation: Array2<bool>) -> Self {
        Self {
            segmentation,
            scores: MaskScores::default(),
        }
    }
}

/// An automatic mask generator.
///
/// Instances are constructed explicitly (loading any heavyweight artifact in
/// their constructor) and injected into a [`ModelProducer`]; nothing about a
/// model is process-global.
pub trait SegmentationModel: Send + Sync {
    /// Human-readable model name for logs.
    fn name(&self) -> &str;

    /// Generate masks for `image`. Masks may overlap and need not cover it.
    fn generate(&self, image: &RasterImage) -> Result<Vec<GeneratedMask>, ProductionError>;
}

/// Wraps each generated mask into a region with a freshly drawn display color.
///
/// Colors come from a seeded generator, so the same model and image always
/// give the same colors; they are fixed at production time and never
/// resampled during rendering.
pub struct ModelProducer<M> {
    model: M,
    color_seed: u64,
}

impl<M: SegmentationModel> ModelProducer<M> {
    /// Create a producer around an already-loaded model.
    pub fn new(model: M) -> Self {
        Self {
            model,
            color_seed: DEFAULT_COLOR_SEED,
        }
    }

    /// Set the seed used for display colors.
    pub fn with_color_seed(mut self, seed: u64) -> Self {
        self.color_seed = seed;
        self
    }

    /// The wrapped model.
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: SegmentationModel> RegionProducer for ModelProducer<M> {
    fn id(&self) -> &'static str {
        "model"
    }

    fn produce(&self, image: &RasterImage) -> Result<RegionCollection, ProductionError> {
        ensure_not_empty(image)?;
        let (width, height) = image.dimensions();

        let started = web_time::Instant::now();
        let masks = self.model.generate(image)?;
        log::debug!(
            "{} generated {} masks in {:?}",
            self.model.name(),
            masks.len(),
            started.elapsed()
        );

        let mut rng = StdRng::seed_from_u64(self.color_seed);
        let mut regions = Vec::with_capacity(masks.len());
        for (index, mask) in masks.into_iter().enumerate() {
            let (rows, cols) = mask.segmentation.dim();
            if (cols, rows) != (width as usize, height as usize) {
                return Err(ProductionError::dimension_mismatch(
                    format!("mask {}", index),
                    (width, height),
                    (rows, cols),
                ));
            }

            // Draw a color even for skipped masks so colors stay tied to model order.
            let color = random_color(&mut rng);
            match SourceAttributes::measure(&mask.segmentation, image, mask.scores) {
                Some(attributes) => regions.push(Region::new(mask.segmentation, color, attributes)),
                None => log::debug!("Skipping empty mask {}", index),
            }
        }

        log::info!(
            "Produced {} regions for {}x{} image with {}",
            regions.len(),
            width,
            height,
            self.model.name()
        );
        Ok(RegionCollection::new(width, height, regions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Model that returns a fixed set of masks.
    struct FixedModel(Vec<Array2<bool>>);

    impl SegmentationModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, _image: &RasterImage) -> Result<Vec<GeneratedMask>, ProductionError> {
            Ok(self.0.iter().cloned().map(GeneratedMask::new).collect())
        }
    }

    struct FailingModel;

    impl SegmentationModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate(&self, _image: &RasterImage) -> Result<Vec<GeneratedMask>, ProductionError> {
            Err(ProductionError::model("out of memory"))
        }
    }

    fn image() -> RasterImage {
        RasterImage::rgb_from_fn(3, 2, |x, y| [x as u8 * 50, y as u8 * 50, 0])
    }

    #[test]
    fn test_preserves_model_order_and_overlap() {
        let big = array![[true, true, true], [true, true, true]];
        let small = array![[false, true, false], [false, false, false]];
        let producer = ModelProducer::new(FixedModel(vec![big, small]));
        let collection = producer.produce(&image()).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(0).unwrap().area(), 6);
        assert_eq!(collection.get(1).unwrap().area(), 1);
        for region in collection.iter() {
            assert_eq!((region.width(), region.height()), (3, 2));
        }
    }

    #[test]
    fn test_empty_masks_dropped() {
        let empty = Array2::from_elem((2, 3), false);
        let one = array![[true, false, false], [false, false, false]];
        let producer = ModelProducer::new(FixedModel(vec![empty, one]));
        let collection = producer.produce(&image()).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(0).unwrap().id(), 0);
    }

    #[test]
    fn test_colors_fixed_by_seed() {
        let masks = vec![
            array![[true, false, false], [false, false, false]],
            array![[false, false, true], [false, false, false]],
        ];
        let a = ModelProducer::new(FixedModel(masks.clone()))
            .with_color_seed(3)
            .produce(&image())
            .unwrap();
        let b = ModelProducer::new(FixedModel(masks))
            .with_color_seed(3)
            .produce(&image())
            .unwrap();
        let colors_a: Vec<_> = a.iter().map(|r| r.display_color()).collect();
        let colors_b: Vec<_> = b.iter().map(|r| r.display_color()).collect();
        assert_eq!(colors_a, colors_b);
    }

    #[test]
    fn test_mismatched_mask_rejected() {
        let wrong = Array2::from_elem((3, 3), true);
        let producer = ModelProducer::new(FixedModel(vec![wrong]));
        let result = producer.produce(&image());
        assert!(matches!(
            result,
            Err(ProductionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_model_error_propagates() {
        let result = ModelProducer::new(FailingModel).produce(&image());
        assert!(matches!(result, Err(ProductionError::Model(_))));
    }
}
