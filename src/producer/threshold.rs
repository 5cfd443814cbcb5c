//! Binary threshold producer.

use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::color_utils::random_color;
use crate::constants::{DEFAULT_COLOR_SEED, DEFAULT_THRESHOLD};
use crate::data::RasterImage;
use crate::model::{MaskScores, Region, RegionCollection, SourceAttributes};
use crate::producer::{ProductionError, RegionProducer, ensure_not_empty};

/// Classifies every pixel as foreground (`luma >= threshold`) or background
/// and emits all foreground pixels as a single region.
///
/// Foreground is not split into connected components: one threshold
/// application yields one region. Color images are reduced to luma first,
/// while the region's sample color is still taken from the original colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdProducer {
    threshold: u8,
    color_seed: u64,
}

impl ThresholdProducer {
    /// Create a producer with the given threshold.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            color_seed: DEFAULT_COLOR_SEED,
        }
    }

    /// Set the seed used for the region's display color.
    pub fn with_color_seed(mut self, seed: u64) -> Self {
        self.color_seed = seed;
        self
    }

    /// The active threshold.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Compute the foreground grid for an image, indexed `[[y, x]]`.
    pub fn classify(&self, image: &RasterImage) -> Array2<bool> {
        let gray = image.to_gray();
        Array2::from_shape_fn(
            (gray.height() as usize, gray.width() as usize),
            |(y, x)| gray.get_pixel(x as u32, y as u32)[0] >= self.threshold,
        )
    }
}

impl Default for ThresholdProducer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl RegionProducer for ThresholdProducer {
    fn id(&self) -> &'static str {
        "threshold"
    }

    fn produce(&self, image: &RasterImage) -> Result<RegionCollection, ProductionError> {
        ensure_not_empty(image)?;

        let occupancy = self.classify(image);
        let (width, height) = image.dimensions();

        // An all-background result has no pixel to select.
        let Some(attributes) = SourceAttributes::measure(&occupancy, image, MaskScores::default())
        else {
            log::debug!(
                "Threshold {} left no foreground in {}x{} image",
                self.threshold,
                width,
                height
            );
            return Ok(RegionCollection::empty(width, height));
        };

        log::debug!(
            "Threshold {}: {} of {} pixels are foreground",
            self.threshold,
            attributes.area,
            width as usize * height as usize
        );

        let mut rng = StdRng::seed_from_u64(self.color_seed);
        let region = Region::new(occupancy, random_color(&mut rng), attributes);
        Ok(RegionCollection::new(width, height, vec![region]))
    }
}
