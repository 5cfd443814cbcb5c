//! Alpha compositing of regions and the current selection over the base image.
//!
//! Rendering is a pure function of its inputs: every call builds a new frame
//! from the base image and never reads a previous frame. Two passes:
//!
//! 1. every region is painted in its display color onto a copy of the base
//!    image (later regions overwrite earlier ones), and that overlay is
//!    blended with the base at `alpha`;
//! 2. if anything is selected, the selected regions are painted white onto a
//!    copy of the pass-1 result, which is blended with it again at `alpha`.
//!
//! A selected region therefore shows up lighter than its peers instead of
//! simply changing color.

use std::sync::Arc;

use image::{Rgb, RgbImage};
use ndarray::Array2;

use crate::constants::{DEFAULT_ALPHA, HIGHLIGHT_COLOR};
use crate::data::RasterImage;
use crate::model::{Region, RegionCollection};

/// Compositing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeOptions {
    /// Weight of the overlay in each blend, in `[0, 1]`.
    pub alpha: f32,
}

impl CompositeOptions {
    /// Options with the given blend weight, clamped to `[0, 1]`.
    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Whether the selected regions get the white highlight pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightMode {
    /// Selected regions are drawn like every other region
    Normal,
    /// Selected regions are blended toward white
    #[default]
    Bright,
}

/// A rendered RGB frame with the source image's dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeFrame(RgbImage);

impl CompositeFrame {
    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// RGB value at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        (x < self.width() && y < self.height()).then(|| self.0.get_pixel(x, y).0)
    }

    /// Borrow the underlying image buffer.
    pub fn image(&self) -> &RgbImage {
        &self.0
    }

    /// Take the underlying image buffer.
    pub fn into_image(self) -> RgbImage {
        self.0
    }

    /// Raw row-major RGB bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_raw()
    }
}

/// Render regions and the selection over `base` with the highlight pass.
pub fn render(
    base: &RasterImage,
    collection: &RegionCollection,
    selection: &[Arc<Region>],
    options: &CompositeOptions,
) -> CompositeFrame {
    render_with(base, collection, selection, HighlightMode::Bright, options)
}

/// Render with an explicit highlight mode.
pub fn render_with(
    base: &RasterImage,
    collection: &RegionCollection,
    selection: &[Arc<Region>],
    mode: HighlightMode,
    options: &CompositeOptions,
) -> CompositeFrame {
    let started = web_time::Instant::now();
    let alpha = options.alpha.clamp(0.0, 1.0);
    let base = base.to_rgb();

    let mut overlay = base.clone();
    for region in collection.iter() {
        paint(&mut overlay, region.occupancy(), region.display_color());
    }
    let mut frame = blend(&overlay, &base, alpha);

    if mode == HighlightMode::Bright && !selection.is_empty() {
        let mut highlight = frame.clone();
        for region in selection {
            paint(&mut highlight, region.occupancy(), HIGHLIGHT_COLOR);
        }
        frame = blend(&highlight, &frame, alpha);
    }

    log::trace!(
        "Composited {} regions ({} selected, {:?}) in {:?}",
        collection.len(),
        selection.len(),
        mode,
        started.elapsed()
    );
    CompositeFrame(frame)
}

/// Set every occupied pixel of `target` to `color`.
fn paint(target: &mut RgbImage, occupancy: &Array2<bool>, color: [u8; 3]) {
    let (width, height) = target.dimensions();
    for ((y, x), _) in occupancy.indexed_iter().filter(|(_, occupied)| **occupied) {
        let (x, y) = (x as u32, y as u32);
        if x < width && y < height {
            target.put_pixel(x, y, Rgb(color));
        }
    }
}

/// Per-channel `alpha * top + (1 - alpha) * bottom`, rounded and saturated.
fn blend(top: &RgbImage, bottom: &RgbImage, alpha: f32) -> RgbImage {
    let mut out = bottom.clone();
    for (dst, (t, b)) in out
        .iter_mut()
        .zip(top.as_raw().iter().zip(bottom.as_raw().iter()))
    {
        let value = alpha * f32::from(*t) + (1.0 - alpha) * f32::from(*b);
        *dst = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaskScores, SourceAttributes};
    use ndarray::array;

    fn region(image: &RasterImage, occupancy: Array2<bool>, color: [u8; 3]) -> Region {
        let attrs = SourceAttributes::measure(&occupancy, image, MaskScores::default()).unwrap();
        Region::new(occupancy, color, attrs)
    }

    fn fixture() -> (RasterImage, RegionCollection) {
        let base = RasterImage::gray_from_fn(3, 1, |_, _| 100);
        let a = region(&base, array![[true, true, false]], [200, 0, 0]);
        let b = region(&base, array![[false, true, false]], [0, 200, 0]);
        (base, RegionCollection::new(3, 1, vec![a, b]))
    }

    #[test]
    fn test_overlay_blend_and_paint_order() {
        let (base, collection) = fixture();
        let frame = render(&base, &collection, &[], &CompositeOptions::default());

        assert_eq!(frame.pixel(0, 0), Some([150, 50, 50]));
        // Region b is later in the collection and wins the overlap.
        assert_eq!(frame.pixel(1, 0), Some([50, 150, 50]));
        // Uncovered pixels keep the base (replicated to three channels).
        assert_eq!(frame.pixel(2, 0), Some([100, 100, 100]));
    }

    #[test]
    fn test_selected_region_is_brightened() {
        let (base, collection) = fixture();
        let selected = vec![collection.get(0).unwrap().clone()];
        let frame = render(&base, &collection, &selected, &CompositeOptions::default());

        // 0.5 * 255 + 0.5 * pass-1 value
        assert_eq!(frame.pixel(0, 0), Some([203, 153, 153]));
        assert_eq!(frame.pixel(1, 0), Some([153, 203, 153]));
        assert_eq!(frame.pixel(2, 0), Some([100, 100, 100]));
    }

    #[test]
    fn test_normal_mode_skips_highlight() {
        let (base, collection) = fixture();
        let selected = vec![collection.get(0).unwrap().clone()];
        let options = CompositeOptions::default();
        let normal = render_with(&base, &collection, &selected, HighlightMode::Normal, &options);
        let unselected = render(&base, &collection, &[], &options);
        assert_eq!(normal, unselected);
    }

    #[test]
    fn test_alpha_extremes() {
        let (base, collection) = fixture();
        let opaque = render(&base, &collection, &[], &CompositeOptions::with_alpha(1.0));
        assert_eq!(opaque.pixel(0, 0), Some([200, 0, 0]));

        let clear = render(&base, &collection, &[], &CompositeOptions::with_alpha(0.0));
        assert_eq!(clear.pixel(0, 0), Some([100, 100, 100]));

        assert_eq!(CompositeOptions::with_alpha(3.0).alpha, 1.0);
    }

    #[test]
    fn test_render_is_pure() {
        let (base, collection) = fixture();
        let selected = vec![collection.get(1).unwrap().clone()];
        let options = CompositeOptions::default();
        let a = render(&base, &collection, &selected, &options);
        let b = render(&base, &collection, &selected, &options);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!((a.width(), a.height()), (3, 1));
    }
}
