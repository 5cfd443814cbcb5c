//! In-memory raster images handed to the core by the image source.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// A single pixel value, either grayscale or RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    /// Single-channel intensity
    Gray(u8),
    /// Three-channel color
    Rgb([u8; 3]),
}

impl Pixel {
    /// Get the pixel as an RGB triple, replicating grayscale to all channels.
    pub fn to_rgb(self) -> [u8; 3] {
        match self {
            Pixel::Gray(v) => [v, v, v],
            Pixel::Rgb(rgb) => rgb,
        }
    }
}

/// An 8-bit raster image, grayscale or RGB.
///
/// Anything else the codec hands back (16-bit, alpha, float) is narrowed to
/// one of these two on construction.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterImage {
    /// Single-channel image
    Gray(GrayImage),
    /// Three-channel image
    Rgb(RgbImage),
}

impl RasterImage {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            RasterImage::Gray(img) => img.width(),
            RasterImage::Rgb(img) => img.width(),
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            RasterImage::Gray(img) => img.height(),
            RasterImage::Rgb(img) => img.height(),
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Number of color channels (1 or 3).
    pub fn channels(&self) -> usize {
        match self {
            RasterImage::Gray(_) => 1,
            RasterImage::Rgb(_) => 3,
        }
    }

    /// Whether the image has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Read the pixel at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(match self {
            RasterImage::Gray(img) => Pixel::Gray(img.get_pixel(x, y)[0]),
            RasterImage::Rgb(img) => Pixel::Rgb(img.get_pixel(x, y).0),
        })
    }

    /// Convert to a three-channel image (grayscale is replicated).
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            RasterImage::Gray(img) => RgbImage::from_fn(img.width(), img.height(), |x, y| {
                let v = img.get_pixel(x, y)[0];
                Rgb([v, v, v])
            }),
            RasterImage::Rgb(img) => img.clone(),
        }
    }

    /// Convert to a single-channel luma image.
    pub fn to_gray(&self) -> GrayImage {
        match self {
            RasterImage::Gray(img) => img.clone(),
            RasterImage::Rgb(img) => DynamicImage::ImageRgb8(img.clone()).into_luma8(),
        }
    }

    /// Build a grayscale image from row-major values.
    ///
    /// Returns `None` if `values.len() != width * height`.
    pub fn gray_from_vec(width: u32, height: u32, values: Vec<u8>) -> Option<Self> {
        GrayImage::from_raw(width, height, values).map(RasterImage::Gray)
    }

    /// Build a grayscale image by evaluating `f(x, y)` at every pixel.
    pub fn gray_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Self {
        RasterImage::Gray(GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    /// Build an RGB image by evaluating `f(x, y)` at every pixel.
    pub fn rgb_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Self {
        RasterImage::Rgb(RgbImage::from_fn(width, height, |x, y| Rgb(f(x, y))))
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => RasterImage::Gray(gray),
            DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLumaA16(_) => RasterImage::Gray(img.into_luma8()),
            DynamicImage::ImageRgb8(rgb) => RasterImage::Rgb(rgb),
            other => RasterImage::Rgb(other.into_rgb8()),
        }
    }
}

impl From<GrayImage> for RasterImage {
    fn from(img: GrayImage) -> Self {
        RasterImage::Gray(img)
    }
}

impl From<RgbImage> for RasterImage {
    fn from(img: RgbImage) -> Self {
        RasterImage::Rgb(img)
    }
}
