//! Raster image data and the image source.
//!
//! This module provides:
//! - `RasterImage`: 8-bit grayscale or RGB pixel buffer the core works on
//! - `load_image` / `load_image_from_bytes`: decode files into `RasterImage`
//! - `ImageLoadError`: everything that can go wrong while loading

mod error;
mod loader;
mod raster;

pub use error::ImageLoadError;
pub use loader::{IMAGE_EXTENSIONS, is_image_filename, load_image, load_image_from_bytes};
pub use raster::{Pixel, RasterImage};
