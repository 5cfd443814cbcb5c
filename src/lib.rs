//! maskselect - region selection, compositing and export
//!
//! Load a raster image, partition it into regions (by threshold or with a
//! segmentation model), select regions by pointing at pixels, preview the
//! result as an alpha composite, and export the selection as a binary PNG
//! mask or as filled SVG polygons. Selected regions can also be made to
//! blink in step with an external on/off event stream.

pub mod blink;
pub mod color_utils;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod data;
pub mod export;
pub mod model;
pub mod producer;
pub mod selection;
pub mod session;

#[cfg(test)]
mod tests;

pub use blink::{BlinkKind, BlinkMessage, BlinkSynchronizer, SyncError, TimelineEvent};
pub use compositor::{CompositeFrame, CompositeOptions, HighlightMode, render, render_with};
pub use config::{AppConfig, ConfigError, LogLevel};
pub use data::{ImageLoadError, RasterImage, load_image};
pub use export::{ExportError, ExportSummary, export_png, export_svg};
pub use model::{Region, RegionCollection, RegionId};
pub use producer::{ProductionError, RegionProducer};
pub use selection::{SelectionSet, locate};
pub use session::Session;
