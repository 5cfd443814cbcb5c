//! Selection export.
//!
//! Two renditions of the current selection:
//!
//! - **Raster**: the union of all selected occupancy grids as a 0/255
//!   single-channel PNG sized to the image
//! - **Vector**: an SVG drawing with one filled polygon per external contour
//!   of each selected region, colored by the region's sampled source color
//!
//! Both are fully encoded in memory before anything touches the disk, so an
//! empty selection or an encoding failure never creates the output file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use maskselect::export::{export_png, export_svg};
//!
//! let selected = selection.snapshot();
//! export_png(&selected, Path::new("mask.png"))?;
//! export_svg(&selected, Path::new("mask.svg"))?;
//! ```

mod contour;
mod error;
mod raster;
mod svg;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::Region;

pub use contour::{Contour, trace_external_contours};
pub use error::ExportError;
pub use raster::{encode_png, union_mask};
pub use svg::{SvgDocument, VectorPolygon};

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Destination file
    pub path: PathBuf,
    /// Number of selected regions exported
    pub regions: usize,
    /// Number of polygons written (zero for raster exports)
    pub polygons: usize,
    /// Bytes written
    pub bytes: usize,
}

/// Write the union of `selection` as a binary PNG mask.
pub fn export_png(selection: &[Arc<Region>], path: &Path) -> Result<ExportSummary, ExportError> {
    let mask = union_mask(selection)?;
    let bytes = encode_png(&mask)?;
    write_file(path, &bytes)?;

    log::info!(
        "Exported raster mask of {} region(s) to {:?}",
        selection.len(),
        path
    );
    Ok(ExportSummary {
        path: path.to_path_buf(),
        regions: selection.len(),
        polygons: 0,
        bytes: bytes.len(),
    })
}

/// Write `selection` as an SVG of filled contour polygons.
pub fn export_svg(selection: &[Arc<Region>], path: &Path) -> Result<ExportSummary, ExportError> {
    let document = SvgDocument::from_selection(selection)?;
    let markup = document.to_svg_string()?;
    write_file(path, markup.as_bytes())?;

    log::info!(
        "Exported {} polygon(s) from {} region(s) to {:?}",
        document.polygons().len(),
        selection.len(),
        path
    );
    Ok(ExportSummary {
        path: path.to_path_buf(),
        regions: selection.len(),
        polygons: document.polygons().len(),
        bytes: markup.len(),
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
