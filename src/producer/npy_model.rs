//! Segmentation model backed by a precomputed NumPy mask stack.
//!
//! The artifact is a `.npy` array of shape `(N, H, W)` (or `(H, W)` for a
//! single mask) holding `u8` or `bool` values, where nonzero means occupied.
//! This is the format an offline automatic mask generator run writes out.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayD, Axis, Ix3};
use ndarray_npy::ReadNpyExt;

use crate::data::RasterImage;
use crate::producer::{GeneratedMask, ProductionError, SegmentationModel};

/// Mask generator that replays a mask stack loaded once at construction.
#[derive(Debug, Clone)]
pub struct NpyMaskModel {
    source: PathBuf,
    masks: Vec<Array2<bool>>,
}

impl NpyMaskModel {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    /// Load the artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ProductionError> {
        let data = std::fs::read(path)
            .map_err(|e| ProductionError::model_load(path, e.to_string()))?;
        let model = Self::from_bytes(&data, path)?;
        log::info!(
            "Loaded {} masks of {}x{} from {:?}",
            model.masks.len(),
            model.width(),
            model.height(),
            path
        );
        Ok(model)
    }

    /// Parse an artifact from raw bytes. `source` is only used for messages.
    pub fn from_bytes(data: &[u8], source: impl Into<PathBuf>) -> Result<Self, ProductionError> {
        let source = source.into();
        if !data.starts_with(Self::MAGIC) {
            return Err(ProductionError::model_load(source, "not a .npy file"));
        }

        let array: ArrayD<bool> = match ArrayD::<u8>::read_npy(Cursor::new(data)) {
            Ok(values) => values.mapv(|v| v != 0),
            Err(u8_err) => match ArrayD::<bool>::read_npy(Cursor::new(data)) {
                Ok(values) => values,
                Err(_) => {
                    return Err(ProductionError::model_load(
                        source,
                        format!("expected u8 or bool array: {}", u8_err),
                    ));
                }
            },
        };

        let stack = match array.ndim() {
            2 => array.insert_axis(Axis(0)),
            3 => array,
            n => {
                return Err(ProductionError::model_load(
                    source,
                    format!("unsupported array dimensions: {} (expected 2 or 3)", n),
                ));
            }
        };
        let stack = stack
            .into_dimensionality::<Ix3>()
            .map_err(|e| ProductionError::model_load(&source, e.to_string()))?;

        let masks = stack
            .axis_iter(Axis(0))
            .map(|mask| mask.to_owned())
            .collect();

        Ok(Self { source, masks })
    }

    /// Number of masks in the artifact.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Whether the artifact holds no masks.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Mask width, or 0 for an empty artifact.
    pub fn width(&self) -> usize {
        self.masks.first().map_or(0, |m| m.ncols())
    }

    /// Mask height, or 0 for an empty artifact.
    pub fn height(&self) -> usize {
        self.masks.first().map_or(0, |m| m.nrows())
    }
}

impl SegmentationModel for NpyMaskModel {
    fn name(&self) -> &str {
        self.source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("npy-masks")
    }

    fn generate(&self, image: &RasterImage) -> Result<Vec<GeneratedMask>, ProductionError> {
        let image_dim = (image.width() as usize, image.height() as usize);
        if !self.is_empty() && (self.width(), self.height()) != image_dim {
            return Err(ProductionError::dimension_mismatch(
                format!("mask artifact {:?}", self.source),
                image.dimensions(),
                (self.height(), self.width()),
            ));
        }
        Ok(self.masks.iter().cloned().map(GeneratedMask::new).collect())
    }
}
