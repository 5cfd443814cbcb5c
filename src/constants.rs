//! Global constants for mask selection and rendering.

/// Default blend weight between the region overlay and the base image.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Default grayscale threshold applied on image load.
pub const DEFAULT_THRESHOLD: u8 = 0;

/// Default seed for pseudo-random region display colors.
pub const DEFAULT_COLOR_SEED: u64 = 0x5eed_cafe;

/// Highlight color painted over selected regions (maximum on every channel).
pub const HIGHLIGHT_COLOR: [u8; 3] = [255, 255, 255];

/// Foreground value written by the raster union export.
pub const MASK_FOREGROUND: u8 = 255;

/// Background value written by the raster union export.
pub const MASK_BACKGROUND: u8 = 0;

/// How often the blink loop re-checks its cancellation flag while waiting
/// for the next timeline event, in milliseconds.
pub const DEFAULT_BLINK_POLL_MS: u64 = 20;
