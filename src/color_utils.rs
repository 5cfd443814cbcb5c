//! Color utility functions shared across the application.
//!
//! This module provides color conversion and generation utilities
//! used by region producers, the compositor and the vector exporter.

use rand::Rng;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Scale a unit-range RGB tuple to 8-bit channels.
pub fn unit_rgb_to_u8((r, g, b): (f32, f32, f32)) -> [u8; 3] {
    let scale = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [scale(r), scale(g), scale(b)]
}

/// Draw a pseudo-random display color.
///
/// Hue is uniform; saturation and value stay in a band that reads well over
/// both dark and bright photographs.
pub fn random_color<R: Rng>(rng: &mut R) -> [u8; 3] {
    let hue = rng.random_range(0.0..360.0);
    let saturation = rng.random_range(0.55..0.95);
    let value = rng.random_range(0.6..1.0);
    unit_rgb_to_u8(hsv_to_rgb(hue, saturation, value))
}

/// Format an RGB triple as a lowercase `#rrggbb` string.
pub fn to_hex(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_hsv_to_rgb_red() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsv_to_rgb_blue() {
        let (r, g, b) = hsv_to_rgb(240.0, 1.0, 1.0);
        assert!(r.abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!((b - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_unit_rgb_to_u8_clamps() {
        assert_eq!(unit_rgb_to_u8((1.5, -0.2, 0.5)), [255, 0, 128]);
    }

    #[test]
    fn test_random_color_is_seed_stable() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            assert_eq!(random_color(&mut a), random_color(&mut b));
        }
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex([255, 0, 16]), "#ff0010");
    }
}
