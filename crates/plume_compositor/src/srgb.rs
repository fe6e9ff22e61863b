//! Linear → sRGB transfer, 8-bit quantized.
//!
//! The engine works in linear space; the host displays sRGB.

use crate::pixel::{LinearPixel, Rgba8};

/// Upper end of the linear segment of the sRGB curve.
pub const LINEAR_BREAKPOINT: f32 = 0.003_130_8;

/// Converts one linear component to an 8-bit sRGB value.
///
/// Saturates to 0 at or below 0 and to 255 at or above 1.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn linear_to_srgb8(v: f32) -> u8 {
    if v <= 0.0 {
        0
    } else if v >= 1.0 {
        255
    } else if v <= LINEAR_BREAKPOINT {
        (12.92 * v * 255.0).round() as u8
    } else {
        ((1.055 * v.powf(1.0 / 2.4) - 0.055) * 255.0).round() as u8
    }
}

/// Collapses the three per-channel alphas to one 8-bit alpha (their mean).
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn average_alpha8(r_alpha: f32, g_alpha: f32, b_alpha: f32) -> u8 {
    (255.0 * ((r_alpha + g_alpha + b_alpha) / 3.0)).round() as u8
}

/// Encodes one engine pixel for the host.
#[inline]
#[must_use]
pub fn encode_pixel(pixel: &LinearPixel) -> Rgba8 {
    [
        linear_to_srgb8(pixel.r),
        linear_to_srgb8(pixel.g),
        linear_to_srgb8(pixel.b),
        average_alpha8(pixel.r_alpha, pixel.g_alpha, pixel.b_alpha),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_saturation() {
        assert_eq!(linear_to_srgb8(-1.0), 0);
        assert_eq!(linear_to_srgb8(0.0), 0);
        assert_eq!(linear_to_srgb8(1.0), 255);
        assert_eq!(linear_to_srgb8(7.5), 255);
        assert_eq!(linear_to_srgb8(f32::INFINITY), 255);
    }

    #[test]
    fn test_mid_grey() {
        // 18% grey sits near the middle of the 8-bit sRGB range.
        assert_eq!(linear_to_srgb8(0.18), 118);
        assert_eq!(linear_to_srgb8(0.5), 188);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = 0u8;
        for i in 0..=200_000 {
            let v = i as f32 / 200_000.0;
            let encoded = linear_to_srgb8(v);
            assert!(encoded >= previous, "not monotonic at {v}");
            previous = encoded;
        }
        assert_eq!(previous, 255);
    }

    #[test]
    fn test_pieces_agree_at_breakpoint() {
        let v = LINEAR_BREAKPOINT;
        let linear = 12.92 * v * 255.0;
        let curve = (1.055 * v.powf(1.0 / 2.4) - 0.055) * 255.0;
        assert!((linear - curve).abs() < 1.0, "{linear} vs {curve}");
        let below = linear_to_srgb8(v);
        let above = linear_to_srgb8(f32::from_bits(v.to_bits() + 1));
        assert!(above.abs_diff(below) <= 1);
    }

    #[test]
    fn test_alpha_mean() {
        assert_eq!(average_alpha8(1.0, 0.0, 0.0), 85);
        assert_eq!(average_alpha8(1.0, 1.0, 1.0), 255);
        assert_eq!(average_alpha8(0.0, 0.0, 0.0), 0);

        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..10_000 {
            let (a, b, c): (f32, f32, f32) = (rng.gen(), rng.gen(), rng.gen());
            let expected = (255.0 * ((a + b + c) / 3.0)).round() as u8;
            assert_eq!(average_alpha8(a, b, c), expected);
        }
    }

    #[test]
    fn test_encode_pixel() {
        let pixel = LinearPixel {
            r: 1.0,
            g: 0.0,
            b: 0.5,
            r_alpha: 1.0,
            g_alpha: 0.0,
            b_alpha: 0.0,
        };
        assert_eq!(encode_pixel(&pixel), [255, 0, 188, 85]);
    }
}
