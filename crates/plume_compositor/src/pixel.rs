//! Pixel formats on both sides of the compositor.

use bytemuck::{Pod, Zeroable};

/// One engine pixel: linear color plus one alpha per color channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LinearPixel {
    /// Red, linear.
    pub r: f32,
    /// Green, linear.
    pub g: f32,
    /// Blue, linear.
    pub b: f32,
    /// Alpha of the red channel.
    pub r_alpha: f32,
    /// Alpha of the green channel.
    pub g_alpha: f32,
    /// Alpha of the blue channel.
    pub b_alpha: f32,
}

impl LinearPixel {
    /// Pixel with the given color and the same alpha on every channel.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, alpha: f32) -> Self {
        Self {
            r,
            g,
            b,
            r_alpha: alpha,
            g_alpha: alpha,
            b_alpha: alpha,
        }
    }
}

/// One host pixel, 8 bits per channel, R,G,B,A in memory order.
pub type Rgba8 = [u8; 4];
