//! Borrowed views over one delivered engine image.

use crate::error::{CompositorError, CompositorResult};
use crate::pixel::{LinearPixel, Rgba8};
use crate::srgb::encode_pixel;
use crate::tile::FrameTile;

/// A whole engine image, borrowed for the duration of one callback.
///
/// Row `y` starts at `pixels[y * width]`.
#[derive(Debug, Clone, Copy)]
pub struct FrameImage<'a> {
    width: u32,
    height: u32,
    pixels: &'a [LinearPixel],
}

impl<'a> FrameImage<'a> {
    /// Wraps an engine buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CompositorError::BufferSize`] if `pixels` does not hold
    /// exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, pixels: &'a [LinearPixel]) -> CompositorResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CompositorError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at column `x`, row `y`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&LinearPixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(x as usize + y as usize * self.width as usize)
    }
}

/// The tile-shaped window a host sink reads scanlines from.
///
/// A fragment with no image (before the first delivery) yields no scanlines.
#[derive(Debug, Clone, Copy)]
pub struct FrameFragment<'a> {
    tile: FrameTile,
    image: Option<FrameImage<'a>>,
}

impl<'a> FrameFragment<'a> {
    /// A fragment over `image`.
    ///
    /// # Errors
    ///
    /// Returns [`CompositorError::TileOutOfBounds`] if the tile does not fit.
    pub fn new(tile: FrameTile, image: FrameImage<'a>) -> CompositorResult<Self> {
        if !tile.fits(image.width, image.height) {
            return Err(CompositorError::TileOutOfBounds {
                tile,
                width: image.width,
                height: image.height,
            });
        }
        Ok(Self {
            tile,
            image: Some(image),
        })
    }

    /// A fragment that has not received an image yet.
    #[must_use]
    pub const fn empty(tile: FrameTile) -> FrameFragment<'static> {
        FrameFragment { tile, image: None }
    }

    /// Tile geometry.
    #[must_use]
    pub const fn tile(&self) -> FrameTile {
        self.tile
    }

    /// Tile width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.tile.width
    }

    /// Tile height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.tile.height
    }

    /// Returns true once an image is attached.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Writes one tile row as RGBA8 into `out`.
    ///
    /// `row_from_bottom` selects image row `offset_y + row_from_bottom`.
    /// Returns false if no image is attached, the row is outside the tile, or
    /// `out` is shorter than one scanline. Only `tile.width * 4` bytes are
    /// written.
    pub fn scanline(&self, row_from_bottom: u32, out: &mut [u8]) -> bool {
        let Some(image) = self.image else {
            return false;
        };
        let width = self.tile.width as usize;
        if row_from_bottom >= self.tile.height || out.len() < width * 4 {
            return false;
        }

        let src_y = (self.tile.offset_y + row_from_bottom) as usize;
        let start = self.tile.offset_x as usize + src_y * image.width as usize;
        let Some(src) = image.pixels.get(start..start + width) else {
            return false;
        };

        let dst: &mut [Rgba8] = bytemuck::cast_slice_mut(&mut out[..width * 4]);
        for (pixel, linear) in dst.iter_mut().zip(src) {
            *pixel = encode_pixel(linear);
        }
        true
    }

    /// Encodes the whole tile, row 0 first.
    ///
    /// Returns `None` if no image is attached.
    #[must_use]
    pub fn to_rgba8(&self) -> Option<Vec<u8>> {
        if !self.has_image() {
            return None;
        }
        let stride = self.tile.scanline_bytes();
        let mut bytes = vec![0u8; stride * self.tile.height as usize];
        for (row, line) in (0..self.tile.height).zip(bytes.chunks_exact_mut(stride.max(1))) {
            if !self.scanline(row, line) {
                return None;
            }
        }
        Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<LinearPixel> {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = (x + y * width) as f32 / (width * height) as f32;
                pixels.push(LinearPixel::new(v, 1.0 - v, 0.0, 1.0));
            }
        }
        pixels
    }

    #[test]
    fn test_buffer_size_checked() {
        let pixels = vec![LinearPixel::default(); 5];
        let err = FrameImage::new(2, 3, &pixels).unwrap_err();
        assert_eq!(
            err,
            CompositorError::BufferSize {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_tile_bounds_checked() {
        let pixels = vec![LinearPixel::default(); 16];
        let image = FrameImage::new(4, 4, &pixels).unwrap();
        let err = FrameFragment::new(FrameTile::new(3, 3, 2, 0), image).unwrap_err();
        assert!(matches!(err, CompositorError::TileOutOfBounds { .. }));
    }

    #[test]
    fn test_empty_fragment_has_no_scanlines() {
        let fragment = FrameFragment::empty(FrameTile::full(2, 2));
        let mut out = [0u8; 8];
        assert!(!fragment.has_image());
        assert!(!fragment.scanline(0, &mut out));
        assert!(fragment.to_rgba8().is_none());
    }

    #[test]
    fn test_full_tile_reproduces_image() {
        let pixels = gradient(5, 3);
        let image = FrameImage::new(5, 3, &pixels).unwrap();
        let fragment = FrameFragment::new(FrameTile::full(5, 3), image).unwrap();

        let mut out = [0u8; 20];
        for row in 0..3 {
            assert!(fragment.scanline(row, &mut out));
            for col in 0..5u32 {
                let expected = encode_pixel(image.pixel(col, row).unwrap());
                let at = col as usize * 4;
                assert_eq!(&out[at..at + 4], &expected);
            }
        }
    }

    #[test]
    fn test_offset_tile_samples_offset_pixels() {
        let pixels = gradient(8, 6);
        let image = FrameImage::new(8, 6, &pixels).unwrap();
        let tile = FrameTile::new(3, 2, 4, 3);
        let fragment = FrameFragment::new(tile, image).unwrap();

        let bytes = fragment.to_rgba8().unwrap();
        assert_eq!(bytes.len(), 3 * 2 * 4);
        for row in 0..2u32 {
            for col in 0..3u32 {
                let expected = encode_pixel(image.pixel(4 + col, 3 + row).unwrap());
                let at = (row as usize * 3 + col as usize) * 4;
                assert_eq!(&bytes[at..at + 4], &expected);
            }
        }
    }

    #[test]
    fn test_scanline_rejects_bad_requests() {
        let pixels = gradient(4, 4);
        let image = FrameImage::new(4, 4, &pixels).unwrap();
        let fragment = FrameFragment::new(FrameTile::new(2, 2, 1, 1), image).unwrap();

        let mut short = [0u8; 7];
        assert!(!fragment.scanline(0, &mut short));

        let mut out = [0u8; 8];
        assert!(!fragment.scanline(2, &mut out));
        assert!(fragment.scanline(1, &mut out));
    }

    #[test]
    fn test_scanline_leaves_tail_untouched() {
        let pixels = vec![LinearPixel::new(1.0, 1.0, 1.0, 1.0); 4];
        let image = FrameImage::new(2, 2, &pixels).unwrap();
        let fragment = FrameFragment::new(FrameTile::full(2, 2), image).unwrap();

        let mut out = [7u8; 12];
        assert!(fragment.scanline(0, &mut out));
        assert_eq!(&out[..8], &[255; 8]);
        assert_eq!(&out[8..], &[7; 4]);
    }
}
