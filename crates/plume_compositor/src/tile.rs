//! Host tile geometry.

/// The host-requested region of the engine image.
///
/// Offsets are measured in engine image pixels. `offset_y` counts rows in the
/// same direction as the engine buffer's row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameTile {
    /// Tile width in pixels.
    pub width: u32,
    /// Tile height in pixels.
    pub height: u32,
    /// Horizontal offset into the image.
    pub offset_x: u32,
    /// Vertical offset into the image.
    pub offset_y: u32,
}

impl FrameTile {
    /// Creates a tile.
    #[must_use]
    pub const fn new(width: u32, height: u32, offset_x: u32, offset_y: u32) -> Self {
        Self {
            width,
            height,
            offset_x,
            offset_y,
        }
    }

    /// A tile covering a whole `width` x `height` image.
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(width, height, 0, 0)
    }

    /// Returns true when the tile lies inside a `width` x `height` image.
    #[must_use]
    pub const fn fits(&self, width: u32, height: u32) -> bool {
        (self.offset_x as u64 + self.width as u64) <= width as u64
            && (self.offset_y as u64 + self.height as u64) <= height as u64
    }

    /// Number of pixels in the tile.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes needed for one RGBA8 scanline.
    #[must_use]
    pub const fn scanline_bytes(&self) -> usize {
        self.width as usize * 4
    }
}
