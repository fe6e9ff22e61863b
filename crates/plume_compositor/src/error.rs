//! # Compositor Error Types

use thiserror::Error;

use crate::tile::FrameTile;

/// Errors raised while adapting an engine image to host tiles.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorError {
    /// The tile does not fit inside the delivered image.
    #[error("tile {tile:?} does not fit in a {width}x{height} image")]
    TileOutOfBounds {
        /// The configured tile.
        tile: FrameTile,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The pixel buffer length does not match the image dimensions.
    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    BufferSize {
        /// `width * height`.
        expected: usize,
        /// Pixels actually supplied.
        actual: usize,
    },
}

/// Result type for compositor operations.
pub type CompositorResult<T> = Result<T, CompositorError>;
