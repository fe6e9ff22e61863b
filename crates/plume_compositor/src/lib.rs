//! # PLUME Compositor - Frame Buffer Adaptation
//!
//! Turns the engine's whole-image, linear, six-component float buffers into
//! the host's cropped 8-bit sRGB RGBA tiles.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    FRAME COMPOSITING                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  engine image (W x H, LinearPixel)                           │
//! │        ↓  on_full_image (borrowed for one call)              │
//! │  FrameFragment (tile window, lazy per scanline)              │
//! │        ↓  scanline(row) → linear_to_srgb8 + mean alpha       │
//! │  TileSink (host)                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Never retain the engine buffer** - fragments borrow it per callback
//! 2. **Encode lazily** - a scanline is converted only when the host asks
//! 3. **Saturate, never wrap** - out-of-range values clamp to 0 or 255

pub mod compositor;
pub mod error;
pub mod fragment;
pub mod pixel;
pub mod srgb;
pub mod tile;

pub use compositor::{CompositorStats, FrameBufferCompositor, TileSink};
pub use error::{CompositorError, CompositorResult};
pub use fragment::{FrameFragment, FrameImage};
pub use pixel::{LinearPixel, Rgba8};
pub use srgb::{average_alpha8, encode_pixel, linear_to_srgb8};
pub use tile::FrameTile;
