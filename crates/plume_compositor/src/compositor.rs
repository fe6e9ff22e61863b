//! Engine-image callback → host tile sink.

use tracing::{debug, warn};

use crate::error::CompositorResult;
use crate::fragment::{FrameFragment, FrameImage};
use crate::pixel::LinearPixel;
use crate::tile::FrameTile;

/// Host side of frame delivery.
///
/// `receive_fragment` is called once per delivered image. The fragment only
/// lives for the duration of the call.
pub trait TileSink {
    /// Announces a new frame of `width` x `height` engine pixels.
    fn begin_frame(&mut self, width: u32, height: u32);

    /// Receives one delivered image, cropped to the tile.
    fn receive_fragment(&mut self, fragment: &FrameFragment<'_>);
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositorStats {
    /// Images forwarded to the sink.
    pub delivered: u64,
    /// Images rejected (bad size or tile out of bounds).
    pub rejected: u64,
    /// Dimensions of the last forwarded image.
    pub last_size: Option<(u32, u32)>,
}

/// Adapts engine image callbacks to the host tile.
///
/// Holds no pixel data between callbacks.
#[derive(Debug)]
pub struct FrameBufferCompositor {
    tile: FrameTile,
    started: bool,
    stats: CompositorStats,
}

impl FrameBufferCompositor {
    /// Creates a compositor for the host tile.
    #[must_use]
    pub fn new(tile: FrameTile) -> Self {
        Self {
            tile,
            started: false,
            stats: CompositorStats::default(),
        }
    }

    /// The host tile.
    #[must_use]
    pub const fn tile(&self) -> FrameTile {
        self.tile
    }

    /// Delivery counters.
    #[must_use]
    pub const fn stats(&self) -> CompositorStats {
        self.stats
    }

    /// Announces the frame to the sink. Later calls are ignored until the
    /// next render.
    pub fn begin_frame<S: TileSink + ?Sized>(&mut self, width: u32, height: u32, sink: &mut S) {
        if !self.started {
            sink.begin_frame(width, height);
            self.started = true;
        }
    }

    /// Clears delivery state so the compositor can serve another render.
    pub fn reset(&mut self) {
        self.started = false;
        self.stats = CompositorStats::default();
    }

    /// A fragment with no image, for hosts that poll before first delivery.
    #[must_use]
    pub const fn fragment(&self) -> FrameFragment<'static> {
        FrameFragment::empty(self.tile)
    }

    /// Handles one engine image (partial or final).
    ///
    /// The buffer is borrowed only for this call and never retained.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels` does not match `width * height` or the
    /// tile does not fit in the image. The sink is not called in that case.
    pub fn on_full_image<S: TileSink + ?Sized>(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[LinearPixel],
        sink: &mut S,
    ) -> CompositorResult<()> {
        let fragment = match FrameImage::new(width, height, pixels)
            .and_then(|image| FrameFragment::new(self.tile, image))
        {
            Ok(fragment) => fragment,
            Err(e) => {
                self.stats.rejected += 1;
                warn!(error = %e, "dropping engine image");
                return Err(e);
            }
        };

        self.begin_frame(width, height, sink);
        sink.receive_fragment(&fragment);

        self.stats.delivered += 1;
        self.stats.last_size = Some((width, height));
        debug!(
            width,
            height,
            tile_width = self.tile.width,
            tile_height = self.tile.height,
            "delivered image"
        );
        Ok(())
    }
}
