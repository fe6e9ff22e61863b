//! # Render Engine Contract
//!
//! The ingestion protocol of the offline particle renderer, and the context
//! it is lent for the duration of one blocking `render` call.
//!
//! ```text
//! RenderSession ──register_*──> RenderEngine
//!       │                           │ render(&mut RenderContext)
//!       │                           ├── ctx.stream(h).next_particle(..)
//!       │                           ├── ctx.deliver_frame(w, h, pixels) ──> compositor ──> TileSink
//!       │                           ├── ctx.is_cancelled()
//!       │                           └── ctx.progress(..) / ctx.log(..)
//!       └── reset_state() after every render, exactly once
//! ```

use std::sync::Arc;

use plume_compositor::{CompositorError, FrameBufferCompositor, LinearPixel, TileSink};
use plume_core::{ChannelDescriptor, ParticleStreamAdapter};
use tracing::{error, info, warn};

use crate::camera::CameraSetup;
use crate::cancel::CancellationToken;
use crate::config::RenderSettings;
use crate::error::EngineError;
use crate::light::LightDescriptor;
use crate::mesh::TriangleMesh;
use crate::output::{ImageOutput, ParticleExport};
use crate::progress::ProgressRelay;
use crate::scene::Transform;

/// Identifies a registered particle source within one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(pub(crate) usize);

impl StreamHandle {
    /// Registration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Severity of an engine log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineLogLevel {
    /// Errors.
    Errors,
    /// Warnings.
    Warnings,
    /// Progress messages.
    Progress,
    /// Statistics.
    Stats,
    /// Debug output.
    Debug,
    /// Anything else.
    Custom,
}

/// Forwards one engine log line to `tracing`.
///
/// Errors and warnings keep their severity, everything else is info.
pub fn forward_engine_log(level: EngineLogLevel, line: &str) {
    match level {
        EngineLogLevel::Errors => error!(target: "plume::engine", "{}", line),
        EngineLogLevel::Warnings => warn!(target: "plume::engine", "{}", line),
        EngineLogLevel::Progress
        | EngineLogLevel::Stats
        | EngineLogLevel::Debug
        | EngineLogLevel::Custom => info!(target: "plume::engine", "{}", line),
    }
}

/// The render engine's ingestion protocol.
///
/// All registration happens before `render`. `reset_state` drops every
/// registration so the engine can serve the next session.
pub trait RenderEngine {
    /// Applies scalar render settings, including the shader.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine rejects the settings.
    fn configure(&mut self, settings: &RenderSettings) -> Result<(), EngineError>;

    /// Sets the output resolution. Only called when an image is rendered.
    fn set_resolution(&mut self, width: u32, height: u32);

    /// Attaches the image file writer, or `None` to discard the image.
    fn set_image_output(&mut self, output: Option<&ImageOutput>);

    /// Requests a particle export instead of an image.
    fn save_particle_export(&mut self, export: &ParticleExport);

    /// Sets the camera.
    fn set_camera(&mut self, camera: &CameraSetup);

    /// Registers a particle source. Records are pulled during `render`
    /// through [`RenderContext::stream`].
    fn register_particle_source(
        &mut self,
        handle: StreamHandle,
        channels: &[ChannelDescriptor],
        transform: &Transform,
    );

    /// Registers an occlusion mesh.
    fn register_mesh(&mut self, mesh: Arc<TriangleMesh>, transform: &Transform);

    /// Registers a light.
    fn register_light(&mut self, light: &LightDescriptor, transform: &Transform);

    /// Renders. Blocks until done.
    ///
    /// Returns `Ok(false)` when the render stopped because cancellation was
    /// observed.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when rendering fails.
    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<bool, EngineError>;

    /// Drops all registrations and callbacks.
    fn reset_state(&mut self);
}

/// Everything the engine may call back into while rendering.
pub struct RenderContext<'a> {
    streams: &'a mut [ParticleStreamAdapter],
    frames: Option<(&'a mut FrameBufferCompositor, &'a mut dyn TileSink)>,
    cancel: &'a CancellationToken,
    progress: &'a ProgressRelay,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        streams: &'a mut [ParticleStreamAdapter],
        frames: Option<(&'a mut FrameBufferCompositor, &'a mut dyn TileSink)>,
        cancel: &'a CancellationToken,
        progress: &'a ProgressRelay,
    ) -> Self {
        Self {
            streams,
            frames,
            cancel,
            progress,
        }
    }

    /// Number of registered particle sources.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// The particle source registered under `handle`.
    pub fn stream(&mut self, handle: StreamHandle) -> Option<&mut ParticleStreamAdapter> {
        self.streams.get_mut(handle.0)
    }

    /// All particle sources, in registration order.
    ///
    /// Each stream may be pulled from one thread at a time; splitting the
    /// slice hands streams to separate workers.
    pub fn streams_mut(&mut self) -> &mut [ParticleStreamAdapter] {
        self.streams
    }

    /// Polls the cancellation flag.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the cancellation token for engine worker threads.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Reports progress; `fraction` in `[0, 1]`.
    pub fn progress(&self, title: &str, fraction: f32) {
        self.progress.report(title, fraction);
    }

    /// A progress relay for engine worker threads.
    #[must_use]
    pub fn progress_relay(&self) -> ProgressRelay {
        self.progress.clone()
    }

    /// Delivers the current state of the whole image.
    ///
    /// The buffer is read during this call only. Partial images may be
    /// delivered any number of times; the last delivery is the final image.
    /// Without a frame target (particle export) the image is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CompositorError`] if the image does not match its
    /// dimensions or cannot hold the host tile.
    pub fn deliver_frame(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[LinearPixel],
    ) -> Result<(), CompositorError> {
        match self.frames.as_mut() {
            Some((compositor, sink)) => {
                compositor.on_full_image(width, height, pixels, &mut **sink)
            }
            None => Ok(()),
        }
    }

    /// Forwards an engine log line.
    pub fn log(&self, level: EngineLogLevel, line: &str) {
        forward_engine_log(level, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::progress_channel;
    use plume_compositor::{FrameFragment, FrameTile};

    #[derive(Default)]
    struct Count {
        fragments: usize,
    }

    impl TileSink for Count {
        fn begin_frame(&mut self, _width: u32, _height: u32) {}

        fn receive_fragment(&mut self, _fragment: &FrameFragment<'_>) {
            self.fragments += 1;
        }
    }

    #[test]
    fn test_context_routes_frames_and_cancel() {
        let mut streams = vec![ParticleStreamAdapter::new("a")];
        let mut compositor = FrameBufferCompositor::new(FrameTile::full(1, 1));
        let mut sink = Count::default();
        let cancel = CancellationToken::new();
        let (relay, progress) = progress_channel(8);

        {
            let target: &mut dyn TileSink = &mut sink;
            let mut ctx =
                RenderContext::new(&mut streams, Some((&mut compositor, target)), &cancel, &relay);
            assert_eq!(ctx.stream_count(), 1);
            assert!(ctx.stream(StreamHandle(0)).is_some());
            assert!(ctx.stream(StreamHandle(1)).is_none());

            ctx.deliver_frame(1, 1, &[LinearPixel::default()]).unwrap();
            assert!(ctx.deliver_frame(2, 1, &[LinearPixel::default()]).is_err());

            assert!(!ctx.is_cancelled());
            ctx.cancellation().cancel();
            assert!(ctx.is_cancelled());

            ctx.progress("Rendering", 0.5);
            ctx.log(EngineLogLevel::Stats, "42 particles");
        }

        assert_eq!(sink.fragments, 1);
        assert_eq!(progress.try_recv().unwrap().percent, 50.0);
    }

    #[test]
    fn test_frames_ignored_without_target() {
        let mut streams = Vec::new();
        let cancel = CancellationToken::new();
        let (relay, _progress) = progress_channel(1);
        let mut ctx = RenderContext::new(&mut streams, None, &cancel, &relay);
        assert!(ctx.deliver_frame(4, 4, &[]).is_ok());
    }
}
