//! # PLUME
//!
//! Bridges a host scene graph to an offline particle render engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            PLUME BRIDGE                               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  host scene ──lock──> ┌─────────────────┐                            │
//! │                       │  plume_session  │── register ──> engine      │
//! │                       │  RenderSession  │<── render ───┘   │         │
//! │                       └───────┬─────────┘                  │         │
//! │                               │                            │         │
//! │           ┌───────────────────┴──┐          ┌──────────────┴──────┐  │
//! │           │  plume_core          │<─ pull ──│  particle records   │  │
//! │           │  ParticleStream...   │          └─────────────────────┘  │
//! │           └──────────────────────┘                                   │
//! │           ┌──────────────────────┐          ┌─────────────────────┐  │
//! │           │  plume_compositor    │<─ image ─│  linear frames      │  │
//! │           │  FrameBufferComp...  │── tile ─>│  host tile sink     │  │
//! │           └──────────────────────┘          └─────────────────────┘  │
//! │                                                                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Host lifecycle
//!
//! `Init → Process → (Abort | Cleanup) → Term`, mapped onto
//! [`RenderSession`]. `Process` returns [`RenderOutcome`]: `Ok`, `Abort`
//! (user cancellation only) or `Fail`.

pub use plume_compositor as compositor;
pub use plume_core as core;
pub use plume_session as session;

#[cfg(feature = "test-utils")]
pub use plume_session::testing;

pub use plume_compositor::{FrameFragment, FrameTile, LinearPixel, TileSink};
pub use plume_core::{
    AttributeInfo, AttributeType, AttributeValues, ChannelDescriptor, ChannelMappingTable,
    ParticleSource, ParticleStreamAdapter, PointAttributeSource, RecordLayout,
};
pub use plume_session::{
    AbortHandle, CancellationToken, RenderContext, RenderEngine, RenderOutcome, RenderSession,
    RenderSettings, SceneLock, SceneView, SessionError,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Loads render settings and logs the bridge version.
///
/// # Errors
///
/// Returns a [`plume_session::ConfigError`] if the file cannot be read or
/// parsed, or its values are inconsistent.
pub fn load_settings(
    path: impl AsRef<std::path::Path>,
) -> Result<RenderSettings, plume_session::ConfigError> {
    let path = path.as_ref();
    let settings = RenderSettings::load(path)?;
    settings.validate()?;
    tracing::info!(version = VERSION, path = %path.display(), "render settings loaded");
    Ok(settings)
}
