//! # PLUME Session - Render Lifecycle
//!
//! Drives one offline render per host call: apply settings, snapshot the
//! scene under its lock, release the lock, run the blocking engine render,
//! tear everything down.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      RENDER SESSION                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  RenderSettings (TOML) ─→ OutputPlan ─→ RenderEngine::configure│
//! │  SceneLock::acquire ─→ snapshot (streams, meshes, lights)    │
//! │  guard.release()                                             │
//! │  RenderEngine::render(RenderContext)                         │
//! │     ├─ streams ─→ ParticleStreamAdapter::next_particle       │
//! │     ├─ frames  ─→ FrameBufferCompositor ─→ TileSink          │
//! │     ├─ cancel  ←─ AbortHandle (any thread)                   │
//! │     └─ progress ─→ crossbeam channel ─→ host                 │
//! │  TeardownScope (exactly once, also on unwind)                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Never render under the scene lock**
//! 2. **Teardown always runs** - streams, meshes and the image writer are
//!    released after the engine is reset
//! 3. **Abort means cancelled** - every error is reported as `Fail`

pub mod camera;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod light;
pub mod lock;
pub mod mesh;
pub mod output;
pub mod progress;
pub mod scene;
pub mod session;
pub mod snapshot;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use camera::{CameraProjection, CameraSetup};
pub use cancel::{AbortHandle, CancellationToken};
pub use config::{
    CameraEffects, CropWindow, DensitySettings, DepthOfField, ExrCompression, FilterKind,
    FilterSettings, ImageSettings, MarschnerParams, MotionBlur, OutputSettings,
    ParticleExportSettings, PhaseParams, RenderElements, RenderSettings, RenderType,
    RenderingMethod, SamplingSettings, SceneSettings, ShaderSettings, SpecularParams,
};
pub use engine::{forward_engine_log, EngineLogLevel, RenderContext, RenderEngine, StreamHandle};
pub use error::{
    ConfigError, EngineError, LockError, MeshError, OutputError, RenderOutcome, SessionError,
    SessionResult,
};
pub use light::{LightDescriptor, LightShape};
pub use lock::{SceneGuard, SceneLock};
pub use mesh::{MeshVisibility, TriangleMesh};
pub use output::{
    resolve_frame_path, resolve_frame_tokens, ImageOutput, OutputPlan, ParticleExport,
};
pub use progress::{progress_channel, ProgressRelay, ProgressUpdate, PROGRESS_CAPACITY};
pub use scene::{
    FovAxis, GroupMember, HostCamera, HostLight, HostLightKind, HostProjection, MeshSource,
    PointCloudNode, SceneGroup, SceneView, Transform,
};
pub use session::{RenderSession, SessionState, TeardownReport};
pub use snapshot::SnapshotStats;
