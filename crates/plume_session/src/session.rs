//! # Render Session
//!
//! One host render call, start to finish.
//!
//! ```text
//! Idle ──> Configuring ──> Snapshotting ──> Rendering ──┬──> Completed ──┐
//!               │          (scene locked)  (unlocked)   ├──> Cancelled ──┼──> TornDown
//!               │                │                      └──> Failed ─────┤
//!               └────────────────┴──── any error ──────────> Failed ─────┘
//! ```
//!
//! ## Rules
//!
//! 1. The scene lock is released before `RenderEngine::render` is called.
//! 2. Teardown runs exactly once on every exit path, unwinding included.
//! 3. `Abort` is reported only when the render observed cancellation.

use std::fmt;

use crossbeam_channel::Receiver;
use plume_compositor::{FrameBufferCompositor, TileSink};
use plume_core::ChannelMappingTable;
use tracing::{debug, error, info};

use crate::cancel::{AbortHandle, CancellationToken};
use crate::config::RenderSettings;
use crate::engine::{RenderContext, RenderEngine};
use crate::error::{RenderOutcome, SessionError, SessionResult};
use crate::lock::SceneLock;
use crate::output::OutputPlan;
use crate::progress::{progress_channel, ProgressRelay, ProgressUpdate, PROGRESS_CAPACITY};
use crate::scene::SceneView;
use crate::snapshot::{self, SnapshotStats, Staged};

/// Lifecycle state of one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing started.
    Idle,
    /// Settings and outputs are being applied.
    Configuring,
    /// The scene lock is held and the scene is being traversed.
    Snapshotting,
    /// The engine is rendering; the scene lock is released.
    Rendering,
    /// The engine finished.
    Completed,
    /// The engine stopped on cancellation.
    Cancelled,
    /// An error ended the session.
    Failed,
    /// Resources were released.
    TornDown,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Snapshotting => "snapshotting",
            Self::Rendering => "rendering",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::TornDown => "torn_down",
        };
        f.write_str(name)
    }
}

impl SessionState {
    /// Whether the render reached an outcome.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Failed | Self::TornDown
        )
    }
}

/// State history of the latest `process` call.
#[derive(Debug, Clone, Default)]
struct Lifecycle {
    history: Vec<SessionState>,
    snapshot: Option<SnapshotStats>,
}

impl Lifecycle {
    fn start() -> Self {
        Self {
            history: vec![SessionState::Idle],
            snapshot: None,
        }
    }

    fn state(&self) -> SessionState {
        self.history.last().copied().unwrap_or(SessionState::Idle)
    }

    fn enter(&mut self, next: SessionState) {
        debug!(from = %self.state(), to = %next, "session state");
        self.history.push(next);
    }
}

/// What teardown released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Particle streams dropped.
    pub streams_released: usize,
    /// Occlusion meshes dropped.
    pub meshes_released: usize,
    /// Whether an image writer was detached.
    pub writer_closed: bool,
}

/// Owns everything registered with the engine during one `process` call.
///
/// Releasing resets the engine first, so it holds no registration that
/// points at a dropped stream or mesh. A scope dropped without
/// [`finish`](Self::finish), as when the engine panics, records `Failed`.
struct TeardownScope<'a, E: RenderEngine + ?Sized> {
    engine: &'a mut E,
    staged: Staged,
    lifecycle: &'a mut Lifecycle,
    report: &'a mut Option<TeardownReport>,
    done: bool,
}

impl<'a, E: RenderEngine + ?Sized> TeardownScope<'a, E> {
    fn new(
        engine: &'a mut E,
        lifecycle: &'a mut Lifecycle,
        report: &'a mut Option<TeardownReport>,
    ) -> Self {
        *report = None;
        Self {
            engine,
            staged: Staged::default(),
            lifecycle,
            report,
            done: false,
        }
    }

    fn release(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if !self.lifecycle.state().is_settled() {
            self.lifecycle.enter(SessionState::Failed);
        }

        self.engine.reset_state();
        let report = TeardownReport {
            streams_released: self.staged.streams.len(),
            meshes_released: self.staged.meshes.len(),
            writer_closed: self.staged.image_output.is_some(),
        };
        self.staged.streams.clear();
        self.staged.meshes.clear();
        if let Some(output) = self.staged.image_output.take() {
            debug!(path = %output.path.display(), "image writer closed");
        }
        debug!(
            streams = report.streams_released,
            meshes = report.meshes_released,
            "session resources released"
        );
        *self.report = Some(report);
        self.lifecycle.enter(SessionState::TornDown);
    }

    fn finish(mut self, result: &SessionResult<bool>) {
        self.lifecycle.enter(match result {
            Ok(true) => SessionState::Completed,
            Ok(false) => SessionState::Cancelled,
            Err(_) => SessionState::Failed,
        });
        self.release();
    }
}

impl<E: RenderEngine + ?Sized> Drop for TeardownScope<'_, E> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Borrowed session plumbing handed to the render context.
struct Plumbing<'a> {
    table: &'a ChannelMappingTable,
    cancel: &'a CancellationToken,
    progress: &'a ProgressRelay,
}

/// Drives renders of a host scene through a [`RenderEngine`].
///
/// The host calls [`init`](Self::init) once, then [`process`](Self::process)
/// per frame, [`abort`](Self::abort) from any thread to cancel, and
/// [`term`](Self::term) at shutdown.
pub struct RenderSession<E: RenderEngine> {
    engine: E,
    table: &'static ChannelMappingTable,
    cancel: CancellationToken,
    progress: ProgressRelay,
    progress_rx: Receiver<ProgressUpdate>,
    lifecycle: Lifecycle,
    last_teardown: Option<TeardownReport>,
    terminated: bool,
}

impl<E: RenderEngine> RenderSession<E> {
    /// Creates a session around `engine` using the global channel table.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self::with_progress_capacity(engine, PROGRESS_CAPACITY)
    }

    /// Creates a session whose progress channel holds `capacity` undrained
    /// updates.
    #[must_use]
    pub fn with_progress_capacity(engine: E, capacity: usize) -> Self {
        let (progress, progress_rx) = progress_channel(capacity);
        Self {
            engine,
            table: ChannelMappingTable::global(),
            cancel: CancellationToken::new(),
            progress,
            progress_rx,
            lifecycle: Lifecycle::start(),
            last_teardown: None,
            terminated: false,
        }
    }

    /// Host `Init`: readies the session for renders.
    pub fn init(&mut self) {
        self.cancel.reset();
        self.terminated = false;
        self.lifecycle = Lifecycle::start();
        info!("render session initialized");
    }

    /// Host `Process`: renders `frame` of the locked scene.
    ///
    /// Frames are delivered to `sink`. Errors are logged and reported as
    /// [`RenderOutcome::Fail`]; see [`try_process`](Self::try_process) for
    /// the error itself.
    pub fn process<S: SceneView>(
        &mut self,
        scene: &SceneLock<S>,
        settings: &RenderSettings,
        frame: i32,
        sink: &mut dyn TileSink,
    ) -> RenderOutcome {
        match self.try_process(scene, settings, frame, sink) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, frame, "render failed");
                e.outcome()
            }
        }
    }

    /// Like [`process`](Self::process), returning the error that ended the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for lock, configuration, output, camera or
    /// engine failures. A cancelled render is `Ok(RenderOutcome::Abort)`.
    pub fn try_process<S: SceneView>(
        &mut self,
        scene: &SceneLock<S>,
        settings: &RenderSettings,
        frame: i32,
        sink: &mut dyn TileSink,
    ) -> SessionResult<RenderOutcome> {
        self.cancel.reset();
        self.lifecycle = Lifecycle::start();
        if self.terminated {
            self.lifecycle.enter(SessionState::Failed);
            return Err(SessionError::Terminated);
        }
        info!(
            frame,
            width = settings.image.width,
            height = settings.image.height,
            "render started"
        );

        let plumbing = Plumbing {
            table: self.table,
            cancel: &self.cancel,
            progress: &self.progress,
        };
        let mut scope =
            TeardownScope::new(&mut self.engine, &mut self.lifecycle, &mut self.last_teardown);
        let result = run(&mut scope, &plumbing, scene, settings, frame, sink);
        scope.finish(&result);

        let completed = result?;
        let outcome = if completed {
            RenderOutcome::Ok
        } else {
            RenderOutcome::Abort
        };
        info!(frame, ?outcome, "render finished");
        Ok(outcome)
    }

    /// Host `Abort`: requests that the running render stop.
    pub fn abort(&self) {
        info!("render abort requested");
        self.cancel.cancel();
    }

    /// A handle the host's abort callback can use from any thread.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.cancel.abort_handle()
    }

    /// Host `Cleanup`: drains pending progress updates.
    pub fn cleanup(&mut self) -> Vec<ProgressUpdate> {
        let updates = self.drain_progress();
        debug!(updates = updates.len(), "render session cleanup");
        updates
    }

    /// Host `Term`: shuts the session down. Later `process` calls fail.
    pub fn term(&mut self) {
        self.cancel.reset();
        self.terminated = true;
        info!("render session terminated");
    }

    /// Takes every progress update received so far.
    pub fn drain_progress(&self) -> Vec<ProgressUpdate> {
        self.progress_rx.try_iter().collect()
    }

    /// Progress updates as they arrive.
    #[must_use]
    pub const fn progress(&self) -> &Receiver<ProgressUpdate> {
        &self.progress_rx
    }

    /// The cancellation token renders observe.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Every state the latest `process` call passed through.
    #[must_use]
    pub fn history(&self) -> &[SessionState] {
        &self.lifecycle.history
    }

    /// What the latest snapshot registered, if one ran.
    #[must_use]
    pub const fn last_snapshot(&self) -> Option<SnapshotStats> {
        self.lifecycle.snapshot
    }

    /// What the latest teardown released.
    #[must_use]
    pub const fn last_teardown(&self) -> Option<TeardownReport> {
        self.last_teardown
    }

    /// Whether `term` was called.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine, mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Consumes the session, returning the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }
}

/// Configuring, snapshotting and rendering. `Ok(false)` is a cancelled render.
fn run<S, E>(
    scope: &mut TeardownScope<'_, E>,
    plumbing: &Plumbing<'_>,
    scene: &SceneLock<S>,
    settings: &RenderSettings,
    frame: i32,
    sink: &mut dyn TileSink,
) -> SessionResult<bool>
where
    S: SceneView,
    E: RenderEngine + ?Sized,
{
    scope.lifecycle.enter(SessionState::Configuring);
    settings.validate()?;
    let plan = OutputPlan::resolve(settings, frame)?;
    scope.engine.configure(settings)?;
    scope.engine.set_image_output(plan.image.as_ref());
    scope.staged.image_output = plan.image;
    if let Some(export) = &plan.particle_export {
        scope.engine.save_particle_export(export);
    }
    if plan.render_image {
        scope
            .engine
            .set_resolution(settings.image.width, settings.image.height);
    }

    scope.lifecycle.enter(SessionState::Snapshotting);
    let guard = scene.acquire(settings.scene.lock_timeout())?;
    let stats = snapshot::capture(
        &*guard,
        settings,
        plumbing.table,
        &mut *scope.engine,
        &mut scope.staged,
    );
    guard.release();
    scope.lifecycle.snapshot = Some(stats?);

    scope.lifecycle.enter(SessionState::Rendering);
    let mut compositor = FrameBufferCompositor::new(settings.image.tile());
    if plan.render_image {
        compositor.begin_frame(settings.image.width, settings.image.height, &mut *sink);
    }
    let sink: &mut dyn TileSink = sink;
    let frames = if plan.render_image {
        Some((&mut compositor, sink))
    } else {
        None
    };
    let mut ctx = RenderContext::new(
        &mut scope.staged.streams,
        frames,
        plumbing.cancel,
        plumbing.progress,
    );
    let completed = scope.engine.render(&mut ctx)?;
    if !completed {
        info!("render aborted");
    }
    debug!(
        delivered = compositor.stats().delivered,
        rejected = compositor.stats().rejected,
        "frame delivery"
    );
    Ok(completed)
}
