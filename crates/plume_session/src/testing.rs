//! # Test Doubles
//!
//! In-memory host scene, a scripted render engine and a collecting tile
//! sink. Compiled for this crate's tests and behind the `test-utils` feature
//! for downstream tests.

#![allow(missing_docs)]

use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use plume_compositor::{FrameFragment, LinearPixel, TileSink};
use plume_core::{
    AttributeInfo, AttributeType, AttributeValues, ChannelDescriptor, ParticleSource,
    PointAttributeSource, RecordLayout,
};

use crate::camera::CameraSetup;
use crate::cancel::AbortHandle;
use crate::config::RenderSettings;
use crate::engine::{EngineLogLevel, RenderContext, RenderEngine, StreamHandle};
use crate::error::EngineError;
use crate::light::LightDescriptor;
use crate::mesh::TriangleMesh;
use crate::output::{ImageOutput, ParticleExport};
use crate::scene::{
    FovAxis, GroupMember, HostCamera, HostLight, HostLightKind, HostProjection, MeshSource,
    PointCloudNode, SceneGroup, SceneView, Transform,
};

// ============================================================================
// SCENE
// ============================================================================

/// A point cloud held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPointCloud {
    pub name: String,
    pub count: usize,
    pub attributes: Vec<(AttributeInfo, AttributeValues)>,
}

impl MemoryPointCloud {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            attributes: Vec::new(),
        }
    }

    /// Adds a per-point attribute whose type follows the values.
    #[must_use]
    pub fn with(mut self, name: &str, values: AttributeValues) -> Self {
        let data_type = match &values {
            AttributeValues::Bool(_) => AttributeType::Bool,
            AttributeValues::Int32(_) => AttributeType::Int32,
            AttributeValues::Float32(_) => AttributeType::Float32,
            AttributeValues::Vec2(_) => AttributeType::Vec2,
            AttributeValues::Vec3(_) => AttributeType::Vec3,
            AttributeValues::Vec4(_) => AttributeType::Vec4,
            AttributeValues::Quat(_) => AttributeType::Quat,
            AttributeValues::Color4(_) => AttributeType::Color4,
            AttributeValues::Rotation(_) => AttributeType::Rotation,
        };
        self.attributes
            .push((AttributeInfo::per_point(name, data_type), values));
        self
    }

    /// Adds an attribute with explicit metadata.
    #[must_use]
    pub fn with_info(mut self, info: AttributeInfo, values: AttributeValues) -> Self {
        self.attributes.push((info, values));
        self
    }

    /// A cloud with `count` points along the x axis.
    pub fn line(name: impl Into<String>, count: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let positions = (0..count).map(|i| [i as f32, 0.0, 0.0]).collect();
        Self::new(name, count).with("PointPosition", AttributeValues::Vec3(positions))
    }
}

impl PointAttributeSource for MemoryPointCloud {
    fn name(&self) -> &str {
        &self.name
    }

    fn point_count(&self) -> usize {
        self.count
    }

    fn attributes(&self) -> Vec<AttributeInfo> {
        self.attributes.iter().map(|(info, _)| info.clone()).collect()
    }

    fn values(&self, attribute: &str) -> Option<AttributeValues> {
        self.attributes
            .iter()
            .find(|(info, _)| info.name == attribute)
            .map(|(_, values)| values.clone())
    }
}

/// A polygon mesh held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMesh {
    pub name: String,
    pub positions: Vec<f64>,
    pub indices: Vec<i64>,
}

impl MemoryMesh {
    /// A unit quad made of two triangles.
    pub fn quad(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

impl MeshSource for MemoryMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn vertex_positions(&self) -> Vec<f64> {
        self.positions.clone()
    }

    fn triangle_indices(&self) -> Vec<i64> {
        self.indices.clone()
    }
}

/// Owned group member.
#[derive(Debug, Clone)]
pub enum MemoryMember {
    Mesh(MemoryMesh, Transform),
    Light(HostLight),
    Other { name: String, type_name: String },
}

/// Owned group.
#[derive(Debug, Clone, Default)]
pub struct MemoryGroup {
    pub name: String,
    pub members: Vec<MemoryMember>,
}

/// A complete host scene held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    pub clouds: Vec<(MemoryPointCloud, Transform)>,
    pub groups: Vec<MemoryGroup>,
    pub lights: Vec<HostLight>,
    pub camera: Option<HostCamera>,
}

impl MemoryScene {
    /// An empty scene with a default perspective camera.
    pub fn with_camera() -> Self {
        Self {
            camera: Some(perspective_camera()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cloud(mut self, cloud: MemoryPointCloud) -> Self {
        self.clouds.push((cloud, Transform::IDENTITY));
        self
    }

    #[must_use]
    pub fn group(mut self, name: &str, members: Vec<MemoryMember>) -> Self {
        self.groups.push(MemoryGroup {
            name: name.to_string(),
            members,
        });
        self
    }

    #[must_use]
    pub fn light(mut self, light: HostLight) -> Self {
        self.lights.push(light);
        self
    }
}

impl SceneView for MemoryScene {
    fn point_clouds(&self) -> Vec<PointCloudNode<'_>> {
        self.clouds
            .iter()
            .map(|(cloud, transform)| PointCloudNode {
                path: format!("Scene_Root.{}", cloud.name),
                source: cloud,
                transform: *transform,
            })
            .collect()
    }

    fn groups(&self) -> Vec<SceneGroup<'_>> {
        self.groups
            .iter()
            .map(|group| SceneGroup {
                name: group.name.clone(),
                members: group
                    .members
                    .iter()
                    .map(|member| match member {
                        MemoryMember::Mesh(mesh, transform) => GroupMember::PolygonMesh {
                            mesh,
                            transform: *transform,
                        },
                        MemoryMember::Light(light) => GroupMember::Light(light.clone()),
                        MemoryMember::Other { name, type_name } => GroupMember::Other {
                            name: name.clone(),
                            type_name: type_name.clone(),
                        },
                    })
                    .collect(),
            })
            .collect()
    }

    fn lights(&self) -> Vec<HostLight> {
        self.lights.clone()
    }

    fn camera(&self) -> Option<HostCamera> {
        self.camera.clone()
    }
}

/// A 45 degree horizontal perspective camera at z = 10.
pub fn perspective_camera() -> HostCamera {
    HostCamera {
        name: "Camera".to_string(),
        projection: HostProjection::Perspective {
            fov_degrees: 45.0,
            axis: FovAxis::Horizontal,
        },
        near: 0.1,
        far: 1000.0,
        pixel_aspect: 1.0,
        transform: Transform::translation(0.0, 0.0, 10.0),
    }
}

/// A white point light.
pub fn point_light(name: &str) -> HostLight {
    HostLight {
        name: name.to_string(),
        kind: HostLightKind::Point,
        energy: [1.0, 1.0, 1.0],
        intensity: 1.0,
        falloff_exponent: 0.0,
        transform: Transform::translation(0.0, 5.0, 0.0),
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// What the [`RecordingEngine`] does inside `render`.
#[derive(Debug, Clone, Default)]
pub struct EngineScript {
    /// Fail with this message after pulling particles.
    pub fail_with: Option<String>,
    /// Panic with this message after pulling particles.
    pub panic_with: Option<&'static str>,
    /// Abort through this handle once this many particles were pulled.
    pub abort_after: Option<(usize, AbortHandle)>,
    /// Spin until cancelled, for at most this long.
    pub wait_for_cancel: Option<Duration>,
    /// Number of partial images delivered before the final one.
    pub partial_frames: usize,
    /// Return `Ok(false)` without observing cancellation.
    pub report_unsuccessful: bool,
}

/// A registered particle source.
#[derive(Debug, Clone)]
pub struct RegisteredSource {
    pub handle: StreamHandle,
    pub channels: Vec<ChannelDescriptor>,
    pub transform: Transform,
}

/// Render engine double that records every call.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub script: EngineScript,
    pub configured: usize,
    pub resolution: Option<(u32, u32)>,
    pub image_output: Option<ImageOutput>,
    pub particle_export: Option<ParticleExport>,
    pub camera: Option<CameraSetup>,
    pub sources: Vec<RegisteredSource>,
    pub lights: Vec<LightDescriptor>,
    /// Meshes held until `reset_state`.
    pub meshes: Vec<Arc<TriangleMesh>>,
    /// Every mesh ever registered.
    pub mesh_refs: Vec<Weak<TriangleMesh>>,
    /// Records pulled per stream, in order.
    pub pulled: Vec<Vec<Vec<u8>>>,
    pub frames_delivered: usize,
    pub renders: usize,
    pub resets: usize,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(script: EngineScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Total records pulled across all streams.
    pub fn pulled_count(&self) -> usize {
        self.pulled.iter().map(Vec::len).sum()
    }

    fn pull_all(&mut self, ctx: &mut RenderContext<'_>) -> bool {
        let cancel = ctx.cancellation();
        let mut total = 0usize;
        for source in &self.sources {
            let Some(stream) = ctx.stream(source.handle) else {
                continue;
            };
            let layout = RecordLayout::packed(&source.channels);
            let mut record = vec![0u8; layout.record_size()];
            let mut records = Vec::new();
            stream.close();
            while stream.next_particle(&layout, &mut record) {
                records.push(record.clone());
                total += 1;
                if let Some((limit, handle)) = &self.script.abort_after {
                    if total >= *limit {
                        handle.abort();
                    }
                }
                if cancel.is_cancelled() {
                    self.pulled.push(records);
                    return false;
                }
            }
            self.pulled.push(records);
        }
        true
    }

    #[allow(clippy::cast_precision_loss)]
    fn image(width: u32, height: u32, scale: f32) -> Vec<LinearPixel> {
        let n = (width * height) as usize;
        (0..n)
            .map(|i| {
                let v = scale * i as f32 / n.max(1) as f32;
                LinearPixel::new(v, v, v, scale)
            })
            .collect()
    }
}

impl RenderEngine for RecordingEngine {
    fn configure(&mut self, _settings: &RenderSettings) -> Result<(), EngineError> {
        self.configured += 1;
        Ok(())
    }

    fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = Some((width, height));
    }

    fn set_image_output(&mut self, output: Option<&ImageOutput>) {
        self.image_output = output.cloned();
    }

    fn save_particle_export(&mut self, export: &ParticleExport) {
        self.particle_export = Some(export.clone());
    }

    fn set_camera(&mut self, camera: &CameraSetup) {
        self.camera = Some(camera.clone());
    }

    fn register_particle_source(
        &mut self,
        handle: StreamHandle,
        channels: &[ChannelDescriptor],
        transform: &Transform,
    ) {
        self.sources.push(RegisteredSource {
            handle,
            channels: channels.to_vec(),
            transform: *transform,
        });
    }

    fn register_mesh(&mut self, mesh: Arc<TriangleMesh>, _transform: &Transform) {
        self.mesh_refs.push(Arc::downgrade(&mesh));
        self.meshes.push(mesh);
    }

    fn register_light(&mut self, light: &LightDescriptor, _transform: &Transform) {
        self.lights.push(light.clone());
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<bool, EngineError> {
        self.renders += 1;
        ctx.log(EngineLogLevel::Progress, "render started");
        ctx.progress("Loading particles", 0.0);

        if !self.pull_all(ctx) {
            ctx.log(EngineLogLevel::Warnings, "render cancelled while loading");
            return Ok(false);
        }
        if let Some(message) = self.script.panic_with {
            panic!("{message}");
        }
        if let Some(message) = &self.script.fail_with {
            ctx.log(EngineLogLevel::Errors, message);
            return Err(EngineError::new(message.clone()));
        }
        if let Some(limit) = self.script.wait_for_cancel {
            let deadline = Instant::now() + limit;
            while !ctx.is_cancelled() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            if ctx.is_cancelled() {
                return Ok(false);
            }
        }

        if let Some((width, height)) = self.resolution {
            let passes = self.script.partial_frames;
            for pass in 0..passes {
                #[allow(clippy::cast_precision_loss)]
                let scale = (pass + 1) as f32 / (passes + 1) as f32;
                ctx.deliver_frame(width, height, &Self::image(width, height, scale))
                    .map_err(|e| EngineError::new(e.to_string()))?;
                self.frames_delivered += 1;
                ctx.progress("Rendering", scale);
            }
            ctx.deliver_frame(width, height, &Self::image(width, height, 1.0))
                .map_err(|e| EngineError::new(e.to_string()))?;
            self.frames_delivered += 1;
        }

        ctx.progress("Rendering", 1.0);
        ctx.log(EngineLogLevel::Stats, "render finished");
        Ok(!self.script.report_unsuccessful)
    }

    fn reset_state(&mut self) {
        self.resets += 1;
        self.meshes.clear();
        self.resolution = None;
    }
}

// ============================================================================
// SINK
// ============================================================================

/// One fragment as the host received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFragment {
    pub width: u32,
    pub height: u32,
    /// Tile rows, row 0 first, RGBA8.
    pub rgba: Vec<u8>,
}

/// Tile sink that keeps a copy of every fragment.
#[derive(Debug, Default)]
pub struct CollectingTileSink {
    pub frames_begun: Vec<(u32, u32)>,
    pub fragments: Vec<CollectedFragment>,
}

impl CollectingTileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent fragment.
    pub fn last(&self) -> Option<&CollectedFragment> {
        self.fragments.last()
    }
}

impl TileSink for CollectingTileSink {
    fn begin_frame(&mut self, width: u32, height: u32) {
        self.frames_begun.push((width, height));
    }

    fn receive_fragment(&mut self, fragment: &FrameFragment<'_>) {
        if let Some(rgba) = fragment.to_rgba8() {
            self.fragments.push(CollectedFragment {
                width: fragment.width(),
                height: fragment.height(),
                rgba,
            });
        }
    }
}
