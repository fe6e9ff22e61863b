//! Scene traversal performed while the scene lock is held.
//!
//! Per-object problems are logged and the object is skipped; only a missing
//! camera ends the traversal.

use std::sync::Arc;

use plume_core::{ChannelMappingTable, ParticleSource, ParticleStreamAdapter};
use tracing::{debug, info, warn};

use crate::camera::CameraSetup;
use crate::config::{RenderSettings, RenderingMethod};
use crate::engine::{RenderEngine, StreamHandle};
use crate::error::{SessionError, SessionResult};
use crate::light::LightDescriptor;
use crate::mesh::TriangleMesh;
use crate::output::ImageOutput;
use crate::scene::{GroupMember, HostLight, SceneView};

/// What one traversal registered with the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    /// Particle sources registered.
    pub particle_sources: usize,
    /// Point clouds skipped because they had no points.
    pub empty_clouds: usize,
    /// Occlusion meshes registered.
    pub meshes: usize,
    /// Lights registered.
    pub lights: usize,
    /// Objects skipped because of soft failures.
    pub skipped: usize,
}

/// Resources owned by the session until teardown.
#[derive(Debug, Default)]
pub(crate) struct Staged {
    pub(crate) streams: Vec<ParticleStreamAdapter>,
    pub(crate) meshes: Vec<Arc<TriangleMesh>>,
    pub(crate) image_output: Option<ImageOutput>,
}

/// Traverses the locked scene once and registers everything with `engine`.
pub(crate) fn capture<S, E>(
    scene: &S,
    settings: &RenderSettings,
    table: &ChannelMappingTable,
    engine: &mut E,
    staged: &mut Staged,
) -> SessionResult<SnapshotStats>
where
    S: SceneView + ?Sized,
    E: RenderEngine + ?Sized,
{
    let mut stats = SnapshotStats::default();

    let camera = scene.camera().ok_or(SessionError::MissingCamera)?;
    info!(camera = %camera.name, "using camera");
    engine.set_camera(&CameraSetup::resolve(
        &camera,
        settings.image.width,
        settings.image.height,
    ));

    for node in scene.point_clouds() {
        if node.source.point_count() == 0 {
            info!(cloud = %node.path, "skipping point cloud since particle count is 0");
            stats.empty_clouds += 1;
            continue;
        }
        info!(cloud = %node.path, "adding particle stream from point cloud");
        let stream = ParticleStreamAdapter::from_source(node.source, table);
        let handle = StreamHandle(staged.streams.len());
        engine.register_particle_source(handle, stream.channels(), &node.transform);
        staged.streams.push(stream);
        stats.particle_sources += 1;
    }

    let scene_settings = &settings.scene;
    let particle_method = settings.sampling.method == RenderingMethod::Particle;
    let use_light_group = scene_settings.use_light_group;

    if scene_settings.use_occlusion_meshes || use_light_group {
        let mut occlusion_found = false;
        let mut lights_found = false;
        for group in scene.groups() {
            if scene_settings.use_occlusion_meshes && group.name == scene_settings.occlusion_group {
                occlusion_found = true;
                if group.members.is_empty() {
                    warn!(group = %group.name, "occlusion group is empty");
                }
                for member in group.members {
                    match member {
                        GroupMember::PolygonMesh { mesh, transform } => {
                            match TriangleMesh::extract(mesh) {
                                Ok(mesh) => {
                                    info!(mesh = mesh.name(), "added occlusion mesh");
                                    let mesh = Arc::new(mesh);
                                    engine.register_mesh(Arc::clone(&mesh), &transform);
                                    staged.meshes.push(mesh);
                                    stats.meshes += 1;
                                }
                                Err(error) => {
                                    warn!(%error, "skipping occlusion mesh");
                                    stats.skipped += 1;
                                }
                            }
                        }
                        other => {
                            warn!(
                                object = other.name(),
                                "skipping object in occlusion group (it is not a polygon mesh)"
                            );
                            stats.skipped += 1;
                        }
                    }
                }
            } else if particle_method
                && use_light_group
                && group.name == scene_settings.light_group
            {
                lights_found = true;
                if group.members.is_empty() {
                    warn!(group = %group.name, "light group is empty");
                }
                for member in group.members {
                    match member {
                        GroupMember::Light(light) => {
                            if add_light(engine, &light) {
                                stats.lights += 1;
                            } else {
                                stats.skipped += 1;
                            }
                        }
                        other => debug!(object = other.name(), "ignoring non-light in light group"),
                    }
                }
            }
        }
        if scene_settings.use_occlusion_meshes && !occlusion_found {
            warn!(group = %scene_settings.occlusion_group, "occlusion group not found");
        }
        if particle_method && use_light_group && !lights_found {
            warn!(group = %scene_settings.light_group, "light group not found");
        }
    }

    if particle_method && !use_light_group {
        for light in scene.lights() {
            if add_light(engine, &light) {
                stats.lights += 1;
            } else {
                stats.skipped += 1;
            }
        }
    }

    debug!(?stats, "scene snapshot complete");
    Ok(stats)
}

fn add_light<E: RenderEngine + ?Sized>(engine: &mut E, light: &HostLight) -> bool {
    match LightDescriptor::from_host(light) {
        Some(descriptor) => {
            engine.register_light(&descriptor, &light.transform);
            true
        }
        None => {
            warn!(light = %light.name, kind = ?light.kind, "skipping unsupported light type");
            false
        }
    }
}
