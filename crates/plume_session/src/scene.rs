//! # Host Scene Contracts
//!
//! What the session reads from the host while the scene lock is held. Host
//! adapters implement [`SceneView`]; everything returned borrows from the
//! locked scene and must not outlive the snapshot.

use plume_core::PointAttributeSource;

/// A 4x4 world transform, row-major, translation in the last row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Matrix rows.
    pub rows: [[f32; 4]; 4],
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Narrows a double precision host matrix.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(rows: [[f64; 4]; 4]) -> Self {
        Self {
            rows: rows.map(|row| row.map(|v| v as f32)),
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut transform = Self::IDENTITY;
        transform.rows[3] = [x, y, z, 1.0];
        transform
    }

    /// Translation component.
    #[must_use]
    pub const fn position(&self) -> [f32; 3] {
        [self.rows[3][0], self.rows[3][1], self.rows[3][2]]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Host polygon mesh geometry.
pub trait MeshSource {
    /// Host object name.
    fn name(&self) -> &str;

    /// Vertex positions, flattened xyz triples.
    fn vertex_positions(&self) -> Vec<f64>;

    /// Triangulated face indices, flattened triples.
    fn triangle_indices(&self) -> Vec<i64>;
}

/// Host light type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostLightKind {
    /// Omnidirectional.
    Point,
    /// Infinite, parallel rays.
    Directional,
    /// Cone light.
    Spot {
        /// Full cone angle in degrees.
        cone_angle: f32,
    },
    /// A type code the bridge does not translate.
    Unsupported(i32),
}

/// A host light as read from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HostLight {
    /// Host object name.
    pub name: String,
    /// Light type.
    pub kind: HostLightKind,
    /// Per-channel energy.
    pub energy: [f32; 3],
    /// Energy multiplier.
    pub intensity: f32,
    /// Falloff exponent.
    pub falloff_exponent: f32,
    /// World transform.
    pub transform: Transform,
}

/// Which axis a perspective field of view spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FovAxis {
    /// Field of view spans the image height.
    Vertical,
    /// Field of view spans the image width.
    Horizontal,
}

/// Host camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostProjection {
    /// Orthographic, sized by its view height.
    Orthographic {
        /// View height in world units.
        ortho_height: f32,
    },
    /// Perspective.
    Perspective {
        /// Field of view in degrees.
        fov_degrees: f32,
        /// Axis `fov_degrees` spans.
        axis: FovAxis,
    },
}

/// The render camera as read from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCamera {
    /// Host object name.
    pub name: String,
    /// Projection.
    pub projection: HostProjection,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Pixel aspect ratio.
    pub pixel_aspect: f32,
    /// World transform.
    pub transform: Transform,
}

/// A point-cloud object in the scene.
pub struct PointCloudNode<'a> {
    /// Full host path of the object.
    pub path: String,
    /// Attribute access.
    pub source: &'a dyn PointAttributeSource,
    /// World transform.
    pub transform: Transform,
}

/// One member of a host group.
pub enum GroupMember<'a> {
    /// A polygon mesh.
    PolygonMesh {
        /// Mesh geometry.
        mesh: &'a dyn MeshSource,
        /// World transform.
        transform: Transform,
    },
    /// A light.
    Light(HostLight),
    /// Anything else.
    Other {
        /// Host object name.
        name: String,
        /// Host type name.
        type_name: String,
    },
}

impl GroupMember<'_> {
    /// Host name of the member.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::PolygonMesh { mesh, .. } => mesh.name(),
            Self::Light(light) => &light.name,
            Self::Other { name, .. } => name,
        }
    }
}

/// A named host group.
pub struct SceneGroup<'a> {
    /// Group name.
    pub name: String,
    /// Members in host order.
    pub members: Vec<GroupMember<'a>>,
}

/// Read access to the host scene graph.
pub trait SceneView {
    /// Every point-cloud object, in host order.
    fn point_clouds(&self) -> Vec<PointCloudNode<'_>>;

    /// Every group of the scene root.
    fn groups(&self) -> Vec<SceneGroup<'_>>;

    /// Every light in the scene.
    fn lights(&self) -> Vec<HostLight>;

    /// The render camera.
    fn camera(&self) -> Option<HostCamera>;
}
