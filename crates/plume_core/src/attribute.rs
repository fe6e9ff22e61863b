//! # Host Attribute Model
//!
//! What the host exposes about a point cloud: named attributes, each with a
//! data type and evaluation context, and a query returning one value per point.

/// Data type tag of a host attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 32-bit float.
    Float32,
    /// 2-component float vector.
    Vec2,
    /// 3-component float vector.
    Vec3,
    /// 4-component float vector.
    Vec4,
    /// Quaternion, x,y,z,w.
    Quat,
    /// RGBA color.
    Color4,
    /// Axis-angle rotation.
    Rotation,
    /// 3x3 matrix (not streamable).
    Matrix3,
    /// 4x4 matrix (not streamable).
    Matrix4,
    /// String (not streamable).
    String,
}

/// Evaluation context of a host attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeContext {
    /// One value per point.
    PerPoint,
    /// One value for the whole object.
    Singleton,
    /// Per-edge, per-polygon or per-sample data.
    Other,
}

/// Metadata for one host attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Attribute name as the host spells it.
    pub name: String,
    /// Data type tag.
    pub data_type: AttributeType,
    /// Evaluation context.
    pub context: AttributeContext,
    /// Whether the attribute currently holds data.
    pub defined: bool,
}

impl AttributeInfo {
    /// Creates metadata for a defined per-point attribute.
    #[must_use]
    pub fn per_point(name: impl Into<String>, data_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            data_type,
            context: AttributeContext::PerPoint,
            defined: true,
        }
    }
}

/// Axis-angle rotation as hosts typically store it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisAngle {
    /// Rotation axis (need not be normalized).
    pub axis: [f32; 3],
    /// Angle in radians.
    pub angle: f32,
}

impl AxisAngle {
    /// Converts to a unit quaternion in x,y,z,w order.
    ///
    /// A zero-length axis yields the identity rotation.
    #[must_use]
    pub fn to_quat_xyzw(self) -> [f32; 4] {
        let [x, y, z] = self.axis;
        let len = (x * x + y * y + z * z).sqrt();
        if len <= f32::EPSILON {
            return [0.0, 0.0, 0.0, 1.0];
        }
        let half = self.angle * 0.5;
        let s = half.sin() / len;
        [x * s, y * s, z * s, half.cos()]
    }
}

/// One column of host attribute values.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValues {
    /// Boolean values.
    Bool(Vec<bool>),
    /// Integer values.
    Int32(Vec<i32>),
    /// Float values.
    Float32(Vec<f32>),
    /// 2-vectors.
    Vec2(Vec<[f32; 2]>),
    /// 3-vectors.
    Vec3(Vec<[f32; 3]>),
    /// 4-vectors.
    Vec4(Vec<[f32; 4]>),
    /// Quaternions, x,y,z,w.
    Quat(Vec<[f32; 4]>),
    /// RGBA colors.
    Color4(Vec<[f32; 4]>),
    /// Axis-angle rotations.
    Rotation(Vec<AxisAngle>),
}

impl AttributeValues {
    /// Number of values in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) | Self::Quat(v) | Self::Color4(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Host-side point cloud that exposes per-point attributes.
pub trait PointAttributeSource {
    /// Full host name of the object, for diagnostics.
    fn name(&self) -> &str;

    /// Number of points.
    fn point_count(&self) -> usize;

    /// Metadata of every attribute on the object, in host order.
    fn attributes(&self) -> Vec<AttributeInfo>;

    /// Values of one attribute, one per point.
    ///
    /// Returns `None` if the attribute does not exist or holds no data.
    fn values(&self, attribute: &str) -> Option<AttributeValues>;
}
