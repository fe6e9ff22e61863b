//! # Typed Column Store
//!
//! One-time extraction of the mappable per-point attributes of a point cloud
//! into owned, contiguous byte columns.
//!
//! Each column is a frozen snapshot: edits the host makes after the scan are
//! not visible to an already-scanned stream. Values are stored in the exact
//! byte layout the engine expects, so pulling a particle is a plain copy.

use crate::attribute::{AttributeContext, AttributeType, AttributeValues, PointAttributeSource};
use crate::channel::{ChannelDescriptor, ChannelKind};
use crate::error::{StreamError, StreamResult};
use crate::mapping::ChannelMappingTable;

/// Channel kind a host attribute type is stored as, if it is streamable.
#[must_use]
pub const fn kind_for(data_type: AttributeType) -> Option<ChannelKind> {
    match data_type {
        AttributeType::Bool => Some(ChannelKind::Bool),
        AttributeType::Int32 => Some(ChannelKind::Int32),
        AttributeType::Float32 => Some(ChannelKind::Float32),
        AttributeType::Vec2 => Some(ChannelKind::Vec2),
        AttributeType::Vec3 => Some(ChannelKind::Vec3),
        AttributeType::Vec4 => Some(ChannelKind::Vec4),
        AttributeType::Quat => Some(ChannelKind::Quat),
        AttributeType::Color4 => Some(ChannelKind::Color),
        AttributeType::Rotation => Some(ChannelKind::Rotation),
        AttributeType::Matrix3 | AttributeType::Matrix4 | AttributeType::String => None,
    }
}

const fn kind_of_values(values: &AttributeValues) -> ChannelKind {
    match values {
        AttributeValues::Bool(_) => ChannelKind::Bool,
        AttributeValues::Int32(_) => ChannelKind::Int32,
        AttributeValues::Float32(_) => ChannelKind::Float32,
        AttributeValues::Vec2(_) => ChannelKind::Vec2,
        AttributeValues::Vec3(_) => ChannelKind::Vec3,
        AttributeValues::Vec4(_) => ChannelKind::Vec4,
        AttributeValues::Quat(_) => ChannelKind::Quat,
        AttributeValues::Color4(_) => ChannelKind::Color,
        AttributeValues::Rotation(_) => ChannelKind::Rotation,
    }
}

/// Owned, contiguous raw values of one channel.
#[derive(Debug, Clone)]
pub struct AttributeColumn {
    attribute: String,
    kind: ChannelKind,
    descriptor: ChannelDescriptor,
    bytes: Vec<u8>,
}

impl AttributeColumn {
    /// Converts host values into engine byte layout.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ColumnLength`] if the host returned a different
    /// number of values than the cloud has points.
    pub fn extract(
        attribute: &str,
        engine_name: &'static str,
        values: &AttributeValues,
        expected: usize,
    ) -> StreamResult<Self> {
        if values.len() != expected {
            return Err(StreamError::ColumnLength {
                attribute: attribute.to_owned(),
                expected,
                actual: values.len(),
            });
        }

        let bytes: Vec<u8> = match values {
            AttributeValues::Bool(v) => v.iter().map(|&b| u8::from(b)).collect(),
            AttributeValues::Int32(v) => bytemuck::cast_slice(v).to_vec(),
            AttributeValues::Float32(v) => bytemuck::cast_slice(v).to_vec(),
            AttributeValues::Vec2(v) => bytemuck::cast_slice(v).to_vec(),
            AttributeValues::Vec3(v) => bytemuck::cast_slice(v).to_vec(),
            AttributeValues::Vec4(v) | AttributeValues::Quat(v) => bytemuck::cast_slice(v).to_vec(),
            AttributeValues::Color4(v) => {
                let rgb: Vec<[f32; 3]> = v.iter().map(|c| [c[0], c[1], c[2]]).collect();
                bytemuck::cast_slice(&rgb).to_vec()
            }
            AttributeValues::Rotation(v) => {
                let quats: Vec<[f32; 4]> = v.iter().map(|r| r.to_quat_xyzw()).collect();
                bytemuck::cast_slice(&quats).to_vec()
            }
        };

        let kind = kind_of_values(values);
        Ok(Self {
            attribute: attribute.to_owned(),
            kind,
            descriptor: kind.descriptor(engine_name),
            bytes,
        })
    }

    /// Host attribute this column was captured from.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Engine channel descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ChannelDescriptor {
        &self.descriptor
    }

    /// Kind tag resolved at scan time.
    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.byte_width()
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw bytes of the value at `index`.
    #[must_use]
    pub fn value_bytes(&self, index: usize) -> Option<&[u8]> {
        let width = self.kind.byte_width();
        let start = index.checked_mul(width)?;
        self.bytes.get(start..start + width)
    }

    /// Copies the value at `index` to the front of `dst`.
    ///
    /// `index` must be below [`len`](Self::len) and `dst` at least one
    /// value wide; both hold by construction inside the stream adapter.
    #[inline]
    pub(crate) fn copy_into(&self, index: usize, dst: &mut [u8]) {
        let width = self.kind.byte_width();
        (self.kind.copier())(&self.bytes[index * width..], dst);
    }
}

/// Columns captured from one point cloud.
#[derive(Debug, Clone, Default)]
pub struct TypedColumnStore {
    columns: Vec<AttributeColumn>,
    count: usize,
}

impl TypedColumnStore {
    /// Scans a point cloud and extracts every mappable attribute.
    ///
    /// Attributes are skipped (never failing the scan) when they are
    /// undefined, not per-point, of an unsupported type, not in the mapping
    /// table, alias an engine channel that is already taken, or return a
    /// column of the wrong length.
    pub fn scan<S>(source: &S, table: &ChannelMappingTable) -> Self
    where
        S: PointAttributeSource + ?Sized,
    {
        let count = source.point_count();
        if count == 0 {
            tracing::info!(cloud = source.name(), "point cloud is empty, skipping channel mapping");
            return Self::default();
        }

        let mut columns: Vec<AttributeColumn> = Vec::new();
        for info in source.attributes() {
            if !info.defined || info.context != AttributeContext::PerPoint {
                continue;
            }
            let Some(kind) = kind_for(info.data_type) else {
                tracing::debug!(
                    attribute = %info.name,
                    data_type = ?info.data_type,
                    "unsupported attribute type"
                );
                continue;
            };
            let Some(engine_name) = table.resolve(&info.name) else {
                continue;
            };
            if columns.iter().any(|c| c.descriptor.name() == engine_name) {
                tracing::debug!(
                    attribute = %info.name,
                    channel = engine_name,
                    "channel already mapped by an alias"
                );
                continue;
            }
            let Some(values) = source.values(&info.name) else {
                tracing::warn!(
                    cloud = source.name(),
                    attribute = %info.name,
                    "attribute reported but returned no values"
                );
                continue;
            };
            if kind_of_values(&values) != kind {
                tracing::warn!(
                    cloud = source.name(),
                    attribute = %info.name,
                    declared = ?info.data_type,
                    "attribute values do not match declared type"
                );
                continue;
            }

            match AttributeColumn::extract(&info.name, engine_name, &values, count) {
                Ok(column) => {
                    tracing::debug!(
                        attribute = %info.name,
                        channel = engine_name,
                        "mapping channel"
                    );
                    columns.push(column);
                }
                Err(error) => {
                    tracing::warn!(cloud = source.name(), %error, "skipping attribute");
                }
            }
        }

        Self { columns, count }
    }

    /// Captured columns, in channel order.
    #[must_use]
    pub fn columns(&self) -> &[AttributeColumn] {
        &self.columns
    }

    /// Engine descriptors of every column, in channel order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<ChannelDescriptor> {
        self.columns.iter().map(|c| c.descriptor).collect()
    }

    /// Finds a column by engine channel name.
    #[must_use]
    pub fn column(&self, channel: &str) -> Option<&AttributeColumn> {
        self.columns.iter().find(|c| c.descriptor.name() == channel)
    }

    /// Number of particles every column holds.
    #[must_use]
    pub const fn particle_count(&self) -> usize {
        self.count
    }
}
