//! # Channel Types
//!
//! Channels are the named, typed slots of the render engine's particle record.
//!
//! A channel's kind is resolved once, when the stream is scanned. From then on
//! the per-particle copy is a lookup into a table of fixed-width copy
//! functions, indexed by the kind tag. No type checks happen per particle.

/// Storage type of a single channel component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StorageType {
    /// Unsigned 8-bit integer (booleans are stored as 0 or 1).
    UInt8 = 0,
    /// Signed 32-bit integer.
    Int32 = 1,
    /// 32-bit float.
    Float32 = 2,
}

impl StorageType {
    /// Size in bytes of one component.
    #[inline]
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::Int32 | Self::Float32 => 4,
        }
    }
}

/// Describes one channel of the engine's particle record schema.
///
/// Immutable once a stream is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelDescriptor {
    name: &'static str,
    storage: StorageType,
    arity: u8,
}

impl ChannelDescriptor {
    /// Creates a descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `arity` is not in `1..=4`.
    #[must_use]
    pub const fn new(name: &'static str, storage: StorageType, arity: u8) -> Self {
        assert!(arity >= 1 && arity <= 4, "channel arity must be 1..=4");
        Self {
            name,
            storage,
            arity,
        }
    }

    /// Engine channel name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Component storage type.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> StorageType {
        self.storage
    }

    /// Number of components (1-4).
    #[inline]
    #[must_use]
    pub const fn arity(&self) -> u8 {
        self.arity
    }

    /// Size in bytes of one value of this channel.
    #[inline]
    #[must_use]
    pub const fn byte_width(&self) -> usize {
        self.storage.size_bytes() * self.arity as usize
    }
}

/// Closed set of channel kinds a host attribute can be mapped to.
///
/// The discriminant indexes [`COPY_TABLE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelKind {
    /// 1x uint8.
    Bool = 0,
    /// 1x int32.
    Int32 = 1,
    /// 1x float32.
    Float32 = 2,
    /// 2x float32.
    Vec2 = 3,
    /// 3x float32.
    Vec3 = 4,
    /// 4x float32.
    Vec4 = 5,
    /// 4x float32, x,y,z,w.
    Quat = 6,
    /// 3x float32. The host's alpha component is dropped: the engine's
    /// color channel is RGB only.
    Color = 7,
    /// 4x float32, stored as a quaternion in x,y,z,w order.
    Rotation = 8,
}

impl ChannelKind {
    /// Every kind, in discriminant order.
    pub const ALL: [Self; 9] = [
        Self::Bool,
        Self::Int32,
        Self::Float32,
        Self::Vec2,
        Self::Vec3,
        Self::Vec4,
        Self::Quat,
        Self::Color,
        Self::Rotation,
    ];

    /// Storage type the engine sees for this kind.
    #[must_use]
    pub const fn storage(self) -> StorageType {
        match self {
            Self::Bool => StorageType::UInt8,
            Self::Int32 => StorageType::Int32,
            _ => StorageType::Float32,
        }
    }

    /// Component count the engine sees for this kind.
    #[must_use]
    pub const fn arity(self) -> u8 {
        match self {
            Self::Bool | Self::Int32 | Self::Float32 => 1,
            Self::Vec2 => 2,
            Self::Vec3 | Self::Color => 3,
            Self::Vec4 | Self::Quat | Self::Rotation => 4,
        }
    }

    /// Size in bytes of one value.
    #[inline]
    #[must_use]
    pub const fn byte_width(self) -> usize {
        self.storage().size_bytes() * self.arity() as usize
    }

    /// Builds the engine-facing descriptor for this kind.
    #[must_use]
    pub const fn descriptor(self, name: &'static str) -> ChannelDescriptor {
        ChannelDescriptor::new(name, self.storage(), self.arity())
    }

    /// Fixed-width copy function for this kind.
    #[inline]
    pub(crate) fn copier(self) -> CopyFn {
        COPY_TABLE[self as usize]
    }
}

/// Copies exactly one channel value from `src` into the front of `dst`.
pub(crate) type CopyFn = fn(&[u8], &mut [u8]);

#[inline]
fn copy_fixed<const N: usize>(src: &[u8], dst: &mut [u8]) {
    dst[..N].copy_from_slice(&src[..N]);
}

/// Copy functions indexed by [`ChannelKind`] discriminant.
const COPY_TABLE: [CopyFn; 9] = [
    copy_fixed::<1>,
    copy_fixed::<4>,
    copy_fixed::<4>,
    copy_fixed::<8>,
    copy_fixed::<12>,
    copy_fixed::<16>,
    copy_fixed::<16>,
    copy_fixed::<12>,
    copy_fixed::<16>,
];
