//! # PLUME Core - Particle Streaming
//!
//! Converts heterogeneously typed, named per-point host attributes into the
//! render engine's fixed-schema particle records.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    PARTICLE STREAMING                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Host attributes → ChannelMappingTable → TypedColumnStore    │
//! │                                              ↓               │
//! │                       ParticleStreamAdapter (pull, rewind)   │
//! │                                              ↓               │
//! │                       engine record bytes at engine offsets  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Columns are extracted once** - at scan time, never per particle
//! 2. **Kinds are resolved once** - the per-particle copy is a table lookup
//! 3. **No allocations per pull** - records are written into engine buffers
//!
//! ## Example
//!
//! ```rust,ignore
//! use plume_core::{ChannelMappingTable, ParticleSource, ParticleStreamAdapter};
//!
//! let mut stream = ParticleStreamAdapter::from_source(&cloud, ChannelMappingTable::global());
//! let layout = stream.packed_layout();
//! let mut record = vec![0u8; layout.record_size()];
//! while stream.next_particle(&layout, &mut record) {
//!     // hand `record` to the engine
//! }
//! ```

pub mod attribute;
pub mod channel;
pub mod column;
pub mod error;
pub mod mapping;
pub mod stream;

pub use attribute::{
    AttributeContext, AttributeInfo, AttributeType, AttributeValues, AxisAngle,
    PointAttributeSource,
};
pub use channel::{ChannelDescriptor, ChannelKind, StorageType};
pub use column::{kind_for, AttributeColumn, TypedColumnStore};
pub use error::{StreamError, StreamResult};
pub use mapping::ChannelMappingTable;
pub use stream::{ParticleSource, ParticleStreamAdapter, RecordLayout};
