//! # Particle Stream Adapter
//!
//! Pull iterator over a [`TypedColumnStore`], implementing the engine's
//! particle-source contract.
//!
//! ```text
//! column[0] ──┐
//! column[1] ──┼──(copy at engine-assigned offsets)──> [ record bytes ]
//! column[n] ──┘                cursor++
//! ```
//!
//! The adapter is offset-agnostic: the engine assigns channel offsets when it
//! registers the source and hands them back as a [`RecordLayout`] on every
//! pull. Pulls against one stream must be sequential; the adapter holds no
//! lock, so an engine pulling several streams from worker threads must give
//! each stream to exactly one thread at a time (`&mut self` enforces this).

use crate::attribute::PointAttributeSource;
use crate::channel::ChannelDescriptor;
use crate::column::TypedColumnStore;
use crate::error::{StreamError, StreamResult};
use crate::mapping::ChannelMappingTable;

/// Byte offsets of each channel inside one engine particle record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    offsets: Vec<usize>,
    record_size: usize,
}

impl RecordLayout {
    /// Validates engine-assigned offsets against the channel widths.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::LayoutMismatch`] if the offset count differs
    /// from the channel count and [`StreamError::ChannelOverflow`] if any
    /// channel would write past the end of the record.
    pub fn new(
        channels: &[ChannelDescriptor],
        offsets: Vec<usize>,
        record_size: usize,
    ) -> StreamResult<Self> {
        if offsets.len() != channels.len() {
            return Err(StreamError::LayoutMismatch {
                layout: offsets.len(),
                stream: channels.len(),
            });
        }
        for (channel, &offset) in channels.iter().zip(&offsets) {
            let fits = matches!(
                offset.checked_add(channel.byte_width()),
                Some(end) if end <= record_size
            );
            if !fits {
                return Err(StreamError::ChannelOverflow {
                    channel: channel.name(),
                    offset,
                    record_size,
                });
            }
        }
        Ok(Self {
            offsets,
            record_size,
        })
    }

    /// Tightly packs the channels in order, with no padding.
    #[must_use]
    pub fn packed(channels: &[ChannelDescriptor]) -> Self {
        let mut offsets = Vec::with_capacity(channels.len());
        let mut cursor = 0;
        for channel in channels {
            offsets.push(cursor);
            cursor += channel.byte_width();
        }
        Self {
            offsets,
            record_size: cursor,
        }
    }

    /// Offset of each channel, in channel order.
    #[must_use]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Size in bytes of one record.
    #[must_use]
    pub const fn record_size(&self) -> usize {
        self.record_size
    }
}

/// The engine's particle-source contract.
pub trait ParticleSource: Send {
    /// Channels every record carries, in order.
    fn channels(&self) -> &[ChannelDescriptor];

    /// Total number of particles the source yields per pass.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NotScanned`] if the source was never scanned.
    fn particle_count(&self) -> StreamResult<u64>;

    /// Writes the next particle into `record` and advances.
    ///
    /// Returns `false` once, on the call after the last particle; nothing is
    /// written on that call.
    fn next_particle(&mut self, layout: &RecordLayout, record: &mut [u8]) -> bool;

    /// Rewinds to the first particle. Idempotent.
    fn close(&mut self);
}

/// Particle source backed by columns captured from one host point cloud.
#[derive(Debug)]
pub struct ParticleStreamAdapter {
    name: String,
    store: Option<TypedColumnStore>,
    channels: Vec<ChannelDescriptor>,
    cursor: u64,
}

impl ParticleStreamAdapter {
    /// Creates an adapter that has not scanned any channels yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: None,
            channels: Vec::new(),
            cursor: 0,
        }
    }

    /// Creates an adapter and scans `source` immediately.
    #[must_use]
    pub fn from_source<S>(source: &S, table: &ChannelMappingTable) -> Self
    where
        S: PointAttributeSource + ?Sized,
    {
        let mut adapter = Self::new(source.name());
        adapter.scan(source, table);
        adapter
    }

    /// Extracts every mappable attribute of `source` into owned columns.
    ///
    /// Rescanning replaces the previous columns and rewinds the cursor.
    pub fn scan<S>(&mut self, source: &S, table: &ChannelMappingTable)
    where
        S: PointAttributeSource + ?Sized,
    {
        let store = TypedColumnStore::scan(source, table);
        self.channels = store.descriptors();
        self.store = Some(store);
        self.cursor = 0;
    }

    /// Host name of the scanned object.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the channel scan has completed.
    #[must_use]
    pub const fn is_scanned(&self) -> bool {
        self.store.is_some()
    }

    /// Captured columns, if scanned.
    #[must_use]
    pub const fn store(&self) -> Option<&TypedColumnStore> {
        self.store.as_ref()
    }

    /// Index of the next particle to be pulled.
    #[must_use]
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Builds a tightly packed layout for this stream's channels.
    #[must_use]
    pub fn packed_layout(&self) -> RecordLayout {
        RecordLayout::packed(&self.channels)
    }
}

impl ParticleSource for ParticleStreamAdapter {
    fn channels(&self) -> &[ChannelDescriptor] {
        &self.channels
    }

    fn particle_count(&self) -> StreamResult<u64> {
        self.store
            .as_ref()
            .map(|store| store.particle_count() as u64)
            .ok_or_else(|| StreamError::NotScanned {
                stream: self.name.clone(),
            })
    }

    fn next_particle(&mut self, layout: &RecordLayout, record: &mut [u8]) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        debug_assert_eq!(layout.offsets().len(), self.channels.len());
        if record.len() < layout.record_size() {
            tracing::warn!(
                stream = %self.name,
                buffer = record.len(),
                record_size = layout.record_size(),
                "record buffer smaller than layout"
            );
            return false;
        }

        let count = store.particle_count() as u64;
        if self.cursor >= count {
            self.cursor = count + 1;
            return false;
        }

        #[allow(clippy::cast_possible_truncation)]
        let index = self.cursor as usize;
        for (column, &offset) in store.columns().iter().zip(layout.offsets()) {
            column.copy_into(index, &mut record[offset..]);
        }
        self.cursor += 1;
        true
    }

    fn close(&mut self) {
        self.cursor = 0;
    }
}
