//! # Stream Error Types
//!
//! All errors that can occur while scanning or pulling particle streams.

use thiserror::Error;

/// Errors that can occur in the particle streaming adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// `particle_count` was queried before the channel scan completed.
    #[error("particle count requested before channels were scanned on stream {stream}")]
    NotScanned {
        /// Name of the stream that was queried.
        stream: String,
    },

    /// A host attribute column did not match the point count.
    #[error("attribute {attribute} has {actual} values, expected {expected}")]
    ColumnLength {
        /// Host attribute name.
        attribute: String,
        /// Number of points on the cloud.
        expected: usize,
        /// Number of values the host returned.
        actual: usize,
    },

    /// The record layout does not match the stream's channel set.
    #[error("record layout describes {layout} channels, stream has {stream}")]
    LayoutMismatch {
        /// Channels in the layout.
        layout: usize,
        /// Channels on the stream.
        stream: usize,
    },

    /// A channel does not fit inside the engine record.
    #[error("channel {channel} at offset {offset} overflows a {record_size}-byte record")]
    ChannelOverflow {
        /// Engine channel name.
        channel: &'static str,
        /// Offset the engine assigned.
        offset: usize,
        /// Size of one record.
        record_size: usize,
    },
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
