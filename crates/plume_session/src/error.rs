//! # Session Error Types
//!
//! Every failure that can end a render session, and the host-visible
//! outcome each one maps to.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result reported back to the host for one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderOutcome {
    /// The render completed.
    Ok,
    /// The user cancelled the render.
    Abort,
    /// Any error.
    Fail,
}

/// Settings could not be loaded or are inconsistent.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings text is not valid TOML for the settings schema.
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Width or height is zero.
    #[error("image resolution must be nonzero, got {width}x{height}")]
    ZeroResolution {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },

    /// Crop window reaches outside the image.
    #[error(
        "crop window {width}x{height}+{left}+{bottom} exceeds {image_width}x{image_height} image"
    )]
    CropOutOfBounds {
        /// Crop left edge.
        left: u32,
        /// Crop bottom edge.
        bottom: u32,
        /// Crop width.
        width: u32,
        /// Crop height.
        height: u32,
        /// Image width.
        image_width: u32,
        /// Image height.
        image_height: u32,
    },

    /// A value that must be strictly positive is not.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Settings key.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
}

/// Persisted-output configuration is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    /// Path has no file extension.
    #[error("output path {path} has no extension, expected .{expected}")]
    MissingExtension {
        /// Offending path.
        path: PathBuf,
        /// Required extension.
        expected: &'static str,
    },

    /// Path has the wrong file extension.
    #[error("unsupported output file type .{extension} for {path}, expected .{expected}")]
    UnsupportedExtension {
        /// Offending path.
        path: PathBuf,
        /// Extension found.
        extension: String,
        /// Required extension.
        expected: &'static str,
    },

    /// Parent directory is missing or does not exist.
    #[error("output directory {directory} does not exist")]
    MissingDirectory {
        /// Directory that was checked.
        directory: PathBuf,
    },
}

/// The scene lock could not be acquired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("scene lock not acquired within {waited:?}")]
pub struct LockError {
    /// How long acquisition was attempted.
    pub waited: Duration,
}

/// Failure raised by the render engine during `render`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    /// Creates an engine error carrying the engine's message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The engine's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A triangle mesh could not be extracted from a host object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Vertex position array is not a whole number of xyz triples.
    #[error("mesh {mesh} has {len} position components, not a multiple of 3")]
    PositionArity {
        /// Host object name.
        mesh: String,
        /// Number of components.
        len: usize,
    },

    /// Index array is not a whole number of triangles.
    #[error("mesh {mesh} has {len} triangle indices, not a multiple of 3")]
    IndexArity {
        /// Host object name.
        mesh: String,
        /// Number of indices.
        len: usize,
    },

    /// A triangle references a vertex that does not exist.
    #[error("mesh {mesh} references vertex {index}, but has {vertex_count} vertices")]
    IndexOutOfRange {
        /// Host object name.
        mesh: String,
        /// Offending index.
        index: i64,
        /// Vertex count.
        vertex_count: usize,
    },
}

/// Errors that end a render session before or during rendering.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Scene lock acquisition failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Settings are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Output configuration is invalid.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The engine raised an error.
    #[error("render engine failed: {0}")]
    Engine(#[from] EngineError),

    /// The scene has no render camera.
    #[error("scene has no render camera")]
    MissingCamera,

    /// `process` was called after `term`.
    #[error("render session has been terminated")]
    Terminated,
}

impl SessionError {
    /// Host-visible outcome for this error.
    ///
    /// Every error is a failure; cancellation is not an error and never
    /// reaches this type.
    #[must_use]
    pub const fn outcome(&self) -> RenderOutcome {
        RenderOutcome::Fail
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
