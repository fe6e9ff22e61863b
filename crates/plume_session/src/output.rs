//! # Persisted Output
//!
//! Resolves and validates file outputs before anything is handed to the
//! engine. Every error here is fatal and surfaces before the scene lock is
//! taken.
//!
//! | Request               | Region render | Otherwise                     |
//! |-----------------------|---------------|-------------------------------|
//! | image file output     | skipped       | `.exr`, directory must exist  |
//! | particle export       | skipped       | `.prt`, directory must exist; |
//! |                       |               | no image is rendered          |

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{ExrCompression, RenderSettings};
use crate::error::OutputError;

/// The only supported image file format.
pub const IMAGE_EXTENSION: &str = "exr";

/// The only supported particle export format.
pub const PARTICLE_EXTENSION: &str = "prt";

/// A validated image file target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutput {
    /// Destination file.
    pub path: PathBuf,
    /// EXR compression.
    pub compression: ExrCompression,
}

/// A validated particle export target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleExport {
    /// Destination file, frame number resolved.
    pub path: PathBuf,
    /// Bake lighting into the export.
    pub compute_lighting: bool,
}

/// Which outputs a render produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    /// Image file writer, if any.
    pub image: Option<ImageOutput>,
    /// Particle export, if any.
    pub particle_export: Option<ParticleExport>,
    /// Whether an image is rendered at all.
    pub render_image: bool,
}

impl OutputPlan {
    /// Resolves the outputs for `frame`.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] when a requested output path has the wrong
    /// extension or no existing directory.
    pub fn resolve(settings: &RenderSettings, frame: i32) -> Result<Self, OutputError> {
        let region = settings.is_region();
        let export = &settings.particle_export;

        let image = if !region && settings.output.file_output && !export.enabled {
            match settings.output.path.as_deref() {
                Some(path) => {
                    let path = resolve_frame_tokens(path, frame);
                    check_extension(&path, IMAGE_EXTENSION)?;
                    check_directory(&path)?;
                    info!(path = %path.display(), "saving render to file");
                    Some(ImageOutput {
                        path,
                        compression: settings.output.compression,
                    })
                }
                None => {
                    warn!("no enabled main frame buffer, not saving output to disk");
                    None
                }
            }
        } else {
            None
        };

        let particle_export = if export.enabled && region {
            warn!("skipping particle export during region render");
            None
        } else if export.enabled {
            let path = resolve_frame_path(&export.path, frame);
            check_extension(&path, PARTICLE_EXTENSION)?;
            check_directory(&path)?;
            info!(path = %path.display(), "exporting particles");
            Some(ParticleExport {
                path,
                compute_lighting: export.compute_lighting,
            })
        } else {
            None
        };

        Ok(Self {
            image,
            render_image: particle_export.is_none(),
            particle_export,
        })
    }
}

/// Substitutes the frame number into a path expression.
///
/// A `[Frame]` token is replaced by the zero-padded frame. Without a token
/// the padded frame is inserted before the extension.
#[must_use]
pub fn resolve_frame_path(expression: &str, frame: i32) -> PathBuf {
    if let Some(resolved) = substitute_frame_token(expression, frame) {
        return PathBuf::from(resolved);
    }

    let padded = format!("{frame:04}");
    let path = Path::new(expression);
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return path.to_path_buf();
    };
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{padded}.{ext}"),
        None => format!("{stem}.{padded}"),
    };
    path.with_file_name(name)
}

/// Replaces `[Frame]` tokens in `path` with the zero-padded frame.
///
/// A path without a token is returned unchanged.
#[must_use]
pub fn resolve_frame_tokens(path: &Path, frame: i32) -> PathBuf {
    path.to_str()
        .and_then(|expression| substitute_frame_token(expression, frame))
        .map_or_else(|| path.to_path_buf(), PathBuf::from)
}

fn substitute_frame_token(expression: &str, frame: i32) -> Option<String> {
    if !expression.contains("[Frame]") && !expression.contains("[frame]") {
        return None;
    }
    let padded = format!("{frame:04}");
    Some(
        expression
            .replace("[Frame]", &padded)
            .replace("[frame]", &padded),
    )
}

fn check_extension(path: &Path, expected: &'static str) -> Result<(), OutputError> {
    match path.extension().and_then(|e| e.to_str()) {
        None => Err(OutputError::MissingExtension {
            path: path.to_path_buf(),
            expected,
        }),
        Some(ext) if ext.eq_ignore_ascii_case(expected) => Ok(()),
        Some(ext) => Err(OutputError::UnsupportedExtension {
            path: path.to_path_buf(),
            extension: ext.to_ascii_lowercase(),
            expected,
        }),
    }
}

fn check_directory(path: &Path) -> Result<(), OutputError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && dir.is_dir() => Ok(()),
        dir => Err(OutputError::MissingDirectory {
            directory: dir.map(Path::to_path_buf).unwrap_or_default(),
        }),
    }
}
