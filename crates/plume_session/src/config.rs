//! # Render Settings
//!
//! Scalar render configuration, loaded from TOML. Every key is optional; a
//! missing key takes the default shown on its field.
//!
//! ```toml
//! render_type = "pass"
//! background = [0.0, 0.0, 0.0]
//!
//! [image]
//! width = 1920
//! height = 1080
//! crop = { left = 0, bottom = 0, width = 960, height = 540 }
//!
//! [sampling]
//! method = "particle"
//! draw_point_filter = { kind = "bilinear", size = 2 }
//!
//! [shader]
//! model = "henyey_greenstein"
//! eccentricity = 0.3
//!
//! [scene]
//! use_occlusion_meshes = true
//! occlusion_group = "Occluders"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use plume_compositor::FrameTile;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the host asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    /// A full render pass.
    #[default]
    Pass,
    /// An interactive region preview. Never writes files.
    Region,
    /// A material preview.
    Shaderball,
}

/// How the engine accumulates particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingMethod {
    /// Splat particles as points. The only method that takes lights.
    #[default]
    Particle,
    /// Rasterize particles into voxels.
    Voxel,
}

/// Reconstruction filter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear.
    #[default]
    Bilinear,
    /// Bicubic.
    Bicubic,
}

/// A filter and its support size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Filter kind.
    pub kind: FilterKind,
    /// Support size. Values below 1 are treated as 1.
    pub size: i32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kind: FilterKind::Bilinear,
            size: 1,
        }
    }
}

impl FilterSettings {
    /// Support size clamped to at least 1.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn effective_size(&self) -> u32 {
        if self.size > 0 {
            self.size as u32
        } else {
            1
        }
    }
}

/// Region of the image the host wants back, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    /// Left edge.
    pub left: u32,
    /// Bottom edge.
    pub bottom: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// `[image]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Host crop window. `None` means the whole image.
    pub crop: Option<CropWindow>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            crop: None,
        }
    }
}

impl ImageSettings {
    /// The tile the host receives.
    #[must_use]
    pub fn tile(&self) -> FrameTile {
        match self.crop {
            Some(crop) => FrameTile::new(crop.width, crop.height, crop.left, crop.bottom),
            None => FrameTile::full(self.width, self.height),
        }
    }
}

/// `[sampling]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Rendering method.
    pub method: RenderingMethod,
    /// Filter used when splatting particles.
    pub draw_point_filter: FilterSettings,
    /// Filter used when looking up light attenuation.
    pub attenuation_lookup_filter: FilterSettings,
    /// Voxel edge length (voxel method).
    pub voxel_size: f32,
    /// Voxel filter radius (voxel method).
    pub voxel_radius: i32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            method: RenderingMethod::Particle,
            draw_point_filter: FilterSettings::default(),
            attenuation_lookup_filter: FilterSettings::default(),
            voxel_size: 0.5,
            voxel_radius: 1,
        }
    }
}

/// `[density]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensitySettings {
    /// Final pass density, as `density_per_particle * 10^density_exponent`.
    pub density_per_particle: f32,
    /// Final pass density exponent.
    pub density_exponent: i32,
    /// Lighting pass density.
    pub lighting_density_per_particle: f32,
    /// Lighting pass density exponent.
    pub lighting_density_exponent: i32,
    /// Use the emission channel.
    pub use_emission: bool,
    /// Emission strength.
    pub emission_strength: f32,
    /// Emission strength exponent.
    pub emission_strength_exponent: i32,
    /// Use the absorption channel.
    pub use_absorption: bool,
}

impl Default for DensitySettings {
    fn default() -> Self {
        Self {
            density_per_particle: 5.0,
            density_exponent: -1,
            lighting_density_per_particle: 5.0,
            lighting_density_exponent: -1,
            use_emission: false,
            emission_strength: 1.0,
            emission_strength_exponent: 0,
            use_absorption: false,
        }
    }
}

/// Depth of field parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOfField {
    /// Enabled.
    pub enabled: bool,
    /// Aperture f-stop.
    pub f_stop: f32,
    /// Focal length in millimetres.
    pub focal_length: f32,
    /// Distance to the focal plane.
    pub focal_distance: f32,
    /// Sample rate.
    pub sample_rate: f32,
}

impl Default for DepthOfField {
    fn default() -> Self {
        Self {
            enabled: false,
            f_stop: 2.8,
            focal_length: 30.0,
            focal_distance: 100.0,
            sample_rate: 0.1,
        }
    }
}

/// Motion blur parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlur {
    /// Enabled.
    pub enabled: bool,
    /// Shutter open, in frames relative to the current frame.
    pub shutter_begin: f32,
    /// Shutter close, in frames relative to the current frame.
    pub shutter_end: f32,
    /// Number of sub-frame samples.
    pub samples: u32,
    /// Jitter sample times.
    pub jitter: bool,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            enabled: false,
            shutter_begin: -0.25,
            shutter_end: 0.25,
            samples: 2,
            jitter: true,
        }
    }
}

/// `[camera_effects]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraEffects {
    /// Additive compositing of particles.
    pub additive_mode: bool,
    /// Blur the camera over the shutter.
    pub camera_blur: bool,
    /// Depth of field.
    pub depth_of_field: DepthOfField,
    /// Motion blur.
    pub motion_blur: MotionBlur,
}

/// `[elements]` extra render passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderElements {
    /// Normal pass.
    pub normals: bool,
    /// Occluded RGBA pass.
    pub occluded_rgba: bool,
    /// Velocity pass.
    pub velocity: bool,
    /// Z-depth pass.
    pub z_depth: bool,
}

/// Specular lobe parameters shared by phong and kajiya-kay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecularParams {
    /// Specular level.
    pub specular_level: f32,
    /// Specular power.
    pub specular_power: f32,
    /// Read the level from the `SpecularLevel` channel.
    pub use_specular_level_channel: bool,
    /// Read the power from the `SpecularPower` channel.
    pub use_specular_power_channel: bool,
}

impl Default for SpecularParams {
    fn default() -> Self {
        Self {
            specular_level: 100.0,
            specular_power: 10.0,
            use_specular_level_channel: false,
            use_specular_power_channel: false,
        }
    }
}

/// Phase function parameters shared by henyey-greenstein and schlick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseParams {
    /// Phase eccentricity in `[-1, 1]`.
    pub eccentricity: f32,
    /// Read eccentricity from the `Eccentricity` channel.
    pub use_eccentricity_channel: bool,
}

/// Hair shading parameters.
///
/// Each `use_*_channel` switch reads the matching value per particle from
/// the channel of the same name instead of the constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct MarschnerParams {
    pub specular_glossiness: f32,
    pub specular_level: f32,
    pub specular_shift: f32,
    pub secondary_specular_glossiness: f32,
    pub secondary_specular_level: f32,
    pub secondary_specular_shift: f32,
    pub glint_level: f32,
    pub glint_size: f32,
    pub glint_glossiness: f32,
    pub diffuse_level: f32,
    pub use_specular_glossiness_channel: bool,
    pub use_specular_level_channel: bool,
    pub use_specular_shift_channel: bool,
    pub use_secondary_specular_glossiness_channel: bool,
    pub use_secondary_specular_level_channel: bool,
    pub use_secondary_specular_shift_channel: bool,
    pub use_glint_level_channel: bool,
    pub use_glint_size_channel: bool,
    pub use_glint_glossiness_channel: bool,
    pub use_diffuse_level_channel: bool,
}

impl Default for MarschnerParams {
    fn default() -> Self {
        Self {
            specular_glossiness: 300.0,
            specular_level: 5.0,
            specular_shift: 0.0,
            secondary_specular_glossiness: 30.0,
            secondary_specular_level: 10.0,
            secondary_specular_shift: 0.0,
            glint_level: 2.0,
            glint_size: 0.5,
            glint_glossiness: 10.0,
            diffuse_level: 0.0,
            use_specular_glossiness_channel: false,
            use_specular_level_channel: false,
            use_specular_shift_channel: false,
            use_secondary_specular_glossiness_channel: false,
            use_secondary_specular_level_channel: false,
            use_secondary_specular_shift_channel: false,
            use_glint_level_channel: false,
            use_glint_size_channel: false,
            use_glint_glossiness_channel: false,
            use_diffuse_level_channel: false,
        }
    }
}

/// `[shader]`, selected by `model`.
///
/// Must be applied to the engine before any particle source is registered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ShaderSettings {
    /// Uniform scattering.
    #[default]
    Isotropic,
    /// Phong specular.
    Phong(SpecularParams),
    /// Henyey-Greenstein phase function.
    HenyeyGreenstein(PhaseParams),
    /// Schlick phase function.
    Schlick(PhaseParams),
    /// Kajiya-Kay hair specular.
    KajiyaKay(SpecularParams),
    /// Marschner hair model.
    Marschner(MarschnerParams),
}

/// `[scene]` traversal options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Register members of `occlusion_group` as holdout meshes.
    pub use_occlusion_meshes: bool,
    /// Name of the occlusion group.
    pub occlusion_group: String,
    /// Register only members of `light_group` instead of every scene light.
    pub use_light_group: bool,
    /// Name of the light group.
    pub light_group: String,
    /// How long to wait for the scene lock, in milliseconds.
    pub lock_timeout_ms: u64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            use_occlusion_meshes: false,
            occlusion_group: "Occlusion".to_string(),
            use_light_group: false,
            light_group: "Lights".to_string(),
            lock_timeout_ms: 5_000,
        }
    }
}

impl SceneSettings {
    /// Scene lock timeout.
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// EXR compression scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExrCompression {
    /// Uncompressed.
    None,
    /// Run length.
    Rle,
    /// Zlib, one scanline.
    Zips,
    /// Zlib, 16 scanlines.
    #[default]
    Zip,
    /// Wavelet.
    Piz,
    /// Lossy 24-bit float.
    Pxr24,
    /// Lossy 4x4 blocks.
    B44,
    /// B44 with flat-area optimization.
    B44a,
}

/// `[output]` image file output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write the final image to disk.
    pub file_output: bool,
    /// Resolved path of the main frame buffer. `None` when the host has no
    /// enabled main frame buffer.
    pub path: Option<PathBuf>,
    /// EXR compression.
    pub compression: ExrCompression,
}

/// `[particle_export]` PRT output instead of an image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleExportSettings {
    /// Export particles instead of rendering an image.
    pub enabled: bool,
    /// Path expression; may contain a `[Frame]` token.
    pub path: String,
    /// Bake lighting into the exported particles.
    pub compute_lighting: bool,
}

/// Complete render configuration for one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Render request kind.
    pub render_type: RenderType,
    /// Background colour, linear RGB.
    pub background: [f32; 3],
    /// Fail the render when the engine license is missing.
    pub error_on_missing_license: bool,
    /// Image size and crop.
    pub image: ImageSettings,
    /// Sampling.
    pub sampling: SamplingSettings,
    /// Density and emission.
    pub density: DensitySettings,
    /// Camera effects.
    pub camera_effects: CameraEffects,
    /// Extra render elements.
    pub elements: RenderElements,
    /// Particle shader.
    pub shader: ShaderSettings,
    /// Scene traversal.
    pub scene: SceneSettings,
    /// Image file output.
    pub output: OutputSettings,
    /// Particle export.
    pub particle_export: ParticleExportSettings,
}

impl RenderSettings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown variants.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks values that TOML typing cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let image = &self.image;
        if image.width == 0 || image.height == 0 {
            return Err(ConfigError::ZeroResolution {
                width: image.width,
                height: image.height,
            });
        }
        if let Some(crop) = image.crop {
            if !image.tile().fits(image.width, image.height)
                || crop.width == 0
                || crop.height == 0
            {
                return Err(ConfigError::CropOutOfBounds {
                    left: crop.left,
                    bottom: crop.bottom,
                    width: crop.width,
                    height: crop.height,
                    image_width: image.width,
                    image_height: image.height,
                });
            }
        }
        if self.sampling.method == RenderingMethod::Voxel && self.sampling.voxel_size <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "sampling.voxel_size",
                value: self.sampling.voxel_size,
            });
        }
        Ok(())
    }

    /// Whether this is an interactive region render.
    #[must_use]
    pub fn is_region(&self) -> bool {
        self.render_type == RenderType::Region
    }
}
