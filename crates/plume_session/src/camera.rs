//! Camera projection resolution.

use crate::scene::{FovAxis, HostCamera, HostProjection, Transform};

/// Projection handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraProjection {
    /// Orthographic with the given view width.
    Orthographic {
        /// View width in world units.
        width: f32,
    },
    /// Perspective.
    Perspective {
        /// Horizontal field of view in radians.
        horizontal_fov: f32,
    },
}

/// Complete engine camera setup.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSetup {
    /// Host camera name.
    pub name: String,
    /// World transform.
    pub transform: Transform,
    /// Projection.
    pub projection: CameraProjection,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Pixel aspect ratio.
    pub pixel_aspect: f32,
}

impl CameraSetup {
    /// Resolves the engine projection for an image of the given size.
    ///
    /// Orthographic width is `width * ortho_height / height`. A vertical
    /// field of view is converted through the image aspect ratio.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve(camera: &HostCamera, image_width: u32, image_height: u32) -> Self {
        let aspect = image_width as f32 / image_height.max(1) as f32;
        let projection = match camera.projection {
            HostProjection::Orthographic { ortho_height } => CameraProjection::Orthographic {
                width: ortho_height * aspect,
            },
            HostProjection::Perspective { fov_degrees, axis } => {
                let fov = fov_degrees.to_radians();
                let horizontal_fov = match axis {
                    FovAxis::Horizontal => fov,
                    FovAxis::Vertical => 2.0 * ((fov * 0.5).tan() * aspect).atan(),
                };
                CameraProjection::Perspective { horizontal_fov }
            }
        };
        Self {
            name: camera.name.clone(),
            transform: camera.transform,
            projection,
            near: camera.near,
            far: camera.far,
            pixel_aspect: camera.pixel_aspect,
        }
    }
}
