//! Host light → engine light descriptor.

use crate::scene::{HostLight, HostLightKind};

/// Engine light shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightShape {
    /// Omnidirectional.
    Point,
    /// Parallel rays.
    Directional,
    /// Cone.
    Spot {
        /// Hotspot angle in degrees.
        inner_angle: f32,
        /// Falloff angle in degrees.
        outer_angle: f32,
    },
}

/// A light as the engine consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct LightDescriptor {
    /// Host object name.
    pub name: String,
    /// Shape.
    pub shape: LightShape,
    /// Radiant flux per channel.
    pub flux: [f32; 3],
    /// Integer decay exponent.
    pub decay_exponent: i32,
    /// Near attenuation range enabled.
    pub near_attenuation: bool,
    /// Far attenuation range enabled.
    pub far_attenuation: bool,
}

impl LightDescriptor {
    /// Translates a host light. Returns `None` for unsupported light types.
    ///
    /// Flux is energy scaled by intensity. The falloff exponent is truncated
    /// to an integer. Spot lights use the host cone for both angles.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_host(light: &HostLight) -> Option<Self> {
        let shape = match light.kind {
            HostLightKind::Point => LightShape::Point,
            HostLightKind::Directional => LightShape::Directional,
            HostLightKind::Spot { cone_angle } => LightShape::Spot {
                inner_angle: cone_angle,
                outer_angle: cone_angle,
            },
            HostLightKind::Unsupported(_) => return None,
        };
        Some(Self {
            name: light.name.clone(),
            shape,
            flux: light.energy.map(|e| e * light.intensity),
            decay_exponent: light.falloff_exponent as i32,
            near_attenuation: false,
            far_attenuation: false,
        })
    }
}
