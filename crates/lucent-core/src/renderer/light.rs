// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scene lights and their conversion to GPU uniform data.

use super::uniforms::LightStruct;
use crate::math::{LinearRgba, Mat4, Vec3};

/// Omnidirectional fill light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Light color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            intensity: 0.1,
        }
    }
}

/// Parallel rays, like the sun. The direction is the light transform's Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Light color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Half-size of the area covered by the shadow map.
    pub range: f32,
    /// Whether the light renders a shadow map.
    pub cast_shadows: bool,
    /// Depth bias applied when sampling the shadow map.
    pub shadow_bias: f32,
    /// Bias along the surface normal.
    pub shadow_normal_bias: f32,
    /// Shadow map resolution.
    pub shadow_map_size: u32,
    /// PCF kernel radius (1 = 3x3, 2 = 5x5).
    pub shadow_pcf_kernel: u32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            intensity: 1.0,
            range: 100.0,
            cast_shadows: false,
            shadow_bias: 0.005,
            shadow_normal_bias: 0.01,
            shadow_map_size: 4096,
            shadow_pcf_kernel: 1,
        }
    }
}

/// Radiates in all directions from the light transform's translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Light color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Effective range, used for culling and attenuation.
    pub range: f32,
    /// Whether the light renders a shadow cube.
    pub cast_shadows: bool,
    /// Depth bias applied when sampling the shadow cube.
    pub shadow_bias: f32,
    /// Bias along the surface normal.
    pub shadow_normal_bias: f32,
    /// Per-face resolution of the shadow cube.
    pub shadow_map_size: u32,
    /// PCF kernel radius.
    pub shadow_pcf_kernel: u32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            intensity: 1.0,
            range: 10.0,
            cast_shadows: false,
            shadow_bias: 0.005,
            shadow_normal_bias: 0.01,
            shadow_map_size: 1024,
            shadow_pcf_kernel: 1,
        }
    }
}

/// A cone of light from the transform's translation along its Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    /// Light color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Inner cone half-angle, in radians.
    pub spot_angle: f32,
    /// Softness of the cone edge.
    pub spot_softness: f32,
    /// Effective range, used for culling and attenuation.
    pub range: f32,
    /// Whether the light renders a shadow map.
    pub cast_shadows: bool,
    /// Depth bias applied when sampling the shadow map.
    pub shadow_bias: f32,
    /// Bias along the surface normal.
    pub shadow_normal_bias: f32,
    /// Shadow map resolution.
    pub shadow_map_size: u32,
    /// PCF kernel radius.
    pub shadow_pcf_kernel: u32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            intensity: 1.0,
            spot_angle: 0.5,
            spot_softness: 0.2,
            range: 10.0,
            cast_shadows: false,
            shadow_bias: 0.005,
            shadow_normal_bias: 0.01,
            shadow_map_size: 2048,
            shadow_pcf_kernel: 1,
        }
    }
}

/// The type-specific part of a [`Light`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// See [`AmbientLight`].
    Ambient(AmbientLight),
    /// See [`DirectionalLight`].
    Directional(DirectionalLight),
    /// See [`PointLight`].
    Point(PointLight),
    /// See [`SpotLight`].
    Spot(SpotLight),
}

/// The numeric light type written into [`LightStruct::light_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LightType {
    /// Ambient.
    Ambient = 0,
    /// Directional.
    Directional = 1,
    /// Point.
    Point = 2,
    /// Spot.
    Spot = 3,
}

/// A light placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Type-specific parameters.
    pub kind: LightKind,
    /// World transform. Translation is the position, the Z axis the direction.
    pub transform: Mat4,
}

impl Light {
    /// Creates a light with an identity transform.
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            transform: Mat4::IDENTITY,
        }
    }

    /// Builder-style transform setter.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// The numeric light type.
    pub fn light_type(&self) -> LightType {
        match self.kind {
            LightKind::Ambient(_) => LightType::Ambient,
            LightKind::Directional(_) => LightType::Directional,
            LightKind::Point(_) => LightType::Point,
            LightKind::Spot(_) => LightType::Spot,
        }
    }

    /// Whether this light has shadows enabled. Ambient lights never do.
    pub fn casts_shadows(&self) -> bool {
        match &self.kind {
            LightKind::Ambient(_) => false,
            LightKind::Directional(l) => l.cast_shadows,
            LightKind::Point(l) => l.cast_shadows,
            LightKind::Spot(l) => l.cast_shadows,
        }
    }

    /// World position.
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// Normalized world direction, or `-Y` for a degenerate transform.
    pub fn direction(&self) -> Vec3 {
        self.transform
            .z_axis
            .truncate()
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y)
    }

    /// Effective range, `0.0` for ambient lights.
    pub fn range(&self) -> f32 {
        match &self.kind {
            LightKind::Ambient(_) => 0.0,
            LightKind::Directional(l) => l.range,
            LightKind::Point(l) => l.range,
            LightKind::Spot(l) => l.range,
        }
    }

    /// Packs the light for the GPU. Shadow fields are left at zero and are
    /// filled in by shadow assignment.
    pub fn to_uniform(&self) -> LightStruct {
        let (color, intensity) = match &self.kind {
            LightKind::Ambient(l) => (l.color, l.intensity),
            LightKind::Directional(l) => (l.color, l.intensity),
            LightKind::Point(l) => (l.color, l.intensity),
            LightKind::Spot(l) => (l.color, l.intensity),
        };
        let (spot_angle, spot_softness) = match &self.kind {
            LightKind::Spot(l) => (l.spot_angle, l.spot_softness),
            _ => (0.5, 0.2),
        };
        LightStruct {
            transform: self.transform.to_cols_array_2d(),
            color: [color.r, color.g, color.b],
            intensity,
            light_type: self.light_type() as u32,
            spot_angle,
            spot_softness,
            range: self.range(),
            shadow_index: 0,
            shadow_count: 0,
            _pad: [0.0; 2],
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(LightKind::Ambient(AmbientLight::default()))
    }
}
