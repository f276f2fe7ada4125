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

//! `#[repr(C)]` layouts uploaded to uniform and storage buffers.
//!
//! Every struct is 16-byte aligned to match WGSL's layout rules.

use crate::math::{Mat4, Vec3};
use bytemuck::{Pod, Zeroable};

/// One packed light in the light storage buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightStruct {
    /// World transform of the light.
    pub transform: [[f32; 4]; 4],
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Intensity multiplier.
    pub intensity: f32,
    /// See `LightType`.
    pub light_type: u32,
    /// Spot cone half-angle.
    pub spot_angle: f32,
    /// Spot edge softness.
    pub spot_softness: f32,
    /// Effective range.
    pub range: f32,
    /// Index of the first [`ShadowUniform`] for this light.
    pub shadow_index: u32,
    /// Number of shadow uniforms for this light, `0` without shadows.
    pub shadow_count: u32,
    /// Padding.
    pub _pad: [f32; 2],
}

/// Header at offset 0 of the light storage buffer. Lights follow at offset 16.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LightsHeader {
    /// Number of lights following the header.
    pub count: u32,
    /// Padding.
    pub _pad: [u32; 3],
}

impl LightsHeader {
    /// Byte offset of the first light in the storage buffer.
    pub const LIGHTS_OFFSET: u64 = std::mem::size_of::<LightsHeader>() as u64;

    /// A header announcing `count` lights.
    pub fn new(count: u32) -> Self {
        Self {
            count,
            _pad: [0; 3],
        }
    }
}

/// Per-shadow data read by the lit shader when sampling shadow maps.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniform {
    /// Light view-projection, for 2D shadows.
    pub view_proj: [[f32; 4]; 4],
    /// Light position, for cube shadows.
    pub light_pos: [f32; 3],
    /// Near plane.
    pub near: f32,
    /// Far plane.
    pub far: f32,
    /// Depth bias.
    pub bias: f32,
    /// Normal bias.
    pub normal_bias: f32,
    /// `1 / shadow map size`.
    pub texel_size: f32,
    /// PCF kernel radius.
    pub pcf_kernel: u32,
    /// `0` for a 2D shadow map, `1` for a shadow cube.
    pub shadow_type: u32,
    /// Layer in the 2D array or cube index in the cube array.
    pub texture_index: u32,
    /// Far distance covered by this shadow.
    pub cascade_split: f32,
}

impl ShadowUniform {
    /// `shadow_type` of a 2D shadow map.
    pub const TYPE_2D: u32 = 0;
    /// `shadow_type` of a shadow cube.
    pub const TYPE_CUBE: u32 = 1;
}

impl Default for ShadowUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_pos: [0.0; 3],
            near: 0.1,
            far: 100.0,
            bias: 0.002,
            normal_bias: 0.3,
            texel_size: 1.0 / 2048.0,
            pcf_kernel: 1,
            shadow_type: Self::TYPE_2D,
            texture_index: 0,
            cascade_split: 1.0,
        }
    }
}

/// Uniforms of the 2D depth-only shadow pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowPass2DUniforms {
    /// Light view-projection.
    pub light_view_proj: [[f32; 4]; 4],
}

/// Uniforms of one cube face of the point shadow pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowPassCubeUniforms {
    /// View-projection of the face.
    pub light_view_proj: [[f32; 4]; 4],
    /// Light position; depth is stored as distance to it.
    pub light_position: [f32; 3],
    /// Far plane used to normalize the distance.
    pub far_plane: f32,
}

/// Per-object transform uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    /// Model matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix.
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniforms {
    /// Builds the uniforms for a world transform.
    pub fn from_transform(model: &Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

/// Per-camera frame uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// View matrix.
    pub view: [[f32; 4]; 4],
    /// Projection matrix.
    pub projection: [[f32; 4]; 4],
    /// Camera position in world space.
    pub camera_position: [f32; 3],
    /// Seconds since start.
    pub time: f32,
}

impl FrameUniforms {
    /// Builds the uniforms for a camera.
    pub fn new(view: &Mat4, projection: &Mat4, camera_position: Vec3, time: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::mem::size_of;

    #[test]
    fn layouts_match_shader_sizes() {
        assert_eq!(size_of::<LightStruct>(), 112);
        assert_eq!(size_of::<LightsHeader>(), 16);
        assert_eq!(size_of::<ShadowUniform>(), 112);
        assert_eq!(size_of::<ShadowPass2DUniforms>(), 64);
        assert_eq!(size_of::<ShadowPassCubeUniforms>(), 80);
        assert_eq!(size_of::<ObjectUniforms>(), 128);
        assert_eq!(size_of::<FrameUniforms>(), 144);
        assert_eq!(LightsHeader::LIGHTS_OFFSET, 16);
    }

    #[test]
    fn normal_matrix_is_inverse_transpose() {
        let model = Mat4::from_scale(Vec3::new(2.0, 4.0, 8.0));
        let uniforms = ObjectUniforms::from_transform(&model);
        let normal = Mat4::from_cols_array_2d(&uniforms.normal);
        assert_relative_eq!(normal.x_axis.x, 0.5);
        assert_relative_eq!(normal.y_axis.y, 0.25);
        assert_relative_eq!(normal.z_axis.z, 0.125);
    }
}
