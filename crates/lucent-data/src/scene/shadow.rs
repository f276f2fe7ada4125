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

//! Shadow map requests produced by light extraction.

use lucent_core::renderer::Light;

/// The shadow mapping technique used for a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowType {
    /// Orthographic 2D map of a directional light.
    Directional2D,
    /// Perspective 2D map of a spot light.
    Spot2D,
    /// Six-face cube of a point light.
    PointCube,
}

impl ShadowType {
    /// Whether this shadow lives in the 2D array (as opposed to the cube array).
    pub fn is_2d(&self) -> bool {
        !matches!(self, ShadowType::PointCube)
    }
}

/// One light that needs a shadow map this frame.
///
/// Holds no matrices; those are computed by the shadow pass from the light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowRequest {
    /// Index of the light in the collector's light list.
    pub light_index: usize,
    /// A copy of the light.
    pub light: Light,
    /// Technique.
    pub shadow_type: ShadowType,
    /// First layer (2D) or cube index (cube) in the shadow texture array.
    pub texture_index_start: u32,
    /// Number of cascades. Always `1`.
    pub cascade_count: u32,
}
