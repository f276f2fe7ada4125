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

//! The GPU side of one render item.

use crate::gpu::{BindGroupSlot, GpuMaterial, GpuMesh, GpuModel};
use lucent_core::math::Mat4;
use lucent_data::Submesh;
use std::sync::Arc;

/// Everything a pass needs to draw one submesh of one model instance.
///
/// Built by [`FrameCache::prepare_gpu_resources`](super::FrameCache::prepare_gpu_resources)
/// and dropped at the end of the frame. The GPU objects it points to live on
/// in their factory caches.
#[derive(Debug, Clone)]
pub struct RenderItemGpu {
    /// The model mirror.
    pub model: Arc<GpuModel>,
    /// The model's mesh.
    pub mesh: Arc<GpuMesh>,
    /// The submesh material.
    pub material: Arc<GpuMaterial>,
    /// Object uniforms. Persistent for non-zero object ids.
    pub object_bind_group: BindGroupSlot,
    /// Index range and material handle.
    pub submesh: Submesh,
    /// Model to world.
    pub world_transform: Mat4,
    /// Sort layer.
    pub layer: u32,
    /// Scene object id. `0` marks a transient item.
    pub object_id: u64,
}

impl RenderItemGpu {
    /// Whether the object bind group is owned by this frame only.
    pub fn is_transient(&self) -> bool {
        self.object_id == 0
    }
}
