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

//! # Lucent Lanes
//!
//! The hot path of the renderer. GPU mirrors of CPU resources are created by
//! caching factories and kept current through version-driven sync. Bind groups
//! live in a generation-counted arena and are bound through a
//! [`BindGroupBinder`](render_lane::BindGroupBinder) that skips redundant
//! binds. The [`FrameCache`](render_lane::FrameCache) materializes render
//! items for the passes in [`render_lane`].

#![warn(missing_docs)]

pub mod context;
pub mod factory;
pub mod gpu;
pub mod pipeline;
pub mod render_lane;
pub mod shader;

#[cfg(test)]
mod test_support;

pub use context::{GpuContext, SamplerKind, SweepStats};
pub use factory::{
    FactoryCache, FactoryError, GpuFactory, MaterialFactory, MeshFactory, ModelFactory,
    TextureFactory,
};
pub use gpu::{
    BindGroupArena, BindGroupSlot, GpuBindGroup, GpuMaterial, GpuMesh, GpuModel, GpuSyncable,
    GpuTexture, SyncOutcome, SyncState,
};
pub use pipeline::{PipelineHandle, PipelineKey, PipelineManager};
pub use shader::{
    BindGroupLayoutInfo, BindGroupReuse, BindGroupType, BindingInfo, BindingKind,
    ShaderDescriptor, ShaderInfo, ShaderRegistry,
};
