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

//! GPU-side objects: the bind group arena and the mirrors of CPU resources.

mod arena;
mod bind_group;
mod material;
mod mesh;
mod model;
mod sync;
mod texture;

pub use arena::{BindGroupArena, BindGroupSlot};
pub use bind_group::{GpuBindGroup, OwnedBuffer};
pub use material::GpuMaterial;
pub use mesh::GpuMesh;
pub use model::GpuModel;
pub use sync::{GpuSyncable, SyncOutcome, SyncState};
pub use texture::GpuTexture;
