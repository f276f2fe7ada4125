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

//! A device bind group together with the buffers it owns.

use crate::shader::BindGroupLayoutInfo;
use lucent_core::renderer::{BindGroupId, BufferId, GraphicsDevice, ResourceError};
use std::sync::Arc;

/// A buffer created for, and owned by, one bind group entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedBuffer {
    /// Binding index the buffer is bound to.
    pub binding: u32,
    /// The device buffer.
    pub buffer: BufferId,
    /// Size in bytes.
    pub size: u64,
}

/// A bind group and the layout it was created from.
///
/// Uniform and storage buffers declared by the layout are allocated with the
/// group and released with it; textures and samplers are borrowed.
#[derive(Debug)]
pub struct GpuBindGroup {
    id: BindGroupId,
    layout: Arc<BindGroupLayoutInfo>,
    buffers: Vec<OwnedBuffer>,
}

impl GpuBindGroup {
    /// Wraps an existing device bind group.
    pub fn new(id: BindGroupId, layout: Arc<BindGroupLayoutInfo>, buffers: Vec<OwnedBuffer>) -> Self {
        Self {
            id,
            layout,
            buffers,
        }
    }

    /// The device bind group.
    pub fn id(&self) -> BindGroupId {
        self.id
    }

    /// The layout the group conforms to.
    pub fn layout(&self) -> &Arc<BindGroupLayoutInfo> {
        &self.layout
    }

    /// The buffers owned by this group.
    pub fn buffers(&self) -> &[OwnedBuffer] {
        &self.buffers
    }

    /// The owned buffer bound at `binding`, if any.
    pub fn buffer(&self, binding: u32) -> Option<OwnedBuffer> {
        self.buffers.iter().copied().find(|b| b.binding == binding)
    }

    /// Writes `data` at `offset` into the buffer bound at `binding`.
    ///
    /// ## Errors
    /// * `ResourceError::NotFound` - If no owned buffer is bound at `binding`.
    /// * `ResourceError::OutOfBounds` - If the write does not fit the buffer.
    pub fn update_buffer(
        &self,
        device: &dyn GraphicsDevice,
        binding: u32,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let owned = self.buffer(binding).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > owned.size {
            return Err(ResourceError::OutOfBounds);
        }
        device.write_buffer(owned.buffer, offset, data)
    }

    /// Destroys the device bind group and its owned buffers.
    pub fn release(self, device: &dyn GraphicsDevice) {
        if let Err(e) = device.destroy_bind_group(self.id) {
            log::warn!("GpuBindGroup: failed to destroy {:?}: {e}", self.id);
        }
        for owned in self.buffers {
            if let Err(e) = device.destroy_buffer(owned.buffer) {
                log::warn!("GpuBindGroup: failed to destroy {:?}: {e}", owned.buffer);
            }
        }
    }
}
