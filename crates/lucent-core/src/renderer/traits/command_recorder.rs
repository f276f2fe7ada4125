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

//! Command recording traits.

use crate::renderer::api::{
    BindGroupId, BufferId, CommandBufferId, IndexFormat, PassId, RenderPassDescriptor,
    RenderPipelineId, Viewport,
};
use std::ops::Range;

/// An active render pass, used for recording drawing commands.
///
/// Obtained from a [`CommandEncoder`]. The pass ends when the object is dropped.
pub trait RenderPassEncoder {
    /// The identity of this pass. Unique for every begun pass.
    fn pass_id(&self) -> PassId;

    /// Sets the active render pipeline for subsequent draw calls.
    fn set_pipeline(&mut self, pipeline: RenderPipelineId);

    /// Binds a bind group to a group index.
    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId);

    /// Binds a vertex buffer to a specific slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, index_format: IndexFormat);

    /// Restricts rasterization to a viewport.
    fn set_viewport(&mut self, viewport: &Viewport);

    /// Records a non-indexed draw call.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    /// Records an indexed draw call.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
}

/// Records a sequence of GPU commands into a command buffer.
pub trait CommandEncoder {
    /// Begins a new render pass.
    ///
    /// The returned pass borrows the encoder mutably, so only one pass can be
    /// active at a time.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPassEncoder + 'encoder>;

    /// Finalizes the recording. The result can be submitted to the device.
    fn finish(self: Box<Self>) -> CommandBufferId;
}
