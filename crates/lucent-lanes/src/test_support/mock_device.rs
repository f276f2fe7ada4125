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

//! A recording [`GraphicsDevice`] for tests.
//!
//! Every id is unique across resource kinds. Buffer writes, object counts and
//! every command recorded into a render pass are kept so tests can assert how
//! much work reached the device.

use lucent_core::math::{Extent3D, Origin3D};
use lucent_core::renderer::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutDescriptor, BindGroupLayoutId, BufferDescriptor,
    BufferId, CommandBufferId, CommandEncoder, GraphicsDevice, IndexFormat, PassId,
    PipelineLayoutDescriptor, PipelineLayoutId, PrimitiveTopology, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPassEncoder,
    RenderPipelineDescriptor, RenderPipelineId, ResourceError, SamplerDescriptor, SamplerId,
    ShaderError, ShaderModuleDescriptor, ShaderModuleId, TextureDescriptor, TextureFormat,
    TextureId, TextureViewDescriptor, TextureViewId, Viewport,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One call recorded into a render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PassCommand {
    SetPipeline(RenderPipelineId),
    SetBindGroup(u32, BindGroupId),
    SetVertexBuffer(u32, BufferId),
    SetIndexBuffer(BufferId, IndexFormat),
    SetViewport(Viewport),
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
}

/// A render pass and everything recorded into it.
#[derive(Debug, Clone)]
pub struct RecordedPass {
    pub label: Option<String>,
    pub pass_id: PassId,
    pub color_attachments: Vec<RenderPassColorAttachment>,
    pub depth_attachment: Option<RenderPassDepthStencilAttachment>,
    pub commands: Vec<PassCommand>,
}

impl RecordedPass {
    pub fn bind_group_calls(&self) -> Vec<(u32, BindGroupId)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PassCommand::SetBindGroup(index, id) => Some((*index, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PassCommand::Draw { .. } | PassCommand::DrawIndexed { .. }))
            .count()
    }

    pub fn count(&self, predicate: impl Fn(&PassCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }
}

/// A queued buffer write.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferWrite {
    pub buffer: BufferId,
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Creation and destruction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStats {
    pub buffers_created: usize,
    pub buffers_destroyed: usize,
    pub textures_created: usize,
    pub textures_destroyed: usize,
    pub texture_writes: usize,
    pub views_created: usize,
    pub views_destroyed: usize,
    pub bind_groups_created: usize,
    pub bind_groups_destroyed: usize,
    pub pipelines_created: usize,
    pub shader_modules_created: usize,
    pub samplers_created: usize,
}

#[derive(Debug, Default)]
struct MockState {
    stats: MockStats,
    buffers: HashMap<BufferId, u64>,
    textures: HashMap<TextureId, (Extent3D, TextureFormat)>,
    views: HashMap<TextureViewId, TextureId>,
    bind_groups: HashSet<BindGroupId>,
    pipelines: HashMap<RenderPipelineId, (Option<String>, PrimitiveTopology)>,
    writes: Vec<BufferWrite>,
    passes: Vec<RecordedPass>,
    submitted: usize,
    fail_shader_compilation: bool,
}

/// The recording device. Clones share their state.
#[derive(Debug, Clone, Default)]
pub struct MockGraphicsDevice {
    next_id: Arc<AtomicUsize>,
    state: Arc<Mutex<MockState>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicUsize::new(1)),
            state: Arc::default(),
        }
    }

    fn next(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn stats(&self) -> MockStats {
        self.state.lock().stats
    }

    pub fn writes(&self) -> Vec<BufferWrite> {
        self.state.lock().writes.clone()
    }

    pub fn writes_to(&self, buffer: BufferId) -> Vec<BufferWrite> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.buffer == buffer)
            .cloned()
            .collect()
    }

    pub fn passes(&self) -> Vec<RecordedPass> {
        self.state.lock().passes.clone()
    }

    pub fn submitted(&self) -> usize {
        self.state.lock().submitted
    }

    /// Forgets recorded writes and passes. Counters are kept.
    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.writes.clear();
        state.passes.clear();
    }

    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn live_bind_groups(&self) -> usize {
        self.state.lock().bind_groups.len()
    }

    pub fn buffer_size(&self, buffer: BufferId) -> Option<u64> {
        self.state.lock().buffers.get(&buffer).copied()
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<Extent3D> {
        self.state.lock().textures.get(&texture).map(|(size, _)| *size)
    }

    pub fn view_texture(&self, view: TextureViewId) -> Option<TextureId> {
        self.state.lock().views.get(&view).copied()
    }

    pub fn pipeline_topology(&self, pipeline: RenderPipelineId) -> Option<PrimitiveTopology> {
        self.state.lock().pipelines.get(&pipeline).map(|(_, t)| *t)
    }

    pub fn set_fail_shader_compilation(&self, fail: bool) {
        self.state.lock().fail_shader_compilation = fail;
    }

    /// A pass outside any encoder, for driving pass-level code directly.
    pub fn begin_test_pass(&self) -> Box<dyn RenderPassEncoder> {
        Box::new(MockRenderPass::begin(
            self.state.clone(),
            &RenderPassDescriptor {
                label: Some("test pass"),
                ..Default::default()
            },
        ))
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let mut state = self.state.lock();
        if state.fail_shader_compilation {
            return Err(ShaderError::CompilationError {
                label: descriptor.label.unwrap_or_default().to_owned(),
                details: "mock failure".to_owned(),
            }
            .into());
        }
        state.stats.shader_modules_created += 1;
        Ok(ShaderModuleId(self.next()))
    }

    fn create_bind_group_layout(
        &self,
        _descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        Ok(BindGroupLayoutId(self.next()))
    }

    fn create_bind_group(
        &self,
        _descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let id = BindGroupId(self.next());
        let mut state = self.state.lock();
        state.stats.bind_groups_created += 1;
        state.bind_groups.insert(id);
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        if !state.bind_groups.remove(&id) {
            return Err(ResourceError::NotFound);
        }
        state.stats.bind_groups_destroyed += 1;
        Ok(())
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        Ok(PipelineLayoutId(self.next()))
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let id = RenderPipelineId(self.next());
        let mut state = self.state.lock();
        state.stats.pipelines_created += 1;
        state.pipelines.insert(
            id,
            (
                descriptor.label.as_ref().map(|l| l.to_string()),
                descriptor.topology,
            ),
        );
        Ok(id)
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        let mut state = self.state.lock();
        state.stats.buffers_created += 1;
        state.buffers.insert(id, descriptor.size);
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        _descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        let mut state = self.state.lock();
        state.stats.buffers_created += 1;
        state.buffers.insert(id, data.len() as u64);
        state.writes.push(BufferWrite {
            buffer: id,
            offset: 0,
            data: data.to_vec(),
        });
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        let size = *state.buffers.get(&id).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > size {
            return Err(ResourceError::OutOfBounds);
        }
        state.writes.push(BufferWrite {
            buffer: id,
            offset,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        state.buffers.remove(&id).ok_or(ResourceError::NotFound)?;
        state.stats.buffers_destroyed += 1;
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next());
        let mut state = self.state.lock();
        state.stats.textures_created += 1;
        state
            .textures
            .insert(id, (descriptor.size, descriptor.format));
        Ok(id)
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        _data: &[u8],
        _bytes_per_row: Option<u32>,
        _origin: Origin3D,
        _size: Extent3D,
    ) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        if !state.textures.contains_key(&texture_id) {
            return Err(ResourceError::NotFound);
        }
        state.stats.texture_writes += 1;
        Ok(())
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        state.textures.remove(&id).ok_or(ResourceError::NotFound)?;
        state.stats.textures_destroyed += 1;
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        _descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let mut state = self.state.lock();
        if !state.textures.contains_key(&texture_id) {
            return Err(ResourceError::NotFound);
        }
        let id = TextureViewId(self.next());
        state.stats.views_created += 1;
        state.views.insert(id, texture_id);
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        let mut state = self.state.lock();
        state.views.remove(&id).ok_or(ResourceError::NotFound)?;
        state.stats.views_destroyed += 1;
        Ok(())
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        self.state.lock().stats.samplers_created += 1;
        Ok(SamplerId(self.next()))
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(MockCommandEncoder {
            state: self.state.clone(),
            id: self.next(),
        })
    }

    fn submit_command_buffer(&self, _command_buffer: CommandBufferId) {
        self.state.lock().submitted += 1;
    }

    fn get_surface_format(&self) -> Option<TextureFormat> {
        None
    }
}

struct MockCommandEncoder {
    state: Arc<Mutex<MockState>>,
    id: usize,
}

impl CommandEncoder for MockCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPassEncoder + 'encoder> {
        Box::new(MockRenderPass::begin(self.state.clone(), descriptor))
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        CommandBufferId(self.id)
    }
}

struct MockRenderPass {
    state: Arc<Mutex<MockState>>,
    index: usize,
    id: PassId,
}

impl MockRenderPass {
    fn begin(state: Arc<Mutex<MockState>>, descriptor: &RenderPassDescriptor<'_>) -> Self {
        let id = PassId::next();
        let index = {
            let mut guard = state.lock();
            guard.passes.push(RecordedPass {
                label: descriptor.label.map(str::to_owned),
                pass_id: id,
                color_attachments: descriptor.color_attachments.to_vec(),
                depth_attachment: descriptor.depth_stencil_attachment,
                commands: Vec::new(),
            });
            guard.passes.len() - 1
        };
        Self { state, index, id }
    }

    fn record(&self, command: PassCommand) {
        if let Some(pass) = self.state.lock().passes.get_mut(self.index) {
            pass.commands.push(command);
        }
    }
}

impl RenderPassEncoder for MockRenderPass {
    fn pass_id(&self) -> PassId {
        self.id
    }

    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.record(PassCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId) {
        self.record(PassCommand::SetBindGroup(index, bind_group));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, _offset: u64) {
        self.record(PassCommand::SetVertexBuffer(slot, buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferId, _offset: u64, index_format: IndexFormat) {
        self.record(PassCommand::SetIndexBuffer(buffer, index_format));
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.record(PassCommand::SetViewport(*viewport));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.record(PassCommand::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.record(PassCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }
}
