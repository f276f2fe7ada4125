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

//! Command recording on top of `wgpu`.

use std::ops::Range;

use lucent_core::renderer::{
    BindGroupId, BufferId, CommandBufferId, CommandEncoder, IndexFormat, PassId,
    RenderPassDescriptor, RenderPassEncoder, RenderPipelineId, Viewport,
};

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;

/// A render pass being recorded into a [`WgpuCommandEncoder`].
pub struct WgpuRenderPass<'encoder> {
    pass: wgpu::RenderPass<'encoder>,
    device: &'encoder WgpuDevice,
    id: PassId,
}

impl RenderPassEncoder for WgpuRenderPass<'_> {
    fn pass_id(&self) -> PassId {
        self.id
    }

    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        match self.device.get_wgpu_render_pipeline(pipeline) {
            Some(wgpu_pipeline) => self.pass.set_pipeline(&wgpu_pipeline),
            None => log::warn!("WgpuRenderPass: RenderPipelineId {pipeline:?} not found."),
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId) {
        match self.device.get_wgpu_bind_group(bind_group) {
            Some(group) => self.pass.set_bind_group(index, group.as_ref(), &[]),
            None => log::warn!("WgpuRenderPass: BindGroupId {bind_group:?} not found."),
        }
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        match self.device.get_wgpu_buffer(buffer) {
            Some(wgpu_buffer) => self.pass.set_vertex_buffer(slot, wgpu_buffer.slice(offset..)),
            None => log::warn!("WgpuRenderPass: Vertex BufferId {buffer:?} not found."),
        }
    }

    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, index_format: IndexFormat) {
        match self.device.get_wgpu_buffer(buffer) {
            Some(wgpu_buffer) => self
                .pass
                .set_index_buffer(wgpu_buffer.slice(offset..), index_format.into_wgpu()),
            None => log::warn!("WgpuRenderPass: Index BufferId {buffer:?} not found."),
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.pass.set_viewport(
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
            viewport.min_depth,
            viewport.max_depth,
        );
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass.draw(vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass.draw_indexed(indices, base_vertex, instances);
    }
}

/// Records commands into a `wgpu::CommandEncoder`.
pub struct WgpuCommandEncoder {
    pub(crate) encoder: wgpu::CommandEncoder,
    pub(crate) device: WgpuDevice,
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPassEncoder + 'encoder> {
        // Resolve every view first; the wgpu attachments borrow them.
        let color_views: Vec<_> = descriptor
            .color_attachments
            .iter()
            .map(|attachment| {
                let view = self
                    .device
                    .get_attachment_view(attachment.view, attachment.base_array_layer);
                if view.is_none() {
                    log::warn!(
                        "WgpuCommandEncoder: color attachment {:?} not found, skipped.",
                        attachment.view
                    );
                }
                let resolve = attachment
                    .resolve_target
                    .and_then(|target| self.device.get_attachment_view(target, None));
                (view, resolve)
            })
            .collect();
        let depth_view = descriptor.depth_stencil_attachment.as_ref().and_then(|attachment| {
            let view = self
                .device
                .get_attachment_view(attachment.view, attachment.base_array_layer);
            if view.is_none() {
                log::warn!(
                    "WgpuCommandEncoder: depth attachment {:?} not found, skipped.",
                    attachment.view
                );
            }
            view
        });

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = descriptor
            .color_attachments
            .iter()
            .zip(&color_views)
            .map(|(attachment, (view, resolve))| {
                view.as_ref().map(|view| wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: resolve.as_deref(),
                    ops: wgpu::Operations {
                        load: attachment.ops.load.into_wgpu(),
                        store: attachment.ops.store.into_wgpu(),
                    },
                })
            })
            .collect();
        let depth_stencil_attachment = descriptor
            .depth_stencil_attachment
            .as_ref()
            .zip(depth_view.as_ref())
            .map(|(attachment, view)| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: attachment.depth_ops.map(|ops| wgpu::Operations {
                    load: ops.load.into_wgpu(),
                    store: ops.store.into_wgpu(),
                }),
                stencil_ops: None,
            });

        let device = &self.device;
        let pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: descriptor.label,
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        Box::new(WgpuRenderPass {
            pass,
            device,
            id: PassId::next(),
        })
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let WgpuCommandEncoder { encoder, device } = *self;
        device.register_command_buffer(encoder.finish())
    }
}
