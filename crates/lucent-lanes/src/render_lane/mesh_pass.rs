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

//! Forward pass drawing the visible items of every camera.

use super::{
    ensure_initialized, init_failure, BindGroupBinder, BindingIds, DrawStats, FramePass,
    FrameCache, PassState, RenderTarget,
};
use crate::context::GpuContext;
use crate::gpu::{BindGroupSlot, GpuSyncable};
use crate::pipeline::{PipelineHandle, PipelineKey};
use crate::shader::{globals, names, BindGroupType};
use lucent_core::renderer::{
    LightsHeader, LoadOp, Operations, PrimitiveTopology, RenderError,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    RenderPassEncoder, RenderPipelineId, StoreOp, Viewport,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Draws lit meshes into each camera's color and depth targets.
///
/// Per camera the pass binds the frame group, the light buffer and the
/// shadow group, then walks the camera's visible list. Pipeline and vertex
/// buffer changes are only issued between consecutive items that differ.
#[derive(Debug, Default)]
pub struct MeshPass {
    state: PassState,
    light_bind_group: Option<BindGroupSlot>,
    shadow_bind_group: Option<BindGroupSlot>,
    visible: HashMap<u64, Vec<usize>>,
    binder: BindGroupBinder,
    last_stats: DrawStats,
}

impl MeshPass {
    /// Creates an uninitialized pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collector indices `camera_id` draws this frame.
    pub fn set_visible(&mut self, camera_id: u64, indices: Vec<usize>) {
        self.visible.insert(camera_id, indices);
    }

    /// Sets the shadow group sampled by the lit shader.
    pub fn set_shadow_bind_group(&mut self, slot: Option<BindGroupSlot>) {
        self.shadow_bind_group = slot;
    }

    /// The light storage group, once initialized.
    pub fn light_bind_group(&self) -> Option<BindGroupSlot> {
        self.light_bind_group
    }

    /// Draw totals of the last [`render`](FramePass::render).
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }

    /// Writes the light header and the packed lights.
    ///
    /// The header is written even with no lights so the shader always reads
    /// a valid count.
    fn upload_lights(&self, ctx: &GpuContext, cache: &FrameCache) -> Result<(), RenderError> {
        let Some(slot) = self.light_bind_group else {
            return Err(RenderError::NotInitialized);
        };
        let max = ctx.config().max_lights as usize;
        if cache.light_uniforms.len() > max {
            log::warn!(
                "MeshPass: {} lights, only the first {max} are uploaded",
                cache.light_uniforms.len()
            );
        }
        let lights = &cache.light_uniforms[..cache.light_uniforms.len().min(max)];
        let header = LightsHeader::new(lights.len() as u32);
        ctx.write_bind_group_buffer(slot, 0, 0, bytemuck::bytes_of(&header))?;
        if !lights.is_empty() {
            ctx.write_bind_group_buffer(
                slot,
                0,
                LightsHeader::LIGHTS_OFFSET,
                bytemuck::cast_slice(lights),
            )?;
        }
        Ok(())
    }

    fn draw_camera(
        &mut self,
        pass: &mut dyn RenderPassEncoder,
        ctx: &GpuContext,
        cache: &FrameCache,
        target: &RenderTarget,
        overrides: &mut Vec<(BindGroupType, BindGroupSlot)>,
    ) {
        let camera = &target.camera;
        pass.set_viewport(&Viewport {
            x: 0.0,
            y: 0.0,
            width: target.color.width() as f32,
            height: target.color.height() as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });

        let Some(indices) = self.visible.remove(&camera.id) else {
            return;
        };

        let mut current: Option<(Arc<str>, PrimitiveTopology, PipelineHandle)> = None;
        let mut bound_pipeline: Option<RenderPipelineId> = None;
        let mut bound_mesh = None;

        for index in indices {
            let Some(item) = cache.item(index) else {
                log::trace!("MeshPass: item {index} was not prepared");
                self.last_stats.skipped += 1;
                continue;
            };
            let shader = item.material.shader();
            let topology = item.mesh.topology();

            let reuse = matches!(
                &current,
                Some((name, t, _)) if name.as_ref() == shader.name() && *t == topology
            );
            if !reuse {
                let key = PipelineKey::new(shader.name())
                    .with_color(target.color.format())
                    .with_depth(target.depth.format(), true)
                    .with_topology(topology);
                match ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key) {
                    Ok(handle) => current = Some((Arc::from(shader.name()), topology, handle)),
                    Err(e) => {
                        log::warn!("MeshPass: no pipeline for '{}': {e}", shader.name());
                        self.last_stats.skipped += 1;
                        continue;
                    }
                }
            }
            let Some((_, _, pipeline)) = &current else {
                continue;
            };

            if bound_pipeline != Some(pipeline.id) {
                pass.set_pipeline(pipeline.id);
                bound_pipeline = Some(pipeline.id);
                self.binder.reset();
            }
            let mesh_buffer = item.mesh.vertex_buffer();
            if bound_mesh != Some(mesh_buffer) {
                item.mesh.bind_buffers(pass);
                bound_mesh = Some(mesh_buffer);
            }

            overrides.clear();
            overrides.push((BindGroupType::Material, item.material.bind_group()));
            if let Some(light) = self.light_bind_group {
                overrides.push((BindGroupType::Light, light));
            }
            if let Some(shadow) = self.shadow_bind_group {
                overrides.push((BindGroupType::Shadow, shadow));
            }
            if item.is_transient() {
                overrides.push((BindGroupType::Object, item.object_bind_group));
            }
            let ids = BindingIds {
                camera: Some(camera.id),
                object: Some(item.object_id),
                material: Some(item.material.cpu_handle().id()),
            };
            self.binder
                .bind(pass, ctx, cache, &pipeline.shader, ids, overrides.as_slice());

            item.mesh.draw_submesh(pass, &item.submesh);
            self.last_stats.drawn += 1;
        }
    }
}

impl FramePass for MeshPass {
    fn name(&self) -> &'static str {
        "MeshPass"
    }

    fn state(&self) -> PassState {
        self.state
    }

    fn initialize(&mut self, ctx: &GpuContext) -> Result<(), RenderError> {
        let name = self.name();
        ctx.shaders()
            .require(names::MESH_LIT)
            .map_err(|e| init_failure(name, e))?;
        let config = ctx.config();
        let key = PipelineKey::new(names::MESH_LIT)
            .with_color(config.color_format)
            .with_depth(config.depth_format, true);
        ctx.pipelines()
            .get_or_create(ctx.device(), ctx.shaders(), &key)
            .map_err(|e| init_failure(name, e))?;

        let layout = ctx
            .shaders()
            .global_layout(globals::LIGHT)
            .cloned()
            .ok_or_else(|| init_failure(name, "missing light layout"))?;
        let slot = ctx
            .create_bind_group(&layout, &[], "lights")
            .map_err(|e| init_failure(name, e))?;
        self.light_bind_group = Some(slot);
        self.state = PassState::Initialized;
        log::debug!("MeshPass: initialized");
        Ok(())
    }

    fn render(&mut self, ctx: &GpuContext, cache: &mut FrameCache) -> Result<(), RenderError> {
        ensure_initialized(self)?;
        self.last_stats = DrawStats::default();
        self.upload_lights(ctx, cache)?;

        let cameras: Vec<_> = cache.render_targets.values().map(|t| t.camera).collect();
        for camera in &cameras {
            if let Err(e) = cache.frame_bind_group(ctx, camera) {
                log::warn!("MeshPass: no frame group for camera {}: {e}", camera.id);
            }
        }

        let cache: &FrameCache = cache;
        let mut overrides = Vec::with_capacity(4);
        let mut encoder = ctx.device().create_command_encoder(Some("mesh pass"));
        for target in cache.render_targets.values() {
            let color = [RenderPassColorAttachment {
                view: target.color.view(),
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(target.clear_color(ctx)),
                    store: StoreOp::Store,
                },
                base_array_layer: None,
            }];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("mesh pass"),
                color_attachments: &color,
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: target.depth.view(),
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    base_array_layer: None,
                }),
            });
            self.draw_camera(pass.as_mut(), ctx, cache, target, &mut overrides);
        }
        ctx.device().submit_command_buffer(encoder.finish());

        self.visible.clear();
        log::trace!(
            "MeshPass: {} drawn, {} skipped",
            self.last_stats.drawn,
            self.last_stats.skipped
        );
        Ok(())
    }

    fn cleanup(&mut self, ctx: &GpuContext) {
        if let Some(slot) = self.light_bind_group.take() {
            ctx.release_bind_group(slot);
        }
        self.shadow_bind_group = None;
        self.visible.clear();
        self.state = PassState::Disposed;
    }
}
