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

//! Overlay of debug primitives over each camera's scene.

use super::{
    ensure_initialized, init_failure, BindGroupBinder, BindingIds, DebugCollector,
    DebugPrimitive, FrameCache, FramePass, PassState, MAX_DEBUG_PRIMITIVES,
};
use crate::context::GpuContext;
use crate::gpu::BindGroupSlot;
use crate::pipeline::{PipelineHandle, PipelineKey};
use crate::shader::{names, BindGroupType};
use lucent_core::renderer::{
    BlendMode, CullMode, LoadOp, Operations, PrimitiveTopology, RenderError,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp,
    Viewport,
};

/// Vertices the debug shader emits per primitive.
const VERTICES_PER_PRIMITIVE: u32 = 32;

/// Draws the frame's [`DebugCollector`] primitives as lines, depth tested
/// against the scene but not writing depth.
#[derive(Debug, Default)]
pub struct DebugPass {
    state: PassState,
    pipeline: Option<PipelineHandle>,
    bind_group: Option<BindGroupSlot>,
    primitives: Vec<DebugPrimitive>,
    binder: BindGroupBinder,
}

impl DebugPass {
    /// Creates an uninitialized pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the primitives to draw this frame.
    ///
    /// Anything past [`MAX_DEBUG_PRIMITIVES`] is dropped.
    pub fn set_primitives(&mut self, debug: &DebugCollector) {
        let primitives = debug.primitives();
        if primitives.len() > MAX_DEBUG_PRIMITIVES {
            log::warn!(
                "DebugPass: {} primitives queued, drawing the first {MAX_DEBUG_PRIMITIVES}",
                primitives.len()
            );
        }
        self.primitives.clear();
        self.primitives
            .extend_from_slice(&primitives[..primitives.len().min(MAX_DEBUG_PRIMITIVES)]);
    }

    /// Number of primitives drawn per camera.
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Looks up the line pipeline and rebuilds the primitive group for it.
    fn acquire_pipeline(&mut self, ctx: &GpuContext) -> Result<(), RenderError> {
        let name = self.name();
        let config = ctx.config();
        let key = PipelineKey::new(names::DEBUG)
            .with_color(config.color_format)
            .with_depth(config.depth_format, false)
            .with_topology(PrimitiveTopology::LineList)
            .with_cull_mode(CullMode::None)
            .with_blend(BlendMode::AlphaBlend);
        let pipeline = ctx
            .pipelines()
            .get_or_create(ctx.device(), ctx.shaders(), &key)
            .map_err(|e| init_failure(name, e))?;
        let layout = pipeline
            .shader
            .bind_group_of_type(BindGroupType::Debug)
            .ok_or_else(|| init_failure(name, "debug shader has no debug group"))?;
        let group = ctx
            .create_bind_group(layout, &[], "debug")
            .map_err(|e| init_failure(name, e))?;

        if let Some(old) = self.bind_group.replace(group) {
            ctx.release_bind_group(old);
        }
        self.pipeline = Some(pipeline);
        Ok(())
    }
}

impl FramePass for DebugPass {
    fn name(&self) -> &'static str {
        "DebugPass"
    }

    fn state(&self) -> PassState {
        self.state
    }

    fn initialize(&mut self, ctx: &GpuContext) -> Result<(), RenderError> {
        self.acquire_pipeline(ctx)?;
        self.state = PassState::Initialized;
        Ok(())
    }

    fn render(&mut self, ctx: &GpuContext, cache: &mut FrameCache) -> Result<(), RenderError> {
        ensure_initialized(self)?;
        if self
            .pipeline
            .as_ref()
            .is_some_and(|p| !p.is_current(ctx.shaders()))
        {
            log::debug!("DebugPass: shader changed, refreshing pipeline");
            self.acquire_pipeline(ctx)?;
        }
        let (Some(pipeline), Some(group)) = (self.pipeline.clone(), self.bind_group) else {
            return Err(RenderError::NotInitialized);
        };
        if self.primitives.is_empty() || cache.render_targets.is_empty() {
            return Ok(());
        }
        ctx.write_bind_group_buffer(group, 0, 0, bytemuck::cast_slice(&self.primitives))?;
        let count = self.primitives.len() as u32;

        let cameras: Vec<_> = cache.render_targets.values().map(|t| t.camera).collect();
        for camera in &cameras {
            if let Err(e) = cache.frame_bind_group(ctx, camera) {
                log::warn!("DebugPass: no frame group for camera {}: {e}", camera.id);
            }
        }

        let cache: &FrameCache = cache;
        let mut encoder = ctx.device().create_command_encoder(Some("debug pass"));
        for target in cache.render_targets.values() {
            let color = [RenderPassColorAttachment {
                view: target.color.view(),
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Load,
                    store: StoreOp::Store,
                },
                base_array_layer: None,
            }];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("debug pass"),
                color_attachments: &color,
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: target.depth.view(),
                    depth_ops: Some(Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    }),
                    base_array_layer: None,
                }),
            });
            pass.set_viewport(&Viewport {
                x: 0.0,
                y: 0.0,
                width: target.color.width() as f32,
                height: target.color.height() as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            });
            pass.set_pipeline(pipeline.id);
            let ids = BindingIds {
                camera: Some(target.camera.id),
                ..BindingIds::default()
            };
            self.binder.bind(
                pass.as_mut(),
                ctx,
                cache,
                &pipeline.shader,
                ids,
                &[(BindGroupType::Debug, group)],
            );
            pass.draw(0..VERTICES_PER_PRIMITIVE, 0..count);
        }
        ctx.device().submit_command_buffer(encoder.finish());
        self.primitives.clear();
        Ok(())
    }

    fn cleanup(&mut self, ctx: &GpuContext) {
        if let Some(slot) = self.bind_group.take() {
            ctx.release_bind_group(slot);
        }
        self.pipeline = None;
        self.primitives.clear();
        self.state = PassState::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{CameraView, RenderTarget};
    use crate::test_support::{mock_context, PassCommand};
    use lucent_core::math::{LinearRgba, Vec3};

    #[test]
    fn lines_are_drawn_once_per_camera() {
        let (device, ctx) = mock_context();
        let mut pass = DebugPass::new();
        pass.initialize(&ctx).unwrap();
        let mut cache = FrameCache::new();
        for id in [1, 2] {
            let camera = CameraView::perspective(id, Vec3::Z, Vec3::ZERO, 1.0, 8, 8, 0.1, 10.0);
            cache.render_targets.insert(id, RenderTarget::new(&ctx, camera).unwrap());
        }
        let mut debug = DebugCollector::new();
        debug.add_line(Vec3::ZERO, Vec3::X, LinearRgba::WHITE);
        debug.add_arrow(Vec3::ZERO, Vec3::Y, 0.1, LinearRgba::WHITE);
        pass.set_primitives(&debug);
        device.clear_log();

        pass.render(&ctx, &mut cache).unwrap();

        let passes = device.passes();
        assert_eq!(passes.len(), 2);
        for recorded in &passes {
            assert!(matches!(
                recorded.color_attachments[0].ops.load,
                LoadOp::Load
            ));
            assert!(recorded.commands.iter().any(|c| matches!(
                c,
                PassCommand::Draw { vertices, instances } if *vertices == (0..32) && *instances == (0..2)
            )));
            assert_eq!(recorded.bind_group_calls().len(), 2);
        }
        assert_eq!(pass.primitive_count(), 0);
    }

    #[test]
    fn reloaded_debug_shader_swaps_pipeline_and_group() {
        let (device, ctx) = mock_context();
        let mut pass = DebugPass::new();
        pass.initialize(&ctx).unwrap();
        let mut cache = FrameCache::new();
        let camera = CameraView::perspective(1, Vec3::Z, Vec3::ZERO, 1.0, 8, 8, 0.1, 10.0);
        cache.render_targets.insert(1, RenderTarget::new(&ctx, camera).unwrap());
        let bound_pipeline = |device: &crate::test_support::MockGraphicsDevice| {
            device.passes()[0].commands.iter().find_map(|c| match c {
                PassCommand::SetPipeline(id) => Some(*id),
                _ => None,
            })
        };
        let mut debug = DebugCollector::new();
        debug.add_line(Vec3::ZERO, Vec3::X, LinearRgba::WHITE);

        pass.set_primitives(&debug);
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();
        let before = bound_pipeline(&device).unwrap();
        let groups = device.live_bind_groups();

        let descriptor = ctx.shaders().builtin_descriptor(names::DEBUG).unwrap();
        ctx.reload_shader(descriptor.build(ctx.device()).unwrap());
        pass.set_primitives(&debug);
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();

        assert_ne!(bound_pipeline(&device).unwrap(), before);
        assert_eq!(device.live_bind_groups(), groups);
    }

    #[test]
    fn overflow_is_truncated() {
        let mut debug = DebugCollector::new();
        for _ in 0..MAX_DEBUG_PRIMITIVES + 5 {
            debug.add_line(Vec3::ZERO, Vec3::ONE, LinearRgba::BLACK);
        }
        let mut pass = DebugPass::new();
        pass.set_primitives(&debug);
        assert_eq!(pass.primitive_count(), MAX_DEBUG_PRIMITIVES);
    }

    #[test]
    fn nothing_queued_records_nothing() {
        let (device, ctx) = mock_context();
        let mut pass = DebugPass::new();
        pass.initialize(&ctx).unwrap();
        let mut cache = FrameCache::new();
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();
        assert!(device.passes().is_empty());
    }
}
