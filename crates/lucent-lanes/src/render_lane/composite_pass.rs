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

//! Final pass copying every camera's output into its region of the surface.

use super::source_groups::SourceGroups;
use super::{ensure_initialized, init_failure, BindGroupBinder, FrameCache, FramePass, PassState};
use crate::context::GpuContext;
use crate::pipeline::{PipelineHandle, PipelineKey};
use crate::shader::names;
use lucent_core::renderer::{
    CullMode, LoadOp, Operations, RenderError, RenderPassColorAttachment, RenderPassDescriptor,
    StoreOp, TextureFormat, TextureViewId, Viewport,
};

const SOURCE_GROUP: &str = "source";

/// The texture presented this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTarget {
    /// View of the surface texture.
    pub view: TextureViewId,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Format of the surface texture.
    pub format: TextureFormat,
}

/// Clears the surface once, then draws each render target's output into
/// the viewport its camera covers. Targets are drawn in camera id order.
#[derive(Debug, Default)]
pub struct CompositePass {
    state: PassState,
    surface: Option<SurfaceTarget>,
    sources: SourceGroups,
    binder: BindGroupBinder,
}

impl CompositePass {
    /// Creates an uninitialized pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the surface of the next [`render`](FramePass::render).
    pub fn set_surface(&mut self, surface: Option<SurfaceTarget>) {
        self.surface = surface;
    }

    fn pipeline(ctx: &GpuContext, format: TextureFormat) -> Result<PipelineHandle, RenderError> {
        let key = PipelineKey::new(names::COMPOSITE)
            .with_color(format)
            .with_cull_mode(CullMode::None);
        Ok(ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key)?)
    }
}

impl FramePass for CompositePass {
    fn name(&self) -> &'static str {
        "CompositePass"
    }

    fn state(&self) -> PassState {
        self.state
    }

    fn initialize(&mut self, ctx: &GpuContext) -> Result<(), RenderError> {
        let format = ctx
            .device()
            .get_surface_format()
            .unwrap_or(ctx.config().color_format);
        let pipeline = Self::pipeline(ctx, format).map_err(|e| init_failure(self.name(), e))?;
        if pipeline.shader.bind_group(SOURCE_GROUP).is_none() {
            return Err(init_failure(self.name(), "composite shader has no source group"));
        }
        self.state = PassState::Initialized;
        Ok(())
    }

    fn render(&mut self, ctx: &GpuContext, cache: &mut FrameCache) -> Result<(), RenderError> {
        ensure_initialized(self)?;
        let Some(surface) = self.surface.take() else {
            log::debug!("CompositePass: no surface this frame");
            return Ok(());
        };
        let pipeline = Self::pipeline(ctx, surface.format)?;
        let Some(layout) = pipeline.shader.bind_group(SOURCE_GROUP).cloned() else {
            return Err(RenderError::NotInitialized);
        };

        let name = self.name();
        let mut encoder = ctx.device().create_command_encoder(Some("composite"));
        {
            let color = [RenderPassColorAttachment {
                view: surface.view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(ctx.config().clear_color),
                    store: StoreOp::Store,
                },
                base_array_layer: None,
            }];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("composite"),
                color_attachments: &color,
                depth_stencil_attachment: None,
            });
            pass.set_pipeline(pipeline.id);

            let (sw, sh) = (surface.width as f32, surface.height as f32);
            for target in cache.render_targets.values() {
                let region = target.camera.viewport;
                let viewport = Viewport {
                    x: region.x * sw,
                    y: region.y * sh,
                    width: region.z * sw,
                    height: region.w * sh,
                    min_depth: 0.0,
                    max_depth: 1.0,
                };
                if viewport.width < 1.0 || viewport.height < 1.0 {
                    log::trace!("CompositePass: camera {} covers no pixel", target.camera.id);
                    continue;
                }
                let source = target.output().view();
                let Some(group) = self.sources.get_or_create(ctx, &layout, source, name) else {
                    continue;
                };
                pass.set_viewport(&viewport);
                if self
                    .binder
                    .bind_group_by_name(pass.as_mut(), ctx, &pipeline.shader, SOURCE_GROUP, group)
                {
                    pass.draw(0..3, 0..1);
                }
            }
        }
        ctx.device().submit_command_buffer(encoder.finish());
        self.sources.end_frame(ctx);
        Ok(())
    }

    fn cleanup(&mut self, ctx: &GpuContext) {
        self.sources.release_all(ctx);
        self.surface = None;
        self.state = PassState::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{CameraView, RenderTarget};
    use crate::test_support::{mock_context, PassCommand};
    use lucent_core::math::Vec3;

    fn surface() -> SurfaceTarget {
        SurfaceTarget {
            view: TextureViewId(9000),
            width: 200,
            height: 100,
            format: TextureFormat::Bgra8UnormSrgb,
        }
    }

    #[test]
    fn each_target_is_drawn_into_its_viewport() {
        let (device, ctx) = mock_context();
        let mut pass = CompositePass::new();
        pass.initialize(&ctx).unwrap();
        let mut cache = FrameCache::new();
        let left = CameraView::perspective(1, Vec3::Z, Vec3::ZERO, 1.0, 100, 100, 0.1, 10.0)
            .with_viewport(0.0, 0.0, 0.5, 1.0);
        let right = CameraView::perspective(2, Vec3::Z, Vec3::ZERO, 1.0, 100, 100, 0.1, 10.0)
            .with_viewport(0.5, 0.0, 0.5, 1.0);
        for camera in [left, right] {
            cache
                .render_targets
                .insert(camera.id, RenderTarget::new(&ctx, camera).unwrap());
        }
        pass.set_surface(Some(surface()));
        device.clear_log();

        pass.render(&ctx, &mut cache).unwrap();

        let passes = device.passes();
        assert_eq!(passes.len(), 1);
        let recorded = &passes[0];
        assert_eq!(recorded.color_attachments[0].view, TextureViewId(9000));
        assert_eq!(recorded.draw_count(), 2);
        let viewports: Vec<_> = recorded
            .commands
            .iter()
            .filter_map(|c| match c {
                PassCommand::SetViewport(v) => Some((v.x, v.width)),
                _ => None,
            })
            .collect();
        assert_eq!(viewports, vec![(0.0, 100.0), (100.0, 100.0)]);
    }

    #[test]
    fn without_a_surface_nothing_is_recorded() {
        let (device, ctx) = mock_context();
        let mut pass = CompositePass::new();
        pass.initialize(&ctx).unwrap();
        let mut cache = FrameCache::new();
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();
        assert!(device.passes().is_empty());
    }
}
