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

//! Fullscreen pass turning each camera's scene color into its output.

use super::source_groups::SourceGroups;
use super::{ensure_initialized, init_failure, BindGroupBinder, FrameCache, FramePass, PassState};
use crate::context::GpuContext;
use crate::pipeline::{PipelineHandle, PipelineKey};
use crate::shader::names;
use lucent_core::math::LinearRgba;
use lucent_core::renderer::{
    CullMode, LoadOp, Operations, RenderError, RenderPassColorAttachment, RenderPassDescriptor,
    StoreOp, TextureViewId, Viewport,
};

const SOURCE_GROUP: &str = "source";

/// Samples every target's `color` and writes `post`, which then becomes the
/// target's final color.
#[derive(Debug, Default)]
pub struct PostProcessingPass {
    state: PassState,
    pipeline: Option<PipelineHandle>,
    sources: SourceGroups,
    binder: BindGroupBinder,
}

impl PostProcessingPass {
    /// Creates an uninitialized pass.
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire_pipeline(&mut self, ctx: &GpuContext) -> Result<(), RenderError> {
        let key = PipelineKey::new(names::POST_PROCESS)
            .with_color(ctx.config().color_format)
            .with_cull_mode(CullMode::None);
        let pipeline = ctx
            .pipelines()
            .get_or_create(ctx.device(), ctx.shaders(), &key)
            .map_err(|e| init_failure(self.name(), e))?;
        if pipeline.shader.bind_group(SOURCE_GROUP).is_none() {
            return Err(init_failure(self.name(), "post shader has no source group"));
        }
        // Source groups were built against the old layout.
        self.sources.release_all(ctx);
        self.pipeline = Some(pipeline);
        Ok(())
    }
}

impl FramePass for PostProcessingPass {
    fn name(&self) -> &'static str {
        "PostProcessingPass"
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
            log::debug!("PostProcessingPass: shader changed, refreshing pipeline");
            self.acquire_pipeline(ctx)?;
        }
        let Some(pipeline) = self.pipeline.clone() else {
            return Err(RenderError::NotInitialized);
        };
        let Some(layout) = pipeline.shader.bind_group(SOURCE_GROUP).cloned() else {
            return Err(RenderError::NotInitialized);
        };

        let name = self.name();
        let mut written: Vec<u64> = Vec::with_capacity(cache.render_targets.len());
        let mut encoder = ctx.device().create_command_encoder(Some("post processing"));
        for (&id, target) in &cache.render_targets {
            let source: TextureViewId = target.color.view();
            let Some(group) = self.sources.get_or_create(ctx, &layout, source, name) else {
                continue;
            };
            let color = [RenderPassColorAttachment {
                view: target.post.view(),
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(LinearRgba::BLACK),
                    store: StoreOp::Store,
                },
                base_array_layer: None,
            }];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("post processing"),
                color_attachments: &color,
                depth_stencil_attachment: None,
            });
            pass.set_viewport(&Viewport {
                x: 0.0,
                y: 0.0,
                width: target.post.width() as f32,
                height: target.post.height() as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            });
            pass.set_pipeline(pipeline.id);
            if self
                .binder
                .bind_group_by_name(pass.as_mut(), ctx, &pipeline.shader, SOURCE_GROUP, group)
            {
                pass.draw(0..3, 0..1);
                written.push(id);
            }
        }
        ctx.device().submit_command_buffer(encoder.finish());

        for id in written {
            if let Some(target) = cache.render_targets.get_mut(&id) {
                target.final_color = Some(target.post.clone());
            }
        }
        self.sources.end_frame(ctx);
        Ok(())
    }

    fn cleanup(&mut self, ctx: &GpuContext) {
        self.sources.release_all(ctx);
        self.pipeline = None;
        self.state = PassState::Disposed;
    }
}
