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

//! Render pipelines, cached by the state that distinguishes them.

use crate::shader::{ShaderInfo, ShaderRegistry};
use lucent_core::renderer::{
    BlendMode, ColorTargetState, CompareFunction, CullMode, DepthStencilState, FrontFace,
    GraphicsDevice, PrimitiveTopology, RenderPipelineDescriptor, RenderPipelineId, ResourceError,
    TextureFormat,
};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything that selects one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Registered shader name.
    pub shader: String,
    /// Color attachment format. `None` for depth-only pipelines.
    pub color_format: Option<TextureFormat>,
    /// Depth attachment format. `None` disables the depth test.
    pub depth_format: Option<TextureFormat>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Whether depth is written.
    pub depth_write: bool,
    /// Constant depth bias, with a fixed slope factor when non-zero.
    pub depth_bias: i32,
    /// Color blending.
    pub blend: BlendMode,
}

impl PipelineKey {
    /// Triangle list, back-face culling, opaque, no attachments.
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            color_format: None,
            depth_format: None,
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::Back,
            depth_write: false,
            depth_bias: 0,
            blend: BlendMode::Opaque,
        }
    }

    /// Renders into a color attachment of `format`.
    pub fn with_color(mut self, format: TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    /// Tests against a depth attachment of `format`.
    pub fn with_depth(mut self, format: TextureFormat, write: bool) -> Self {
        self.depth_format = Some(format);
        self.depth_write = write;
        self
    }

    /// Sets the topology.
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Sets face culling.
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Sets the constant depth bias.
    pub fn with_depth_bias(mut self, depth_bias: i32) -> Self {
        self.depth_bias = depth_bias;
        self
    }

    /// Sets blending.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}

/// A compiled pipeline and the shader it runs.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    /// The device pipeline.
    pub id: RenderPipelineId,
    /// The shader, whose bind groups the pipeline layout follows.
    pub shader: Arc<ShaderInfo>,
}

impl PipelineHandle {
    /// Whether the shader is still the one registered under its name.
    ///
    /// Re-registering a shader leaves handles to the old one stale.
    pub fn is_current(&self, shaders: &ShaderRegistry) -> bool {
        shaders
            .get(self.shader.name())
            .is_some_and(|registered| Arc::ptr_eq(&registered, &self.shader))
    }
}

/// Compiles each distinct [`PipelineKey`] once.
#[derive(Default)]
pub struct PipelineManager {
    pipelines: Mutex<HashMap<PipelineKey, PipelineHandle>>,
}

impl PipelineManager {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pipeline for `key`, compiling it on first use.
    ///
    /// A cached pipeline whose shader was replaced in `shaders` is compiled
    /// again.
    ///
    /// ## Errors
    /// * `ResourceError::Shader` - If `key.shader` is not registered.
    /// * Any error the device reports while compiling.
    pub fn get_or_create(
        &self,
        device: &dyn GraphicsDevice,
        shaders: &ShaderRegistry,
        key: &PipelineKey,
    ) -> Result<PipelineHandle, ResourceError> {
        if let Some(handle) = self.pipelines.lock().get(key) {
            if handle.is_current(shaders) {
                return Ok(handle.clone());
            }
        }
        let shader = shaders.require(&key.shader)?;
        let descriptor = RenderPipelineDescriptor {
            label: Some(Cow::Owned(format!("{}:{:?}", key.shader, key.topology))),
            layout: shader.pipeline_layout(),
            vertex_shader: shader.module(),
            vertex_entry: Cow::Borrowed(shader.vertex_entry()),
            fragment_shader: shader.fragment_entry().map(|_| shader.module()),
            fragment_entry: shader.fragment_entry().map(Cow::Borrowed),
            vertex_buffers: shader.vertex_layout().cloned().into_iter().collect(),
            topology: key.topology,
            cull_mode: key.cull_mode,
            front_face: FrontFace::Ccw,
            depth_stencil: key.depth_format.map(|format| DepthStencilState {
                format,
                depth_write_enabled: key.depth_write,
                depth_compare: CompareFunction::LessEqual,
                depth_bias: key.depth_bias,
                depth_bias_slope_scale: if key.depth_bias != 0 { 2.0 } else { 0.0 },
            }),
            color_targets: key
                .color_format
                .map(|format| ColorTargetState {
                    format,
                    blend: key.blend,
                })
                .into_iter()
                .collect(),
        };
        let id = device.create_render_pipeline(&descriptor)?;
        log::debug!("PipelineManager: compiled {:?}", descriptor.label);

        let handle = PipelineHandle { id, shader };
        self.pipelines.lock().insert(key.clone(), handle.clone());
        Ok(handle)
    }

    /// Drops every pipeline compiled from the shader `name`. They are
    /// compiled again on their next use. Returns how many were dropped.
    pub fn invalidate_shader(&self, name: &str) -> usize {
        let mut pipelines = self.pipelines.lock();
        let before = pipelines.len();
        pipelines.retain(|key, _| key.shader != name);
        let dropped = before - pipelines.len();
        if dropped > 0 {
            log::debug!("PipelineManager: dropped {dropped} pipelines of '{name}'");
        }
        dropped
    }

    /// Number of compiled pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.lock().len()
    }

    /// Returns `true` if nothing was compiled yet.
    pub fn is_empty(&self) -> bool {
        self.pipelines.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::names;
    use crate::test_support::mock_context;

    #[test]
    fn pipelines_are_compiled_once_per_key() {
        let (device, ctx) = mock_context();
        let key = PipelineKey::new(names::SHADOW_2D)
            .with_depth(TextureFormat::Depth32Float, true)
            .with_depth_bias(2);
        let a = ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key).unwrap();
        let b = ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key).unwrap();
        assert_eq!(a.id, b.id);

        let lines = key.clone().with_topology(PrimitiveTopology::LineList);
        let c = ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &lines).unwrap();
        assert_ne!(a.id, c.id);
        assert_eq!(device.pipeline_topology(c.id), Some(PrimitiveTopology::LineList));
        assert_eq!(ctx.pipelines().len(), 2);
    }

    #[test]
    fn unknown_shader_is_an_error() {
        let (_, ctx) = mock_context();
        let key = PipelineKey::new("missing");
        assert!(ctx
            .pipelines()
            .get_or_create(ctx.device(), ctx.shaders(), &key)
            .is_err());
    }

    #[test]
    fn replaced_shader_gets_a_fresh_pipeline() {
        let (_, ctx) = mock_context();
        let key = PipelineKey::new(names::SHADOW_2D).with_depth(TextureFormat::Depth32Float, true);
        let old = ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key).unwrap();
        assert!(old.is_current(ctx.shaders()));

        let replacement = ctx
            .shaders()
            .builtin_descriptor(names::SHADOW_2D)
            .unwrap()
            .build(ctx.device())
            .unwrap();
        ctx.shaders().register(replacement);
        assert!(!old.is_current(ctx.shaders()));

        let new = ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key).unwrap();
        assert_ne!(old.id, new.id);
        assert!(new.is_current(ctx.shaders()));
        assert_eq!(ctx.pipelines().len(), 1);
    }

    #[test]
    fn invalidation_only_touches_the_named_shader() {
        let (_, ctx) = mock_context();
        let shadow = PipelineKey::new(names::SHADOW_2D).with_depth(TextureFormat::Depth32Float, true);
        let debug = PipelineKey::new(names::DEBUG).with_topology(PrimitiveTopology::LineList);
        ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &shadow).unwrap();
        ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &debug).unwrap();

        assert_eq!(ctx.pipelines().invalidate_shader(names::SHADOW_2D), 1);
        assert_eq!(ctx.pipelines().len(), 1);
        assert_eq!(ctx.pipelines().invalidate_shader(names::SHADOW_2D), 0);
    }
}
