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

//! Pipeline layouts and render pipeline state.

use super::bind_group::BindGroupLayoutId;
use super::enums::{CompareFunction, TextureFormat};
use super::shader::ShaderModuleId;
use std::borrow::Cow;

/// The format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One `f32`.
    Float32,
    /// Two `f32`.
    Float32x2,
    /// Three `f32`.
    Float32x3,
    /// Four `f32`.
    Float32x4,
    /// One `u32`.
    Uint32,
}

impl VertexFormat {
    /// Size in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// Whether a vertex buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexStepMode {
    /// Per vertex.
    Vertex,
    /// Per instance.
    Instance,
}

/// One attribute inside a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Attribute format.
    pub format: VertexFormat,
    /// Byte offset inside the vertex.
    pub offset: u64,
    /// `@location` in the shader.
    pub shader_location: u32,
}

/// Layout of one vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Byte stride between elements.
    pub array_stride: u64,
    /// Step mode.
    pub step_mode: VertexStepMode,
    /// Attributes.
    pub attributes: Vec<VertexAttribute>,
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PrimitiveTopology {
    /// Points.
    PointList,
    /// Separate lines.
    LineList,
    /// Connected lines.
    LineStrip,
    /// Separate triangles.
    #[default]
    TriangleList,
    /// Connected triangles.
    TriangleStrip,
}

/// Which faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Front faces.
    Front,
    /// Back faces.
    #[default]
    Back,
}

/// Winding order of front faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise.
    #[default]
    Ccw,
    /// Clockwise.
    Cw,
}

/// A fixed set of color blending setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// No blending.
    #[default]
    Opaque,
    /// `src * a + dst * (1 - a)`.
    AlphaBlend,
    /// `src + dst`.
    Additive,
}

/// One color output of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetState {
    /// Attachment format.
    pub format: TextureFormat,
    /// Blending applied to the output.
    pub blend: BlendMode,
}

/// Depth test and depth bias state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    /// Depth attachment format.
    pub format: TextureFormat,
    /// Whether passing fragments write depth.
    pub depth_write_enabled: bool,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Constant depth bias.
    pub depth_bias: i32,
    /// Slope-scaled depth bias.
    pub depth_bias_slope_scale: f32,
}

/// An opaque handle to a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineLayoutId(pub usize);

/// A descriptor used to create a [`PipelineLayoutId`].
#[derive(Debug, Clone)]
pub struct PipelineLayoutDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// Bind group layouts, one per group index.
    pub bind_group_layouts: &'a [BindGroupLayoutId],
}

/// An opaque handle to a compiled render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);

/// A descriptor used to create a [`RenderPipelineId`].
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Pipeline layout.
    pub layout: PipelineLayoutId,
    /// Module holding the vertex stage.
    pub vertex_shader: ShaderModuleId,
    /// Vertex entry point.
    pub vertex_entry: Cow<'a, str>,
    /// Module holding the fragment stage, if any.
    pub fragment_shader: Option<ShaderModuleId>,
    /// Fragment entry point.
    pub fragment_entry: Option<Cow<'a, str>>,
    /// Vertex buffer layouts.
    pub vertex_buffers: Vec<VertexBufferLayout>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Front face winding.
    pub front_face: FrontFace,
    /// Depth state. `None` disables the depth test.
    pub depth_stencil: Option<DepthStencilState>,
    /// Color outputs.
    pub color_targets: Vec<ColorTargetState>,
}
