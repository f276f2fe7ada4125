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

//! Describes what a shader expects to be bound.

use lucent_core::renderer::{
    BindGroupLayoutEntry, BindGroupLayoutId, BindingType, BufferBindingType, PipelineLayoutId,
    SamplerBindingType, ShaderModuleId, ShaderStageFlags, TextureSampleType,
    TextureViewDimension, VertexBufferLayout,
};
use std::sync::Arc;

/// How long a bound bind group stays valid, which drives rebinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindGroupReuse {
    /// Device wide. Bound once per pass and never rebound.
    Global,
    /// Rebound when the active camera changes.
    PerFrame,
    /// Rebound when the drawn object changes.
    PerObject,
    /// Rebound when the active material changes.
    PerMaterial,
}

impl BindGroupReuse {
    /// Whether groups of this kind are keyed by an instance id.
    pub fn needs_instance(&self) -> bool {
        matches!(self, BindGroupReuse::PerObject | BindGroupReuse::PerMaterial)
    }
}

/// What a bind group carries, which decides where the binder finds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindGroupType {
    /// Camera and time uniforms.
    Frame,
    /// The light storage buffer.
    Light,
    /// Mipmap generation inputs. Never bound by the render passes.
    Mipmap,
    /// Per-object transforms.
    Object,
    /// Material properties and textures.
    Material,
    /// Shadow maps and shadow uniforms, read by lit shaders.
    Shadow,
    /// Light matrix of one 2D shadow pass.
    ShadowPass2D,
    /// Light matrix and position of one cube face pass.
    ShadowPassCube,
    /// Debug primitives.
    Debug,
    /// User data supplied through bind group providers.
    Custom,
}

/// The resource expected at one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// A uniform buffer of `size` bytes.
    UniformBuffer {
        /// Size in bytes.
        size: u64,
    },
    /// A storage buffer of `size` bytes.
    StorageBuffer {
        /// Size in bytes.
        size: u64,
        /// Whether the shader only reads it.
        read_only: bool,
    },
    /// A sampled texture.
    Texture {
        /// Sample type.
        sample_type: TextureSampleType,
        /// View dimension.
        view_dimension: TextureViewDimension,
        /// The material slot feeding this binding, for material groups.
        material_slot: Option<String>,
    },
    /// A sampler.
    Sampler(SamplerBindingType),
}

/// One binding of a bind group layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    /// Binding index.
    pub binding: u32,
    /// Name, for diagnostics.
    pub name: String,
    /// Stages that see the binding.
    pub visibility: ShaderStageFlags,
    /// Expected resource.
    pub kind: BindingKind,
}

impl BindingInfo {
    /// A uniform buffer binding.
    pub fn uniform(binding: u32, name: &str, size: u64, visibility: ShaderStageFlags) -> Self {
        Self {
            binding,
            name: name.to_owned(),
            visibility,
            kind: BindingKind::UniformBuffer { size },
        }
    }

    /// A read-only storage buffer binding.
    pub fn storage(binding: u32, name: &str, size: u64, visibility: ShaderStageFlags) -> Self {
        Self {
            binding,
            name: name.to_owned(),
            visibility,
            kind: BindingKind::StorageBuffer {
                size,
                read_only: true,
            },
        }
    }

    /// A texture binding.
    pub fn texture(
        binding: u32,
        name: &str,
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
    ) -> Self {
        Self {
            binding,
            name: name.to_owned(),
            visibility: ShaderStageFlags::FRAGMENT,
            kind: BindingKind::Texture {
                sample_type,
                view_dimension,
                material_slot: None,
            },
        }
    }

    /// A 2D color texture fed by the material slot `slot`.
    pub fn material_texture(binding: u32, slot: &str) -> Self {
        Self {
            binding,
            name: slot.to_owned(),
            visibility: ShaderStageFlags::FRAGMENT,
            kind: BindingKind::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                view_dimension: TextureViewDimension::D2,
                material_slot: Some(slot.to_owned()),
            },
        }
    }

    /// A sampler binding.
    pub fn sampler(binding: u32, name: &str, ty: SamplerBindingType) -> Self {
        Self {
            binding,
            name: name.to_owned(),
            visibility: ShaderStageFlags::FRAGMENT,
            kind: BindingKind::Sampler(ty),
        }
    }

    /// Byte size of a buffer binding.
    pub fn buffer_size(&self) -> Option<u64> {
        match self.kind {
            BindingKind::UniformBuffer { size } | BindingKind::StorageBuffer { size, .. } => {
                Some(size)
            }
            _ => None,
        }
    }

    /// The device layout entry for this binding.
    pub fn layout_entry(&self) -> BindGroupLayoutEntry {
        let ty = match &self.kind {
            BindingKind::UniformBuffer { .. } => BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            BindingKind::StorageBuffer { read_only, .. } => BindingType::Buffer {
                ty: BufferBindingType::Storage {
                    read_only: *read_only,
                },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            BindingKind::Texture {
                sample_type,
                view_dimension,
                ..
            } => BindingType::Texture {
                sample_type: *sample_type,
                view_dimension: *view_dimension,
                multisampled: false,
            },
            BindingKind::Sampler(ty) => BindingType::Sampler(*ty),
        };
        BindGroupLayoutEntry {
            binding: self.binding,
            visibility: self.visibility,
            ty,
        }
    }
}

/// A compiled bind group layout with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupLayoutInfo {
    name: String,
    group_type: BindGroupType,
    reuse: BindGroupReuse,
    index: u32,
    layout_id: BindGroupLayoutId,
    entries: Vec<BindingInfo>,
}

impl BindGroupLayoutInfo {
    /// Describes a layout already created on the device.
    pub fn new(
        name: impl Into<String>,
        group_type: BindGroupType,
        reuse: BindGroupReuse,
        index: u32,
        layout_id: BindGroupLayoutId,
        entries: Vec<BindingInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            group_type,
            reuse,
            index,
            layout_id,
            entries,
        }
    }

    /// Name of the group inside its shader.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content type.
    pub fn group_type(&self) -> BindGroupType {
        self.group_type
    }

    /// Reuse policy.
    pub fn reuse(&self) -> BindGroupReuse {
        self.reuse
    }

    /// `@group` index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Device layout.
    pub fn layout_id(&self) -> BindGroupLayoutId {
        self.layout_id
    }

    /// Bindings, in declaration order.
    pub fn entries(&self) -> &[BindingInfo] {
        &self.entries
    }

    /// The binding at `binding`.
    pub fn entry(&self, binding: u32) -> Option<&BindingInfo> {
        self.entries.iter().find(|e| e.binding == binding)
    }

    /// The same device layout placed at another group index.
    pub fn at_index(&self, index: u32) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }
}

/// A compiled shader and everything its pipelines need.
#[derive(Debug, Clone)]
pub struct ShaderInfo {
    pub(super) name: String,
    pub(super) module: ShaderModuleId,
    pub(super) vertex_entry: String,
    pub(super) fragment_entry: Option<String>,
    pub(super) vertex_layout: Option<VertexBufferLayout>,
    pub(super) bind_groups: Vec<Arc<BindGroupLayoutInfo>>,
    pub(super) pipeline_layout: PipelineLayoutId,
}

impl ShaderInfo {
    /// Registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled module.
    pub fn module(&self) -> ShaderModuleId {
        self.module
    }

    /// Vertex entry point.
    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    /// Fragment entry point, if the shader has a fragment stage.
    pub fn fragment_entry(&self) -> Option<&str> {
        self.fragment_entry.as_deref()
    }

    /// Vertex buffer layout, or `None` for shaders that generate vertices.
    pub fn vertex_layout(&self) -> Option<&VertexBufferLayout> {
        self.vertex_layout.as_ref()
    }

    /// Pipeline layout built from the bind groups.
    pub fn pipeline_layout(&self) -> PipelineLayoutId {
        self.pipeline_layout
    }

    /// Every bind group, ordered by group index.
    pub fn bind_groups(&self) -> &[Arc<BindGroupLayoutInfo>] {
        &self.bind_groups
    }

    /// The bind group called `name`.
    pub fn bind_group(&self, name: &str) -> Option<&Arc<BindGroupLayoutInfo>> {
        self.bind_groups.iter().find(|g| g.name() == name)
    }

    /// Group index of the bind group called `name`.
    pub fn bind_group_index(&self, name: &str) -> Option<u32> {
        self.bind_group(name).map(|g| g.index())
    }

    /// The first bind group of type `ty`.
    pub fn bind_group_of_type(&self, ty: BindGroupType) -> Option<&Arc<BindGroupLayoutInfo>> {
        self.bind_groups.iter().find(|g| g.group_type() == ty)
    }
}
