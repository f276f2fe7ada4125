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

//! Bind group layouts, bind groups and their entries.

use super::buffer::BufferId;
use super::flags::ShaderStageFlags;
use super::texture::{SamplerId, TextureViewDimension, TextureViewId};

/// An opaque handle to a bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupLayoutId(pub usize);

/// An opaque handle to a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupId(pub usize);

/// The kind of buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferBindingType {
    /// A uniform buffer.
    Uniform,
    /// A storage buffer.
    Storage {
        /// Whether the shader only reads from it.
        read_only: bool,
    },
}

/// The sample type a shader expects from a texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSampleType {
    /// Floating point texels.
    Float {
        /// Whether the texture may be sampled with a filtering sampler.
        filterable: bool,
    },
    /// Depth texels, for comparison sampling.
    Depth,
    /// Unsigned integer texels.
    Uint,
}

/// The kind of sampler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerBindingType {
    /// A filtering sampler.
    Filtering,
    /// A non-filtering sampler.
    NonFiltering,
    /// A comparison sampler.
    Comparison,
}

/// The resource type of one layout entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// A buffer binding.
    Buffer {
        /// Uniform or storage.
        ty: BufferBindingType,
        /// Whether a dynamic offset is supplied at bind time.
        has_dynamic_offset: bool,
        /// Minimum size the bound range must have.
        min_binding_size: Option<u64>,
    },
    /// A sampled texture binding.
    Texture {
        /// Expected sample type.
        sample_type: TextureSampleType,
        /// Expected view dimension.
        view_dimension: TextureViewDimension,
        /// Whether the texture is multisampled.
        multisampled: bool,
    },
    /// A sampler binding.
    Sampler(SamplerBindingType),
}

/// One entry of a bind group layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupLayoutEntry {
    /// Binding index inside the group.
    pub binding: u32,
    /// Stages that can see the binding.
    pub visibility: ShaderStageFlags,
    /// Resource type.
    pub ty: BindingType,
}

/// A descriptor used to create a [`BindGroupLayoutId`].
#[derive(Debug, Clone)]
pub struct BindGroupLayoutDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// Layout entries.
    pub entries: &'a [BindGroupLayoutEntry],
}

/// A range of a buffer bound to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferBinding {
    /// The buffer.
    pub buffer: BufferId,
    /// Byte offset into the buffer.
    pub offset: u64,
    /// Size of the range, or the rest of the buffer.
    pub size: Option<u64>,
}

/// The resource bound to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    /// A buffer range.
    Buffer(BufferBinding),
    /// A texture view.
    TextureView(TextureViewId),
    /// A sampler.
    Sampler(SamplerId),
}

/// One entry of a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupEntry {
    /// Binding index inside the group.
    pub binding: u32,
    /// The bound resource.
    pub resource: BindingResource,
}

impl BindGroupEntry {
    /// Binds a whole buffer.
    pub fn buffer(binding: u32, buffer: BufferId) -> Self {
        Self {
            binding,
            resource: BindingResource::Buffer(BufferBinding {
                buffer,
                offset: 0,
                size: None,
            }),
        }
    }

    /// Binds a texture view.
    pub fn texture_view(binding: u32, view: TextureViewId) -> Self {
        Self {
            binding,
            resource: BindingResource::TextureView(view),
        }
    }

    /// Binds a sampler.
    pub fn sampler(binding: u32, sampler: SamplerId) -> Self {
        Self {
            binding,
            resource: BindingResource::Sampler(sampler),
        }
    }
}

/// A descriptor used to create a [`BindGroupId`].
#[derive(Debug, Clone)]
pub struct BindGroupDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The layout the group conforms to.
    pub layout: BindGroupLayoutId,
    /// The bound resources.
    pub entries: &'a [BindGroupEntry],
}
