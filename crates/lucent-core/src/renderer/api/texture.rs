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

//! Defines data structures for textures, texture views and samplers.

use super::enums::{CompareFunction, TextureFormat};
use crate::math::Extent3D;
use bitflags::bitflags;
use std::borrow::Cow;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture, or an array of them.
    D2,
    /// A three-dimensional texture.
    D3,
}

/// How a texture view interprets its texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A one-dimensional view.
    D1,
    /// A single 2D layer.
    D2,
    /// An array of 2D layers.
    D2Array,
    /// A cube, six layers.
    Cube,
    /// An array of cubes, six layers each.
    CubeArray,
    /// A 3D volume.
    D3,
}

/// How texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Wraps around.
    Repeat,
    /// Clamps to the edge texel.
    #[default]
    ClampToEdge,
    /// Mirrors on every repeat.
    MirrorRepeat,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Linear interpolation.
    Linear,
}

bitflags! {
    /// Allowed usages of a [`TextureId`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// Destination of a copy or write operation.
        const COPY_DST = 1 << 1;
        /// Sampled from a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Bound as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// Used as a color or depth attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Size and layer count.
    pub size: Extent3D,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// Samples per texel.
    pub sample_count: u32,
    /// Dimensionality.
    pub dimension: TextureDimension,
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
}

/// A descriptor used to create a [`TextureViewId`].
///
/// `None` fields inherit from the texture.
#[derive(Debug, Clone, Default)]
pub struct TextureViewDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Reinterpreted format.
    pub format: Option<TextureFormat>,
    /// View dimensionality.
    pub dimension: Option<TextureViewDimension>,
    /// First mip level visible through the view.
    pub base_mip_level: u32,
    /// Number of mip levels visible through the view.
    pub mip_level_count: Option<u32>,
    /// First array layer visible through the view.
    pub base_array_layer: u32,
    /// Number of array layers visible through the view.
    pub array_layer_count: Option<u32>,
}

/// A descriptor used to create a [`SamplerId`].
#[derive(Debug, Clone, Default)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Address mode along U.
    pub address_mode_u: AddressMode,
    /// Address mode along V.
    pub address_mode_v: AddressMode,
    /// Address mode along W.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels.
    pub mipmap_filter: FilterMode,
    /// Turns this into a comparison sampler.
    pub compare: Option<CompareFunction>,
}

/// An opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a view onto a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);
