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

//! Render pass descriptors and pass identity.

use super::texture::TextureViewId;
use crate::math::LinearRgba;
use std::sync::atomic::{AtomicU64, Ordering};

/// An opaque handle to a finished command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub usize);

static NEXT_PASS_ID: AtomicU64 = AtomicU64::new(1);

/// The identity of one begun render pass.
///
/// Every call to `begin_render_pass` yields a distinct id, so two passes never
/// compare equal even if they target the same attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(pub u64);

impl PassId {
    /// Allocates a fresh pass id.
    pub fn next() -> Self {
        Self(NEXT_PASS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Describes the operation to perform on an attachment at the start of a pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadOp<V> {
    /// Keep the existing contents.
    Load,
    /// Clear to the given value.
    Clear(V),
}

/// Describes the operation to perform on an attachment at the end of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// Keep the results.
    Store,
    /// Discard the results.
    Discard,
}

/// Load and store operations for one attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operations<V> {
    /// Operation at the beginning of the pass.
    pub load: LoadOp<V>,
    /// Operation at the end of the pass.
    pub store: StoreOp,
}

/// A color attachment of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassColorAttachment {
    /// The view rendered to.
    pub view: TextureViewId,
    /// Multisample resolve target.
    pub resolve_target: Option<TextureViewId>,
    /// Load and store operations.
    pub ops: Operations<LinearRgba>,
    /// Render into this single array layer of the view's texture instead of
    /// the view itself.
    pub base_array_layer: Option<u32>,
}

/// A depth attachment of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassDepthStencilAttachment {
    /// The depth view.
    pub view: TextureViewId,
    /// Depth load and store operations.
    pub depth_ops: Option<Operations<f32>>,
    /// Render into this single array layer of the view's texture instead of
    /// the view itself.
    pub base_array_layer: Option<u32>,
}

/// A descriptor for a render pass.
#[derive(Debug, Default)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// Color attachments.
    pub color_attachments: &'a [RenderPassColorAttachment],
    /// Depth attachment.
    pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment>,
}

/// A viewport rectangle in pixels, with a depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Minimum depth.
    pub min_depth: f32,
    /// Maximum depth.
    pub max_depth: f32,
}
