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

//! Per-frame GPU state and the render passes that consume it.
//!
//! A frame runs in a fixed order: the [`FrameCache`] is filled with lights and
//! render targets, [`ShadowPass::prepare`] and
//! [`FrameCache::prepare_gpu_resources`] materialize the items each pass will
//! draw, the passes record their commands, and [`FrameCache::clear`] ends the
//! frame. Passes never mutate prepared items.

mod binder;
mod composite_pass;
mod debug_collector;
mod debug_pass;
mod frame_cache;
mod mesh_pass;
mod post_processing_pass;
mod provider;
mod render_item;
mod render_target;
mod shadow_pass;
mod source_groups;

pub use binder::{BindGroupBinder, BindingIds};
pub use composite_pass::{CompositePass, SurfaceTarget};
pub use debug_collector::{DebugCollector, DebugPrimitive, DebugPrimitiveKind, MAX_DEBUG_PRIMITIVES};
pub use debug_pass::DebugPass;
pub use frame_cache::{FrameCache, PrepareError, PrepareStats};
pub use mesh_pass::MeshPass;
pub use post_processing_pass::PostProcessingPass;
pub use provider::{BindGroupDataProvider, CustomBindGroupKey};
pub use render_item::RenderItemGpu;
pub use render_target::{CameraView, RenderTarget};
pub use shadow_pass::ShadowPass;

use crate::context::GpuContext;
use lucent_core::renderer::RenderError;

/// Lifecycle of a [`FramePass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    /// Created, GPU objects not allocated yet.
    #[default]
    Uninitialized,
    /// Ready to render.
    Initialized,
    /// Cleaned up. The pass cannot render again.
    Disposed,
}

/// Draw counts of the last [`FramePass::render`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Draw calls issued.
    pub drawn: usize,
    /// Items skipped because a GPU object or bind group was missing.
    pub skipped: usize,
}

/// A render pass driven once or more per frame.
///
/// `render` fails with [`RenderError::NotInitialized`] unless `initialize`
/// succeeded first. Per-draw failures are skipped and counted in
/// [`DrawStats`], they never fail the pass.
pub trait FramePass {
    /// Name used in logs and command labels.
    fn name(&self) -> &'static str;

    /// Current lifecycle state.
    fn state(&self) -> PassState;

    /// Looks up shaders and allocates the pass's long-lived GPU objects.
    ///
    /// A failure here is fatal for the renderer.
    fn initialize(&mut self, ctx: &GpuContext) -> Result<(), RenderError>;

    /// Records and submits the pass.
    fn render(&mut self, ctx: &GpuContext, cache: &mut FrameCache) -> Result<(), RenderError>;

    /// Releases the pass's GPU objects.
    fn cleanup(&mut self, ctx: &GpuContext);
}

fn ensure_initialized(pass: &dyn FramePass) -> Result<(), RenderError> {
    match pass.state() {
        PassState::Initialized => Ok(()),
        state => {
            log::error!("{}: render called in state {state:?}", pass.name());
            Err(RenderError::NotInitialized)
        }
    }
}

fn init_failure(pass: &'static str, what: impl std::fmt::Display) -> RenderError {
    log::error!("{pass}: initialization failed: {what}");
    RenderError::InitializationFailed(format!("{pass}: {what}"))
}
