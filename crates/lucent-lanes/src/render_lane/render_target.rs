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

//! Cameras and the offscreen targets they render into.

use crate::context::GpuContext;
use crate::gpu::{GpuSyncable, GpuTexture};
use lucent_core::math::{Frustum, LinearRgba, Mat4, Vec3, Vec4};
use lucent_core::renderer::{FrameUniforms, ResourceError};
use std::sync::Arc;

/// One camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Stable camera id. Keys the render target and the frame bind group.
    pub id: u64,
    /// World to view.
    pub view: Mat4,
    /// View to clip.
    pub projection: Mat4,
    /// World-space eye position.
    pub position: Vec3,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Region of the surface covered, as relative `(x, y, width, height)`.
    pub viewport: Vec4,
    /// Width of the offscreen target in pixels.
    pub width: u32,
    /// Height of the offscreen target in pixels.
    pub height: u32,
    /// Clear color. `None` uses the configured one.
    pub clear_color: Option<LinearRgba>,
}

impl CameraView {
    /// A perspective camera at `eye` looking at `target`, covering the whole surface.
    #[allow(clippy::too_many_arguments)]
    pub fn perspective(
        id: u64,
        eye: Vec3,
        target: Vec3,
        fov_y: f32,
        width: u32,
        height: u32,
        near: f32,
        far: f32,
    ) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Self {
            id,
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
            position: eye,
            near,
            far,
            viewport: Vec4::new(0.0, 0.0, 1.0, 1.0),
            width,
            height,
            clear_color: None,
        }
    }

    /// Restricts the camera to a relative region of the surface.
    pub fn with_viewport(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.viewport = Vec4::new(x, y, width, height);
        self
    }

    /// Overrides the clear color.
    pub fn with_clear_color(mut self, color: LinearRgba) -> Self {
        self.clear_color = Some(color);
        self
    }

    /// Projection times view.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// The culling frustum.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// The uniforms of the frame bind group.
    pub fn frame_uniforms(&self, time: f32) -> FrameUniforms {
        FrameUniforms::new(&self.view, &self.projection, self.position, time)
    }
}

/// The offscreen textures of one camera.
///
/// The mesh and debug passes draw into `color` and `depth`. The
/// post-processing pass reads `color`, writes `post` and points
/// `final_color` at it. The composite pass samples [`output`](Self::output).
#[derive(Debug, Clone)]
pub struct RenderTarget {
    /// The camera drawing into this target.
    pub camera: CameraView,
    /// Scene color.
    pub color: Arc<GpuTexture>,
    /// Scene depth.
    pub depth: Arc<GpuTexture>,
    /// Post-processing output.
    pub post: Arc<GpuTexture>,
    /// The texture to composite, once a pass produced one this frame.
    pub final_color: Option<Arc<GpuTexture>>,
}

impl RenderTarget {
    /// Allocates the textures of `camera`.
    ///
    /// ## Errors
    /// Any allocation failure. Textures created so far are released.
    pub fn new(ctx: &GpuContext, camera: CameraView) -> Result<Self, ResourceError> {
        let config = ctx.config();
        let (w, h) = (camera.width.max(1), camera.height.max(1));
        let textures = ctx.textures();
        let color = Arc::new(textures.render_target(
            ctx,
            &format!("camera{}.color", camera.id),
            w,
            h,
            config.color_format,
        )?);
        let depth = match textures.depth_target(
            ctx,
            &format!("camera{}.depth", camera.id),
            w,
            h,
            config.depth_format,
        ) {
            Ok(depth) => Arc::new(depth),
            Err(e) => {
                color.release(ctx);
                return Err(e);
            }
        };
        let post = match textures.render_target(
            ctx,
            &format!("camera{}.post", camera.id),
            w,
            h,
            config.color_format,
        ) {
            Ok(post) => Arc::new(post),
            Err(e) => {
                color.release(ctx);
                depth.release(ctx);
                return Err(e);
            }
        };
        log::debug!("RenderTarget: allocated {w}x{h} for camera {}", camera.id);
        Ok(Self {
            camera,
            color,
            depth,
            post,
            final_color: None,
        })
    }

    /// Whether the textures have the size `camera` asks for.
    pub fn fits(&self, camera: &CameraView) -> bool {
        self.color.width() == camera.width.max(1) && self.color.height() == camera.height.max(1)
    }

    /// The texture to composite.
    pub fn output(&self) -> &Arc<GpuTexture> {
        self.final_color.as_ref().unwrap_or(&self.color)
    }

    /// Clear color of the camera, or the configured one.
    pub fn clear_color(&self, ctx: &GpuContext) -> LinearRgba {
        self.camera.clear_color.unwrap_or(ctx.config().clear_color)
    }

    /// Releases the textures. Clones of this target must not be drawn afterwards.
    pub fn release(&self, ctx: &GpuContext) {
        self.color.release(ctx);
        self.depth.release(ctx);
        self.post.release(ctx);
    }
}
