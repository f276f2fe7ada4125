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

//! Creates [`GpuTexture`]s, plus the GPU-only textures the passes render into.

use super::{FactoryCache, FactoryError, GpuFactory};
use crate::context::GpuContext;
use crate::gpu::{GpuSyncable, GpuTexture};
use lucent_core::math::{Extent3D, LinearRgba, Origin3D};
use lucent_core::renderer::{
    ResourceError, TextureFormat, TextureUsage, TextureViewDimension,
};
use lucent_data::Texture;
use parking_lot::Mutex;
use std::sync::Arc;

/// Factory of [`GpuTexture`].
#[derive(Default)]
pub struct TextureFactory {
    cache: FactoryCache<Texture, GpuTexture>,
    white: Mutex<Option<Arc<GpuTexture>>>,
}

impl GpuFactory for TextureFactory {
    type Source = Texture;
    type Product = GpuTexture;
    const KIND: &'static str = "Texture";

    fn cache(&self) -> &FactoryCache<Texture, GpuTexture> {
        &self.cache
    }

    fn create_product(&self, ctx: &GpuContext, source: &Texture) -> Result<GpuTexture, FactoryError> {
        Ok(GpuTexture::from_cpu(ctx, source)?)
    }
}

impl TextureFactory {
    /// The 1x1 white texture bound to empty material slots. Created once.
    pub fn white(&self, ctx: &GpuContext) -> Result<Arc<GpuTexture>, ResourceError> {
        let mut white = self.white.lock();
        if let Some(texture) = white.as_ref() {
            return Ok(texture.clone());
        }
        let texture = Arc::new(self.solid_color(ctx, "white", LinearRgba::WHITE)?);
        *white = Some(texture.clone());
        Ok(texture)
    }

    /// A new 1x1 texture filled with `color`.
    pub fn solid_color(
        &self,
        ctx: &GpuContext,
        label: &str,
        color: LinearRgba,
    ) -> Result<GpuTexture, ResourceError> {
        let texture = GpuTexture::attachment(
            ctx,
            label,
            1,
            1,
            1,
            TextureFormat::Rgba8Unorm,
            TextureViewDimension::D2,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )?;
        let written = ctx.device().write_texture(
            texture.texture_id(),
            &color.to_rgba8(),
            Some(4),
            Origin3D::default(),
            Extent3D::flat(1, 1),
        );
        if let Err(e) = written {
            texture.release(ctx);
            return Err(e);
        }
        Ok(texture)
    }

    /// A color target that later passes can sample.
    pub fn render_target(
        &self,
        ctx: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<GpuTexture, ResourceError> {
        GpuTexture::attachment(
            ctx,
            label,
            width,
            height,
            1,
            format,
            TextureViewDimension::D2,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        )
    }

    /// A depth buffer.
    pub fn depth_target(
        &self,
        ctx: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<GpuTexture, ResourceError> {
        GpuTexture::attachment(
            ctx,
            label,
            width,
            height,
            1,
            format,
            TextureViewDimension::D2,
            TextureUsage::RENDER_ATTACHMENT,
        )
    }

    /// `layers` square depth maps behind one 2D array view.
    pub fn shadow_map_2d_array(
        &self,
        ctx: &GpuContext,
        size: u32,
        layers: u32,
        format: TextureFormat,
    ) -> Result<GpuTexture, ResourceError> {
        GpuTexture::attachment(
            ctx,
            "shadow_maps_2d",
            size,
            size,
            layers,
            format,
            TextureViewDimension::D2Array,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        )
    }

    /// `cubes` depth cube maps behind one cube array view, six layers each.
    pub fn shadow_map_cube_array(
        &self,
        ctx: &GpuContext,
        size: u32,
        cubes: u32,
        format: TextureFormat,
    ) -> Result<GpuTexture, ResourceError> {
        GpuTexture::attachment(
            ctx,
            "shadow_maps_cube",
            size,
            size,
            cubes.max(1) * 6,
            format,
            TextureViewDimension::CubeArray,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        )
    }

    /// Releases the fallback texture. Cached products are released through
    /// the context.
    pub(crate) fn release_fallbacks(&self, ctx: &GpuContext) {
        if let Some(white) = self.white.lock().take() {
            white.release(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_context;

    #[test]
    fn white_fallback_is_shared() {
        let (device, ctx) = mock_context();
        let created = device.stats().textures_created;
        let a = ctx.textures().white(&ctx).unwrap();
        let b = ctx.textures().white(&ctx).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(device.stats().textures_created, created + 1);
    }

    #[test]
    fn cube_array_has_six_layers_per_cube() {
        let (_, ctx) = mock_context();
        let cubes = ctx
            .textures()
            .shadow_map_cube_array(&ctx, 256, 3, TextureFormat::Depth32Float)
            .unwrap();
        assert_eq!(cubes.layers(), 18);
        assert_eq!(cubes.view_dimension(), TextureViewDimension::CubeArray);
    }
}
