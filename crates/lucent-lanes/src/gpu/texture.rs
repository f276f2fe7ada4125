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

//! GPU mirror of a [`Texture`], and GPU-only attachments.

use super::sync::{GpuSyncable, SyncState};
use crate::context::GpuContext;
use lucent_core::math::{Extent3D, Origin3D};
use lucent_core::renderer::{
    GraphicsDevice, ResourceError, TextureDescriptor, TextureDimension, TextureFormat, TextureId,
    TextureUsage, TextureViewDescriptor, TextureViewDimension, TextureViewId,
};
use lucent_core::{Identifiable, Versioned};
use lucent_data::Texture;
use parking_lot::RwLock;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy)]
struct Allocation {
    texture: TextureId,
    view: TextureViewId,
    size: Extent3D,
    format: TextureFormat,
    view_dimension: TextureViewDimension,
    usage: TextureUsage,
}

impl Allocation {
    fn create(
        device: &dyn GraphicsDevice,
        label: &str,
        size: Extent3D,
        format: TextureFormat,
        view_dimension: TextureViewDimension,
        usage: TextureUsage,
    ) -> Result<Self, ResourceError> {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed(label)),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage,
        })?;
        let view = device.create_texture_view(
            texture,
            &TextureViewDescriptor {
                label: Some(Cow::Borrowed(label)),
                dimension: Some(view_dimension),
                array_layer_count: Some(size.depth_or_array_layers),
                ..Default::default()
            },
        );
        let view = match view {
            Ok(view) => view,
            Err(e) => {
                let _ = device.destroy_texture(texture);
                return Err(e);
            }
        };
        Ok(Self {
            texture,
            view,
            size,
            format,
            view_dimension,
            usage,
        })
    }

    fn destroy(self, device: &dyn GraphicsDevice, label: &str) {
        if let Err(e) = device.destroy_texture_view(self.view) {
            log::warn!("GpuTexture: failed to destroy view of '{label}': {e}");
        }
        if let Err(e) = device.destroy_texture(self.texture) {
            log::warn!("GpuTexture: failed to destroy '{label}': {e}");
        }
    }
}

/// A device texture with one default view.
///
/// Textures created from a CPU [`Texture`] follow its version. Attachments
/// (render targets, depth buffers, shadow maps) have no CPU source and are
/// never synced.
#[derive(Debug)]
pub struct GpuTexture {
    state: SyncState<Texture>,
    label: String,
    allocation: RwLock<Allocation>,
}

impl GpuTexture {
    /// Uploads `texture` into a new sampled texture.
    pub fn from_cpu(ctx: &GpuContext, texture: &Texture) -> Result<Self, ResourceError> {
        let version = texture.version();
        let label = texture.name().unwrap_or_else(|| format!("texture#{}", texture.id()));
        let data = texture.data();
        let allocation = Allocation::create(
            ctx.device(),
            &label,
            Extent3D::flat(data.width, data.height),
            data.format,
            TextureViewDimension::D2,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )?;
        let written = ctx.device().write_texture(
            allocation.texture,
            &data.pixels,
            Some(data.bytes_per_row()),
            Origin3D::default(),
            allocation.size,
        );
        if let Err(e) = written {
            allocation.destroy(ctx.device(), &label);
            return Err(e);
        }
        Ok(Self {
            state: SyncState::new(texture.handle(), version),
            label,
            allocation: RwLock::new(allocation),
        })
    }

    /// Creates a GPU-only texture, e.g. a render target or a shadow map array.
    ///
    /// `layers` is the array layer count; cube views need a multiple of six.
    #[allow(clippy::too_many_arguments)]
    pub fn attachment(
        ctx: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        layers: u32,
        format: TextureFormat,
        view_dimension: TextureViewDimension,
        usage: TextureUsage,
    ) -> Result<Self, ResourceError> {
        let size = Extent3D {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: layers.max(1),
        };
        let allocation =
            Allocation::create(ctx.device(), label, size, format, view_dimension, usage)?;
        Ok(Self {
            state: SyncState::detached(),
            label: label.to_owned(),
            allocation: RwLock::new(allocation),
        })
    }

    /// The device texture.
    pub fn texture_id(&self) -> TextureId {
        self.allocation.read().texture
    }

    /// The default view covering every layer.
    pub fn view(&self) -> TextureViewId {
        self.allocation.read().view
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.allocation.read().size.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.allocation.read().size.height
    }

    /// Array layer count.
    pub fn layers(&self) -> u32 {
        self.allocation.read().size.depth_or_array_layers
    }

    /// Texel format.
    pub fn format(&self) -> TextureFormat {
        self.allocation.read().format
    }

    /// Dimension of the default view.
    pub fn view_dimension(&self) -> TextureViewDimension {
        self.allocation.read().view_dimension
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` if this texture has no CPU source.
    pub fn is_attachment(&self) -> bool {
        !self.state.handle().is_valid()
    }
}

impl GpuSyncable for GpuTexture {
    type Cpu = Texture;

    fn sync_state(&self) -> &SyncState<Texture> {
        &self.state
    }

    fn sync_from_cpu(&self, cpu: &Texture, ctx: &GpuContext) -> Result<(), ResourceError> {
        let data = cpu.data();
        let mut allocation = self.allocation.write();
        let size = Extent3D::flat(data.width, data.height);
        if allocation.size != size || allocation.format != data.format {
            log::debug!(
                "GpuTexture: '{}' changed to {}x{} {:?}, reallocating",
                self.label,
                data.width,
                data.height,
                data.format
            );
            let replacement = Allocation::create(
                ctx.device(),
                &self.label,
                size,
                data.format,
                allocation.view_dimension,
                allocation.usage,
            )?;
            std::mem::replace(&mut *allocation, replacement).destroy(ctx.device(), &self.label);
        }
        ctx.device().write_texture(
            allocation.texture,
            &data.pixels,
            Some(data.bytes_per_row()),
            Origin3D::default(),
            size,
        )
    }

    fn release(&self, ctx: &GpuContext) {
        self.allocation.read().destroy(ctx.device(), &self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_context;
    use lucent_core::math::LinearRgba;
    use std::sync::Arc;

    #[test]
    fn resize_reallocates_and_keeps_attachment_state_detached() {
        let (device, ctx) = mock_context();
        let cpu = Arc::new(Texture::solid_color("red", LinearRgba::rgb(1.0, 0.0, 0.0)));
        ctx.registry().add(cpu.clone());

        let gpu = GpuTexture::from_cpu(&ctx, &cpu).unwrap();
        let first_view = gpu.view();
        assert_eq!(device.stats().texture_writes, 1);

        cpu.set_pixels(vec![0, 255, 0, 255]).unwrap();
        gpu.sync_if_needed(&ctx).unwrap();
        assert_eq!(gpu.view(), first_view);
        assert_eq!(device.stats().texture_writes, 2);

        cpu.resize(4, 2);
        gpu.sync_if_needed(&ctx).unwrap();
        assert_ne!(gpu.view(), first_view);
        assert_eq!((gpu.width(), gpu.height()), (4, 2));
        assert_eq!(device.stats().textures_destroyed, 1);

        let target = GpuTexture::attachment(
            &ctx,
            "target",
            0,
            16,
            1,
            TextureFormat::Rgba8Unorm,
            TextureViewDimension::D2,
            TextureUsage::RENDER_ATTACHMENT,
        )
        .unwrap();
        assert!(target.is_attachment());
        assert_eq!(target.width(), 1);
    }
}
