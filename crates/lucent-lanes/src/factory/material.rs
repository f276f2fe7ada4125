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

//! Creates [`GpuMaterial`]s.

use super::{FactoryCache, FactoryError, GpuFactory};
use crate::context::GpuContext;
use crate::gpu::GpuMaterial;
use lucent_data::Material;

/// Factory of [`GpuMaterial`]. Referenced textures are created through the
/// texture factory as part of building the material.
#[derive(Default)]
pub struct MaterialFactory {
    cache: FactoryCache<Material, GpuMaterial>,
}

impl GpuFactory for MaterialFactory {
    type Source = Material;
    type Product = GpuMaterial;
    const KIND: &'static str = "Material";

    fn cache(&self) -> &FactoryCache<Material, GpuMaterial> {
        &self.cache
    }

    fn create_product(
        &self,
        ctx: &GpuContext,
        source: &Material,
    ) -> Result<GpuMaterial, FactoryError> {
        GpuMaterial::from_cpu(ctx, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{GpuSyncable, SyncOutcome};
    use crate::shader::names;
    use crate::test_support::mock_context;
    use lucent_core::math::LinearRgba;
    use lucent_data::assets::slots;
    use lucent_data::Texture;
    use std::sync::Arc;

    #[test]
    fn material_creates_its_textures_and_falls_back_to_white() {
        let (_, ctx) = mock_context();
        let diffuse = ctx
            .registry()
            .add(Arc::new(Texture::solid_color("albedo", LinearRgba::WHITE)));
        let material = Material::new("painted", names::MESH_LIT);
        material.set_texture(slots::DIFFUSE, diffuse);
        let material = ctx.registry().add(Arc::new(material));

        let gpu = ctx.materials().create_from_handle(&ctx, material).unwrap();
        let albedo = ctx.textures().get(diffuse).unwrap();
        assert!(Arc::ptr_eq(&gpu.slot_texture(slots::DIFFUSE).unwrap(), &albedo));
        let white = ctx.textures().white(&ctx).unwrap();
        assert!(Arc::ptr_eq(&gpu.slot_texture(slots::NORMAL).unwrap(), &white));
    }

    #[test]
    fn texture_update_resyncs_the_material() {
        let (device, ctx) = mock_context();
        let texture = Arc::new(Texture::solid_color("albedo", LinearRgba::WHITE));
        let diffuse = ctx.registry().add(texture.clone());
        let material = Material::new("painted", names::MESH_LIT);
        material.set_texture(slots::DIFFUSE, diffuse);
        let material = ctx.registry().add(Arc::new(material));

        let gpu = ctx.materials().create_from_handle(&ctx, material).unwrap();
        assert_eq!(gpu.sync_if_needed(&ctx).unwrap(), SyncOutcome::UpToDate);
        let group = gpu.bind_group();

        texture.set_pixels(vec![10, 20, 30, 255]).unwrap();
        let writes_before = device.stats().texture_writes;
        assert_eq!(gpu.sync_if_needed(&ctx).unwrap(), SyncOutcome::Synced);
        assert_eq!(device.stats().texture_writes, writes_before + 1);
        assert_eq!(gpu.bind_group(), group);
        assert_eq!(gpu.sync_if_needed(&ctx).unwrap(), SyncOutcome::UpToDate);

        texture.resize(2, 2);
        gpu.sync_if_needed(&ctx).unwrap();
        assert_ne!(gpu.bind_group(), group);
    }

    #[test]
    fn unknown_shader_is_a_missing_layout() {
        let (_, ctx) = mock_context();
        let material = ctx
            .registry()
            .add(Arc::new(Material::new("odd", "no_such_shader")));
        assert!(matches!(
            ctx.materials().create_from_handle(&ctx, material),
            Err(FactoryError::MissingLayout { .. })
        ));
    }
}
