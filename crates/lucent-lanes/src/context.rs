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

//! The [`GpuContext`] shared by factories, sync objects and passes.

use crate::factory::{GpuFactory, MaterialFactory, MeshFactory, ModelFactory, TextureFactory};
use crate::gpu::{BindGroupArena, BindGroupSlot, GpuBindGroup, GpuSyncable, OwnedBuffer};
use crate::pipeline::PipelineManager;
use crate::shader::{BindGroupLayoutInfo, BindingKind, ShaderInfo, ShaderRegistry};
use lucent_core::renderer::{
    AddressMode, BindGroupDescriptor, BindGroupEntry, BindGroupId, BindingResource,
    BufferBinding, BufferDescriptor, CompareFunction, FilterMode, GraphicsDevice,
    RenderError, RendererConfig, ResourceError, SamplerDescriptor, SamplerId,
};
use lucent_core::ResourceRegistry;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::sync::Arc;

/// The samplers created once per context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    /// Linear filtering, clamped to edge. Used for fullscreen sources.
    LinearClamp,
    /// Linear filtering, repeating. Used for material textures.
    LinearRepeat,
    /// Nearest filtering, clamped to edge.
    NearestClamp,
    /// `LessEqual` comparison sampler for shadow maps.
    ShadowComparison,
}

impl SamplerKind {
    const ALL: [SamplerKind; 4] = [
        SamplerKind::LinearClamp,
        SamplerKind::LinearRepeat,
        SamplerKind::NearestClamp,
        SamplerKind::ShadowComparison,
    ];

    fn descriptor(self) -> SamplerDescriptor<'static> {
        let (address, filter, compare) = match self {
            SamplerKind::LinearClamp => (AddressMode::ClampToEdge, FilterMode::Linear, None),
            SamplerKind::LinearRepeat => (AddressMode::Repeat, FilterMode::Linear, None),
            SamplerKind::NearestClamp => (AddressMode::ClampToEdge, FilterMode::Nearest, None),
            SamplerKind::ShadowComparison => (
                AddressMode::ClampToEdge,
                FilterMode::Linear,
                Some(CompareFunction::LessEqual),
            ),
        };
        SamplerDescriptor {
            label: Some(Cow::Owned(format!("{self:?}"))),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: FilterMode::Nearest,
            compare,
        }
    }
}

/// Number of GPU objects released by [`GpuContext::sweep_orphans`], per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Textures released.
    pub textures: usize,
    /// Meshes released.
    pub meshes: usize,
    /// Materials released.
    pub materials: usize,
    /// Models released.
    pub models: usize,
}

impl SweepStats {
    /// Total number of released objects.
    pub fn total(&self) -> usize {
        self.textures + self.meshes + self.materials + self.models
    }
}

/// Owns the device, the CPU resource registry and every GPU-side cache.
///
/// The context is shared by reference. Every cache inside it synchronizes
/// itself, so factories may call each other while creating products.
pub struct GpuContext {
    device: Arc<dyn GraphicsDevice>,
    registry: Arc<ResourceRegistry>,
    config: RendererConfig,
    shaders: ShaderRegistry,
    pipelines: PipelineManager,
    samplers: [SamplerId; 4],
    bind_groups: Mutex<BindGroupArena>,
    textures: TextureFactory,
    meshes: MeshFactory,
    materials: MaterialFactory,
    models: ModelFactory,
}

impl GpuContext {
    /// Validates `config`, creates the shared samplers and registers the
    /// builtin shaders.
    ///
    /// ## Errors
    /// [`RenderError::InvalidConfiguration`] for unusable formats, or any
    /// error the device reports while compiling the builtins.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        registry: Arc<ResourceRegistry>,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let config = config.validate()?;
        let mut samplers = [SamplerId(0); 4];
        for (slot, kind) in samplers.iter_mut().zip(SamplerKind::ALL) {
            *slot = device.create_sampler(&kind.descriptor())?;
        }
        let shaders = ShaderRegistry::new(device.as_ref(), &config)?;
        log::info!("GpuContext: ready ({} shaders)", shaders.len());
        Ok(Self {
            device,
            registry,
            config,
            shaders,
            pipelines: PipelineManager::new(),
            samplers,
            bind_groups: Mutex::new(BindGroupArena::new()),
            textures: TextureFactory::default(),
            meshes: MeshFactory::default(),
            materials: MaterialFactory::default(),
            models: ModelFactory::default(),
        })
    }

    /// The graphics device.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// A shared reference to the graphics device.
    pub fn device_arc(&self) -> Arc<dyn GraphicsDevice> {
        self.device.clone()
    }

    /// The CPU resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The renderer configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The shader registry.
    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    /// The pipeline cache.
    pub fn pipelines(&self) -> &PipelineManager {
        &self.pipelines
    }

    /// Registers `info`, replacing the shader of the same name, and drops
    /// the pipelines compiled from the old one.
    pub fn reload_shader(&self, info: ShaderInfo) -> Arc<ShaderInfo> {
        let info = self.shaders.register(info);
        let dropped = self.pipelines.invalidate_shader(info.name());
        log::info!("GpuContext: reloaded shader '{}' ({dropped} pipelines dropped)", info.name());
        info
    }

    /// The texture factory.
    pub fn textures(&self) -> &TextureFactory {
        &self.textures
    }

    /// The mesh factory.
    pub fn meshes(&self) -> &MeshFactory {
        &self.meshes
    }

    /// The material factory.
    pub fn materials(&self) -> &MaterialFactory {
        &self.materials
    }

    /// The model factory.
    pub fn models(&self) -> &ModelFactory {
        &self.models
    }

    /// One of the shared samplers.
    pub fn sampler(&self, kind: SamplerKind) -> SamplerId {
        self.samplers[kind as usize]
    }

    /// The bind group arena.
    pub fn bind_groups(&self) -> &Mutex<BindGroupArena> {
        &self.bind_groups
    }

    /// Creates a bind group for `layout` and stores it in the arena.
    ///
    /// `resources` supplies bindings by index. Buffer bindings left out get a
    /// zeroed buffer of the declared size, owned by the group.
    ///
    /// ## Errors
    /// * `ResourceError::NotFound` - If a texture or sampler binding is left out.
    /// * Any error the device reports. Buffers allocated so far are freed.
    pub fn create_bind_group(
        &self,
        layout: &Arc<BindGroupLayoutInfo>,
        resources: &[(u32, BindingResource)],
        label: &str,
    ) -> Result<BindGroupSlot, ResourceError> {
        let mut owned = Vec::new();
        let result = self.build_entries(layout, resources, label, &mut owned).and_then(|entries| {
            self.device.create_bind_group(&BindGroupDescriptor {
                label: Some(label),
                layout: layout.layout_id(),
                entries: &entries,
            })
        });
        match result {
            Ok(id) => {
                let group = GpuBindGroup::new(id, layout.clone(), owned);
                let slot = self.bind_groups.lock().insert(group);
                log::trace!("GpuContext: bind group '{label}' at {slot:?}");
                Ok(slot)
            }
            Err(e) => {
                for buffer in owned {
                    let _ = self.device.destroy_buffer(buffer.buffer);
                }
                Err(e)
            }
        }
    }

    fn build_entries(
        &self,
        layout: &BindGroupLayoutInfo,
        resources: &[(u32, BindingResource)],
        label: &str,
        owned: &mut Vec<OwnedBuffer>,
    ) -> Result<Vec<BindGroupEntry>, ResourceError> {
        let mut entries = Vec::with_capacity(layout.entries().len());
        for info in layout.entries() {
            let provided = resources
                .iter()
                .find(|(binding, _)| *binding == info.binding)
                .map(|(_, resource)| *resource);
            let resource = match (provided, &info.kind) {
                (Some(resource), _) => resource,
                (None, BindingKind::UniformBuffer { size }) => {
                    let descriptor = BufferDescriptor::uniform(format!("{label}.{}", info.name), *size);
                    self.own_buffer(&descriptor, info.binding, *size, owned)?
                }
                (None, BindingKind::StorageBuffer { size, .. }) => {
                    let descriptor = BufferDescriptor::storage(format!("{label}.{}", info.name), *size);
                    self.own_buffer(&descriptor, info.binding, *size, owned)?
                }
                (None, _) => {
                    log::warn!(
                        "GpuContext: '{label}' has no resource for binding {} ('{}')",
                        info.binding,
                        info.name
                    );
                    return Err(ResourceError::NotFound);
                }
            };
            entries.push(BindGroupEntry {
                binding: info.binding,
                resource,
            });
        }
        Ok(entries)
    }

    fn own_buffer(
        &self,
        descriptor: &BufferDescriptor,
        binding: u32,
        size: u64,
        owned: &mut Vec<OwnedBuffer>,
    ) -> Result<BindingResource, ResourceError> {
        let buffer = self.device.create_buffer(descriptor)?;
        owned.push(OwnedBuffer {
            binding,
            buffer,
            size,
        });
        Ok(BindingResource::Buffer(BufferBinding {
            buffer,
            offset: 0,
            size: None,
        }))
    }

    /// Removes a bind group from the arena and destroys it. Stale slots are ignored.
    pub fn release_bind_group(&self, slot: BindGroupSlot) {
        let removed = self.bind_groups.lock().remove(slot);
        if let Some(group) = removed {
            group.release(self.device());
        }
    }

    /// Writes into a buffer owned by the group at `slot`.
    ///
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If the slot is stale.
    /// * See [`GpuBindGroup::update_buffer`].
    pub fn write_bind_group_buffer(
        &self,
        slot: BindGroupSlot,
        binding: u32,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let arena = self.bind_groups.lock();
        let group = arena.get(slot).ok_or(ResourceError::InvalidHandle)?;
        group.update_buffer(self.device(), binding, offset, data)
    }

    /// The device bind group at `slot`, if the slot is live.
    pub fn bind_group_id(&self, slot: BindGroupSlot) -> Option<BindGroupId> {
        self.bind_groups.lock().get(slot).map(GpuBindGroup::id)
    }

    /// Releases the GPU objects whose CPU resource left the registry.
    ///
    /// Models go first so their meshes are only referenced by the cache.
    pub fn sweep_orphans(&self) -> SweepStats {
        let stats = SweepStats {
            models: self.release_orphans(&self.models),
            materials: self.release_orphans(&self.materials),
            meshes: self.release_orphans(&self.meshes),
            textures: self.release_orphans(&self.textures),
        };
        if stats.total() > 0 {
            log::debug!("GpuContext: swept {stats:?}");
        }
        stats
    }

    fn release_orphans<F: GpuFactory>(&self, factory: &F) -> usize {
        let orphans = factory.cache().drain_orphans(&self.registry);
        for product in &orphans {
            product.release(self);
        }
        orphans.len()
    }

    /// Releases every cached GPU object and bind group.
    ///
    /// Objects still held elsewhere must not be drawn afterwards.
    pub fn release_all(&self) {
        for model in self.models.cache().drain() {
            model.release(self);
        }
        for material in self.materials.cache().drain() {
            material.release(self);
        }
        for mesh in self.meshes.cache().drain() {
            mesh.release(self);
        }
        for texture in self.textures.cache().drain() {
            texture.release(self);
        }
        self.textures.release_fallbacks(self);
        let groups = self.bind_groups.lock().drain();
        let count = groups.len();
        for group in groups {
            group.release(self.device());
        }
        log::info!("GpuContext: released all GPU objects ({count} bind groups)");
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("config", &self.config)
            .field("shaders", &self.shaders.len())
            .field("pipelines", &self.pipelines.len())
            .field("bind_groups", &self.bind_groups.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{globals, BindGroupReuse, BindGroupType, BindingInfo};
    use crate::test_support::mock_context;
    use lucent_core::renderer::{BindGroupLayoutId, SamplerBindingType, ShaderStageFlags};
    use lucent_core::math::{LinearRgba, Vec3};
    use lucent_core::Identifiable;
    use lucent_data::{Mesh, Texture};

    #[test]
    fn config_is_validated_on_creation() {
        let (_device, ctx) = crate::test_support::mock_context_with(RendererConfig {
            max_shadow_maps_cube: 0,
            ..RendererConfig::default()
        });
        assert_eq!(ctx.config().max_shadow_maps_cube, 1);

        let device = crate::test_support::MockGraphicsDevice::new();
        let result = GpuContext::new(
            Arc::new(device),
            Arc::new(ResourceRegistry::new()),
            RendererConfig {
                depth_format: lucent_core::renderer::TextureFormat::Rgba8Unorm,
                ..RendererConfig::default()
            },
        );
        assert!(matches!(result, Err(RenderError::InvalidConfiguration(_))));
    }

    #[test]
    fn buffers_are_allocated_for_missing_buffer_bindings() {
        let (device, ctx) = mock_context();
        let layout = ctx.shaders().global_layout(globals::OBJECT).unwrap().clone();
        let before = device.stats().buffers_created;

        let slot = ctx.create_bind_group(&layout, &[], "object").unwrap();
        assert_eq!(device.stats().buffers_created, before + 1);
        assert!(ctx.bind_group_id(slot).is_some());

        ctx.write_bind_group_buffer(slot, 0, 0, &[0u8; 16]).unwrap();
        ctx.release_bind_group(slot);
        assert!(ctx.bind_group_id(slot).is_none());
        assert_eq!(device.stats().buffers_destroyed, 1);
        assert!(matches!(
            ctx.write_bind_group_buffer(slot, 0, 0, &[0u8; 4]),
            Err(ResourceError::InvalidHandle)
        ));
    }

    #[test]
    fn missing_sampler_fails_and_frees_allocated_buffers() {
        let (device, ctx) = mock_context();
        let layout = Arc::new(BindGroupLayoutInfo::new(
            "params",
            BindGroupType::Custom,
            BindGroupReuse::PerFrame,
            0,
            BindGroupLayoutId(999),
            vec![
                BindingInfo::uniform(0, "params", 16, ShaderStageFlags::FRAGMENT),
                BindingInfo::sampler(1, "sampler", SamplerBindingType::Filtering),
            ],
        ));
        let err = ctx.create_bind_group(&layout, &[], "params").unwrap_err();
        assert!(matches!(err, ResourceError::NotFound));
        let stats = device.stats();
        assert_eq!(stats.buffers_created, stats.buffers_destroyed);
        assert!(ctx.bind_groups().lock().is_empty());
    }

    #[test]
    fn samplers_are_created_once() {
        let (device, ctx) = mock_context();
        assert_eq!(device.stats().samplers_created, 4);
        assert_ne!(
            ctx.sampler(SamplerKind::LinearRepeat),
            ctx.sampler(SamplerKind::ShadowComparison)
        );
    }

    #[test]
    fn sweep_releases_objects_whose_source_is_gone() {
        let (device, ctx) = mock_context();
        let mesh = Arc::new(Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y]));
        let texture = Arc::new(Texture::solid_color("red", LinearRgba::rgb(1.0, 0.0, 0.0)));
        ctx.registry().add(mesh.clone());
        ctx.registry().add(texture.clone());
        ctx.meshes().create_from(&ctx, &mesh).unwrap();
        ctx.textures().create_from(&ctx, &texture).unwrap();

        assert_eq!(ctx.sweep_orphans(), SweepStats::default());

        ctx.registry().remove(mesh.handle());
        let stats = ctx.sweep_orphans();
        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.textures, 0);
        assert!(ctx.meshes().get(mesh.handle()).is_none());
        assert!(device.stats().buffers_destroyed >= 1);
    }

    #[test]
    fn release_all_empties_every_cache() {
        let (device, ctx) = mock_context();
        let texture = Arc::new(Texture::solid_color("blue", LinearRgba::rgb(0.0, 0.0, 1.0)));
        ctx.registry().add(texture.clone());
        ctx.textures().create_from(&ctx, &texture).unwrap();
        ctx.textures().white(&ctx).unwrap();

        ctx.release_all();
        let stats = device.stats();
        assert_eq!(stats.textures_created, stats.textures_destroyed);
        assert!(ctx.textures().cache().is_empty());
    }
}
