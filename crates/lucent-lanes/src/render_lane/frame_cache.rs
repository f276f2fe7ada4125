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

//! The per-frame cache of lights, targets and prepared render items.

use super::provider::{BindGroupDataProvider, CustomBindGroupKey};
use super::render_item::RenderItemGpu;
use super::render_target::{CameraView, RenderTarget};
use crate::context::GpuContext;
use crate::factory::{FactoryError, GpuFactory};
use crate::gpu::{BindGroupSlot, GpuSyncable};
use crate::shader::{globals, BindGroupLayoutInfo};
use lucent_core::renderer::{Light, LightStruct, ObjectUniforms, ResourceError, ShadowUniform};
use lucent_data::{RenderCollector, RenderItem, ShadowRequest};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Counts of one [`FrameCache::prepare_gpu_resources`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareStats {
    /// Indices asked for.
    pub requested: usize,
    /// Items materialized by this call.
    pub prepared: usize,
    /// Items already prepared earlier in the frame.
    pub reused: usize,
    /// Items left empty because a GPU object could not be produced.
    pub failed: usize,
}

impl std::ops::AddAssign for PrepareStats {
    fn add_assign(&mut self, rhs: Self) {
        self.requested += rhs.requested;
        self.prepared += rhs.prepared;
        self.reused += rhs.reused;
        self.failed += rhs.failed;
    }
}

/// Why a bind group provider could not be applied.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// The provider names an unknown shader.
    #[error("shader '{0}' is not registered")]
    UnknownShader(String),
    /// The shader declares no group with that name.
    #[error("shader '{shader}' has no bind group '{bind_group}'")]
    UnknownBindGroup {
        /// The shader name.
        shader: String,
        /// The group name.
        bind_group: String,
    },
    /// A per-object or per-material group came without an instance id.
    #[error("bind group '{shader}'.'{bind_group}' needs an instance id")]
    MissingInstance {
        /// The shader name.
        shader: String,
        /// The group name.
        bind_group: String,
    },
    /// The device rejected the group or the upload.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Bind groups kept across frames.
#[derive(Debug, Default)]
struct BindGroupCache {
    frame: HashMap<u64, BindGroupSlot>,
    object: HashMap<u64, ObjectGroup>,
    custom: HashMap<CustomBindGroupKey, BindGroupSlot>,
}

#[derive(Debug, Clone, Copy)]
struct ObjectGroup {
    slot: BindGroupSlot,
    // Frame index of the last prepare that used it.
    last_used: u64,
}

/// Everything the passes read during one frame.
///
/// The public fields are refilled every frame and emptied by [`clear`](Self::clear).
/// Frame, object and custom bind groups persist across frames until
/// [`release`](Self::release). Object bind groups of transient items (object
/// id `0`) are recreated each frame. Object bind groups nobody prepared for a
/// while are dropped by [`evict_idle_objects`](Self::evict_idle_objects).
#[derive(Debug, Default)]
pub struct FrameCache {
    /// Lights of the frame.
    pub lights: Vec<Light>,
    /// Packed lights, in the order of `lights`.
    pub light_uniforms: Vec<LightStruct>,
    /// Shadow maps to render this frame.
    pub shadow_requests: Vec<ShadowRequest>,
    /// One entry per shadow map, indexed by `LightStruct::shadow_index`.
    pub shadow_uniforms: Vec<ShadowUniform>,
    /// Offscreen targets by camera id.
    pub render_targets: BTreeMap<u64, RenderTarget>,
    /// Prepared items, parallel to the collector's items.
    pub gpu_render_items: Vec<Option<RenderItemGpu>>,
    /// Seconds since start, as given to the frame uniforms.
    pub time: f32,
    bind_groups: BindGroupCache,
    transient: Vec<BindGroupSlot>,
    stats: PrepareStats,
    // Number of cleared frames.
    frame_index: u64,
}

impl FrameCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the collector's lights and assigns shadow map slots.
    pub fn extract_lights(&mut self, ctx: &GpuContext, collector: &RenderCollector) {
        let config = ctx.config();
        let extraction = collector.extract_light_uniforms_with_shadows(
            config.max_shadow_maps_2d,
            config.max_shadow_maps_cube,
        );
        self.lights = collector.lights().to_vec();
        self.light_uniforms = extraction.uniforms;
        self.shadow_requests = extraction.shadow_requests;
    }

    /// Materializes the GPU side of the collector items at `indices`.
    ///
    /// `gpu_render_items` is resized to the collector's item count first.
    /// Items prepared earlier in the frame are left alone. An item whose model,
    /// mesh, material or object bind group cannot be produced stays `None` and
    /// is skipped by the passes.
    pub fn prepare_gpu_resources(
        &mut self,
        ctx: &GpuContext,
        collector: &RenderCollector,
        indices: &[usize],
    ) -> PrepareStats {
        let items = collector.render_items();
        if self.gpu_render_items.len() != items.len() {
            self.gpu_render_items.resize(items.len(), None);
        }

        let mut stats = PrepareStats {
            requested: indices.len(),
            ..PrepareStats::default()
        };
        let Some(object_layout) = ctx.shaders().global_layout(globals::OBJECT).cloned() else {
            log::error!("FrameCache: no '{}' bind group layout", globals::OBJECT);
            stats.failed = indices.len();
            self.stats += stats;
            return stats;
        };

        for &index in indices {
            let Some(item) = items.get(index) else {
                log::warn!("FrameCache: index {index} out of range ({} items)", items.len());
                stats.failed += 1;
                continue;
            };
            if self.gpu_render_items[index].is_some() {
                stats.reused += 1;
                continue;
            }
            match self.prepare_item(ctx, &object_layout, item) {
                Ok(gpu_item) => {
                    self.gpu_render_items[index] = Some(gpu_item);
                    stats.prepared += 1;
                }
                Err(e) => {
                    log::warn!(
                        "FrameCache: item {index} (model {:?}, object {}) skipped: {e}",
                        item.model,
                        item.object_id
                    );
                    stats.failed += 1;
                }
            }
        }

        log::debug!(
            "FrameCache: prepared {}/{} items ({} reused, {} failed)",
            self.gpu_render_items.iter().filter(|i| i.is_some()).count(),
            items.len(),
            stats.reused,
            stats.failed
        );
        self.stats += stats;
        stats
    }

    fn prepare_item(
        &mut self,
        ctx: &GpuContext,
        object_layout: &Arc<BindGroupLayoutInfo>,
        item: &RenderItem,
    ) -> Result<RenderItemGpu, FactoryError> {
        let model = ctx.models().create_from_handle(ctx, item.model)?;
        model.sync_if_needed(ctx)?;
        let mesh = model.mesh();
        mesh.sync_if_needed(ctx)?;
        let material = ctx.materials().create_from_handle(ctx, item.submesh.material)?;
        material.sync_if_needed(ctx)?;

        let object_bind_group = self.object_bind_group_for(ctx, object_layout, item.object_id)?;
        let uniforms = ObjectUniforms::from_transform(&item.world_transform);
        ctx.write_bind_group_buffer(object_bind_group, 0, 0, bytemuck::bytes_of(&uniforms))?;

        Ok(RenderItemGpu {
            model,
            mesh,
            material,
            object_bind_group,
            submesh: item.submesh,
            world_transform: item.world_transform,
            layer: item.layer,
            object_id: item.object_id,
        })
    }

    fn object_bind_group_for(
        &mut self,
        ctx: &GpuContext,
        layout: &Arc<BindGroupLayoutInfo>,
        object_id: u64,
    ) -> Result<BindGroupSlot, ResourceError> {
        if object_id == 0 {
            let slot = ctx.create_bind_group(layout, &[], "object#transient")?;
            self.transient.push(slot);
            return Ok(slot);
        }
        if let Some(group) = self.bind_groups.object.get_mut(&object_id) {
            if ctx.bind_group_id(group.slot).is_some() {
                group.last_used = self.frame_index;
                return Ok(group.slot);
            }
            log::debug!("FrameCache: object {object_id} lost its bind group, recreating");
        }
        let slot = ctx.create_bind_group(layout, &[], &format!("object#{object_id}"))?;
        self.bind_groups.object.insert(
            object_id,
            ObjectGroup {
                slot,
                last_used: self.frame_index,
            },
        );
        Ok(slot)
    }

    /// Uploads provider data into custom bind groups, creating them on first use.
    ///
    /// Every provider is processed even when an earlier one fails. The first
    /// failure is returned.
    pub fn process_bind_group_providers(
        &mut self,
        ctx: &GpuContext,
        providers: &[BindGroupDataProvider],
    ) -> Result<(), PrepareError> {
        let mut first_error = None;
        for provider in providers {
            if let Err(e) = self.apply_provider(ctx, provider) {
                log::error!(
                    "FrameCache: provider for '{}'.'{}' failed: {e}",
                    provider.shader,
                    provider.bind_group
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn apply_provider(
        &mut self,
        ctx: &GpuContext,
        provider: &BindGroupDataProvider,
    ) -> Result<(), PrepareError> {
        let shader = ctx
            .shaders()
            .get(&provider.shader)
            .ok_or_else(|| PrepareError::UnknownShader(provider.shader.clone()))?;
        let layout = shader
            .bind_group(&provider.bind_group)
            .cloned()
            .ok_or_else(|| PrepareError::UnknownBindGroup {
                shader: provider.shader.clone(),
                bind_group: provider.bind_group.clone(),
            })?;

        let reuse = layout.reuse();
        if provider.reuse != reuse {
            log::warn!(
                "FrameCache: '{}'.'{}' provider says {:?}, shader declares {reuse:?}; using the shader's",
                provider.shader,
                provider.bind_group,
                provider.reuse
            );
        }
        let instance = match (reuse.needs_instance(), provider.instance) {
            (true, None) => {
                return Err(PrepareError::MissingInstance {
                    shader: provider.shader.clone(),
                    bind_group: provider.bind_group.clone(),
                })
            }
            (false, Some(id)) => {
                log::warn!(
                    "FrameCache: '{}'.'{}' is shared, instance {id} ignored",
                    provider.shader,
                    provider.bind_group
                );
                None
            }
            (_, instance) => instance,
        };

        let key = CustomBindGroupKey::new(&provider.shader, &provider.bind_group, instance);
        let slot = match self.bind_groups.custom.get(&key) {
            Some(&slot) if ctx.bind_group_id(slot).is_some() => slot,
            _ => {
                let label = format!("{}.{}", provider.shader, provider.bind_group);
                let slot = ctx.create_bind_group(&layout, &[], &label)?;
                log::debug!("FrameCache: created custom bind group {key:?}");
                self.bind_groups.custom.insert(key, slot);
                slot
            }
        };
        ctx.write_bind_group_buffer(slot, 0, 0, &provider.data)?;
        Ok(())
    }

    /// The frame bind group of `camera`, with its uniforms refreshed.
    ///
    /// ## Errors
    /// Any failure to create the group or upload the uniforms.
    pub fn frame_bind_group(
        &mut self,
        ctx: &GpuContext,
        camera: &CameraView,
    ) -> Result<BindGroupSlot, ResourceError> {
        let slot = match self.bind_groups.frame.get(&camera.id) {
            Some(&slot) if ctx.bind_group_id(slot).is_some() => slot,
            _ => {
                let layout = ctx
                    .shaders()
                    .global_layout(globals::FRAME)
                    .cloned()
                    .ok_or(ResourceError::NotFound)?;
                let slot = ctx.create_bind_group(&layout, &[], &format!("frame#{}", camera.id))?;
                self.bind_groups.frame.insert(camera.id, slot);
                slot
            }
        };
        let uniforms = camera.frame_uniforms(self.time);
        ctx.write_bind_group_buffer(slot, 0, 0, bytemuck::bytes_of(&uniforms))?;
        Ok(slot)
    }

    /// The cached frame bind group of a camera.
    pub fn cached_frame_bind_group(&self, camera_id: u64) -> Option<BindGroupSlot> {
        self.bind_groups.frame.get(&camera_id).copied()
    }

    /// The persistent object bind group of a scene object.
    pub fn object_bind_group(&self, object_id: u64) -> Option<BindGroupSlot> {
        self.bind_groups.object.get(&object_id).map(|group| group.slot)
    }

    /// A custom bind group created by a provider.
    pub fn custom_bind_group(&self, key: &CustomBindGroupKey) -> Option<BindGroupSlot> {
        self.bind_groups.custom.get(key).copied()
    }

    /// Number of persistent object bind groups.
    pub fn object_bind_group_count(&self) -> usize {
        self.bind_groups.object.len()
    }

    /// Releases the bind group of an object that left the scene.
    pub fn release_object(&mut self, ctx: &GpuContext, object_id: u64) {
        if let Some(group) = self.bind_groups.object.remove(&object_id) {
            ctx.release_bind_group(group.slot);
        }
    }

    /// Releases the object bind groups not prepared during the last
    /// `max_idle_frames` cleared frames and returns how many went away.
    pub fn evict_idle_objects(&mut self, ctx: &GpuContext, max_idle_frames: u64) -> usize {
        let now = self.frame_index;
        let before = self.bind_groups.object.len();
        self.bind_groups.object.retain(|id, group| {
            let keep = now.saturating_sub(group.last_used) <= max_idle_frames;
            if !keep {
                log::trace!("FrameCache: object {id} idle since frame {}", group.last_used);
                ctx.release_bind_group(group.slot);
            }
            keep
        });
        let evicted = before - self.bind_groups.object.len();
        if evicted > 0 {
            log::debug!("FrameCache: evicted {evicted} idle object bind groups");
        }
        evicted
    }

    /// The prepared item at `index`.
    pub fn item(&self, index: usize) -> Option<&RenderItemGpu> {
        self.gpu_render_items.get(index).and_then(Option::as_ref)
    }

    /// Totals of every prepare call since the last [`clear`](Self::clear).
    pub fn stats(&self) -> PrepareStats {
        self.stats
    }

    /// Ends the frame.
    ///
    /// Per-frame data is dropped and transient object bind groups are
    /// released. Persistent bind groups are kept.
    pub fn clear(&mut self, ctx: &GpuContext) {
        self.lights.clear();
        self.light_uniforms.clear();
        self.shadow_requests.clear();
        self.shadow_uniforms.clear();
        self.render_targets.clear();
        self.gpu_render_items.clear();
        self.time = 0.0;
        self.stats = PrepareStats::default();
        for slot in self.transient.drain(..) {
            ctx.release_bind_group(slot);
        }
        self.frame_index += 1;
    }

    /// Clears the frame and releases every persistent bind group.
    pub fn release(&mut self, ctx: &GpuContext) {
        self.clear(ctx);
        let cache = std::mem::take(&mut self.bind_groups);
        let count = cache.frame.len() + cache.object.len() + cache.custom.len();
        for slot in cache
            .frame
            .into_values()
            .chain(cache.object.into_values().map(|group| group.slot))
            .chain(cache.custom.into_values())
        {
            ctx.release_bind_group(slot);
        }
        log::debug!("FrameCache: released {count} bind groups");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{BindGroupReuse, names};
    use crate::test_support::mock_context;
    use lucent_core::math::{Mat4, Vec3};
    use lucent_core::Handle;
    use lucent_data::{Material, Mesh, Model};

    fn scene(ctx: &GpuContext) -> (Handle<Model>, Handle<Material>) {
        let registry = ctx.registry();
        let material = registry.add(Arc::new(Material::new("grey", names::MESH_LIT)));
        let mesh = registry.add(Arc::new(Mesh::new(
            "tri",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        )));
        let model = registry.add(Arc::new(Model::single("tri", mesh, material, 3)));
        (model, material)
    }

    #[test]
    fn prepare_is_idempotent_within_a_frame() {
        let (device, ctx) = mock_context();
        let (model, _) = scene(&ctx);
        let mut collector = RenderCollector::new();
        collector.add_model(ctx.registry(), model, Mat4::IDENTITY, 0, 11);
        let mut cache = FrameCache::new();

        let first = cache.prepare_gpu_resources(&ctx, &collector, &[0]);
        assert_eq!(first.prepared, 1);
        let groups = device.stats().bind_groups_created;

        let second = cache.prepare_gpu_resources(&ctx, &collector, &[0]);
        assert_eq!(second.reused, 1);
        assert_eq!(second.prepared, 0);
        assert_eq!(device.stats().bind_groups_created, groups);
        assert_eq!(cache.stats().requested, 2);
    }

    #[test]
    fn object_bind_groups_persist_and_transient_ones_are_freed() {
        let (_, ctx) = mock_context();
        let (model, _) = scene(&ctx);
        let mut collector = RenderCollector::new();
        collector.add_model(ctx.registry(), model, Mat4::IDENTITY, 0, 4);
        collector.add_model(ctx.registry(), model, Mat4::IDENTITY, 0, 0);
        let mut cache = FrameCache::new();

        cache.prepare_gpu_resources(&ctx, &collector, &collector.all_indices());
        let persistent = cache.item(0).unwrap().object_bind_group;
        let transient = cache.item(1).unwrap().object_bind_group;
        assert!(cache.item(1).unwrap().is_transient());
        cache.clear(&ctx);

        assert!(ctx.bind_group_id(persistent).is_some());
        assert!(ctx.bind_group_id(transient).is_none());
        assert_eq!(cache.object_bind_group_count(), 1);

        cache.prepare_gpu_resources(&ctx, &collector, &collector.all_indices());
        assert_eq!(cache.item(0).unwrap().object_bind_group, persistent);
    }

    #[test]
    fn idle_object_groups_are_evicted() {
        let (device, ctx) = mock_context();
        let (model, _) = scene(&ctx);
        let mut cache = FrameCache::new();
        let kept_id = 1;

        for frame in 0..50u64 {
            let mut collector = RenderCollector::new();
            collector.add_model(ctx.registry(), model, Mat4::IDENTITY, 0, kept_id);
            collector.add_model(ctx.registry(), model, Mat4::IDENTITY, 0, 100 + frame);
            cache.prepare_gpu_resources(&ctx, &collector, &collector.all_indices());
            cache.clear(&ctx);
        }
        assert_eq!(cache.object_bind_group_count(), 51);
        let live = device.live_bind_groups();

        let evicted = cache.evict_idle_objects(&ctx, 4);

        // The steady object and the last four one-off objects survive.
        assert_eq!(evicted, 46);
        assert_eq!(cache.object_bind_group_count(), 5);
        assert!(cache.object_bind_group(kept_id).is_some());
        assert!(cache.object_bind_group(100).is_none());
        assert!(cache.object_bind_group(149).is_some());
        assert_eq!(device.live_bind_groups(), live - 46);
    }

    #[test]
    fn out_of_range_indices_count_as_failures() {
        let (_, ctx) = mock_context();
        let collector = RenderCollector::new();
        let mut cache = FrameCache::new();
        let stats = cache.prepare_gpu_resources(&ctx, &collector, &[3]);
        assert_eq!(stats.failed, 1);
        assert!(cache.gpu_render_items.is_empty());
    }

    #[test]
    fn frame_bind_group_is_cached_per_camera() {
        let (_, ctx) = mock_context();
        let mut cache = FrameCache::new();
        let camera = CameraView::perspective(1, Vec3::Z, Vec3::ZERO, 1.0, 64, 64, 0.1, 10.0);
        let a = cache.frame_bind_group(&ctx, &camera).unwrap();
        let b = cache.frame_bind_group(&ctx, &camera).unwrap();
        let other = cache
            .frame_bind_group(&ctx, &CameraView { id: 2, ..camera })
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(cache.cached_frame_bind_group(1), Some(a));
    }

    #[test]
    fn providers_validate_against_the_shader() {
        let (device, ctx) = mock_context();
        let mut cache = FrameCache::new();
        let unknown = BindGroupDataProvider::new("nope", "x", &[0; 4], BindGroupReuse::PerFrame, None);
        assert!(matches!(
            cache.process_bind_group_providers(&ctx, &[unknown]),
            Err(PrepareError::UnknownShader(_))
        ));

        let source = BindGroupDataProvider::new(
            names::POST_PROCESS,
            "missing",
            &[0; 4],
            BindGroupReuse::PerFrame,
            None,
        );
        assert!(matches!(
            cache.process_bind_group_providers(&ctx, &[source]),
            Err(PrepareError::UnknownBindGroup { .. })
        ));
        assert_eq!(device.live_bind_groups(), 0);
    }

    #[test]
    fn release_frees_persistent_groups() {
        let (device, ctx) = mock_context();
        let (model, _) = scene(&ctx);
        let mut collector = RenderCollector::new();
        collector.add_model(ctx.registry(), model, Mat4::IDENTITY, 0, 9);
        let mut cache = FrameCache::new();
        cache.prepare_gpu_resources(&ctx, &collector, &[0]);
        let material_groups = 1;

        cache.release(&ctx);
        assert_eq!(cache.object_bind_group_count(), 0);
        assert_eq!(device.live_bind_groups(), material_groups);
    }
}
