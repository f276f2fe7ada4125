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

//! Binds a shader's groups, skipping the ones already bound.

use super::frame_cache::FrameCache;
use super::provider::CustomBindGroupKey;
use crate::context::GpuContext;
use crate::gpu::BindGroupSlot;
use crate::shader::{BindGroupReuse, BindGroupType, ShaderInfo};
use lucent_core::renderer::{PassId, RenderPassEncoder};
use std::collections::HashMap;

/// Ids that decide whether per-frame, per-object and per-material groups
/// must be rebound. `None` means "no such id" and differs from `Some(0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingIds {
    /// Active camera.
    pub camera: Option<u64>,
    /// Object being drawn.
    pub object: Option<u64>,
    /// Material being drawn.
    pub material: Option<u64>,
}

/// Tracks what is bound in the current render pass.
///
/// A group is bound when its reuse policy says the relevant id changed or
/// when the slot resolved for it differs from the slot last bound at its
/// index. `Global` groups are only ever bound on the slot check, so once per
/// pass. A new pass, detected by its [`PassId`], forgets everything bound.
#[derive(Debug, Default)]
pub struct BindGroupBinder {
    last_pass: Option<PassId>,
    last_ids: BindingIds,
    bound: HashMap<u32, BindGroupSlot>,
}

impl BindGroupBinder {
    /// Creates a binder with nothing bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every bound group and id.
    pub fn reset(&mut self) {
        self.last_ids = BindingIds::default();
        self.bound.clear();
    }

    fn enter_pass(&mut self, pass: &dyn RenderPassEncoder) {
        let id = pass.pass_id();
        if self.last_pass != Some(id) {
            self.last_pass = Some(id);
            self.bound.clear();
        }
    }

    /// Binds every group `shader` declares and returns the number of bind
    /// calls issued.
    ///
    /// Groups come from `overrides` first, then from the frame cache: frame
    /// groups by camera, object groups by object id, custom groups by
    /// `(shader, group, instance)`. A group that resolves to nothing, or to a
    /// released slot, is left unbound.
    pub fn bind(
        &mut self,
        pass: &mut dyn RenderPassEncoder,
        ctx: &GpuContext,
        cache: &FrameCache,
        shader: &ShaderInfo,
        ids: BindingIds,
        overrides: &[(BindGroupType, BindGroupSlot)],
    ) -> usize {
        self.enter_pass(pass);
        let camera_changed = ids.camera != self.last_ids.camera;
        let object_changed = ids.object != self.last_ids.object;
        let material_changed = ids.material != self.last_ids.material;
        self.last_ids = ids;

        let arena = ctx.bind_groups().lock();
        let mut issued = 0;
        for layout in shader.bind_groups() {
            let index = layout.index();
            let needs_rebind = match layout.reuse() {
                BindGroupReuse::Global => false,
                BindGroupReuse::PerFrame => camera_changed,
                BindGroupReuse::PerObject => object_changed,
                BindGroupReuse::PerMaterial => material_changed,
            };

            let overridden = overrides
                .iter()
                .find(|(ty, _)| *ty == layout.group_type())
                .map(|(_, slot)| *slot);
            let resolved = overridden.or_else(|| match layout.group_type() {
                BindGroupType::Frame => ids.camera.and_then(|c| cache.cached_frame_bind_group(c)),
                BindGroupType::Object => ids.object.and_then(|o| cache.object_bind_group(o)),
                BindGroupType::Custom => {
                    let instance = match layout.reuse() {
                        BindGroupReuse::PerObject => ids.object,
                        BindGroupReuse::PerMaterial => ids.material,
                        _ => None,
                    };
                    let key = CustomBindGroupKey::new(shader.name(), layout.name(), instance);
                    cache.custom_bind_group(&key)
                }
                BindGroupType::Mipmap => {
                    log::warn!(
                        "BindGroupBinder: '{}' declares a mipmap group at {index}",
                        shader.name()
                    );
                    None
                }
                _ => None,
            });

            let Some(slot) = resolved else {
                log::trace!(
                    "BindGroupBinder: nothing to bind for '{}' at {index} in '{}'",
                    layout.name(),
                    shader.name()
                );
                continue;
            };
            let Some(group) = arena.get(slot) else {
                log::trace!("BindGroupBinder: stale slot {slot:?} for '{}'", layout.name());
                continue;
            };

            if needs_rebind || self.bound.get(&index) != Some(&slot) {
                pass.set_bind_group(index, group.id());
                self.bound.insert(index, slot);
                issued += 1;
            }
        }
        issued
    }

    /// Binds `slot` as the group called `name`, unless it is already bound.
    ///
    /// Returns `false` if the shader has no such group or the slot is stale.
    pub fn bind_group_by_name(
        &mut self,
        pass: &mut dyn RenderPassEncoder,
        ctx: &GpuContext,
        shader: &ShaderInfo,
        name: &str,
        slot: BindGroupSlot,
    ) -> bool {
        self.enter_pass(pass);
        let Some(index) = shader.bind_group_index(name) else {
            log::warn!("BindGroupBinder: shader '{}' has no group '{name}'", shader.name());
            return false;
        };
        if self.bound.get(&index) == Some(&slot) {
            return true;
        }
        let Some(id) = ctx.bind_group_id(slot) else {
            log::trace!("BindGroupBinder: stale slot {slot:?} for '{name}'");
            return false;
        };
        pass.set_bind_group(index, id);
        self.bound.insert(index, slot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SamplerKind;
    use crate::shader::{globals, names};
    use crate::test_support::mock_context;
    use lucent_core::renderer::BindingResource;

    fn ids(camera: u64, object: u64, material: u64) -> BindingIds {
        BindingIds {
            camera: Some(camera),
            object: Some(object),
            material: Some(material),
        }
    }

    #[test]
    fn unchanged_ids_bind_nothing_after_the_first_call() {
        let (device, ctx) = mock_context();
        let shader = ctx.shaders().get(names::SHADOW_2D).unwrap();
        let shadow_layout = shader.bind_group("shadow_pass").unwrap().clone();
        let object_layout = ctx.shaders().global_layout(globals::OBJECT).unwrap().clone();
        let pass_group = ctx.create_bind_group(&shadow_layout, &[], "pass").unwrap();
        let object_group = ctx.create_bind_group(&object_layout, &[], "object").unwrap();
        let overrides = [
            (BindGroupType::ShadowPass2D, pass_group),
            (BindGroupType::Object, object_group),
        ];
        let cache = FrameCache::new();
        let mut binder = BindGroupBinder::new();

        {
            let mut pass = device.begin_test_pass();
            assert_eq!(binder.bind(pass.as_mut(), &ctx, &cache, &shader, ids(1, 5, 2), &overrides), 2);
            for _ in 0..4 {
                assert_eq!(binder.bind(pass.as_mut(), &ctx, &cache, &shader, ids(1, 5, 2), &overrides), 0);
            }
        }
        assert_eq!(device.passes()[0].bind_group_calls().len(), 2);
    }

    #[test]
    fn released_slot_is_skipped() {
        let (device, ctx) = mock_context();
        let shader = ctx.shaders().get(names::SHADOW_2D).unwrap();
        let object_layout = ctx.shaders().global_layout(globals::OBJECT).unwrap().clone();
        let object_group = ctx.create_bind_group(&object_layout, &[], "object").unwrap();
        ctx.release_bind_group(object_group);

        let cache = FrameCache::new();
        let mut binder = BindGroupBinder::new();
        let mut pass = device.begin_test_pass();
        let issued = binder.bind(
            pass.as_mut(),
            &ctx,
            &cache,
            &shader,
            ids(1, 5, 2),
            &[(BindGroupType::Object, object_group)],
        );
        assert_eq!(issued, 0);
    }

    #[test]
    fn a_new_pass_rebinds_everything() {
        let (device, ctx) = mock_context();
        let shader = ctx.shaders().get(names::COMPOSITE).unwrap();
        let layout = shader.bind_group("source").unwrap().clone();
        let white = ctx.textures().white(&ctx).unwrap();
        let slot = ctx
            .create_bind_group(
                &layout,
                &[
                    (0, BindingResource::TextureView(white.view())),
                    (1, BindingResource::Sampler(ctx.sampler(SamplerKind::LinearClamp))),
                ],
                "source",
            )
            .unwrap();
        let mut binder = BindGroupBinder::new();

        for _ in 0..2 {
            let mut pass = device.begin_test_pass();
            assert!(binder.bind_group_by_name(pass.as_mut(), &ctx, &shader, "source", slot));
            assert!(binder.bind_group_by_name(pass.as_mut(), &ctx, &shader, "source", slot));
        }
        let passes = device.passes();
        assert_eq!(passes.len(), 2);
        assert!(passes.iter().all(|p| p.bind_group_calls().len() == 1));
        assert!(!binder.bind_group_by_name(
            device.begin_test_pass().as_mut(),
            &ctx,
            &shader,
            "missing",
            slot
        ));
    }
}
