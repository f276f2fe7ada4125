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

//! GPU mirror of a [`Material`]: its uniform block and bind group.
//!
//! A material's GPU state also depends on the textures it references. Their
//! versions are remembered per slot, so re-uploading a texture invalidates
//! every material that samples it even though the material itself is
//! unchanged.

use super::arena::BindGroupSlot;
use super::sync::{GpuSyncable, SyncState};
use super::texture::GpuTexture;
use crate::context::{GpuContext, SamplerKind};
use crate::factory::{FactoryError, GpuFactory};
use crate::shader::{BindGroupLayoutInfo, BindGroupType, BindingKind, ShaderInfo};
use lucent_core::renderer::{
    BindingResource, ResourceError, SamplerBindingType, ShaderError, TextureViewId,
};
use lucent_core::{Handle, Identifiable, Versioned};
use lucent_data::{Material, Texture};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct SlotTexture {
    slot: String,
    handle: Handle<Texture>,
    texture: Arc<GpuTexture>,
    version: u64,
}

#[derive(Debug)]
struct MaterialBinding {
    shader: Arc<ShaderInfo>,
    layout: Arc<BindGroupLayoutInfo>,
    bind_group: BindGroupSlot,
    slots: Vec<SlotTexture>,
}

impl MaterialBinding {
    fn views(&self) -> Vec<TextureViewId> {
        self.slots.iter().map(|s| s.texture.view()).collect()
    }
}

fn material_layout(
    ctx: &GpuContext,
    shader_name: &str,
) -> Option<(Arc<ShaderInfo>, Arc<BindGroupLayoutInfo>)> {
    let shader = ctx.shaders().get(shader_name)?;
    let layout = shader.bind_group_of_type(BindGroupType::Material)?.clone();
    Some((shader, layout))
}

/// Resolves the texture of every slot the layout samples. Missing or broken
/// textures fall back to white.
fn resolve_slots(
    ctx: &GpuContext,
    layout: &BindGroupLayoutInfo,
    material: &Material,
) -> Result<Vec<SlotTexture>, ResourceError> {
    let mut resolved = Vec::new();
    for entry in layout.entries() {
        let BindingKind::Texture {
            material_slot: Some(slot),
            ..
        } = &entry.kind
        else {
            continue;
        };
        let handle = material.texture(slot).unwrap_or(Handle::NULL);
        let texture = if handle.is_valid() {
            match ctx.textures().create_from_handle(ctx, handle) {
                Ok(texture) => {
                    if let Err(e) = texture.sync_if_needed(ctx) {
                        log::warn!("GpuMaterial: texture for slot '{slot}' failed to sync: {e}");
                    }
                    Some(texture)
                }
                Err(e) => {
                    log::warn!("GpuMaterial: slot '{slot}' falls back to white: {e}");
                    None
                }
            }
        } else {
            None
        };
        let slot_texture = match texture {
            Some(texture) => SlotTexture {
                slot: slot.clone(),
                handle,
                version: texture.sync_state().last_synced_version(),
                texture,
            },
            None => SlotTexture {
                slot: slot.clone(),
                handle: Handle::NULL,
                texture: ctx.textures().white(ctx)?,
                version: 0,
            },
        };
        resolved.push(slot_texture);
    }
    Ok(resolved)
}

fn create_bind_group(
    ctx: &GpuContext,
    layout: &Arc<BindGroupLayoutInfo>,
    slots: &[SlotTexture],
    label: &str,
) -> Result<BindGroupSlot, ResourceError> {
    let mut resources = Vec::new();
    for entry in layout.entries() {
        match &entry.kind {
            BindingKind::Texture {
                material_slot: Some(slot),
                ..
            } => {
                if let Some(bound) = slots.iter().find(|s| &s.slot == slot) {
                    resources.push((entry.binding, BindingResource::TextureView(bound.texture.view())));
                }
            }
            BindingKind::Sampler(ty) => {
                let kind = match ty {
                    SamplerBindingType::Comparison => SamplerKind::ShadowComparison,
                    SamplerBindingType::NonFiltering => SamplerKind::NearestClamp,
                    SamplerBindingType::Filtering => SamplerKind::LinearRepeat,
                };
                resources.push((entry.binding, BindingResource::Sampler(ctx.sampler(kind))));
            }
            _ => {}
        }
    }
    ctx.create_bind_group(layout, &resources, label)
}

fn write_uniforms(
    ctx: &GpuContext,
    layout: &BindGroupLayoutInfo,
    bind_group: BindGroupSlot,
    material: &Material,
) -> Result<(), ResourceError> {
    let uniform = layout
        .entries()
        .iter()
        .find(|e| matches!(e.kind, BindingKind::UniformBuffer { .. }));
    match uniform {
        Some(entry) => {
            ctx.write_bind_group_buffer(bind_group, entry.binding, 0, &material.uniform_bytes())
        }
        None => Ok(()),
    }
}

/// A material's bind group, built against the material layout of its shader.
#[derive(Debug)]
pub struct GpuMaterial {
    state: SyncState<Material>,
    label: String,
    binding: RwLock<MaterialBinding>,
}

impl GpuMaterial {
    /// Builds the bind group of `material` and uploads its uniforms.
    ///
    /// ## Errors
    /// * `FactoryError::MissingLayout` - If the shader is unknown or declares no material group.
    pub fn from_cpu(ctx: &GpuContext, material: &Material) -> Result<Self, FactoryError> {
        let version = material.version();
        let shader_name = material.shader();
        let (shader, layout) =
            material_layout(ctx, &shader_name).ok_or_else(|| FactoryError::MissingLayout {
                shader: shader_name.clone(),
            })?;
        let label = material
            .name()
            .unwrap_or_else(|| format!("material#{}", material.id()));
        let slots = resolve_slots(ctx, &layout, material)?;
        let bind_group = create_bind_group(ctx, &layout, &slots, &label)?;
        if let Err(e) = write_uniforms(ctx, &layout, bind_group, material) {
            ctx.release_bind_group(bind_group);
            return Err(e.into());
        }
        Ok(Self {
            state: SyncState::new(material.handle(), version),
            label,
            binding: RwLock::new(MaterialBinding {
                shader,
                layout,
                bind_group,
                slots,
            }),
        })
    }

    /// The material bind group.
    pub fn bind_group(&self) -> BindGroupSlot {
        self.binding.read().bind_group
    }

    /// The shader the material renders with.
    pub fn shader(&self) -> Arc<ShaderInfo> {
        self.binding.read().shader.clone()
    }

    /// The GPU texture bound to `slot`. Empty slots report the white fallback.
    pub fn slot_texture(&self, slot: &str) -> Option<Arc<GpuTexture>> {
        self.binding
            .read()
            .slots
            .iter()
            .find(|s| s.slot == slot)
            .map(|s| s.texture.clone())
    }
}

impl GpuSyncable for GpuMaterial {
    type Cpu = Material;

    fn sync_state(&self) -> &SyncState<Material> {
        &self.state
    }

    fn needs_sync(&self, cpu: &Material, ctx: &GpuContext) -> bool {
        if cpu.version() > self.state.last_synced_version() {
            return true;
        }
        self.binding.read().slots.iter().any(|slot| {
            slot.handle.is_valid()
                && ctx
                    .registry()
                    .get(slot.handle)
                    .is_some_and(|texture| texture.version() > slot.version)
        })
    }

    fn sync_from_cpu(&self, cpu: &Material, ctx: &GpuContext) -> Result<(), ResourceError> {
        let mut binding = self.binding.write();
        let shader_name = cpu.shader();
        let shader_changed = binding.shader.name() != shader_name;
        if shader_changed {
            let (shader, layout) = material_layout(ctx, &shader_name).ok_or_else(|| {
                ShaderError::UnknownBindGroup {
                    shader: shader_name.clone(),
                    bind_group: "material".to_owned(),
                }
            })?;
            binding.shader = shader;
            binding.layout = layout;
        }

        let old_views = binding.views();
        binding.slots = resolve_slots(ctx, &binding.layout, cpu)?;
        if shader_changed || binding.views() != old_views {
            log::debug!("GpuMaterial: rebuilding bind group of '{}'", self.label);
            let rebuilt = create_bind_group(ctx, &binding.layout, &binding.slots, &self.label)?;
            let old = std::mem::replace(&mut binding.bind_group, rebuilt);
            ctx.release_bind_group(old);
        }
        write_uniforms(ctx, &binding.layout, binding.bind_group, cpu)
    }

    fn release(&self, ctx: &GpuContext) {
        ctx.release_bind_group(self.binding.read().bind_group);
    }
}
