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

//! CPU-side materials.
//!
//! A material names the shader it renders with, carries a property block and
//! maps texture slots to texture handles. It references textures without
//! owning them.

use super::texture::Texture;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use lucent_core::math::LinearRgba;
use lucent_core::{Handle, Identifiable, Identity, Version, Versioned};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;

/// Well-known texture slot names.
pub mod slots {
    /// Base color map.
    pub const DIFFUSE: &str = "diffuse";
    /// Tangent-space normal map.
    pub const NORMAL: &str = "normal";
    /// Emissive map.
    pub const EMISSIVE: &str = "emissive";
    /// Metallic (B) and roughness (G) map.
    pub const METALLIC_ROUGHNESS: &str = "metallic_roughness";
    /// Ambient occlusion map.
    pub const OCCLUSION: &str = "occlusion";

    /// Every slot, in binding order.
    pub const ALL: [&str; 5] = [DIFFUSE, NORMAL, EMISSIVE, METALLIC_ROUGHNESS, OCCLUSION];
}

bitflags! {
    /// Which optional inputs a material uses. Uploaded with the properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFeatures: u32 {
        /// A diffuse map is bound.
        const DIFFUSE_MAP = 1 << 0;
        /// A normal map is bound.
        const NORMAL_MAP = 1 << 1;
        /// An emissive map is bound.
        const EMISSIVE_MAP = 1 << 2;
        /// A metallic-roughness map is bound.
        const METALLIC_ROUGHNESS_MAP = 1 << 3;
        /// An occlusion map is bound.
        const OCCLUSION_MAP = 1 << 4;
        /// Lighting is skipped.
        const UNLIT = 1 << 5;
    }
}

impl MaterialFeatures {
    fn for_slot(slot: &str) -> Self {
        match slot {
            slots::DIFFUSE => Self::DIFFUSE_MAP,
            slots::NORMAL => Self::NORMAL_MAP,
            slots::EMISSIVE => Self::EMISSIVE_MAP,
            slots::METALLIC_ROUGHNESS => Self::METALLIC_ROUGHNESS_MAP,
            slots::OCCLUSION => Self::OCCLUSION_MAP,
            _ => Self::empty(),
        }
    }
}

/// The property block of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialProperties {
    /// Metallic-roughness PBR.
    Pbr {
        /// Base color, multiplied with the diffuse map.
        base_color: LinearRgba,
        /// Metalness in `[0, 1]`.
        metallic: f32,
        /// Roughness in `[0, 1]`.
        roughness: f32,
        /// Emitted radiance.
        emissive: [f32; 3],
        /// Strength of the normal map.
        normal_scale: f32,
        /// Strength of the occlusion map.
        occlusion_strength: f32,
    },
    /// Flat color, no lighting.
    Unlit {
        /// Output color.
        color: LinearRgba,
    },
}

impl Default for MaterialProperties {
    fn default() -> Self {
        MaterialProperties::Pbr {
            base_color: LinearRgba::WHITE,
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0; 3],
            normal_scale: 1.0,
            occlusion_strength: 1.0,
        }
    }
}

/// GPU layout of the material property block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Base color.
    pub base_color: [f32; 4],
    /// Emitted radiance.
    pub emissive: [f32; 3],
    /// Metalness.
    pub metallic: f32,
    /// Roughness.
    pub roughness: f32,
    /// Normal map strength.
    pub normal_scale: f32,
    /// Occlusion map strength.
    pub occlusion_strength: f32,
    /// [`MaterialFeatures`] bits.
    pub features: u32,
}

/// The mutable state of a [`Material`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    /// Name of the shader this material renders with.
    pub shader: String,
    /// Property block.
    pub properties: MaterialProperties,
    /// Texture slots.
    pub textures: BTreeMap<String, Handle<Texture>>,
}

/// A material living in CPU memory.
#[derive(Debug)]
pub struct Material {
    identity: Identity,
    version: Version,
    data: RwLock<MaterialData>,
}

impl Material {
    /// Creates a material with default PBR properties and no textures.
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            identity: Identity::named(name),
            version: Version::new(),
            data: RwLock::new(MaterialData {
                shader: shader.into(),
                properties: MaterialProperties::default(),
                textures: BTreeMap::new(),
            }),
        }
    }

    /// Read access to the material state.
    pub fn data(&self) -> RwLockReadGuard<'_, MaterialData> {
        self.data.read()
    }

    /// The shader name.
    pub fn shader(&self) -> String {
        self.data.read().shader.clone()
    }

    /// The property block.
    pub fn properties(&self) -> MaterialProperties {
        self.data.read().properties
    }

    /// The texture bound to `slot`, if any.
    pub fn texture(&self, slot: &str) -> Option<Handle<Texture>> {
        self.data.read().textures.get(slot).copied()
    }

    /// Every `(slot, texture)` pair, sorted by slot name.
    pub fn textures(&self) -> Vec<(String, Handle<Texture>)> {
        self.data
            .read()
            .textures
            .iter()
            .map(|(slot, handle)| (slot.clone(), *handle))
            .collect()
    }

    /// Reassigns the shader.
    pub fn set_shader(&self, shader: impl Into<String>) {
        self.data.write().shader = shader.into();
        self.version.bump();
    }

    /// Replaces the property block.
    pub fn set_properties(&self, properties: MaterialProperties) {
        self.data.write().properties = properties;
        self.version.bump();
    }

    /// Binds a texture to a slot. A null handle clears the slot.
    pub fn set_texture(&self, slot: &str, texture: Handle<Texture>) {
        let mut data = self.data.write();
        if texture.is_valid() {
            data.textures.insert(slot.to_owned(), texture);
        } else {
            data.textures.remove(slot);
        }
        self.version.bump();
    }

    /// The feature mask derived from bound slots and the property kind.
    pub fn features(&self) -> MaterialFeatures {
        let data = self.data.read();
        let mut features = data
            .textures
            .keys()
            .fold(MaterialFeatures::empty(), |acc, slot| {
                acc | MaterialFeatures::for_slot(slot)
            });
        if matches!(data.properties, MaterialProperties::Unlit { .. }) {
            features |= MaterialFeatures::UNLIT;
        }
        features
    }

    /// Packs the property block for upload.
    pub fn uniforms(&self) -> MaterialUniforms {
        let features = self.features().bits();
        match self.properties() {
            MaterialProperties::Pbr {
                base_color,
                metallic,
                roughness,
                emissive,
                normal_scale,
                occlusion_strength,
            } => MaterialUniforms {
                base_color: base_color.to_array(),
                emissive,
                metallic,
                roughness,
                normal_scale,
                occlusion_strength,
                features,
            },
            MaterialProperties::Unlit { color } => MaterialUniforms {
                base_color: color.to_array(),
                emissive: [0.0; 3],
                metallic: 0.0,
                roughness: 1.0,
                normal_scale: 1.0,
                occlusion_strength: 1.0,
                features,
            },
        }
    }

    /// [`Material::uniforms`] as raw bytes.
    pub fn uniform_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.uniforms()).to_vec()
    }
}

impl Identifiable for Material {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Versioned for Material {
    fn version(&self) -> u64 {
        self.version.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_48_bytes() {
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 48);
        assert_eq!(Material::new("m", "mesh_lit").uniform_bytes().len(), 48);
    }

    #[test]
    fn null_texture_clears_slot() {
        let material = Material::new("brick", "mesh_lit");
        material.set_texture(slots::DIFFUSE, Handle::from_raw(12));
        assert_eq!(material.texture(slots::DIFFUSE), Some(Handle::from_raw(12)));
        assert!(material.features().contains(MaterialFeatures::DIFFUSE_MAP));

        material.set_texture(slots::DIFFUSE, Handle::NULL);
        assert_eq!(material.texture(slots::DIFFUSE), None);
        assert!(material.features().is_empty());
        assert_eq!(material.version(), 2);
    }

    #[test]
    fn unlit_sets_feature_and_color() {
        let material = Material::new("flat", "mesh_lit");
        material.set_properties(MaterialProperties::Unlit {
            color: LinearRgba::rgb(1.0, 0.0, 0.0),
        });
        let uniforms = material.uniforms();
        assert_eq!(uniforms.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.features, MaterialFeatures::UNLIT.bits());
    }

    #[test]
    fn every_mutation_bumps_version() {
        let material = Material::new("m", "a");
        material.set_shader("b");
        material.set_properties(MaterialProperties::default());
        assert_eq!(material.version(), 2);
        assert_eq!(material.shader(), "b");
    }
}
