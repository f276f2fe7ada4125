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

//! Shaders by name, and the bind group layouts they share.

use super::builtin::{DEBUG_WGSL, FULLSCREEN_WGSL, MESH_LIT_WGSL, SHADOW_2D_WGSL, SHADOW_CUBE_WGSL};
use super::descriptor::ShaderDescriptor;
use super::info::{BindGroupLayoutInfo, BindGroupReuse, BindGroupType, BindingInfo, ShaderInfo};
use crate::render_lane::{DebugPrimitive, MAX_DEBUG_PRIMITIVES};
use lucent_core::renderer::{
    BindGroupLayoutDescriptor, FrameUniforms, GraphicsDevice, LightStruct, LightsHeader,
    ObjectUniforms, ResourceError, RendererConfig, SamplerBindingType, ShaderError,
    ShaderStageFlags, ShadowPass2DUniforms, ShadowPassCubeUniforms, ShadowUniform,
    TextureSampleType, TextureViewDimension,
};
use lucent_data::assets::{slots, MaterialUniforms, Vertex};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::mem::size_of;
use std::sync::Arc;

/// Names of the built-in shaders.
pub mod names {
    /// Lit meshes.
    pub const MESH_LIT: &str = "mesh_lit";
    /// Directional and spot light shadows.
    pub const SHADOW_2D: &str = "shadow_2d";
    /// Point light shadows.
    pub const SHADOW_CUBE: &str = "shadow_cube";
    /// Debug primitives.
    pub const DEBUG: &str = "debug";
    /// Per-camera post-processing.
    pub const POST_PROCESS: &str = "post_process";
    /// Final blit onto the surface.
    pub const COMPOSITE: &str = "composite";
}

/// Names of the layouts shared between shaders.
pub mod globals {
    /// Camera uniforms, [`PerFrame`](super::BindGroupReuse::PerFrame).
    pub const FRAME: &str = "frame";
    /// Light storage buffer, [`Global`](super::BindGroupReuse::Global).
    pub const LIGHT: &str = "light";
    /// Object transforms, [`PerObject`](super::BindGroupReuse::PerObject).
    pub const OBJECT: &str = "object";
    /// Shadow maps and uniforms, [`Global`](super::BindGroupReuse::Global).
    pub const SHADOW: &str = "shadow";
}

/// Byte size of the light storage buffer: a 16 byte header then the lights.
pub fn light_buffer_size(max_lights: u32) -> u64 {
    LightsHeader::LIGHTS_OFFSET + u64::from(max_lights) * size_of::<LightStruct>() as u64
}

/// Byte size of the shadow uniform storage buffer.
pub fn shadow_buffer_size(config: &RendererConfig) -> u64 {
    let slots = (config.max_shadow_maps_2d + config.max_shadow_maps_cube).max(1);
    u64::from(slots) * size_of::<ShadowUniform>() as u64
}

/// Owns every compiled shader, keyed by name.
pub struct ShaderRegistry {
    shaders: RwLock<HashMap<String, Arc<ShaderInfo>>>,
    globals: HashMap<&'static str, Arc<BindGroupLayoutInfo>>,
}

impl ShaderRegistry {
    /// Creates the shared layouts and compiles the built-in shaders.
    ///
    /// ## Errors
    /// Any failure to create a layout or compile a built-in shader.
    pub fn new(device: &dyn GraphicsDevice, config: &RendererConfig) -> Result<Self, ResourceError> {
        let mut registry = Self {
            shaders: RwLock::new(HashMap::new()),
            globals: HashMap::new(),
        };
        registry.create_globals(device, config)?;
        registry.register_builtins(device)?;
        log::info!(
            "ShaderRegistry: {} shaders, {} shared layouts",
            registry.len(),
            registry.globals.len()
        );
        Ok(registry)
    }

    fn create_globals(
        &mut self,
        device: &dyn GraphicsDevice,
        config: &RendererConfig,
    ) -> Result<(), ResourceError> {
        let all = ShaderStageFlags::VERTEX_FRAGMENT;
        let layouts = [
            (
                globals::FRAME,
                BindGroupType::Frame,
                BindGroupReuse::PerFrame,
                vec![BindingInfo::uniform(0, "frame", size_of::<FrameUniforms>() as u64, all)],
            ),
            (
                globals::LIGHT,
                BindGroupType::Light,
                BindGroupReuse::Global,
                vec![BindingInfo::storage(0, "lights", light_buffer_size(config.max_lights), all)],
            ),
            (
                globals::OBJECT,
                BindGroupType::Object,
                BindGroupReuse::PerObject,
                vec![BindingInfo::uniform(0, "object", size_of::<ObjectUniforms>() as u64, all)],
            ),
            (
                globals::SHADOW,
                BindGroupType::Shadow,
                BindGroupReuse::Global,
                vec![
                    BindingInfo::sampler(0, "shadow_sampler", SamplerBindingType::Comparison),
                    BindingInfo::texture(
                        1,
                        "shadow_maps_2d",
                        TextureSampleType::Depth,
                        TextureViewDimension::D2Array,
                    ),
                    BindingInfo::texture(
                        2,
                        "shadow_maps_cube",
                        TextureSampleType::Depth,
                        TextureViewDimension::CubeArray,
                    ),
                    BindingInfo::storage(3, "shadows", shadow_buffer_size(config), ShaderStageFlags::FRAGMENT),
                ],
            ),
        ];

        for (name, group_type, reuse, entries) in layouts {
            let layout_entries: Vec<_> = entries.iter().map(BindingInfo::layout_entry).collect();
            let layout_id = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some(name),
                entries: &layout_entries,
            })?;
            self.globals.insert(
                name,
                Arc::new(BindGroupLayoutInfo::new(
                    name, group_type, reuse, 0, layout_id, entries,
                )),
            );
        }
        Ok(())
    }

    fn register_builtins(&self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
        for descriptor in self.builtin_descriptors()? {
            self.register(descriptor.build(device)?);
        }
        Ok(())
    }

    /// The descriptor of the built-in shader `name`, for recompiling it.
    pub fn builtin_descriptor(&self, name: &str) -> Option<ShaderDescriptor> {
        self.builtin_descriptors()
            .ok()?
            .into_iter()
            .find(|descriptor| descriptor.name() == name)
    }

    fn builtin_descriptors(&self) -> Result<Vec<ShaderDescriptor>, ResourceError> {
        let frame = self.require_global(globals::FRAME)?;
        let light = self.require_global(globals::LIGHT)?;
        let object = self.require_global(globals::OBJECT)?;
        let shadow = self.require_global(globals::SHADOW)?;

        let mut material_entries = vec![
            BindingInfo::uniform(
                0,
                "material",
                size_of::<MaterialUniforms>() as u64,
                ShaderStageFlags::FRAGMENT,
            ),
            BindingInfo::sampler(1, "material_sampler", SamplerBindingType::Filtering),
        ];
        material_entries.extend(
            slots::ALL
                .iter()
                .enumerate()
                .map(|(i, slot)| BindingInfo::material_texture(2 + i as u32, slot)),
        );

        let mesh_lit = ShaderDescriptor::new(names::MESH_LIT, MESH_LIT_WGSL)
            .with_vertex_layout(Vertex::buffer_layout())
            .with_global(0, &frame)
            .with_global(1, &light)
            .with_global(2, &object)
            .with_group(
                "material",
                BindGroupType::Material,
                BindGroupReuse::PerMaterial,
                3,
                material_entries,
            )
            .with_global(4, &shadow);

        let shadow_2d = ShaderDescriptor::new(names::SHADOW_2D, SHADOW_2D_WGSL)
            .with_fragment_entry(None)
            .with_vertex_layout(Vertex::buffer_layout())
            .with_group(
                "shadow_pass",
                BindGroupType::ShadowPass2D,
                BindGroupReuse::PerFrame,
                0,
                vec![BindingInfo::uniform(
                    0,
                    "shadow_pass",
                    size_of::<ShadowPass2DUniforms>() as u64,
                    ShaderStageFlags::VERTEX,
                )],
            )
            .with_global(1, &object);

        let shadow_cube = ShaderDescriptor::new(names::SHADOW_CUBE, SHADOW_CUBE_WGSL)
            .with_vertex_layout(Vertex::buffer_layout())
            .with_group(
                "shadow_pass",
                BindGroupType::ShadowPassCube,
                BindGroupReuse::PerFrame,
                0,
                vec![BindingInfo::uniform(
                    0,
                    "shadow_pass",
                    size_of::<ShadowPassCubeUniforms>() as u64,
                    ShaderStageFlags::VERTEX_FRAGMENT,
                )],
            )
            .with_global(1, &object);

        let debug = ShaderDescriptor::new(names::DEBUG, DEBUG_WGSL)
            .with_global(0, &frame)
            .with_group(
                "debug",
                BindGroupType::Debug,
                BindGroupReuse::PerFrame,
                1,
                vec![BindingInfo::storage(
                    0,
                    "primitives",
                    (size_of::<DebugPrimitive>() * MAX_DEBUG_PRIMITIVES) as u64,
                    ShaderStageFlags::VERTEX,
                )],
            );

        let fullscreen_input = || {
            vec![
                BindingInfo::texture(
                    0,
                    "source_texture",
                    TextureSampleType::Float { filterable: true },
                    TextureViewDimension::D2,
                ),
                BindingInfo::sampler(1, "source_sampler", SamplerBindingType::Filtering),
            ]
        };
        let post = ShaderDescriptor::new(names::POST_PROCESS, FULLSCREEN_WGSL)
            .with_fragment_entry(Some("fs_post"))
            .with_group(
                "source",
                BindGroupType::Custom,
                BindGroupReuse::PerFrame,
                0,
                fullscreen_input(),
            );
        let composite = ShaderDescriptor::new(names::COMPOSITE, FULLSCREEN_WGSL)
            .with_fragment_entry(Some("fs_copy"))
            .with_group(
                "source",
                BindGroupType::Custom,
                BindGroupReuse::PerFrame,
                0,
                fullscreen_input(),
            );

        Ok(vec![mesh_lit, shadow_2d, shadow_cube, debug, post, composite])
    }

    /// Adds a compiled shader, replacing any shader with the same name.
    pub fn register(&self, info: ShaderInfo) -> Arc<ShaderInfo> {
        let info = Arc::new(info);
        if self
            .shaders
            .write()
            .insert(info.name().to_owned(), info.clone())
            .is_some()
        {
            log::warn!("ShaderRegistry: replaced shader '{}'", info.name());
        }
        info
    }

    /// The shader registered as `name`.
    pub fn get(&self, name: &str) -> Option<Arc<ShaderInfo>> {
        self.shaders.read().get(name).cloned()
    }

    /// The shader registered as `name`, as an error when missing.
    pub fn require(&self, name: &str) -> Result<Arc<ShaderInfo>, ShaderError> {
        self.get(name).ok_or_else(|| ShaderError::NotRegistered {
            name: name.to_owned(),
        })
    }

    /// A shared layout, by one of the [`globals`] names.
    pub fn global_layout(&self, name: &str) -> Option<&Arc<BindGroupLayoutInfo>> {
        self.globals.get(name)
    }

    fn require_global(&self, name: &str) -> Result<Arc<BindGroupLayoutInfo>, ResourceError> {
        self.global_layout(name).cloned().ok_or_else(|| {
            ResourceError::Shader(ShaderError::UnknownBindGroup {
                shader: "<shared>".to_owned(),
                bind_group: name.to_owned(),
            })
        })
    }

    /// Number of registered shaders.
    pub fn len(&self) -> usize {
        self.shaders.read().len()
    }

    /// Returns `true` if no shader is registered.
    pub fn is_empty(&self) -> bool {
        self.shaders.read().is_empty()
    }
}

impl std::fmt::Debug for ShaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.shaders.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ShaderRegistry")
            .field("shaders", &names)
            .finish()
    }
}
