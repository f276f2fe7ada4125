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

//! The CPU-only render collector.

use super::shadow::{ShadowRequest, ShadowType};
use crate::assets::{Mesh, Model, Submesh};
use lucent_core::math::{Aabb, Frustum, Mat4, Vec3};
use lucent_core::renderer::{Light, LightKind, LightStruct};
use lucent_core::{Handle, ResourceRegistry};

/// One (model instance x submesh) pair, destined for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    /// The model drawn.
    pub model: Handle<Model>,
    /// The index range and material.
    pub submesh: Submesh,
    /// World transform of the instance.
    pub world_transform: Mat4,
    /// World-space bounds of the whole mesh, used for culling.
    pub world_bounds: Aabb,
    /// Sort layer; lower layers draw first.
    pub layer: u32,
    /// Stable id of the scene object; `0` marks a transient item.
    pub object_id: u64,
}

impl RenderItem {
    fn sort_key(&self) -> (u32, u64, u64, u32) {
        (
            self.layer,
            self.submesh.material.id(),
            self.model.id(),
            self.submesh.index_offset,
        )
    }
}

/// Packed light data plus the shadow maps the lights need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightExtraction {
    /// One entry per collected light, in collection order.
    pub uniforms: Vec<LightStruct>,
    /// One entry per shadow-casting light that received a shadow slot.
    pub shadow_requests: Vec<ShadowRequest>,
}

/// Collects render items and lights for one frame.
///
/// Items are collected unconditionally; culling happens later through the
/// `extract_*` queries, which return indices into [`RenderCollector::render_items`].
#[derive(Debug, Default)]
pub struct RenderCollector {
    items: Vec<RenderItem>,
    lights: Vec<Light>,
}

impl RenderCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one render item per submesh of `model`.
    ///
    /// Returns the number of items added. Models or meshes that do not
    /// resolve are skipped.
    pub fn add_model(
        &mut self,
        registry: &ResourceRegistry,
        model: Handle<Model>,
        transform: Mat4,
        layer: u32,
        object_id: u64,
    ) -> usize {
        let Some(model_ref) = registry.get(model) else {
            log::warn!("RenderCollector: model {model:?} does not resolve, skipped");
            return 0;
        };
        let Some(mesh) = registry.get::<Mesh>(model_ref.mesh()) else {
            log::warn!("RenderCollector: mesh of model {model:?} does not resolve, skipped");
            return 0;
        };

        let local = mesh.bounds();
        let world_bounds = if local.is_valid() {
            local.transformed(&transform)
        } else {
            let origin = transform.transform_point3(Vec3::ZERO);
            Aabb::from_min_max(origin, origin)
        };

        let submeshes = model_ref.submeshes();
        let added = submeshes.len();
        self.items.extend(submeshes.into_iter().map(|submesh| RenderItem {
            model,
            submesh,
            world_transform: transform,
            world_bounds,
            layer,
            object_id,
        }));
        added
    }

    /// Adds a light.
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Sorts items by layer, then material, then model, then index offset.
    pub fn sort(&mut self) {
        self.items.sort_by_key(RenderItem::sort_key);
    }

    /// Removes every item and light.
    pub fn clear(&mut self) {
        self.items.clear();
        self.lights.clear();
    }

    /// All collected items.
    pub fn render_items(&self) -> &[RenderItem] {
        &self.items
    }

    /// All collected lights.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Number of collected items.
    pub fn render_item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of collected lights.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Indices of every item.
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.items.len()).collect()
    }

    /// Indices of items touching a camera frustum.
    pub fn extract_visible(&self, frustum: &Frustum) -> Vec<usize> {
        self.filter_indices(|item| frustum.intersects_aabb(&item.world_bounds))
    }

    /// Indices of items inside a directional or spot light's frustum.
    pub fn extract_for_light_frustum(&self, light_frustum: &Frustum) -> Vec<usize> {
        self.extract_visible(light_frustum)
    }

    /// Indices of items touching a point light's sphere of influence.
    pub fn extract_for_point_light(&self, position: Vec3, range: f32) -> Vec<usize> {
        self.filter_indices(|item| item.world_bounds.intersects_sphere(position, range))
    }

    fn filter_indices(&self, predicate: impl Fn(&RenderItem) -> bool) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| predicate(item))
            .map(|(index, _)| index)
            .collect()
    }

    /// Packs every light without assigning shadows.
    pub fn extract_light_uniforms(&self) -> Vec<LightStruct> {
        self.lights.iter().map(Light::to_uniform).collect()
    }

    /// Packs every light and assigns shadow slots.
    ///
    /// Directional and spot lights take the next layer of the 2D shadow array,
    /// point lights the next cube of the cube array, in light order. Once an
    /// array is full, further lights of that kind render without shadows.
    pub fn extract_light_uniforms_with_shadows(
        &self,
        max_shadow_2d: u32,
        max_shadow_cube: u32,
    ) -> LightExtraction {
        let mut extraction = LightExtraction::default();
        let mut next_2d = 0u32;
        let mut next_cube = 0u32;

        for (light_index, light) in self.lights.iter().enumerate() {
            let mut uniform = light.to_uniform();

            if light.casts_shadows() {
                let slot = match light.kind {
                    LightKind::Directional(_) if next_2d < max_shadow_2d => {
                        next_2d += 1;
                        Some((ShadowType::Directional2D, next_2d - 1))
                    }
                    LightKind::Spot(_) if next_2d < max_shadow_2d => {
                        next_2d += 1;
                        Some((ShadowType::Spot2D, next_2d - 1))
                    }
                    LightKind::Point(_) if next_cube < max_shadow_cube => {
                        next_cube += 1;
                        Some((ShadowType::PointCube, next_cube - 1))
                    }
                    _ => None,
                };

                match slot {
                    Some((shadow_type, texture_index_start)) => {
                        uniform.shadow_index = extraction.shadow_requests.len() as u32;
                        uniform.shadow_count = 1;
                        extraction.shadow_requests.push(ShadowRequest {
                            light_index,
                            light: *light,
                            shadow_type,
                            texture_index_start,
                            cascade_count: 1,
                        });
                    }
                    None => log::debug!(
                        "RenderCollector: no shadow slot left for light {light_index}"
                    ),
                }
            }

            extraction.uniforms.push(uniform);
        }
        extraction
    }
}
