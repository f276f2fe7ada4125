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

//! Fixtures shared by the agent tests.

#![allow(dead_code)]

#[path = "../../../lucent-lanes/src/test_support/mock_device.rs"]
mod mock_device;

pub use mock_device::*;

use lucent_core::math::{Mat4, Vec3};
use lucent_core::renderer::{RendererConfig, TextureFormat, TextureViewId};
use lucent_core::{Handle, ResourceRegistry};
use lucent_data::{Material, Mesh, Model, RenderCollector};
use lucent_lanes::render_lane::{CameraView, SurfaceTarget};
use lucent_lanes::shader::names;
use lucent_agents::render_agent::RenderAgent;
use std::sync::Arc;

/// An initialized agent over a recording device.
pub fn agent_with(config: RendererConfig) -> (MockGraphicsDevice, Arc<ResourceRegistry>, RenderAgent) {
    let device = MockGraphicsDevice::new();
    let registry = Arc::new(ResourceRegistry::new());
    let agent = RenderAgent::bootstrap(Arc::new(device.clone()), registry.clone(), config)
        .expect("agent");
    (device, registry, agent)
}

pub fn agent() -> (MockGraphicsDevice, Arc<ResourceRegistry>, RenderAgent) {
    agent_with(RendererConfig::default())
}

/// A lit triangle model.
pub fn triangle_model(registry: &ResourceRegistry) -> Handle<Model> {
    let mesh = registry.add(Arc::new(Mesh::new(
        "tri",
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
    )));
    let material = registry.add(Arc::new(Material::new("lit", names::MESH_LIT)));
    registry.add(Arc::new(Model::single("tri", mesh, material, 3)))
}

/// `model` once per object id, in front of the default camera.
pub fn collector(registry: &ResourceRegistry, model: Handle<Model>, ids: &[u64]) -> RenderCollector {
    let mut collector = RenderCollector::new();
    for &id in ids {
        let transform = Mat4::from_translation(Vec3::new(id as f32 - 1.0, 0.0, 0.0));
        collector.add_model(registry, model, transform, 0, id);
    }
    collector
}

pub fn camera(id: u64, width: u32, height: u32) -> CameraView {
    CameraView::perspective(id, Vec3::new(0.0, 1.0, 8.0), Vec3::ZERO, 1.0, width, height, 0.1, 50.0)
}

pub fn surface() -> SurfaceTarget {
    SurfaceTarget {
        view: TextureViewId(usize::MAX),
        width: 200,
        height: 100,
        format: TextureFormat::Bgra8UnormSrgb,
    }
}

/// Labels of the recorded passes, in submission order.
pub fn pass_labels(device: &MockGraphicsDevice) -> Vec<String> {
    device
        .passes()
        .into_iter()
        .map(|pass| pass.label.unwrap_or_default())
        .collect()
}
