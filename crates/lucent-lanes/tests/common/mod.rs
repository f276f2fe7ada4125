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

//! Fixtures shared by the integration tests.

#![allow(dead_code)]

#[path = "../../src/test_support/mock_device.rs"]
mod mock_device;

pub use mock_device::*;

use lucent_core::math::{Mat4, Vec3};
use lucent_core::renderer::RendererConfig;
use lucent_core::{Handle, ResourceRegistry};
use lucent_data::{Material, Mesh, Model, RenderCollector};
use lucent_lanes::shader::names;
use lucent_lanes::GpuContext;
use std::sync::Arc;

/// A context over a fresh recording device and an empty registry.
pub fn mock_context() -> (MockGraphicsDevice, GpuContext) {
    let device = MockGraphicsDevice::new();
    let ctx = GpuContext::new(
        Arc::new(device.clone()),
        Arc::new(ResourceRegistry::new()),
        RendererConfig::default(),
    )
    .expect("mock context");
    (device, ctx)
}

/// Handles of a small scene: one triangle mesh used by two models with
/// different materials.
pub struct Scene {
    pub mesh: Handle<Mesh>,
    pub red: Handle<Model>,
    pub blue: Handle<Model>,
}

pub fn scene(ctx: &GpuContext) -> Scene {
    let registry = ctx.registry();
    let mesh = registry.add(Arc::new(Mesh::new(
        "tri",
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
    )));
    let red = registry.add(Arc::new(Material::new("red", names::MESH_LIT)));
    let blue = registry.add(Arc::new(Material::new("blue", names::MESH_LIT)));
    Scene {
        mesh,
        red: registry.add(Arc::new(Model::single("red", mesh, red, 3))),
        blue: registry.add(Arc::new(Model::single("blue", mesh, blue, 3))),
    }
}

/// Adds `model` once per object id, spread along X.
pub fn add_instances(
    ctx: &GpuContext,
    collector: &mut RenderCollector,
    model: Handle<Model>,
    ids: &[u64],
) {
    for &id in ids {
        let transform = Mat4::from_translation(Vec3::new(id as f32 * 1.5 - 3.0, 0.0, 0.0));
        collector.add_model(ctx.registry(), model, transform, 0, id);
    }
}
