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

//! Integration tests for GPU item preparation.

mod common;

use common::{add_instances, mock_context, scene};
use lucent_core::math::Mat4;
use lucent_data::{Material, Model, RenderCollector};
use lucent_lanes::render_lane::FrameCache;
use lucent_lanes::GpuFactory;
use std::sync::Arc;

#[test]
fn item_list_always_matches_the_collector() {
    let (_, ctx) = mock_context();
    let scene = scene(&ctx);
    let mut collector = RenderCollector::new();
    add_instances(&ctx, &mut collector, scene.red, &[1, 2, 3, 4]);
    let mut cache = FrameCache::new();

    cache.prepare_gpu_resources(&ctx, &collector, &[2]);
    assert_eq!(cache.gpu_render_items.len(), collector.render_item_count());
    assert!(cache.item(2).is_some());
    assert!(cache.item(0).is_none());

    add_instances(&ctx, &mut collector, scene.blue, &[5]);
    cache.prepare_gpu_resources(&ctx, &collector, &[4]);
    assert_eq!(cache.gpu_render_items.len(), 5);
    assert!(cache.item(4).is_some());
}

#[test]
fn one_broken_item_does_not_stop_the_others() {
    let (_, ctx) = mock_context();
    let scene = scene(&ctx);
    let broken_material = ctx
        .registry()
        .add(Arc::new(Material::new("broken", "no_such_shader")));
    let broken = ctx
        .registry()
        .add(Arc::new(Model::single("broken", scene.mesh, broken_material, 3)));

    let mut collector = RenderCollector::new();
    add_instances(&ctx, &mut collector, scene.red, &[1]);
    collector.add_model(ctx.registry(), broken, Mat4::IDENTITY, 0, 2);
    add_instances(&ctx, &mut collector, scene.blue, &[3]);
    let mut cache = FrameCache::new();

    let stats = cache.prepare_gpu_resources(&ctx, &collector, &collector.all_indices());
    assert_eq!(stats.prepared, 2);
    assert_eq!(stats.failed, 1);
    assert!(cache.item(0).is_some());
    assert!(cache.item(1).is_none());
    assert!(cache.item(2).is_some());
}

#[test]
fn instances_share_gpu_objects() {
    let (device, ctx) = mock_context();
    let scene = scene(&ctx);
    let mut collector = RenderCollector::new();
    add_instances(&ctx, &mut collector, scene.red, &[1, 2]);
    add_instances(&ctx, &mut collector, scene.blue, &[3]);
    let mut cache = FrameCache::new();

    cache.prepare_gpu_resources(&ctx, &collector, &collector.all_indices());
    assert_eq!(ctx.meshes().cache().len(), 1);
    assert_eq!(ctx.materials().cache().len(), 2);
    assert_eq!(ctx.models().cache().len(), 2);
    assert_eq!(cache.object_bind_group_count(), 3);
    let first = cache.item(0).unwrap();
    let second = cache.item(1).unwrap();
    assert!(Arc::ptr_eq(&first.mesh, &second.mesh));
    assert_ne!(first.object_bind_group, second.object_bind_group);

    let buffers = device.stats().buffers_created;
    cache.clear(&ctx);
    cache.prepare_gpu_resources(&ctx, &collector, &collector.all_indices());
    assert_eq!(device.stats().buffers_created, buffers);
}
