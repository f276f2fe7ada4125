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

//! A full frame through every pass, twice.

mod common;

use common::{add_instances, mock_context, scene, MockGraphicsDevice};
use lucent_core::math::{Mat4, Vec3};
use lucent_core::renderer::{
    DirectionalLight, Light, LightKind, LightsHeader, PointLight, TextureFormat, TextureViewId,
};
use lucent_data::RenderCollector;
use lucent_lanes::render_lane::{
    CameraView, CompositePass, DebugCollector, DebugPass, FrameCache, FramePass, MeshPass,
    PostProcessingPass, RenderTarget, ShadowPass, SurfaceTarget,
};
use lucent_lanes::{GpuContext, GpuFactory};

struct Passes {
    shadow: ShadowPass,
    mesh: MeshPass,
    debug: DebugPass,
    post: PostProcessingPass,
    composite: CompositePass,
}

impl Passes {
    fn new(ctx: &GpuContext) -> Self {
        let mut passes = Self {
            shadow: ShadowPass::new(),
            mesh: MeshPass::new(),
            debug: DebugPass::new(),
            post: PostProcessingPass::new(),
            composite: CompositePass::new(),
        };
        for pass in passes.all() {
            pass.initialize(ctx).unwrap();
        }
        passes
    }

    fn all(&mut self) -> [&mut dyn FramePass; 5] {
        [
            &mut self.shadow,
            &mut self.mesh,
            &mut self.debug,
            &mut self.post,
            &mut self.composite,
        ]
    }
}

fn lights() -> [Light; 2] {
    let sun = Light::new(LightKind::Directional(DirectionalLight {
        cast_shadows: true,
        range: 20.0,
        ..DirectionalLight::default()
    }))
    .with_transform(Mat4::from_rotation_x(-1.0));
    let lamp = Light::new(LightKind::Point(PointLight {
        cast_shadows: true,
        range: 8.0,
        ..PointLight::default()
    }))
    .with_transform(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)));
    [sun, lamp]
}

fn run_frame(
    ctx: &GpuContext,
    passes: &mut Passes,
    cache: &mut FrameCache,
    collector: &RenderCollector,
    target: &RenderTarget,
) {
    cache.extract_lights(ctx, collector);
    cache.render_targets.insert(target.camera.id, target.clone());
    let visible = collector.extract_visible(&target.camera.frustum());
    cache.prepare_gpu_resources(ctx, collector, &visible);

    passes.shadow.prepare(ctx, cache, collector);
    passes.shadow.render(ctx, cache).unwrap();
    passes.mesh.set_shadow_bind_group(passes.shadow.shadow_bind_group());
    passes.mesh.set_visible(target.camera.id, visible);
    passes.mesh.render(ctx, cache).unwrap();

    let mut debug = DebugCollector::new();
    debug.add_line(Vec3::ZERO, Vec3::Y, lucent_core::math::LinearRgba::WHITE);
    passes.debug.set_primitives(&debug);
    passes.debug.render(ctx, cache).unwrap();
    passes.post.render(ctx, cache).unwrap();
    passes.composite.set_surface(Some(SurfaceTarget {
        view: TextureViewId(usize::MAX),
        width: 64,
        height: 64,
        format: TextureFormat::Bgra8UnormSrgb,
    }));
    passes.composite.render(ctx, cache).unwrap();
    cache.clear(ctx);
}

fn light_count_writes(device: &MockGraphicsDevice, ctx: &GpuContext, passes: &Passes) -> Vec<u32> {
    let slot = passes.mesh.light_bind_group().unwrap();
    let buffer = ctx.bind_groups().lock().get(slot).unwrap().buffer(0).unwrap().buffer;
    device
        .writes_to(buffer)
        .iter()
        .filter(|w| w.offset == 0)
        .map(|w| u32::from_le_bytes([w.data[0], w.data[1], w.data[2], w.data[3]]))
        .collect()
}

#[test]
fn two_frames_reuse_every_gpu_object() {
    let (device, ctx) = mock_context();
    let scene = scene(&ctx);
    let mut collector = RenderCollector::new();
    add_instances(&ctx, &mut collector, scene.red, &[1, 2]);
    add_instances(&ctx, &mut collector, scene.blue, &[3]);
    for light in lights() {
        collector.add_light(light);
    }
    let camera = CameraView::perspective(1, Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, 1.0, 64, 64, 0.1, 50.0);
    let target = RenderTarget::new(&ctx, camera).unwrap();
    let mut passes = Passes::new(&ctx);
    let mut cache = FrameCache::new();

    device.clear_log();
    run_frame(&ctx, &mut passes, &mut cache, &collector, &target);
    assert_eq!(light_count_writes(&device, &ctx, &passes), vec![2]);
    assert!(device
        .writes()
        .iter()
        .any(|w| w.offset == LightsHeader::LIGHTS_OFFSET));
    let after_first = device.stats();

    device.clear_log();
    run_frame(&ctx, &mut passes, &mut cache, &collector, &target);
    assert_eq!(light_count_writes(&device, &ctx, &passes), vec![2]);
    let after_second = device.stats();

    assert_eq!(ctx.meshes().cache().len(), 1);
    assert_eq!(ctx.materials().cache().len(), 2);
    assert_eq!(cache.object_bind_group_count(), 3);
    assert_eq!(after_second.buffers_created, after_first.buffers_created);
    assert_eq!(after_second.bind_groups_created, after_first.bind_groups_created);
    assert_eq!(after_second.textures_created, after_first.textures_created);
    assert_eq!(after_second.pipelines_created, after_first.pipelines_created);

    // 1 directional layer, 6 cube faces, mesh, debug, post and composite.
    assert_eq!(device.passes().len(), 1 + 6 + 4);
    let mesh_pass = device
        .passes()
        .into_iter()
        .find(|p| p.label.as_deref() == Some("mesh pass"))
        .unwrap();
    assert_eq!(mesh_pass.draw_count(), 3);
}

#[test]
fn cleanup_returns_every_pass_resource() {
    let (device, ctx) = mock_context();
    let bind_groups = device.live_bind_groups();
    let mut passes = Passes::new(&ctx);
    let mut cache = FrameCache::new();
    let collector = RenderCollector::new();
    let camera = CameraView::perspective(1, Vec3::Z, Vec3::ZERO, 1.0, 16, 16, 0.1, 10.0);
    let target = RenderTarget::new(&ctx, camera).unwrap();
    run_frame(&ctx, &mut passes, &mut cache, &collector, &target);

    for pass in passes.all() {
        pass.cleanup(&ctx);
    }
    cache.release(&ctx);
    target.release(&ctx);
    assert_eq!(device.live_bind_groups(), bind_groups);
}
