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

//! Depth-only rendering of shadow maps and shadow cubes.
//!
//! Directional and spot lights render into one layer each of a 2D array.
//! Point lights render six faces into one cube of a cube array. The lit
//! shader samples both through the global `shadow` group owned here.

use super::{
    ensure_initialized, init_failure, BindGroupBinder, BindingIds, DrawStats, FrameCache,
    FramePass, PassState, PrepareStats,
};
use crate::context::{GpuContext, SamplerKind};
use crate::gpu::{BindGroupSlot, GpuSyncable, GpuTexture};
use crate::pipeline::{PipelineHandle, PipelineKey};
use crate::shader::{globals, names, BindGroupType};
use lucent_core::math::{Frustum, Mat4, Vec3};
use lucent_core::renderer::{
    BindingResource, CommandEncoder, CullMode, Light, LightKind, LoadOp, Operations,
    PrimitiveTopology, RenderError, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    RenderPipelineId, ShadowPass2DUniforms, ShadowPassCubeUniforms, ShadowUniform, StoreOp,
    Viewport,
};
use lucent_data::{RenderCollector, ShadowRequest, ShadowType};
use std::collections::HashMap;

const SHADOW_DEPTH_BIAS: i32 = 2;
const SPOT_NEAR: f32 = 0.1;
const POINT_NEAR: f32 = 0.1;

/// Cube faces in array layer order, with the up vector of each face.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y),
    (Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::Z),
    (Vec3::Z, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ShadowKind {
    Flat,
    Cube,
}

impl ShadowKind {
    fn shader(self) -> &'static str {
        match self {
            ShadowKind::Flat => names::SHADOW_2D,
            ShadowKind::Cube => names::SHADOW_CUBE,
        }
    }

    fn pass_group(self) -> BindGroupType {
        match self {
            ShadowKind::Flat => BindGroupType::ShadowPass2D,
            ShadowKind::Cube => BindGroupType::ShadowPassCube,
        }
    }
}

/// Sampling parameters of a light: bias, normal bias and PCF radius.
fn sampling(light: &Light) -> (f32, f32, u32) {
    match &light.kind {
        LightKind::Ambient(_) => (0.0, 0.0, 0),
        LightKind::Directional(l) => (l.shadow_bias, l.shadow_normal_bias, l.shadow_pcf_kernel),
        LightKind::Point(l) => (l.shadow_bias, l.shadow_normal_bias, l.shadow_pcf_kernel),
        LightKind::Spot(l) => (l.shadow_bias, l.shadow_normal_bias, l.shadow_pcf_kernel),
    }
}

fn up_for(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Computes the sampling uniform of one shadow request.
///
/// `camera_planes` are the near and far planes of the main camera, used as
/// the depth range a directional shadow covers.
fn shadow_uniform(
    request: &ShadowRequest,
    camera_planes: (f32, f32),
    map_size: u32,
    cube_size: u32,
) -> ShadowUniform {
    let light = &request.light;
    let (bias, normal_bias, pcf_kernel) = sampling(light);
    let range = light.range();
    let position = light.position();
    let direction = light.direction();
    let mut uniform = ShadowUniform {
        bias,
        normal_bias,
        pcf_kernel,
        texture_index: request.texture_index_start,
        texel_size: 1.0 / map_size.max(1) as f32,
        shadow_type: ShadowUniform::TYPE_2D,
        ..ShadowUniform::default()
    };

    match request.shadow_type {
        ShadowType::Directional2D => {
            let view = Mat4::look_at_rh(-direction * range, Vec3::ZERO, up_for(direction));
            let projection = Mat4::orthographic_rh(-range, range, -range, range, -range, range * 2.0);
            uniform.view_proj = (projection * view).to_cols_array_2d();
            uniform.near = camera_planes.0;
            uniform.far = camera_planes.1;
            uniform.cascade_split = camera_planes.1;
        }
        ShadowType::Spot2D => {
            let spot_angle = match &light.kind {
                LightKind::Spot(spot) => spot.spot_angle,
                _ => std::f32::consts::FRAC_PI_4,
            };
            let view = Mat4::look_at_rh(position, position + direction, up_for(direction));
            let projection = Mat4::perspective_rh(spot_angle * 2.0, 1.0, SPOT_NEAR, range);
            uniform.view_proj = (projection * view).to_cols_array_2d();
            uniform.near = SPOT_NEAR;
            uniform.far = range;
            uniform.cascade_split = range;
        }
        ShadowType::PointCube => {
            uniform.light_pos = position.to_array();
            uniform.near = POINT_NEAR;
            uniform.far = range * 1.05 + 0.1;
            uniform.cascade_split = range;
            uniform.shadow_type = ShadowUniform::TYPE_CUBE;
            uniform.texel_size = 1.0 / cube_size.max(1) as f32;
        }
    }
    uniform
}

/// View-projection of one cube face seen from `position`.
fn cube_face_view_proj(position: Vec3, face: usize, far: f32) -> Mat4 {
    let (direction, up) = CUBE_FACES[face];
    let projection = Mat4::perspective_lh(std::f32::consts::FRAC_PI_2, 1.0, POINT_NEAR, far);
    projection * Mat4::look_at_lh(position, position + direction, up)
}

/// Renders every shadow request of the frame.
///
/// Call [`prepare`](Self::prepare) after the frame cache extracted its
/// lights and before [`render`](FramePass::render).
#[derive(Debug, Default)]
pub struct ShadowPass {
    state: PassState,
    maps_2d: Option<GpuTexture>,
    maps_cube: Option<GpuTexture>,
    shadow_bind_group: Option<BindGroupSlot>,
    pass_groups_2d: HashMap<u32, BindGroupSlot>,
    pass_groups_cube: HashMap<u32, BindGroupSlot>,
    pipelines: HashMap<(ShadowKind, PrimitiveTopology), PipelineHandle>,
    visible: Vec<Vec<usize>>,
    binder: BindGroupBinder,
    last_stats: DrawStats,
}

impl ShadowPass {
    /// Creates an uninitialized pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// The global group holding the shadow maps, their sampler and the
    /// per-shadow uniforms.
    pub fn shadow_bind_group(&self) -> Option<BindGroupSlot> {
        self.shadow_bind_group
    }

    /// Draw totals of the last [`render`](FramePass::render).
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }

    /// Computes the shadow uniforms of the frame, prepares the items each
    /// shadow sees and uploads the uniforms for the lit shader.
    pub fn prepare(
        &mut self,
        ctx: &GpuContext,
        cache: &mut FrameCache,
        collector: &RenderCollector,
    ) -> PrepareStats {
        let config = ctx.config();
        let camera_planes = cache
            .render_targets
            .values()
            .next()
            .map(|target| (target.camera.near, target.camera.far))
            .unwrap_or((0.1, 100.0));

        let uniforms: Vec<ShadowUniform> = cache
            .shadow_requests
            .iter()
            .map(|request| {
                shadow_uniform(
                    request,
                    camera_planes,
                    config.shadow_map_size,
                    config.cube_shadow_map_size,
                )
            })
            .collect();

        self.visible = cache
            .shadow_requests
            .iter()
            .zip(&uniforms)
            .map(|(request, uniform)| match request.shadow_type {
                ShadowType::PointCube => collector
                    .extract_for_point_light(request.light.position(), request.light.range()),
                _ => {
                    let view_proj = Mat4::from_cols_array_2d(&uniform.view_proj);
                    collector.extract_for_light_frustum(&Frustum::from_view_projection(&view_proj))
                }
            })
            .collect();

        let mut stats = PrepareStats::default();
        for indices in &self.visible {
            stats += cache.prepare_gpu_resources(ctx, collector, indices);
        }
        cache.shadow_uniforms = uniforms;

        if let (Some(slot), false) = (self.shadow_bind_group, cache.shadow_uniforms.is_empty()) {
            if let Err(e) =
                ctx.write_bind_group_buffer(slot, 3, 0, bytemuck::cast_slice(&cache.shadow_uniforms))
            {
                log::warn!("ShadowPass: failed to upload shadow uniforms: {e}");
            }
        }
        stats
    }

    fn pipeline(
        &mut self,
        ctx: &GpuContext,
        kind: ShadowKind,
        topology: PrimitiveTopology,
    ) -> Result<PipelineHandle, RenderError> {
        if let Some(handle) = self.pipelines.get(&(kind, topology)) {
            if handle.is_current(ctx.shaders()) {
                return Ok(handle.clone());
            }
        }
        let key = PipelineKey::new(kind.shader())
            .with_depth(ctx.config().depth_format, true)
            .with_topology(topology)
            .with_cull_mode(CullMode::None)
            .with_depth_bias(SHADOW_DEPTH_BIAS);
        let handle = ctx.pipelines().get_or_create(ctx.device(), ctx.shaders(), &key)?;
        self.pipelines.insert((kind, topology), handle.clone());
        Ok(handle)
    }

    fn pass_group(&mut self, ctx: &GpuContext, kind: ShadowKind, layer: u32) -> Option<BindGroupSlot> {
        let groups = match kind {
            ShadowKind::Flat => &mut self.pass_groups_2d,
            ShadowKind::Cube => &mut self.pass_groups_cube,
        };
        if let Some(&slot) = groups.get(&layer) {
            return Some(slot);
        }
        let shader = ctx.shaders().get(kind.shader())?;
        let layout = shader.bind_group_of_type(kind.pass_group())?;
        match ctx.create_bind_group(layout, &[], &format!("shadow_pass#{layer}")) {
            Ok(slot) => {
                groups.insert(layer, slot);
                Some(slot)
            }
            Err(e) => {
                log::warn!("ShadowPass: no pass group for layer {layer}: {e}");
                None
            }
        }
    }

    /// Records one depth pass into `layer` of the 2D or cube array.
    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        ctx: &GpuContext,
        cache: &FrameCache,
        kind: ShadowKind,
        layer: u32,
        request: usize,
        pass_group: BindGroupSlot,
    ) {
        let (view, size) = match (kind, &self.maps_2d, &self.maps_cube) {
            (ShadowKind::Flat, Some(maps), _) | (ShadowKind::Cube, _, Some(maps)) => {
                (maps.view(), maps.width())
            }
            _ => return,
        };
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("shadow pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                base_array_layer: Some(layer),
            }),
        });
        pass.set_viewport(&Viewport {
            x: 0.0,
            y: 0.0,
            width: size as f32,
            height: size as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });

        let indices = self.visible.get(request).cloned().unwrap_or_default();
        let mut bound_pipeline: Option<RenderPipelineId> = None;
        let mut bound_mesh = None;
        for index in indices {
            let Some(item) = cache.item(index) else {
                self.last_stats.skipped += 1;
                continue;
            };
            let topology = item.mesh.topology();
            let pipeline = match self.pipeline(ctx, kind, topology) {
                Ok(pipeline) => pipeline,
                Err(e) => {
                    log::warn!("ShadowPass: no pipeline for {topology:?}: {e}");
                    self.last_stats.skipped += 1;
                    continue;
                }
            };
            if bound_pipeline != Some(pipeline.id) {
                pass.set_pipeline(pipeline.id);
                bound_pipeline = Some(pipeline.id);
            }
            let mesh_buffer = item.mesh.vertex_buffer();
            if bound_mesh != Some(mesh_buffer) {
                item.mesh.bind_buffers(pass.as_mut());
                bound_mesh = Some(mesh_buffer);
            }

            let mut overrides = vec![(kind.pass_group(), pass_group)];
            if item.is_transient() {
                overrides.push((BindGroupType::Object, item.object_bind_group));
            }
            let ids = BindingIds {
                camera: Some(u64::from(layer)),
                object: Some(item.object_id),
                material: None,
            };
            self.binder
                .bind(pass.as_mut(), ctx, cache, &pipeline.shader, ids, &overrides);
            item.mesh.draw_submesh(pass.as_mut(), &item.submesh);
            self.last_stats.drawn += 1;
        }
    }

    fn render_2d(&mut self, ctx: &GpuContext, cache: &FrameCache, requests: &[(usize, u32)]) {
        if requests.is_empty() {
            return;
        }
        let mut encoder = ctx.device().create_command_encoder(Some("shadow maps"));
        for &(request, layer) in requests {
            let Some(group) = self.pass_group(ctx, ShadowKind::Flat, layer) else {
                continue;
            };
            let uniforms = ShadowPass2DUniforms {
                light_view_proj: cache.shadow_uniforms[request].view_proj,
            };
            if let Err(e) = ctx.write_bind_group_buffer(group, 0, 0, bytemuck::bytes_of(&uniforms)) {
                log::warn!("ShadowPass: failed to write layer {layer}: {e}");
                continue;
            }
            self.record(encoder.as_mut(), ctx, cache, ShadowKind::Flat, layer, request, group);
        }
        ctx.device().submit_command_buffer(encoder.finish());
    }

    fn render_cube(&mut self, ctx: &GpuContext, cache: &FrameCache, request: usize, cube: u32) {
        let uniform = &cache.shadow_uniforms[request];
        let position = Vec3::from_array(uniform.light_pos);
        let far = uniform.far;
        let mut encoder = ctx.device().create_command_encoder(Some("shadow cube"));
        for face in 0..CUBE_FACES.len() {
            let layer = cube * 6 + face as u32;
            let Some(group) = self.pass_group(ctx, ShadowKind::Cube, layer) else {
                continue;
            };
            let uniforms = ShadowPassCubeUniforms {
                light_view_proj: cube_face_view_proj(position, face, far).to_cols_array_2d(),
                light_position: position.to_array(),
                far_plane: far,
            };
            if let Err(e) = ctx.write_bind_group_buffer(group, 0, 0, bytemuck::bytes_of(&uniforms)) {
                log::warn!("ShadowPass: failed to write cube face {layer}: {e}");
                continue;
            }
            self.record(encoder.as_mut(), ctx, cache, ShadowKind::Cube, layer, request, group);
        }
        ctx.device().submit_command_buffer(encoder.finish());
    }
}

impl FramePass for ShadowPass {
    fn name(&self) -> &'static str {
        "ShadowPass"
    }

    fn state(&self) -> PassState {
        self.state
    }

    fn initialize(&mut self, ctx: &GpuContext) -> Result<(), RenderError> {
        let name = self.name();
        for kind in [ShadowKind::Flat, ShadowKind::Cube] {
            self.pipeline(ctx, kind, PrimitiveTopology::TriangleList)
                .map_err(|e| init_failure(name, e))?;
        }

        let config = ctx.config();
        let textures = ctx.textures();
        let maps_2d = textures
            .shadow_map_2d_array(
                ctx,
                config.shadow_map_size,
                config.max_shadow_maps_2d.max(1),
                config.depth_format,
            )
            .map_err(|e| init_failure(name, e))?;
        let maps_cube = match textures.shadow_map_cube_array(
            ctx,
            config.cube_shadow_map_size,
            config.max_shadow_maps_cube,
            config.depth_format,
        ) {
            Ok(maps) => maps,
            Err(e) => {
                maps_2d.release(ctx);
                return Err(init_failure(name, e));
            }
        };

        let layout = ctx.shaders().global_layout(globals::SHADOW).cloned();
        let group = layout.ok_or(RenderError::NotInitialized).and_then(|layout| {
            ctx.create_bind_group(
                &layout,
                &[
                    (0, BindingResource::Sampler(ctx.sampler(SamplerKind::ShadowComparison))),
                    (1, BindingResource::TextureView(maps_2d.view())),
                    (2, BindingResource::TextureView(maps_cube.view())),
                ],
                "shadow",
            )
            .map_err(RenderError::from)
        });
        let group = match group {
            Ok(group) => group,
            Err(e) => {
                maps_2d.release(ctx);
                maps_cube.release(ctx);
                return Err(init_failure(name, e));
            }
        };

        self.maps_2d = Some(maps_2d);
        self.maps_cube = Some(maps_cube);
        self.shadow_bind_group = Some(group);
        self.state = PassState::Initialized;
        log::debug!(
            "ShadowPass: {} 2D layers of {}px, {} cubes of {}px",
            config.max_shadow_maps_2d,
            config.shadow_map_size,
            config.max_shadow_maps_cube,
            config.cube_shadow_map_size
        );
        Ok(())
    }

    fn render(&mut self, ctx: &GpuContext, cache: &mut FrameCache) -> Result<(), RenderError> {
        ensure_initialized(self)?;
        self.last_stats = DrawStats::default();
        let cache: &FrameCache = cache;
        if cache.shadow_uniforms.len() != cache.shadow_requests.len() {
            log::warn!("ShadowPass: render called without prepare, skipping shadows");
            return Ok(());
        }

        let flat: Vec<(usize, u32)> = cache
            .shadow_requests
            .iter()
            .enumerate()
            .filter(|(_, r)| r.shadow_type.is_2d())
            .map(|(i, r)| (i, r.texture_index_start))
            .collect();
        self.render_2d(ctx, cache, &flat);

        for (i, request) in cache.shadow_requests.iter().enumerate() {
            if request.shadow_type == ShadowType::PointCube {
                self.render_cube(ctx, cache, i, request.texture_index_start);
            }
        }
        self.visible.clear();
        Ok(())
    }

    fn cleanup(&mut self, ctx: &GpuContext) {
        let groups = self
            .pass_groups_2d
            .drain()
            .chain(self.pass_groups_cube.drain())
            .map(|(_, slot)| slot)
            .chain(self.shadow_bind_group.take());
        for slot in groups {
            ctx.release_bind_group(slot);
        }
        for maps in [self.maps_2d.take(), self.maps_cube.take()].into_iter().flatten() {
            maps.release(ctx);
        }
        self.pipelines.clear();
        self.visible.clear();
        self.state = PassState::Disposed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::{CameraView, RenderTarget};
    use crate::test_support::{mock_context, PassCommand, RecordedPass};
    use approx::assert_relative_eq;
    use lucent_core::renderer::{DirectionalLight, PointLight};
    use lucent_data::{Material, Mesh, Model};
    use std::sync::Arc;

    fn point_light(range: f32) -> Light {
        Light::new(LightKind::Point(PointLight {
            range,
            cast_shadows: true,
            ..PointLight::default()
        }))
        .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)))
    }

    fn sun() -> Light {
        Light::new(LightKind::Directional(DirectionalLight {
            range: 20.0,
            cast_shadows: true,
            ..DirectionalLight::default()
        }))
    }

    fn frame(ctx: &GpuContext, lights: &[Light]) -> (RenderCollector, FrameCache) {
        let registry = ctx.registry();
        let material = registry.add(Arc::new(Material::new("grey", names::MESH_LIT)));
        let mesh = registry.add(Arc::new(Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y])));
        let model = registry.add(Arc::new(Model::single("tri", mesh, material, 3)));
        let mut collector = RenderCollector::new();
        collector.add_model(registry, model, Mat4::IDENTITY, 0, 1);
        for light in lights {
            collector.add_light(*light);
        }
        let mut cache = FrameCache::new();
        let camera = CameraView::perspective(1, Vec3::Z * 5.0, Vec3::ZERO, 1.0, 16, 16, 0.5, 40.0);
        cache
            .render_targets
            .insert(1, RenderTarget::new(ctx, camera).unwrap());
        cache.extract_lights(ctx, &collector);
        (collector, cache)
    }

    #[test]
    fn point_shadow_uniform_extends_the_range() {
        let request = ShadowRequest {
            light_index: 0,
            light: point_light(10.0),
            shadow_type: ShadowType::PointCube,
            texture_index_start: 2,
            cascade_count: 1,
        };
        let uniform = shadow_uniform(&request, (0.1, 100.0), 2048, 1024);
        assert_eq!(uniform.shadow_type, ShadowUniform::TYPE_CUBE);
        assert_eq!(uniform.texture_index, 2);
        assert_relative_eq!(uniform.far, 10.6);
        assert_relative_eq!(uniform.texel_size, 1.0 / 1024.0);
        assert_eq!(uniform.light_pos, [0.0, 2.0, 0.0]);
    }

    #[test]
    fn directional_shadow_uses_the_camera_depth_range() {
        let request = ShadowRequest {
            light_index: 0,
            light: sun(),
            shadow_type: ShadowType::Directional2D,
            texture_index_start: 0,
            cascade_count: 1,
        };
        let uniform = shadow_uniform(&request, (0.5, 40.0), 2048, 1024);
        assert_eq!(uniform.shadow_type, ShadowUniform::TYPE_2D);
        assert_eq!((uniform.near, uniform.far, uniform.cascade_split), (0.5, 40.0, 40.0));
        assert_relative_eq!(uniform.texel_size, 1.0 / 2048.0);
        // The origin sits inside the light volume.
        let clip = Mat4::from_cols_array_2d(&uniform.view_proj).project_point3(Vec3::ZERO);
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn cube_faces_look_along_their_axis() {
        let far = 10.0;
        for (face, (direction, _)) in CUBE_FACES.iter().enumerate() {
            let clip = cube_face_view_proj(Vec3::ZERO, face, far).project_point3(*direction * 5.0);
            assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
            assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
            assert!((0.0..=1.0).contains(&clip.z));
        }
    }

    #[test]
    fn point_light_renders_six_faces_with_their_own_groups() {
        let (device, ctx) = mock_context();
        let mut pass = ShadowPass::new();
        pass.initialize(&ctx).unwrap();
        let (collector, mut cache) = frame(&ctx, &[point_light(10.0)]);
        pass.prepare(&ctx, &mut cache, &collector);
        device.clear_log();

        pass.render(&ctx, &mut cache).unwrap();

        let passes = device.passes();
        assert_eq!(passes.len(), 6);
        let layers: Vec<_> = passes
            .iter()
            .map(|p| p.depth_attachment.unwrap().base_array_layer)
            .collect();
        assert_eq!(layers, (0..6).map(Some).collect::<Vec<_>>());
        let groups: std::collections::HashSet<_> = passes
            .iter()
            .map(|p| p.bind_group_calls()[0])
            .collect();
        assert_eq!(groups.len(), 6);
        assert_eq!(pass.last_stats().drawn, 6);
    }

    #[test]
    fn directional_light_renders_one_layer_and_uploads_uniforms() {
        let (device, ctx) = mock_context();
        let mut pass = ShadowPass::new();
        pass.initialize(&ctx).unwrap();
        let (collector, mut cache) = frame(&ctx, &[sun()]);
        device.clear_log();
        pass.prepare(&ctx, &mut cache, &collector);
        assert_eq!(cache.shadow_uniforms.len(), 1);
        let upload = std::mem::size_of::<ShadowUniform>();
        assert!(device.writes().iter().any(|w| w.data.len() == upload));

        pass.render(&ctx, &mut cache).unwrap();
        let passes = device.passes();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].depth_attachment.unwrap().base_array_layer, Some(0));
        assert!(passes[0].color_attachments.is_empty());
    }

    #[test]
    fn reloaded_shader_is_picked_up_by_the_next_frame() {
        let (device, ctx) = mock_context();
        let mut pass = ShadowPass::new();
        pass.initialize(&ctx).unwrap();
        let pipeline_of = |passes: &[RecordedPass]| {
            passes
                .iter()
                .flat_map(|p| p.commands.iter())
                .find_map(|c| match c {
                    PassCommand::SetPipeline(id) => Some(*id),
                    _ => None,
                })
        };

        let (collector, mut cache) = frame(&ctx, &[sun()]);
        pass.prepare(&ctx, &mut cache, &collector);
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();
        let before = pipeline_of(&device.passes()).unwrap();

        let descriptor = ctx.shaders().builtin_descriptor(names::SHADOW_2D).unwrap();
        ctx.reload_shader(descriptor.build(ctx.device()).unwrap());

        let (collector, mut cache) = frame(&ctx, &[sun()]);
        pass.prepare(&ctx, &mut cache, &collector);
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();
        let after = pipeline_of(&device.passes()).unwrap();

        assert_ne!(before, after);
        assert_eq!(pass.last_stats().drawn, 1);
    }

    #[test]
    fn lights_without_shadows_render_nothing() {
        let (device, ctx) = mock_context();
        let mut pass = ShadowPass::new();
        pass.initialize(&ctx).unwrap();
        let (collector, mut cache) = frame(&ctx, &[Light::default()]);
        pass.prepare(&ctx, &mut cache, &collector);
        device.clear_log();
        pass.render(&ctx, &mut cache).unwrap();
        assert!(device.passes().is_empty());
    }

    #[test]
    fn cleanup_releases_maps_and_groups() {
        let (device, ctx) = mock_context();
        let textures = device.stats().textures_destroyed;
        let mut pass = ShadowPass::new();
        pass.initialize(&ctx).unwrap();
        pass.cleanup(&ctx);
        assert_eq!(pass.state(), PassState::Disposed);
        assert_eq!(device.stats().textures_destroyed, textures + 2);
        assert_eq!(device.live_bind_groups(), 0);
    }
}
