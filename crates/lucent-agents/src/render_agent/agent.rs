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

//! Defines the RenderAgent, the orchestrator of one rendered frame.

use anyhow::Context;
use lucent_core::renderer::{GraphicsDevice, RenderError, RendererConfig};
use lucent_core::ResourceRegistry;
use lucent_data::RenderCollector;
use lucent_lanes::render_lane::{
    CameraView, CompositePass, DebugCollector, DebugPass, DrawStats, FrameCache, FramePass,
    MeshPass, PassState, PostProcessingPass, PrepareStats, RenderTarget, ShadowPass,
    SurfaceTarget,
};
use lucent_lanes::{GpuContext, SweepStats};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What one call to [`RenderAgent::render_frame`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Index of the frame, starting at 1.
    pub frame: u64,
    /// Cameras that got a render target.
    pub cameras: usize,
    /// Item preparation, summed over cameras and shadow views.
    pub prepare: PrepareStats,
    /// Draws of the shadow pass.
    pub shadow: DrawStats,
    /// Draws of the mesh pass.
    pub mesh: DrawStats,
    /// Orphan sweep run at the end of this frame, if one was due.
    pub swept: Option<SweepStats>,
    /// Object bind groups released by that sweep.
    pub evicted_objects: usize,
}

/// The agent responsible for sequencing the render passes.
///
/// A frame always runs extract, prepare, shadow, mesh, debug,
/// post-processing and composite, then clears the frame cache.
pub struct RenderAgent {
    // Device, registry and every GPU-side cache.
    ctx: GpuContext,
    // Per-frame data shared by the passes.
    cache: FrameCache,
    shadow: ShadowPass,
    mesh: MeshPass,
    debug: DebugPass,
    post: PostProcessingPass,
    composite: CompositePass,
    // Offscreen targets, kept across frames while the camera size holds.
    targets: BTreeMap<u64, RenderTarget>,
    // Primitives queued for the next frame.
    debug_primitives: DebugCollector,
    started: Instant,
    last_frame_time: Duration,
    frame_count: u64,
}

impl RenderAgent {
    /// Creates the GPU context. Passes stay uninitialized until
    /// [`initialize`](Self::initialize) runs.
    ///
    /// ## Errors
    /// Any error the device reports while creating samplers or shaders.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        registry: Arc<ResourceRegistry>,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let ctx = GpuContext::new(device, registry, config)?;
        Ok(Self {
            ctx,
            cache: FrameCache::new(),
            shadow: ShadowPass::new(),
            mesh: MeshPass::new(),
            debug: DebugPass::new(),
            post: PostProcessingPass::new(),
            composite: CompositePass::new(),
            targets: BTreeMap::new(),
            debug_primitives: DebugCollector::new(),
            started: Instant::now(),
            last_frame_time: Duration::ZERO,
            frame_count: 0,
        })
    }

    /// Creates and initializes an agent in one step.
    pub fn bootstrap(
        device: Arc<dyn GraphicsDevice>,
        registry: Arc<ResourceRegistry>,
        config: RendererConfig,
    ) -> anyhow::Result<Self> {
        let mut agent =
            Self::new(device, registry, config).context("failed to create the GPU context")?;
        agent
            .initialize()
            .context("failed to initialize the render passes")?;
        Ok(agent)
    }

    /// Initializes every pass in frame order.
    ///
    /// ## Errors
    /// The first pass failure. Passes initialized before it are cleaned up.
    pub fn initialize(&mut self) -> Result<(), RenderError> {
        let ctx = &self.ctx;
        let mut passes = [
            &mut self.shadow as &mut dyn FramePass,
            &mut self.mesh,
            &mut self.debug,
            &mut self.post,
            &mut self.composite,
        ];
        for i in 0..passes.len() {
            if let Err(e) = passes[i].initialize(ctx) {
                log::error!("RenderAgent: {} failed to initialize: {e}", passes[i].name());
                for pass in passes[..i].iter_mut() {
                    pass.cleanup(ctx);
                }
                return Err(e);
            }
        }
        log::info!("RenderAgent: initialized {} passes", passes.len());
        Ok(())
    }

    /// Whether every pass is ready to render.
    pub fn is_initialized(&self) -> bool {
        [
            self.shadow.state(),
            self.mesh.state(),
            self.debug.state(),
            self.post.state(),
            self.composite.state(),
        ]
        .iter()
        .all(|state| *state == PassState::Initialized)
    }

    /// Queues debug primitives for the next frame.
    pub fn debug_primitives_mut(&mut self) -> &mut DebugCollector {
        &mut self.debug_primitives
    }

    /// The GPU context.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// The offscreen target of a camera, if it rendered before.
    pub fn render_target(&self, camera_id: u64) -> Option<&RenderTarget> {
        self.targets.get(&camera_id)
    }

    /// Duration of the last `render_frame` call.
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }

    /// Total number of frames rendered.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Renders `collector` from every camera and composites into `surface`.
    ///
    /// The frame cache is cleared even when a pass fails.
    ///
    /// ## Errors
    /// * `RenderError::NotInitialized` - If [`initialize`](Self::initialize) did not succeed.
    /// * The first error a pass returns.
    pub fn render_frame(
        &mut self,
        collector: &RenderCollector,
        cameras: &[CameraView],
        surface: Option<SurfaceTarget>,
    ) -> Result<FrameReport, RenderError> {
        if !self.is_initialized() {
            log::error!("RenderAgent: render_frame called before initialize");
            return Err(RenderError::NotInitialized);
        }
        let frame_start = Instant::now();
        self.frame_count += 1;
        let mut report = FrameReport {
            frame: self.frame_count,
            ..FrameReport::default()
        };

        self.sync_targets(cameras);
        report.cameras = self.targets.len();

        let result = self.record(collector, surface, &mut report);
        self.cache.clear(&self.ctx);

        let every = self.ctx.config().sweep_orphans_every_n_frames;
        if every > 0 && self.frame_count % u64::from(every) == 0 {
            report.evicted_objects = self.cache.evict_idle_objects(&self.ctx, u64::from(every));
            report.swept = Some(self.ctx.sweep_orphans());
        }

        self.last_frame_time = frame_start.elapsed();
        log::trace!(
            "RenderAgent: frame {} in {:.2}ms",
            self.frame_count,
            self.last_frame_time.as_secs_f32() * 1000.0
        );
        result.map(|()| report)
    }

    fn record(
        &mut self,
        collector: &RenderCollector,
        surface: Option<SurfaceTarget>,
        report: &mut FrameReport,
    ) -> Result<(), RenderError> {
        let ctx = &self.ctx;
        let cache = &mut self.cache;
        cache.time = self.started.elapsed().as_secs_f32();
        cache.extract_lights(ctx, collector);
        for (id, target) in &self.targets {
            cache.render_targets.insert(*id, target.clone());
        }

        for target in self.targets.values() {
            let visible = collector.extract_visible(&target.camera.frustum());
            report.prepare += cache.prepare_gpu_resources(ctx, collector, &visible);
            self.mesh.set_visible(target.camera.id, visible);
        }
        report.prepare += self.shadow.prepare(ctx, cache, collector);

        self.shadow.render(ctx, cache)?;
        report.shadow = self.shadow.last_stats();

        self.mesh.set_shadow_bind_group(self.shadow.shadow_bind_group());
        self.mesh.render(ctx, cache)?;
        report.mesh = self.mesh.last_stats();

        self.debug.set_primitives(&self.debug_primitives);
        self.debug_primitives.clear();
        self.debug.render(ctx, cache)?;

        self.post.render(ctx, cache)?;

        self.composite.set_surface(surface);
        self.composite.render(ctx, cache)
    }

    // Recreates targets whose camera changed size and drops the ones no
    // camera uses anymore. A camera whose target cannot be allocated is
    // left out of the frame.
    fn sync_targets(&mut self, cameras: &[CameraView]) {
        let ctx = &self.ctx;
        self.targets.retain(|id, target| {
            let keep = cameras.iter().any(|camera| camera.id == *id);
            if !keep {
                log::debug!("RenderAgent: camera {id} gone, releasing its target");
                target.release(ctx);
            }
            keep
        });

        for camera in cameras {
            if let Some(target) = self.targets.get_mut(&camera.id) {
                if target.fits(camera) {
                    target.camera = *camera;
                    continue;
                }
            }
            if let Some(stale) = self.targets.remove(&camera.id) {
                stale.release(ctx);
            }
            match RenderTarget::new(ctx, *camera) {
                Ok(target) => {
                    self.targets.insert(camera.id, target);
                }
                Err(e) => log::warn!("RenderAgent: no target for camera {}: {e}", camera.id),
            }
        }
    }

    /// Releases every GPU object owned by the passes, the frame cache, the
    /// render targets and the context. The agent cannot render afterwards.
    pub fn shutdown(&mut self) {
        let ctx = &self.ctx;
        for pass in [
            &mut self.shadow as &mut dyn FramePass,
            &mut self.mesh,
            &mut self.debug,
            &mut self.post,
            &mut self.composite,
        ] {
            pass.cleanup(ctx);
        }
        self.cache.release(ctx);
        for target in std::mem::take(&mut self.targets).into_values() {
            target.release(ctx);
        }
        ctx.release_all();
        log::info!("RenderAgent: shut down after {} frames", self.frame_count);
    }
}
