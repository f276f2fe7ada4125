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

//! The `wgpu` graphics device.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lucent_core::math::{Extent3D, Origin3D};
use lucent_core::renderer::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutDescriptor, BindGroupLayoutId,
    BindingResource, BufferDescriptor, BufferId, CommandBufferId, CommandEncoder, GraphicsDevice,
    PipelineError, PipelineLayoutDescriptor, PipelineLayoutId, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, SamplerDescriptor, SamplerId, ShaderError,
    ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData, TextureDescriptor, TextureFormat,
    TextureId, TextureViewDescriptor, TextureViewId,
};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::{from_wgpu_texture_format, IntoWgpu};

#[derive(Debug)]
struct WgpuTextureEntry {
    wgpu_texture: Arc<wgpu::Texture>,
}

#[derive(Debug)]
struct WgpuTextureViewEntry {
    wgpu_view: Arc<wgpu::TextureView>,
    // `None` for views registered from outside, such as swapchain images.
    texture: Option<Arc<wgpu::Texture>>,
}

/// The internal, non-clonable state of the [`WgpuDevice`].
#[derive(Debug)]
struct WgpuDeviceInternal {
    context: Mutex<WgpuGraphicsContext>,
    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    bind_group_layouts: Mutex<HashMap<BindGroupLayoutId, Arc<wgpu::BindGroupLayout>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    pipeline_layouts: Mutex<HashMap<PipelineLayoutId, Arc<wgpu::PipelineLayout>>>,
    pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    buffers: Mutex<HashMap<BufferId, Arc<wgpu::Buffer>>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    texture_views: Mutex<HashMap<TextureViewId, WgpuTextureViewEntry>>,
    // Single-layer views created on demand for layered attachments.
    layer_views: Mutex<HashMap<(TextureViewId, u32), Arc<wgpu::TextureView>>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,

    /// Every id kind draws from this one counter.
    next_id: AtomicUsize,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, wgpu::CommandBuffer>>,
}

/// A clonable, thread-safe handle to the `wgpu` graphics device.
///
/// Every resource lives in an id-keyed map. Command encoders hold a clone of
/// the handle to resolve ids while recording.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

impl WgpuDevice {
    /// Wraps a context.
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context: Mutex::new(context),
                shader_modules: Mutex::new(HashMap::new()),
                bind_group_layouts: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                pipeline_layouts: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                layer_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
                pending_command_buffers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a headless context and wraps it.
    ///
    /// ## Errors
    /// See [`WgpuGraphicsContext::new_headless`].
    pub fn new_headless() -> anyhow::Result<Self> {
        Ok(Self::new(WgpuGraphicsContext::new_headless()?))
    }

    fn next_id(&self) -> usize {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Runs `operation` with the `wgpu::Device` locked.
    fn with_wgpu_device<F, R>(&self, operation: F) -> R
    where
        F: FnOnce(&wgpu::Device) -> R,
    {
        let context = self.internal.context.lock();
        operation(&context.device)
    }

    /// Registers the format of the surface the renderer presents into.
    pub fn set_surface_format(&self, format: Option<wgpu::TextureFormat>) {
        self.internal.context.lock().set_surface_format(format);
    }

    /// Registers a view created outside the device, such as the current
    /// swapchain image, and returns its id.
    pub fn register_external_view(&self, view: wgpu::TextureView) -> TextureViewId {
        let id = TextureViewId(self.next_id());
        self.internal.texture_views.lock().insert(
            id,
            WgpuTextureViewEntry {
                wgpu_view: Arc::new(view),
                texture: None,
            },
        );
        id
    }

    /// Blocks until the queue is idle.
    pub fn poll_device_blocking(&self) {
        let context = self.internal.context.lock();
        if let Err(e) = context.device.poll(wgpu::PollType::Wait) {
            log::warn!("Failed to poll device: {e:?}");
        }
    }

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        self.internal.pipelines.lock().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        self.internal.bind_groups.lock().get(&id).cloned()
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        self.internal.buffers.lock().get(&id).cloned()
    }

    /// The view to attach for `id`. With a layer, a single-layer 2D view of
    /// the underlying texture is created once and reused.
    pub(crate) fn get_attachment_view(
        &self,
        id: TextureViewId,
        layer: Option<u32>,
    ) -> Option<Arc<wgpu::TextureView>> {
        let views = self.internal.texture_views.lock();
        let entry = views.get(&id)?;
        let Some(layer) = layer else {
            return Some(entry.wgpu_view.clone());
        };
        let mut layer_views = self.internal.layer_views.lock();
        if let Some(view) = layer_views.get(&(id, layer)) {
            return Some(view.clone());
        }
        let texture = entry.texture.as_ref()?;
        let view = Arc::new(texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("layer attachment"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_array_layer: layer,
            array_layer_count: Some(1),
            ..Default::default()
        }));
        layer_views.insert((id, layer), view.clone());
        Some(view)
    }

    pub(crate) fn register_command_buffer(&self, buffer: wgpu::CommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(self.next_id());
        self.internal.pending_command_buffers.lock().insert(id, buffer);
        id
    }
}

fn not_found<T>(what: &str, id: impl std::fmt::Debug) -> Result<T, ResourceError> {
    log::warn!("WgpuDevice: {what} {id:?} not found");
    Err(ResourceError::NotFound)
}

impl GraphicsDevice for WgpuDevice {
    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let source = match &descriptor.source {
            ShaderSourceData::Wgsl(code) => wgpu::ShaderSource::Wgsl(code.clone()),
        };
        let label = descriptor.label;

        let module = self.with_wgpu_device(|device| {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor { label, source });
            match pollster::block_on(device.pop_error_scope()) {
                Some(error) => Err(ShaderError::CompilationError {
                    label: label.unwrap_or_default().to_owned(),
                    details: error.to_string(),
                }),
                None => Ok(module),
            }
        })?;

        let id = ShaderModuleId(self.next_id());
        self.internal.shader_modules.lock().insert(id, Arc::new(module));
        log::debug!("WgpuDevice: Created shader module '{}' with ID: {id:?}", label.unwrap_or_default());
        Ok(id)
    }

    // --- Bind Group Operations ---

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into_wgpu(),
                ty: entry.ty.into_wgpu(),
                count: None,
            })
            .collect();
        let layout = self.with_wgpu_device(|device| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label,
                entries: &entries,
            })
        });
        let id = BindGroupLayoutId(self.next_id());
        self.internal.bind_group_layouts.lock().insert(id, Arc::new(layout));
        Ok(id)
    }

    fn create_bind_group(&self, descriptor: &BindGroupDescriptor) -> Result<BindGroupId, ResourceError> {
        enum Resolved {
            Buffer(Arc<wgpu::Buffer>, u64, Option<u64>),
            View(Arc<wgpu::TextureView>),
            Sampler(Arc<wgpu::Sampler>),
        }

        let Some(layout) = self.internal.bind_group_layouts.lock().get(&descriptor.layout).cloned()
        else {
            return not_found("bind group layout", descriptor.layout);
        };

        let mut resolved = Vec::with_capacity(descriptor.entries.len());
        for entry in descriptor.entries {
            let resource = match entry.resource {
                BindingResource::Buffer(binding) => match self.get_wgpu_buffer(binding.buffer) {
                    Some(buffer) => Resolved::Buffer(buffer, binding.offset, binding.size),
                    None => return not_found("buffer", binding.buffer),
                },
                BindingResource::TextureView(view) => {
                    match self.internal.texture_views.lock().get(&view) {
                        Some(entry) => Resolved::View(entry.wgpu_view.clone()),
                        None => return not_found("texture view", view),
                    }
                }
                BindingResource::Sampler(sampler) => {
                    match self.internal.samplers.lock().get(&sampler) {
                        Some(sampler) => Resolved::Sampler(sampler.clone()),
                        None => return not_found("sampler", sampler),
                    }
                }
            };
            resolved.push((entry.binding, resource));
        }

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    Resolved::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer,
                            offset: *offset,
                            size: size.and_then(NonZeroU64::new),
                        })
                    }
                    Resolved::View(view) => wgpu::BindingResource::TextureView(view),
                    Resolved::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
                },
            })
            .collect();

        let group = self.with_wgpu_device(|device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: descriptor.label,
                layout: &layout,
                entries: &entries,
            })
        });
        let id = BindGroupId(self.next_id());
        self.internal.bind_groups.lock().insert(id, Arc::new(group));
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        match self.internal.bind_groups.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    // -- Render Pipeline Operations ---

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let mut layouts = Vec::with_capacity(descriptor.bind_group_layouts.len());
        {
            let known = self.internal.bind_group_layouts.lock();
            for id in descriptor.bind_group_layouts {
                match known.get(id) {
                    Some(layout) => layouts.push(layout.clone()),
                    None => {
                        return Err(PipelineError::LayoutCreationFailed(format!(
                            "unknown bind group layout {id:?}"
                        ))
                        .into())
                    }
                }
            }
        }
        let refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().map(|l| l.as_ref()).collect();
        let layout = self.with_wgpu_device(|device| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: descriptor.label,
                bind_group_layouts: &refs,
                push_constant_ranges: &[],
            })
        });
        let id = PipelineLayoutId(self.next_id());
        self.internal.pipeline_layouts.lock().insert(id, Arc::new(layout));
        Ok(id)
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let label = descriptor.label.as_deref();
        let failure = |details: String| -> ResourceError {
            PipelineError::CompilationFailed {
                label: label.map(str::to_owned),
                details,
            }
            .into()
        };

        // 1. Resolve the layout and shader modules
        let layout = self
            .internal
            .pipeline_layouts
            .lock()
            .get(&descriptor.layout)
            .cloned()
            .ok_or_else(|| failure(format!("unknown pipeline layout {:?}", descriptor.layout)))?;
        let (vertex_module, fragment_module) = {
            let modules = self.internal.shader_modules.lock();
            let vertex = modules
                .get(&descriptor.vertex_shader)
                .cloned()
                .ok_or(ShaderError::NotFound {
                    id: descriptor.vertex_shader,
                })?;
            let fragment = match descriptor.fragment_shader {
                Some(id) => Some(modules.get(&id).cloned().ok_or(ShaderError::NotFound { id })?),
                None => None,
            };
            (vertex, fragment)
        };

        // 2. Convert vertex buffers layout
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_buffers
            .iter()
            .map(|layout| {
                layout
                    .attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: attr.format.into_wgpu(),
                        offset: attr.offset,
                        shader_location: attr.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_buffers
            .iter()
            .zip(&attributes)
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: layout.step_mode.into_wgpu(),
                attributes,
            })
            .collect();

        // 3. Convert depth and color states
        let depth_stencil = descriptor.depth_stencil.map(|ds| wgpu::DepthStencilState {
            format: ds.format.into_wgpu(),
            depth_write_enabled: ds.depth_write_enabled,
            depth_compare: ds.depth_compare.into_wgpu(),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: ds.depth_bias,
                slope_scale: ds.depth_bias_slope_scale,
                clamp: 0.0,
            },
        });
        let color_targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_targets
            .iter()
            .map(|target| {
                Some(wgpu::ColorTargetState {
                    format: target.format.into_wgpu(),
                    blend: target.blend.into_wgpu(),
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let fragment_entry = match (&fragment_module, &descriptor.fragment_entry) {
            (Some(_), None) => {
                return Err(failure("fragment shader without entry point".to_owned()))
            }
            (_, entry) => entry.as_deref(),
        };

        // 4. Create the pipeline inside an error scope
        let pipeline = self.with_wgpu_device(|device| {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label,
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(descriptor.vertex_entry.as_ref()),
                    compilation_options: Default::default(),
                    buffers: &vertex_buffers,
                },
                primitive: wgpu::PrimitiveState {
                    topology: descriptor.topology.into_wgpu(),
                    strip_index_format: None,
                    front_face: descriptor.front_face.into_wgpu(),
                    cull_mode: descriptor.cull_mode.into_wgpu(),
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                fragment: fragment_module.as_ref().map(|module| wgpu::FragmentState {
                    module,
                    entry_point: fragment_entry,
                    compilation_options: Default::default(),
                    targets: &color_targets,
                }),
                multiview: None,
                cache: None,
            });
            match pollster::block_on(device.pop_error_scope()) {
                Some(error) => Err(failure(error.to_string())),
                None => Ok(pipeline),
            }
        })?;

        let id = RenderPipelineId(self.next_id());
        self.internal.pipelines.lock().insert(id, Arc::new(pipeline));
        log::debug!("WgpuDevice: Created render pipeline '{}' with ID: {id:?}", label.unwrap_or_default());
        Ok(id)
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let buffer = self.with_wgpu_device(|device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size,
                usage: descriptor.usage.into_wgpu(),
                mapped_at_creation: descriptor.mapped_at_creation,
            })
        });
        let id = BufferId(self.next_id());
        self.internal.buffers.lock().insert(id, Arc::new(buffer));
        log::trace!(
            "WgpuDevice: Created buffer '{}' with ID: {id:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        use wgpu::util::DeviceExt;

        let buffer = self.with_wgpu_device(|device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu(),
            })
        });
        let id = BufferId(self.next_id());
        self.internal.buffers.lock().insert(id, Arc::new(buffer));
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffer = self.get_wgpu_buffer(id).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > buffer.size() {
            return Err(ResourceError::OutOfBounds);
        }
        self.internal.context.lock().queue.write_buffer(&buffer, offset, data);
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        match self.internal.buffers.lock().remove(&id) {
            Some(buffer) => {
                buffer.destroy();
                Ok(())
            }
            None => Err(ResourceError::NotFound),
        }
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let texture = self.with_wgpu_device(|device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: descriptor.sample_count,
                dimension: descriptor.dimension.into_wgpu(),
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            })
        });
        let id = TextureId(self.next_id());
        self.internal.textures.lock().insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(texture),
            },
        );
        log::debug!(
            "WgpuDevice: Created texture '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        origin: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let texture = match self.internal.textures.lock().get(&texture_id) {
            Some(entry) => entry.wgpu_texture.clone(),
            None => return Err(ResourceError::NotFound),
        };
        self.internal.context.lock().queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: origin.into_wgpu(),
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row,
                rows_per_image: Some(size.height),
            },
            size.into_wgpu(),
        );
        Ok(())
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        match self.internal.textures.lock().remove(&id) {
            Some(entry) => {
                entry.wgpu_texture.destroy();
                Ok(())
            }
            None => Err(ResourceError::NotFound),
        }
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let texture = match self.internal.textures.lock().get(&texture_id) {
            Some(entry) => entry.wgpu_texture.clone(),
            None => return Err(ResourceError::NotFound),
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            format: descriptor.format.map(IntoWgpu::into_wgpu),
            dimension: descriptor.dimension.map(IntoWgpu::into_wgpu),
            base_mip_level: descriptor.base_mip_level,
            mip_level_count: descriptor.mip_level_count,
            base_array_layer: descriptor.base_array_layer,
            array_layer_count: descriptor.array_layer_count,
            ..Default::default()
        });
        let id = TextureViewId(self.next_id());
        self.internal.texture_views.lock().insert(
            id,
            WgpuTextureViewEntry {
                wgpu_view: Arc::new(view),
                texture: Some(texture),
            },
        );
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.internal.layer_views.lock().retain(|(view, _), _| *view != id);
        match self.internal.texture_views.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::NotFound),
        }
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let sampler = self.with_wgpu_device(|device| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: descriptor.label.as_deref(),
                address_mode_u: descriptor.address_mode_u.into_wgpu(),
                address_mode_v: descriptor.address_mode_v.into_wgpu(),
                address_mode_w: descriptor.address_mode_w.into_wgpu(),
                mag_filter: descriptor.mag_filter.into_wgpu(),
                min_filter: descriptor.min_filter.into_wgpu(),
                mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
                compare: descriptor.compare.map(IntoWgpu::into_wgpu),
                ..Default::default()
            })
        });
        let id = SamplerId(self.next_id());
        self.internal.samplers.lock().insert(id, Arc::new(sampler));
        Ok(id)
    }

    // --- Commands ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let encoder = self.with_wgpu_device(|device| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
        });
        Box::new(WgpuCommandEncoder {
            encoder,
            device: self.clone(),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        let buffer = self.internal.pending_command_buffers.lock().remove(&command_buffer);
        match buffer {
            Some(buffer) => {
                self.internal.context.lock().queue.submit(std::iter::once(buffer));
            }
            None => log::error!(
                "Attempted to submit a CommandBufferId ({command_buffer:?}) that does not exist."
            ),
        }
    }

    fn get_surface_format(&self) -> Option<TextureFormat> {
        self.internal
            .context
            .lock()
            .surface_format()
            .map(from_wgpu_texture_format)
    }
}
