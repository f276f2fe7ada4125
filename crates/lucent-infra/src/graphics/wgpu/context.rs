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

//! Holds the adapter, device and queue.

use anyhow::{anyhow, Result};

/// The core `wgpu` state objects.
///
/// A headless context renders into offscreen textures only. A presentation
/// surface owned by the caller can still be registered on the
/// [`WgpuDevice`](super::WgpuDevice) through
/// [`set_surface_format`](Self::set_surface_format) and
/// `register_external_view`.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    /// The selected adapter.
    pub adapter: wgpu::Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The command queue.
    pub queue: wgpu::Queue,

    // Format of the presentation surface, if there is one.
    surface_format: Option<wgpu::TextureFormat>,

    /// Name reported by the adapter.
    pub adapter_name: String,
    /// Backend the adapter runs on.
    pub adapter_backend: wgpu::Backend,
    /// Features enabled on the device.
    pub active_device_features: wgpu::Features,
}

impl WgpuGraphicsContext {
    /// Picks an adapter and creates a device with no presentation surface.
    ///
    /// ## Errors
    /// If no adapter is available or the device cannot be created.
    pub fn new_headless() -> Result<Self> {
        pollster::block_on(Self::new_headless_async())
    }

    async fn new_headless_async() -> Result<Self> {
        log::info!("Initializing headless WGPU graphics context...");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("Failed to find a graphics adapter: {e}"))?;
        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Lucent Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {e}"))?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));
        let active_device_features = device.features();
        log::debug!("Active device features: {active_device_features:?}");

        Ok(Self {
            adapter,
            device,
            queue,
            surface_format: None,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            active_device_features,
        })
    }

    /// The presentation surface format, if a surface was registered.
    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.surface_format
    }

    /// Registers the format of the surface the composite pass presents into.
    pub fn set_surface_format(&mut self, format: Option<wgpu::TextureFormat>) {
        self.surface_format = format;
    }
}
