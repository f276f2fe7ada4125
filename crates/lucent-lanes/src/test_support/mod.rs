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

//! Shared test fixtures.

mod mock_device;

pub use mock_device::*;

use crate::context::GpuContext;
use lucent_core::renderer::RendererConfig;
use lucent_core::ResourceRegistry;
use std::sync::Arc;

/// A context over a fresh recording device and an empty registry.
pub fn mock_context() -> (MockGraphicsDevice, GpuContext) {
    mock_context_with(RendererConfig::default())
}

/// Same as [`mock_context`] with a custom configuration.
pub fn mock_context_with(config: RendererConfig) -> (MockGraphicsDevice, GpuContext) {
    let device = MockGraphicsDevice::new();
    let ctx = GpuContext::new(
        Arc::new(device.clone()),
        Arc::new(ResourceRegistry::new()),
        config,
    )
    .expect("mock context");
    (device, ctx)
}
