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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" for all rendering operations:
//! the abstract `traits` (like [`GraphicsDevice`]), descriptors (like
//! [`BufferDescriptor`]), error types, and the data layouts shared between
//! the CPU and the shaders. A concrete backend in `lucent-infra` implements
//! the traits; `lucent-lanes` and `lucent-agents` only ever talk to them.

pub mod api;
pub mod error;
pub mod light;
pub mod settings;
pub mod traits;
pub mod uniforms;

pub use self::api::*;
pub use self::error::{PipelineError, RenderError, ResourceError, ShaderError};
pub use self::light::{
    AmbientLight, DirectionalLight, Light, LightKind, LightType, PointLight, SpotLight,
};
pub use self::settings::RendererConfig;
pub use self::traits::{CommandEncoder, GraphicsDevice, RenderPassEncoder};
pub use self::uniforms::{
    FrameUniforms, LightStruct, LightsHeader, ObjectUniforms, ShadowPass2DUniforms,
    ShadowPassCubeUniforms, ShadowUniform,
};
