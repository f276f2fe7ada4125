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

//! Shader metadata: bind group layouts, their reuse policy and the registry
//! of compiled shaders.

mod builtin;
mod descriptor;
mod info;
mod registry;

pub use builtin::*;
pub use descriptor::ShaderDescriptor;
pub use info::{
    BindGroupLayoutInfo, BindGroupReuse, BindGroupType, BindingInfo, BindingKind, ShaderInfo,
};
pub use registry::{globals, light_buffer_size, names, shadow_buffer_size, ShaderRegistry};
