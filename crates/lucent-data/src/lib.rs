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

//! # Lucent Data
//!
//! CPU-side render resources and the per-frame collection of drawable items.
//!
//! Every asset here is shared as `Arc<T>`, registered in a
//! [`ResourceRegistry`](lucent_core::ResourceRegistry) and mutated through
//! `&self`. Each visible mutation bumps the asset's version so that its GPU
//! mirror knows when to re-upload.

#![warn(missing_docs)]

pub mod assets;
pub mod scene;

pub use assets::{
    AssetError, Material, MaterialFeatures, MaterialProperties, MaterialUniforms, Mesh, Model,
    Submesh, Texture, Vertex,
};
pub use scene::{LightExtraction, RenderCollector, RenderItem, ShadowRequest, ShadowType};
