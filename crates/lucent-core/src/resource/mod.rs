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

//! Resource identity and storage.
//!
//! Every CPU-side resource (texture, mesh, material, model) carries an
//! [`Identity`] (unique id plus optional name) and a [`Version`] that is bumped
//! on every visible mutation. A [`Handle`] is the non-owning reference used
//! everywhere else; it is resolved through a [`ResourceManager`], usually via
//! the [`ResourceRegistry`] that owns one manager per resource type.

mod handle;
mod identity;
mod manager;
mod registry;
mod version;

pub use handle::Handle;
pub use identity::{Identifiable, Identity};
pub use manager::ResourceManager;
pub use registry::ResourceRegistry;
pub use version::{Version, Versioned};

/// Marker for types that can be stored in a [`ResourceManager`] and mirrored
/// on the GPU.
pub trait Resource: Identifiable + Versioned + Send + Sync + 'static {}

impl<T> Resource for T where T: Identifiable + Versioned + Send + Sync + 'static {}
