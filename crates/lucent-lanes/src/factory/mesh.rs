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

//! Creates [`GpuMesh`]es.

use super::{FactoryCache, FactoryError, GpuFactory};
use crate::context::GpuContext;
use crate::gpu::GpuMesh;
use lucent_data::Mesh;

/// Factory of [`GpuMesh`].
#[derive(Default)]
pub struct MeshFactory {
    cache: FactoryCache<Mesh, GpuMesh>,
}

impl GpuFactory for MeshFactory {
    type Source = Mesh;
    type Product = GpuMesh;
    const KIND: &'static str = "Mesh";

    fn cache(&self) -> &FactoryCache<Mesh, GpuMesh> {
        &self.cache
    }

    fn create_product(&self, ctx: &GpuContext, source: &Mesh) -> Result<GpuMesh, FactoryError> {
        Ok(GpuMesh::from_cpu(ctx, source)?)
    }
}
