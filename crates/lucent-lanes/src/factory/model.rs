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

//! Creates [`GpuModel`]s.

use super::{FactoryCache, FactoryError, GpuFactory};
use crate::context::GpuContext;
use crate::gpu::GpuModel;
use lucent_data::Model;

/// Factory of [`GpuModel`]. Meshes are fetched from the mesh factory.
#[derive(Default)]
pub struct ModelFactory {
    cache: FactoryCache<Model, GpuModel>,
}

impl GpuFactory for ModelFactory {
    type Source = Model;
    type Product = GpuModel;
    const KIND: &'static str = "Model";

    fn cache(&self) -> &FactoryCache<Model, GpuModel> {
        &self.cache
    }

    fn create_product(&self, ctx: &GpuContext, source: &Model) -> Result<GpuModel, FactoryError> {
        GpuModel::from_cpu(ctx, source)
    }
}
