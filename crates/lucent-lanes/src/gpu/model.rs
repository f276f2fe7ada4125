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

//! GPU view of a [`Model`]: the shared GPU mesh plus the submesh table.

use super::mesh::GpuMesh;
use super::sync::{GpuSyncable, SyncState};
use crate::context::GpuContext;
use crate::factory::{FactoryError, GpuFactory};
use lucent_core::renderer::ResourceError;
use lucent_core::{Handle, Identifiable, Versioned};
use lucent_data::{Mesh, Model, Submesh};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
struct ModelParts {
    mesh_handle: Handle<Mesh>,
    mesh: Arc<GpuMesh>,
    submeshes: Vec<Submesh>,
}

/// A model on the GPU. The mesh comes from the mesh factory, so models that
/// share a mesh share its buffers.
#[derive(Debug)]
pub struct GpuModel {
    state: SyncState<Model>,
    parts: RwLock<ModelParts>,
}

impl GpuModel {
    /// Resolves the model's mesh through the mesh factory.
    pub fn from_cpu(ctx: &GpuContext, model: &Model) -> Result<Self, FactoryError> {
        let version = model.version();
        let mesh_handle = model.mesh();
        let mesh = ctx.meshes().create_from_handle(ctx, mesh_handle)?;
        Ok(Self {
            state: SyncState::new(model.handle(), version),
            parts: RwLock::new(ModelParts {
                mesh_handle,
                mesh,
                submeshes: model.submeshes(),
            }),
        })
    }

    /// The GPU mesh.
    pub fn mesh(&self) -> Arc<GpuMesh> {
        self.parts.read().mesh.clone()
    }

    /// The submesh table as of the last sync.
    pub fn submeshes(&self) -> Vec<Submesh> {
        self.parts.read().submeshes.clone()
    }
}

impl GpuSyncable for GpuModel {
    type Cpu = Model;

    fn sync_state(&self) -> &SyncState<Model> {
        &self.state
    }

    fn sync_from_cpu(&self, cpu: &Model, ctx: &GpuContext) -> Result<(), ResourceError> {
        let mesh_handle = cpu.mesh();
        let mut parts = self.parts.write();
        if parts.mesh_handle != mesh_handle {
            parts.mesh = ctx
                .meshes()
                .create_from_handle(ctx, mesh_handle)
                .map_err(|e| {
                    log::warn!("GpuModel: mesh {mesh_handle:?} unavailable: {e}");
                    ResourceError::NotFound
                })?;
            parts.mesh_handle = mesh_handle;
        }
        parts.submeshes = cpu.submeshes();
        Ok(())
    }

    /// The mesh belongs to the mesh factory and is released by it.
    fn release(&self, _ctx: &GpuContext) {}
}
