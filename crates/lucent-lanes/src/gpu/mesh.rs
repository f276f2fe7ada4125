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

//! GPU mirror of a [`Mesh`]: one interleaved vertex buffer and an optional
//! `u32` index buffer.

use super::sync::{GpuSyncable, SyncState};
use crate::context::GpuContext;
use lucent_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, IndexFormat, PrimitiveTopology,
    RenderPassEncoder, ResourceError,
};
use lucent_core::{Identifiable, Versioned};
use lucent_data::{Mesh, Submesh};
use parking_lot::RwLock;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy)]
struct DeviceBuffer {
    id: BufferId,
    capacity: u64,
}

#[derive(Debug)]
struct MeshBuffers {
    vertices: DeviceBuffer,
    indices: Option<DeviceBuffer>,
    vertex_count: u32,
    index_count: u32,
    topology: PrimitiveTopology,
}

/// Buffers are never zero-sized and writes stay 4-byte aligned.
fn buffer_capacity(len: usize) -> u64 {
    ((len as u64).max(4) + 3) & !3
}

fn create_buffer(
    device: &dyn GraphicsDevice,
    label: &str,
    usage: BufferUsage,
    data: &[u8],
) -> Result<DeviceBuffer, ResourceError> {
    let capacity = buffer_capacity(data.len());
    let id = device.create_buffer(&BufferDescriptor {
        label: Some(Cow::Borrowed(label)),
        size: capacity,
        usage: usage | BufferUsage::COPY_DST,
        mapped_at_creation: false,
    })?;
    if !data.is_empty() {
        if let Err(e) = device.write_buffer(id, 0, data) {
            let _ = device.destroy_buffer(id);
            return Err(e);
        }
    }
    Ok(DeviceBuffer { id, capacity })
}

/// Writes in place when the data fits, otherwise replaces the buffer.
fn upload(
    device: &dyn GraphicsDevice,
    label: &str,
    usage: BufferUsage,
    target: &mut DeviceBuffer,
    data: &[u8],
) -> Result<(), ResourceError> {
    if data.len() as u64 <= target.capacity {
        if !data.is_empty() {
            device.write_buffer(target.id, 0, data)?;
        }
        return Ok(());
    }
    let replacement = create_buffer(device, label, usage, data)?;
    let old = std::mem::replace(target, replacement);
    if let Err(e) = device.destroy_buffer(old.id) {
        log::warn!("GpuMesh: failed to destroy {:?} of '{label}': {e}", old.id);
    }
    Ok(())
}

/// Vertex and index buffers of one mesh, shared by every model using it.
#[derive(Debug)]
pub struct GpuMesh {
    state: SyncState<Mesh>,
    label: String,
    buffers: RwLock<MeshBuffers>,
}

impl GpuMesh {
    /// Uploads `mesh` into new buffers.
    pub fn from_cpu(ctx: &GpuContext, mesh: &Mesh) -> Result<Self, ResourceError> {
        let version = mesh.version();
        let label = mesh.name().unwrap_or_else(|| format!("mesh#{}", mesh.id()));
        let vertices = mesh.interleaved_vertices();
        let data = mesh.data();
        let vertex_buffer = create_buffer(
            ctx.device(),
            &label,
            BufferUsage::VERTEX,
            bytemuck::cast_slice(&vertices),
        )?;
        let index_buffer = match &data.indices {
            Some(indices) => Some(
                create_buffer(
                    ctx.device(),
                    &label,
                    BufferUsage::INDEX,
                    bytemuck::cast_slice(indices),
                )
                .inspect_err(|_| {
                    let _ = ctx.device().destroy_buffer(vertex_buffer.id);
                })?,
            ),
            None => None,
        };
        Ok(Self {
            state: SyncState::new(mesh.handle(), version),
            buffers: RwLock::new(MeshBuffers {
                vertices: vertex_buffer,
                indices: index_buffer,
                vertex_count: vertices.len() as u32,
                index_count: data.indices.as_ref().map_or(0, |i| i.len() as u32),
                topology: data.topology,
            }),
            label,
        })
    }

    /// Binds the vertex buffer at slot 0 and the index buffer, if any.
    pub fn bind_buffers(&self, pass: &mut dyn RenderPassEncoder) {
        let buffers = self.buffers.read();
        pass.set_vertex_buffer(0, buffers.vertices.id, 0);
        if let Some(indices) = buffers.indices {
            pass.set_index_buffer(indices.id, 0, IndexFormat::Uint32);
        }
    }

    /// Records the draw of one submesh. Non-indexed meshes draw every vertex.
    pub fn draw_submesh(&self, pass: &mut dyn RenderPassEncoder, submesh: &Submesh) {
        let buffers = self.buffers.read();
        if buffers.indices.is_some() {
            let start = submesh.index_offset.min(buffers.index_count);
            let end = submesh
                .index_offset
                .saturating_add(submesh.index_count)
                .min(buffers.index_count);
            pass.draw_indexed(start..end, 0, 0..1);
        } else {
            pass.draw(0..buffers.vertex_count, 0..1);
        }
    }

    /// Returns `true` if the mesh has an index buffer.
    pub fn is_indexed(&self) -> bool {
        self.buffers.read().indices.is_some()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.buffers.read().vertex_count
    }

    /// Number of indices, `0` when not indexed.
    pub fn index_count(&self) -> u32 {
        self.buffers.read().index_count
    }

    /// Primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.buffers.read().topology
    }

    /// The vertex buffer.
    pub fn vertex_buffer(&self) -> BufferId {
        self.buffers.read().vertices.id
    }
}

impl GpuSyncable for GpuMesh {
    type Cpu = Mesh;

    fn sync_state(&self) -> &SyncState<Mesh> {
        &self.state
    }

    fn sync_from_cpu(&self, cpu: &Mesh, ctx: &GpuContext) -> Result<(), ResourceError> {
        let vertices = cpu.interleaved_vertices();
        let data = cpu.data();
        let mut buffers = self.buffers.write();
        upload(
            ctx.device(),
            &self.label,
            BufferUsage::VERTEX,
            &mut buffers.vertices,
            bytemuck::cast_slice(&vertices),
        )?;
        match (&data.indices, buffers.indices.as_mut()) {
            (Some(indices), Some(target)) => upload(
                ctx.device(),
                &self.label,
                BufferUsage::INDEX,
                target,
                bytemuck::cast_slice(indices),
            )?,
            (Some(indices), None) => {
                buffers.indices = Some(create_buffer(
                    ctx.device(),
                    &self.label,
                    BufferUsage::INDEX,
                    bytemuck::cast_slice(indices),
                )?);
            }
            (None, Some(_)) => {
                if let Some(old) = buffers.indices.take() {
                    let _ = ctx.device().destroy_buffer(old.id);
                }
            }
            (None, None) => {}
        }
        buffers.vertex_count = vertices.len() as u32;
        buffers.index_count = data.indices.as_ref().map_or(0, |i| i.len() as u32);
        buffers.topology = data.topology;
        Ok(())
    }

    fn release(&self, ctx: &GpuContext) {
        let buffers = self.buffers.read();
        let ids = std::iter::once(buffers.vertices.id).chain(buffers.indices.map(|b| b.id));
        for id in ids {
            if let Err(e) = ctx.device().destroy_buffer(id) {
                log::warn!("GpuMesh: failed to destroy {id:?} of '{}': {e}", self.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_context, PassCommand};
    use lucent_core::math::Vec3;
    use lucent_core::Handle;
    use std::sync::Arc;

    fn triangle() -> Mesh {
        let mesh = Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        mesh.set_indices(Some(vec![0, 1, 2])).unwrap();
        mesh
    }

    #[test]
    fn growing_mesh_replaces_only_the_vertex_buffer() {
        let (device, ctx) = mock_context();
        let cpu = Arc::new(triangle());
        ctx.registry().add(cpu.clone());
        let gpu = GpuMesh::from_cpu(&ctx, &cpu).unwrap();
        let first = gpu.vertex_buffer();
        assert_eq!(device.stats().buffers_created, 2);

        cpu.set_positions(vec![Vec3::ZERO, Vec3::Y, Vec3::Z]);
        gpu.sync_if_needed(&ctx).unwrap();
        assert_eq!(gpu.vertex_buffer(), first);

        cpu.set_positions(vec![Vec3::ZERO; 6]);
        gpu.sync_if_needed(&ctx).unwrap();
        assert_ne!(gpu.vertex_buffer(), first);
        assert_eq!(gpu.vertex_count(), 6);
        assert_eq!(device.stats().buffers_destroyed, 1);
    }

    #[test]
    fn submesh_draw_uses_its_index_range() {
        let (device, ctx) = mock_context();
        let gpu = GpuMesh::from_cpu(&ctx, &triangle()).unwrap();
        let mut pass = device.begin_test_pass();
        gpu.bind_buffers(pass.as_mut());
        gpu.draw_submesh(
            pass.as_mut(),
            &Submesh {
                index_offset: 1,
                index_count: 2,
                material: Handle::NULL,
            },
        );
        drop(pass);

        let commands = &device.passes()[0].commands;
        assert!(matches!(commands[1], PassCommand::SetIndexBuffer(_, IndexFormat::Uint32)));
        assert_eq!(
            commands[2],
            PassCommand::DrawIndexed {
                indices: 1..3,
                base_vertex: 0,
                instances: 0..1
            }
        );
    }

    #[test]
    fn open_ended_submesh_is_clamped_to_the_index_buffer() {
        let (device, ctx) = mock_context();
        let gpu = GpuMesh::from_cpu(&ctx, &triangle()).unwrap();
        let mut pass = device.begin_test_pass();
        gpu.draw_submesh(
            pass.as_mut(),
            &Submesh {
                index_offset: 1,
                index_count: u32::MAX,
                material: Handle::NULL,
            },
        );
        drop(pass);

        assert_eq!(
            device.passes()[0].commands[0],
            PassCommand::DrawIndexed {
                indices: 1..3,
                base_vertex: 0,
                instances: 0..1
            }
        );
    }
}
