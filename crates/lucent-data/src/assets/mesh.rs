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

//! CPU-side mesh geometry.

use super::AssetError;
use bytemuck::{Pod, Zeroable};
use lucent_core::math::{Aabb, Vec2, Vec3, Vec4};
use lucent_core::renderer::{
    PrimitiveTopology, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode,
};
use lucent_core::{Identifiable, Identity, Version, Versioned};
use parking_lot::{RwLock, RwLockReadGuard};

/// The interleaved vertex format uploaded to vertex buffers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position.
    pub position: [f32; 3],
    /// Normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Tangent, `w` holds the bitangent sign.
    pub tangent: [f32; 4],
}

impl Vertex {
    /// The matching vertex buffer layout, locations 0 through 3.
    pub fn buffer_layout() -> VertexBufferLayout {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: VertexStepMode::Vertex,
            attributes: vec![
                VertexAttribute {
                    format: VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                VertexAttribute {
                    format: VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1,
                },
                VertexAttribute {
                    format: VertexFormat::Float32x2,
                    offset: 24,
                    shader_location: 2,
                },
                VertexAttribute {
                    format: VertexFormat::Float32x4,
                    offset: 32,
                    shader_location: 3,
                },
            ],
        }
    }
}

/// The geometry payload of a [`Mesh`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals; empty or one per position.
    pub normals: Vec<Vec3>,
    /// Texture coordinates; empty or one per position.
    pub uvs: Vec<Vec2>,
    /// Tangents; empty or one per position.
    pub tangents: Vec<Vec4>,
    /// Optional index list.
    pub indices: Option<Vec<u32>>,
    /// How vertices form primitives.
    pub topology: PrimitiveTopology,
}

impl MeshData {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices, or vertices for non-indexed meshes.
    pub fn element_count(&self) -> usize {
        self.indices
            .as_ref()
            .map_or(self.positions.len(), Vec::len)
    }
}

/// A mesh living in CPU memory.
#[derive(Debug)]
pub struct Mesh {
    identity: Identity,
    version: Version,
    data: RwLock<MeshData>,
}

fn check_stream(attribute: &'static str, len: usize, expected: usize) -> Result<(), AssetError> {
    if len != 0 && len != expected {
        return Err(AssetError::AttributeCountMismatch {
            attribute,
            expected,
            actual: len,
        });
    }
    Ok(())
}

fn check_indices(indices: &[u32], vertex_count: usize) -> Result<(), AssetError> {
    match indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(&index) => Err(AssetError::IndexOutOfRange {
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

impl Mesh {
    /// Creates a non-indexed triangle-list mesh from positions.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self {
            identity: Identity::named(name),
            version: Version::new(),
            data: RwLock::new(MeshData {
                positions,
                ..Default::default()
            }),
        }
    }

    /// Creates a mesh from a fully built payload.
    pub fn from_data(name: impl Into<String>, data: MeshData) -> Result<Self, AssetError> {
        let count = data.positions.len();
        check_stream("normal", data.normals.len(), count)?;
        check_stream("uv", data.uvs.len(), count)?;
        check_stream("tangent", data.tangents.len(), count)?;
        if let Some(indices) = &data.indices {
            check_indices(indices, count)?;
        }
        Ok(Self {
            identity: Identity::named(name),
            version: Version::new(),
            data: RwLock::new(data),
        })
    }

    /// Read access to the geometry.
    pub fn data(&self) -> RwLockReadGuard<'_, MeshData> {
        self.data.read()
    }

    /// Builds the interleaved vertex stream. Missing attributes get
    /// `+Y` normals, zero UVs and `+X` tangents.
    pub fn interleaved_vertices(&self) -> Vec<Vertex> {
        let data = self.data.read();
        data.positions
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex {
                position: position.to_array(),
                normal: data.normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
                uv: data.uvs.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
                tangent: data
                    .tangents
                    .get(i)
                    .copied()
                    .unwrap_or(Vec4::new(1.0, 0.0, 0.0, 1.0))
                    .to_array(),
            })
            .collect()
    }

    /// Local-space bounds, [`Aabb::INVALID`] for an empty mesh.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.data.read().positions).unwrap_or(Aabb::INVALID)
    }

    /// The primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.data.read().topology
    }

    /// Replaces the positions and drops attribute streams that no longer match.
    pub fn set_positions(&self, positions: Vec<Vec3>) {
        let mut data = self.data.write();
        let count = positions.len();
        if data.normals.len() != count {
            data.normals.clear();
        }
        if data.uvs.len() != count {
            data.uvs.clear();
        }
        if data.tangents.len() != count {
            data.tangents.clear();
        }
        data.positions = positions;
        self.version.bump();
    }

    /// Replaces the normals.
    pub fn set_normals(&self, normals: Vec<Vec3>) -> Result<(), AssetError> {
        let mut data = self.data.write();
        check_stream("normal", normals.len(), data.positions.len())?;
        data.normals = normals;
        self.version.bump();
        Ok(())
    }

    /// Replaces the texture coordinates.
    pub fn set_uvs(&self, uvs: Vec<Vec2>) -> Result<(), AssetError> {
        let mut data = self.data.write();
        check_stream("uv", uvs.len(), data.positions.len())?;
        data.uvs = uvs;
        self.version.bump();
        Ok(())
    }

    /// Replaces or removes the index list.
    pub fn set_indices(&self, indices: Option<Vec<u32>>) -> Result<(), AssetError> {
        let mut data = self.data.write();
        if let Some(indices) = &indices {
            check_indices(indices, data.positions.len())?;
        }
        data.indices = indices;
        self.version.bump();
        Ok(())
    }

    /// Changes the primitive topology.
    pub fn set_topology(&self, topology: PrimitiveTopology) {
        self.data.write().topology = topology;
        self.version.bump();
    }
}

impl Identifiable for Mesh {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Versioned for Mesh {
    fn version(&self) -> u64 {
        self.version.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            "triangle",
            vec![Vec3::ZERO, Vec3::X, Vec3::new(0.0, 2.0, -1.0)],
        )
    }

    #[test]
    fn vertex_layout_is_48_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(Vertex::buffer_layout().array_stride, 48);
    }

    #[test]
    fn interleaving_fills_missing_attributes() {
        let vertices = triangle().interleaved_vertices();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].tangent, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn bounds_cover_positions() {
        let bounds = triangle().bounds();
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.0));
        assert!(!Mesh::new("empty", Vec::new()).bounds().is_valid());
    }

    #[test]
    fn invalid_updates_keep_version() {
        let mesh = triangle();
        assert!(mesh.set_indices(Some(vec![0, 1, 7])).is_err());
        assert!(mesh.set_normals(vec![Vec3::Y]).is_err());
        assert_eq!(mesh.version(), 0);

        mesh.set_indices(Some(vec![0, 1, 2])).unwrap();
        mesh.set_topology(PrimitiveTopology::LineList);
        assert_eq!(mesh.version(), 2);
        assert_eq!(mesh.data().element_count(), 3);
    }

    #[test]
    fn from_data_validates_streams() {
        let data = MeshData {
            positions: vec![Vec3::ZERO; 3],
            uvs: vec![Vec2::ZERO; 2],
            ..Default::default()
        };
        assert!(matches!(
            Mesh::from_data("bad", data),
            Err(AssetError::AttributeCountMismatch { attribute: "uv", .. })
        ));
    }
}
