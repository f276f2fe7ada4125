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

//! Models: a mesh plus per-range material assignments.

use super::material::Material;
use super::mesh::Mesh;
use lucent_core::{Handle, Identifiable, Identity, Version, Versioned};
use parking_lot::RwLock;

/// A contiguous index range of a mesh drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Submesh {
    /// First index.
    pub index_offset: u32,
    /// Number of indices.
    pub index_count: u32,
    /// Material used for the range.
    pub material: Handle<Material>,
}

#[derive(Debug)]
struct ModelData {
    mesh: Handle<Mesh>,
    submeshes: Vec<Submesh>,
}

/// A drawable model.
#[derive(Debug)]
pub struct Model {
    identity: Identity,
    version: Version,
    data: RwLock<ModelData>,
}

impl Model {
    /// Creates a model without submeshes.
    pub fn new(name: impl Into<String>, mesh: Handle<Mesh>) -> Self {
        Self {
            identity: Identity::named(name),
            version: Version::new(),
            data: RwLock::new(ModelData {
                mesh,
                submeshes: Vec::new(),
            }),
        }
    }

    /// Creates a model with one submesh covering `index_count` indices.
    pub fn single(
        name: impl Into<String>,
        mesh: Handle<Mesh>,
        material: Handle<Material>,
        index_count: u32,
    ) -> Self {
        let model = Self::new(name, mesh);
        model.data.write().submeshes.push(Submesh {
            index_offset: 0,
            index_count,
            material,
        });
        model
    }

    /// The mesh handle.
    pub fn mesh(&self) -> Handle<Mesh> {
        self.data.read().mesh
    }

    /// A copy of the submesh list.
    pub fn submeshes(&self) -> Vec<Submesh> {
        self.data.read().submeshes.clone()
    }

    /// Replaces the mesh.
    pub fn set_mesh(&self, mesh: Handle<Mesh>) {
        self.data.write().mesh = mesh;
        self.version.bump();
    }

    /// Appends a submesh.
    pub fn add_submesh(&self, submesh: Submesh) {
        self.data.write().submeshes.push(submesh);
        self.version.bump();
    }

    /// Changes the material of one submesh. Returns `false` if `index` is out
    /// of range.
    pub fn set_submesh_material(&self, index: usize, material: Handle<Material>) -> bool {
        let mut data = self.data.write();
        match data.submeshes.get_mut(index) {
            Some(submesh) => {
                submesh.material = material;
                self.version.bump();
                true
            }
            None => false,
        }
    }
}

impl Identifiable for Model {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Versioned for Model {
    fn version(&self) -> u64 {
        self.version.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submesh_edits_bump_version() {
        let model = Model::single("crate", Handle::from_raw(1), Handle::from_raw(2), 36);
        assert_eq!(model.submeshes().len(), 1);
        assert_eq!(model.version(), 0);

        assert!(model.set_submesh_material(0, Handle::from_raw(3)));
        assert!(!model.set_submesh_material(4, Handle::from_raw(3)));
        assert_eq!(model.version(), 1);
        assert_eq!(model.submeshes()[0].material, Handle::from_raw(3));
    }
}
