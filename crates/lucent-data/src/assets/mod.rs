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

//! Versioned CPU assets.

mod material;
mod mesh;
mod model;
mod texture;

pub use self::material::{
    slots, Material, MaterialData, MaterialFeatures, MaterialProperties, MaterialUniforms,
};
pub use self::mesh::{Mesh, MeshData, Vertex};
pub use self::model::{Model, Submesh};
pub use self::texture::{Texture, TextureData};

use std::fmt;

/// An error raised when asset data is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The pixel buffer does not match `width * height * bytes_per_pixel`.
    PixelSizeMismatch {
        /// Expected byte count.
        expected: usize,
        /// Provided byte count.
        actual: usize,
    },
    /// A vertex attribute stream does not have one entry per position.
    AttributeCountMismatch {
        /// The attribute name.
        attribute: &'static str,
        /// Number of positions.
        expected: usize,
        /// Number of attribute values.
        actual: usize,
    },
    /// An index points past the last vertex.
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices.
        vertex_count: usize,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::PixelSizeMismatch { expected, actual } => {
                write!(f, "Pixel data has {actual} bytes, expected {expected}")
            }
            AssetError::AttributeCountMismatch {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "Attribute '{attribute}' has {actual} values, expected {expected}"
            ),
            AssetError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "Index {index} is out of range for {vertex_count} vertices"
            ),
        }
    }
}

impl std::error::Error for AssetError {}
