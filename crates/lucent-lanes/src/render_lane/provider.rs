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

//! User data for custom bind groups.

use crate::shader::BindGroupReuse;
use bytemuck::Pod;

/// Identifies one custom bind group across frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomBindGroupKey {
    /// Shader declaring the group.
    pub shader: String,
    /// Group name inside the shader.
    pub bind_group: String,
    /// Object or material id for per-instance groups, `None` when shared.
    pub instance: Option<u64>,
}

impl CustomBindGroupKey {
    /// Builds a key.
    pub fn new(shader: &str, bind_group: &str, instance: Option<u64>) -> Self {
        Self {
            shader: shader.to_owned(),
            bind_group: bind_group.to_owned(),
            instance,
        }
    }
}

/// Bytes to upload into binding 0 of a custom bind group.
///
/// The reuse policy declared by the shader wins over [`reuse`](Self::reuse).
/// `PerObject` and `PerMaterial` groups need an instance id, shared groups
/// ignore it.
#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupDataProvider {
    /// Shader declaring the group.
    pub shader: String,
    /// Group name inside the shader.
    pub bind_group: String,
    /// Raw uniform bytes.
    pub data: Vec<u8>,
    /// Expected reuse policy.
    pub reuse: BindGroupReuse,
    /// Object or material id for per-instance groups.
    pub instance: Option<u64>,
}

impl BindGroupDataProvider {
    /// A provider for raw bytes.
    pub fn new(
        shader: &str,
        bind_group: &str,
        data: &[u8],
        reuse: BindGroupReuse,
        instance: Option<u64>,
    ) -> Self {
        Self {
            shader: shader.to_owned(),
            bind_group: bind_group.to_owned(),
            data: data.to_vec(),
            reuse,
            instance,
        }
    }

    /// A provider for a plain-old-data uniform block.
    pub fn from_pod<T: Pod>(
        shader: &str,
        bind_group: &str,
        uniforms: &T,
        reuse: BindGroupReuse,
        instance: Option<u64>,
    ) -> Self {
        Self::new(shader, bind_group, bytemuck::bytes_of(uniforms), reuse, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_provider_copies_the_bytes() {
        let provider = BindGroupDataProvider::from_pod(
            "water",
            "waves",
            &[1.0f32, 2.0, 3.0, 4.0],
            BindGroupReuse::PerFrame,
            None,
        );
        assert_eq!(provider.data.len(), 16);
        assert_eq!(bytemuck::pod_read_unaligned::<f32>(&provider.data[8..12]), 3.0);
    }

    #[test]
    fn keys_differ_by_instance() {
        let shared = CustomBindGroupKey::new("water", "waves", None);
        let first = CustomBindGroupKey::new("water", "waves", Some(1));
        assert_ne!(shared, first);
        assert_eq!(first, CustomBindGroupKey::new("water", "waves", Some(1)));
    }
}
