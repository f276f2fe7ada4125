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

//! Builder turning WGSL source and bind group metadata into a [`ShaderInfo`].

use super::info::{BindGroupLayoutInfo, BindGroupReuse, BindGroupType, BindingInfo, ShaderInfo};
use lucent_core::renderer::{
    BindGroupLayoutDescriptor, GraphicsDevice, PipelineError, PipelineLayoutDescriptor,
    ResourceError, ShaderModuleDescriptor, ShaderSourceData, VertexBufferLayout,
};
use std::borrow::Cow;
use std::sync::Arc;

enum GroupSource {
    /// A layout shared with other shaders, already on the device.
    Shared(Arc<BindGroupLayoutInfo>),
    /// A layout owned by this shader, created at build time.
    Local {
        name: String,
        group_type: BindGroupType,
        reuse: BindGroupReuse,
        index: u32,
        entries: Vec<BindingInfo>,
    },
}

impl GroupSource {
    fn index(&self) -> u32 {
        match self {
            GroupSource::Shared(info) => info.index(),
            GroupSource::Local { index, .. } => *index,
        }
    }
}

/// Describes a shader before compilation.
///
/// ```ignore
/// let info = ShaderDescriptor::new("outline", OUTLINE_WGSL)
///     .with_vertex_layout(Vertex::buffer_layout())
///     .with_global(0, registry.global_layout(globals::FRAME)?)
///     .with_group("outline", BindGroupType::Custom, BindGroupReuse::PerObject, 1, entries)
///     .build(device)?;
/// ```
pub struct ShaderDescriptor {
    name: String,
    source: Cow<'static, str>,
    vertex_entry: String,
    fragment_entry: Option<String>,
    vertex_layout: Option<VertexBufferLayout>,
    groups: Vec<GroupSource>,
}

impl ShaderDescriptor {
    /// Starts a descriptor with `vs_main` and `fs_main` entry points.
    pub fn new(name: impl Into<String>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            vertex_entry: "vs_main".to_owned(),
            fragment_entry: Some("fs_main".to_owned()),
            vertex_layout: None,
            groups: Vec::new(),
        }
    }

    /// The name the shader registers under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overrides the vertex entry point.
    pub fn with_vertex_entry(mut self, entry: impl Into<String>) -> Self {
        self.vertex_entry = entry.into();
        self
    }

    /// Overrides the fragment entry point. `None` makes a depth-only shader.
    pub fn with_fragment_entry(mut self, entry: Option<&str>) -> Self {
        self.fragment_entry = entry.map(str::to_owned);
        self
    }

    /// Sets the vertex buffer layout read by the vertex stage.
    pub fn with_vertex_layout(mut self, layout: VertexBufferLayout) -> Self {
        self.vertex_layout = Some(layout);
        self
    }

    /// Places a shared layout at group `index`.
    pub fn with_global(mut self, index: u32, info: &Arc<BindGroupLayoutInfo>) -> Self {
        let placed = if info.index() == index {
            info.clone()
        } else {
            Arc::new(info.at_index(index))
        };
        self.groups.push(GroupSource::Shared(placed));
        self
    }

    /// Declares a layout owned by this shader.
    pub fn with_group(
        mut self,
        name: impl Into<String>,
        group_type: BindGroupType,
        reuse: BindGroupReuse,
        index: u32,
        entries: Vec<BindingInfo>,
    ) -> Self {
        self.groups.push(GroupSource::Local {
            name: name.into(),
            group_type,
            reuse,
            index,
            entries,
        });
        self
    }

    /// Compiles the module and creates the missing layouts.
    ///
    /// ## Errors
    /// * `ResourceError::Shader` - If the module fails to compile.
    /// * `ResourceError::Pipeline` - If group indices are not `0..n` without gaps.
    pub fn build(self, device: &dyn GraphicsDevice) -> Result<ShaderInfo, ResourceError> {
        let mut groups = self.groups;
        groups.sort_by_key(GroupSource::index);
        for (expected, group) in groups.iter().enumerate() {
            if group.index() != expected as u32 {
                return Err(PipelineError::LayoutCreationFailed(format!(
                    "shader '{}' has no bind group at index {expected}",
                    self.name
                ))
                .into());
            }
        }

        let module = device.create_shader_module(&ShaderModuleDescriptor {
            label: Some(&self.name),
            source: ShaderSourceData::Wgsl(self.source),
        })?;

        let mut bind_groups = Vec::with_capacity(groups.len());
        for group in groups {
            let info = match group {
                GroupSource::Shared(info) => info,
                GroupSource::Local {
                    name,
                    group_type,
                    reuse,
                    index,
                    entries,
                } => {
                    let layout_entries: Vec<_> =
                        entries.iter().map(BindingInfo::layout_entry).collect();
                    let label = format!("{}/{name}", self.name);
                    let layout_id = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                        label: Some(&label),
                        entries: &layout_entries,
                    })?;
                    Arc::new(BindGroupLayoutInfo::new(
                        name, group_type, reuse, index, layout_id, entries,
                    ))
                }
            };
            bind_groups.push(info);
        }

        let layout_ids: Vec<_> = bind_groups.iter().map(|g| g.layout_id()).collect();
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&self.name),
            bind_group_layouts: &layout_ids,
        })?;

        log::debug!(
            "ShaderDescriptor: built '{}' with {} bind groups",
            self.name,
            bind_groups.len()
        );

        Ok(ShaderInfo {
            name: self.name,
            module,
            vertex_entry: self.vertex_entry,
            fragment_entry: self.fragment_entry,
            vertex_layout: self.vertex_layout,
            bind_groups,
            pipeline_layout,
        })
    }
}
