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

//! Bind groups of fullscreen passes, keyed by the sampled view.

use crate::context::{GpuContext, SamplerKind};
use crate::gpu::BindGroupSlot;
use crate::shader::BindGroupLayoutInfo;
use lucent_core::renderer::{BindingResource, TextureViewId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One `(texture, sampler)` group per sampled view.
///
/// Views not sampled during a frame lose their group at
/// [`end_frame`](Self::end_frame), so resized or released targets do not
/// leak groups.
#[derive(Debug, Default)]
pub(super) struct SourceGroups {
    groups: HashMap<TextureViewId, BindGroupSlot>,
    seen: HashSet<TextureViewId>,
}

impl SourceGroups {
    pub(super) fn get_or_create(
        &mut self,
        ctx: &GpuContext,
        layout: &Arc<BindGroupLayoutInfo>,
        view: TextureViewId,
        label: &str,
    ) -> Option<BindGroupSlot> {
        self.seen.insert(view);
        if let Some(&slot) = self.groups.get(&view) {
            return Some(slot);
        }
        let resources = [
            (0, BindingResource::TextureView(view)),
            (1, BindingResource::Sampler(ctx.sampler(SamplerKind::LinearClamp))),
        ];
        match ctx.create_bind_group(layout, &resources, label) {
            Ok(slot) => {
                self.groups.insert(view, slot);
                Some(slot)
            }
            Err(e) => {
                log::warn!("{label}: no source group for {view:?}: {e}");
                None
            }
        }
    }

    pub(super) fn end_frame(&mut self, ctx: &GpuContext) {
        let seen = std::mem::take(&mut self.seen);
        self.groups.retain(|view, slot| {
            let keep = seen.contains(view);
            if !keep {
                ctx.release_bind_group(*slot);
            }
            keep
        });
    }

    pub(super) fn release_all(&mut self, ctx: &GpuContext) {
        for (_, slot) in self.groups.drain() {
            ctx.release_bind_group(slot);
        }
        self.seen.clear();
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.groups.len()
    }
}
