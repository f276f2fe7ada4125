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

//! Generation-counted storage for bind groups.

use super::bind_group::GpuBindGroup;

/// A stable reference to a bind group stored in a [`BindGroupArena`].
///
/// It combines a slot index with the generation of that slot. When a bind
/// group is removed its slot is recycled and the generation bumped, so an old
/// `BindGroupSlot` stops resolving instead of aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupSlot {
    /// Index of the slot in the arena.
    pub index: u32,
    /// Generation of the slot when this reference was handed out.
    pub generation: u32,
}

/// Owns every [`GpuBindGroup`] of a context.
///
/// Slots are recycled through a free list; lookups are `O(1)`.
#[derive(Debug, Default)]
pub struct BindGroupArena {
    slots: Vec<(u32, Option<GpuBindGroup>)>,
    free: Vec<u32>,
    len: usize,
}

impl BindGroupArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a bind group and returns its slot.
    pub fn insert(&mut self, bind_group: GpuBindGroup) -> BindGroupSlot {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let (generation, value) = &mut self.slots[index as usize];
            *value = Some(bind_group);
            BindGroupSlot {
                index,
                generation: *generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push((0, Some(bind_group)));
            BindGroupSlot {
                index,
                generation: 0,
            }
        }
    }

    /// Resolves a slot. Stale slots resolve to `None`.
    pub fn get(&self, slot: BindGroupSlot) -> Option<&GpuBindGroup> {
        self.slots
            .get(slot.index as usize)
            .and_then(|(generation, value)| {
                if *generation == slot.generation {
                    value.as_ref()
                } else {
                    None
                }
            })
    }

    /// Returns `true` if `slot` still resolves.
    pub fn contains(&self, slot: BindGroupSlot) -> bool {
        self.get(slot).is_some()
    }

    /// Takes a bind group out of the arena.
    ///
    /// The slot's generation is bumped, so every copy of `slot` stops
    /// resolving. The caller is responsible for releasing the device objects.
    pub fn remove(&mut self, slot: BindGroupSlot) -> Option<GpuBindGroup> {
        let (generation, value) = self.slots.get_mut(slot.index as usize)?;
        if *generation != slot.generation {
            return None;
        }
        let removed = value.take()?;
        *generation = generation.wrapping_add(1);
        self.free.push(slot.index);
        self.len -= 1;
        Some(removed)
    }

    /// Number of live bind groups.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no bind group.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every bind group, returning them for release.
    pub fn drain(&mut self) -> Vec<GpuBindGroup> {
        let mut drained = Vec::with_capacity(self.len);
        for (index, (generation, value)) in self.slots.iter_mut().enumerate() {
            if let Some(bind_group) = value.take() {
                *generation = generation.wrapping_add(1);
                self.free.push(index as u32);
                drained.push(bind_group);
            }
        }
        self.len = 0;
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{BindGroupLayoutInfo, BindGroupReuse, BindGroupType};
    use lucent_core::renderer::{BindGroupId, BindGroupLayoutId};
    use std::sync::Arc;

    fn bind_group(id: usize) -> GpuBindGroup {
        let layout = Arc::new(BindGroupLayoutInfo::new(
            "test",
            BindGroupType::Custom,
            BindGroupReuse::PerFrame,
            0,
            BindGroupLayoutId(1),
            Vec::new(),
        ));
        GpuBindGroup::new(BindGroupId(id), layout, Vec::new())
    }

    #[test]
    fn insert_and_resolve() {
        let mut arena = BindGroupArena::new();
        let a = arena.insert(bind_group(10));
        let b = arena.insert(bind_group(11));

        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).map(|g| g.id()), Some(BindGroupId(10)));
        assert_eq!(arena.get(b).map(|g| g.id()), Some(BindGroupId(11)));
    }

    #[test]
    fn removed_slot_goes_stale_after_reuse() {
        let mut arena = BindGroupArena::new();
        let old = arena.insert(bind_group(1));
        assert!(arena.remove(old).is_some());
        assert!(arena.get(old).is_none());
        assert!(arena.remove(old).is_none());

        let new = arena.insert(bind_group(2));
        assert_eq!(new.index, old.index);
        assert_eq!(new.generation, old.generation + 1);
        assert!(!arena.contains(old));
        assert_eq!(arena.get(new).map(|g| g.id()), Some(BindGroupId(2)));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn drain_empties_the_arena() {
        let mut arena = BindGroupArena::new();
        let slot = arena.insert(bind_group(1));
        arena.insert(bind_group(2));

        assert_eq!(arena.drain().len(), 2);
        assert!(arena.is_empty());
        assert!(arena.get(slot).is_none());
    }
}
