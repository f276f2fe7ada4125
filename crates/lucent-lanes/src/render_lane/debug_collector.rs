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

//! CPU-side queue of debug primitives drawn by the debug pass.

use bytemuck::{Pod, Zeroable};
use lucent_core::math::{Aabb, LinearRgba, Vec3};

/// Maximum number of primitives the debug storage buffer holds.
pub const MAX_DEBUG_PRIMITIVES: usize = 1024;

/// Shape of a [`DebugPrimitive`]; matches the `KIND_*` constants of the
/// debug shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DebugPrimitiveKind {
    /// Segment from `data[0]` to `data[1]`.
    Line = 0,
    /// Circle at `data[0].xyz`, radius `data[0].w`, normal `data[1]`.
    Disk = 1,
    /// Box from `data[0]` to `data[1]`.
    Aabb = 2,
    /// Arrow from `data[0].xyz` to `data[1]`, head size `data[0].w`.
    Arrow = 3,
}

/// One primitive as stored in the debug storage buffer (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DebugPrimitive {
    _pad: [f32; 3],
    /// [`DebugPrimitiveKind`] as `u32`.
    pub kind: u32,
    /// Linear RGBA color.
    pub color: [f32; 4],
    /// Kind-specific payload.
    pub data: [[f32; 4]; 3],
}

impl DebugPrimitive {
    fn new(kind: DebugPrimitiveKind, color: LinearRgba, a: [f32; 4], b: [f32; 4]) -> Self {
        Self {
            _pad: [0.0; 3],
            kind: kind as u32,
            color: [color.r, color.g, color.b, color.a],
            data: [a, b, [0.0; 4]],
        }
    }
}

fn vec4(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

/// Collects debug primitives for one frame.
#[derive(Debug, Default, Clone)]
pub struct DebugCollector {
    primitives: Vec<DebugPrimitive>,
}

impl DebugCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a line segment.
    pub fn add_line(&mut self, from: Vec3, to: Vec3, color: LinearRgba) {
        self.primitives.push(DebugPrimitive::new(
            DebugPrimitiveKind::Line,
            color,
            vec4(from, 1.0),
            vec4(to, 1.0),
        ));
    }

    /// Queues a circle of `radius` around `center`, facing `normal`.
    pub fn add_disk(&mut self, center: Vec3, normal: Vec3, radius: f32, color: LinearRgba) {
        self.primitives.push(DebugPrimitive::new(
            DebugPrimitiveKind::Disk,
            color,
            vec4(center, radius),
            vec4(normal.normalize_or_zero(), 0.0),
        ));
    }

    /// Queues the edges of `aabb`.
    pub fn add_aabb(&mut self, aabb: &Aabb, color: LinearRgba) {
        self.primitives.push(DebugPrimitive::new(
            DebugPrimitiveKind::Aabb,
            color,
            vec4(aabb.min, 1.0),
            vec4(aabb.max, 1.0),
        ));
    }

    /// Queues an arrow from `start` to `end` with a head of `head_size`.
    pub fn add_arrow(&mut self, start: Vec3, end: Vec3, head_size: f32, color: LinearRgba) {
        self.primitives.push(DebugPrimitive::new(
            DebugPrimitiveKind::Arrow,
            color,
            vec4(start, head_size),
            vec4(end, 1.0),
        ));
    }

    /// Drops every queued primitive.
    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    /// Number of queued primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// The queued primitives, in insertion order.
    pub fn primitives(&self) -> &[DebugPrimitive] {
        &self.primitives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_matches_the_shader_layout() {
        assert_eq!(std::mem::size_of::<DebugPrimitive>(), 80);
        assert_eq!(std::mem::offset_of!(DebugPrimitive, kind), 12);
        assert_eq!(std::mem::offset_of!(DebugPrimitive, data), 32);
    }

    #[test]
    fn payloads_are_packed_per_kind() {
        let mut debug = DebugCollector::new();
        debug.add_disk(Vec3::ONE, Vec3::Y * 3.0, 2.5, LinearRgba::WHITE);
        debug.add_arrow(Vec3::ZERO, Vec3::X, 0.25, LinearRgba::WHITE);
        debug.add_aabb(&Aabb::from_min_max(Vec3::ZERO, Vec3::ONE), LinearRgba::BLACK);

        let [disk, arrow, aabb] = debug.primitives() else {
            panic!("expected three primitives");
        };
        assert_eq!(disk.kind, DebugPrimitiveKind::Disk as u32);
        assert_eq!(disk.data[0], [1.0, 1.0, 1.0, 2.5]);
        assert_eq!(disk.data[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(arrow.data[0][3], 0.25);
        assert_eq!(aabb.kind, DebugPrimitiveKind::Aabb as u32);
        assert_eq!(aabb.data[1], [1.0, 1.0, 1.0, 1.0]);

        debug.clear();
        assert!(debug.is_empty());
    }
}
