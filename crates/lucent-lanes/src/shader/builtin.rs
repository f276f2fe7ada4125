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

//! Built-in shader sources, embedded at compile time.
//!
//! - [`MESH_LIT_WGSL`] - Lit meshes: lights, material maps, 2D and cube shadows.
//! - [`SHADOW_2D_WGSL`] - Depth-only rendering into the 2D shadow array.
//! - [`SHADOW_CUBE_WGSL`] - Linear distance rendering into cube shadow faces.
//! - [`DEBUG_WGSL`] - Lines, disks, boxes and arrows expanded from a storage buffer.
//! - [`FULLSCREEN_WGSL`] - Fullscreen triangle for post-processing and compositing.

/// Lit mesh shader.
pub const MESH_LIT_WGSL: &str = include_str!("wgsl/mesh_lit.wgsl");

/// Depth-only shadow shader for directional and spot lights.
pub const SHADOW_2D_WGSL: &str = include_str!("wgsl/shadow_2d.wgsl");

/// Point light shadow shader. Writes `distance / far` as depth.
pub const SHADOW_CUBE_WGSL: &str = include_str!("wgsl/shadow_cube.wgsl");

/// Debug primitive shader. 32 vertices per instance, line list.
pub const DEBUG_WGSL: &str = include_str!("wgsl/debug.wgsl");

/// Fullscreen triangle with a copy (`fs_copy`) and a post (`fs_post`) entry.
pub const FULLSCREEN_WGSL: &str = include_str!("wgsl/fullscreen.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_entry_points_exist() {
        for source in [MESH_LIT_WGSL, DEBUG_WGSL] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
        assert!(SHADOW_2D_WGSL.contains("@vertex"));
        assert!(!SHADOW_2D_WGSL.contains("@fragment"));
        assert!(SHADOW_CUBE_WGSL.contains("frag_depth"));
        assert!(FULLSCREEN_WGSL.contains("fn fs_copy"));
        assert!(FULLSCREEN_WGSL.contains("fn fs_post"));
    }

    #[test]
    fn mesh_lit_declares_five_groups() {
        for group in 0..5 {
            assert!(MESH_LIT_WGSL.contains(&format!("@group({group})")));
        }
        assert!(!MESH_LIT_WGSL.contains("@group(5)"));
    }
}
