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

//! Renderer configuration.

use super::api::TextureFormat;
use super::error::RenderError;
use crate::math::LinearRgba;
use serde::{Deserialize, Serialize};

/// Tunable limits and formats of the renderer.
///
/// Loaded from JSON or built from [`Default`]. Call [`RendererConfig::validate`]
/// before handing it to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Capacity of the light storage buffer.
    pub max_lights: u32,
    /// Layers in the 2D shadow map array.
    pub max_shadow_maps_2d: u32,
    /// Cubes in the shadow cube array.
    pub max_shadow_maps_cube: u32,
    /// Resolution of each 2D shadow layer.
    pub shadow_map_size: u32,
    /// Per-face resolution of each shadow cube.
    pub cube_shadow_map_size: u32,
    /// Clear color of offscreen targets.
    pub clear_color: LinearRgba,
    /// Format of offscreen color targets.
    pub color_format: TextureFormat,
    /// Format of depth targets.
    pub depth_format: TextureFormat,
    /// Frames between two sweeps of orphaned GPU objects. `0` disables sweeping.
    pub sweep_orphans_every_n_frames: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_lights: 16,
            max_shadow_maps_2d: 16,
            max_shadow_maps_cube: 4,
            shadow_map_size: 2048,
            cube_shadow_map_size: 1024,
            clear_color: LinearRgba::new(0.01, 0.02, 0.03, 1.0),
            color_format: TextureFormat::Rgba8UnormSrgb,
            depth_format: TextureFormat::Depth32Float,
            sweep_orphans_every_n_frames: 120,
        }
    }
}

impl RendererConfig {
    /// Parses a configuration. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|e| RenderError::InvalidConfiguration(e.to_string()))
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, RenderError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RenderError::InvalidConfiguration(e.to_string()))
    }

    /// Clamps zero capacities to one and checks the formats.
    ///
    /// Clamped values are logged at `warn`. A non-depth `depth_format` or a
    /// depth `color_format` is an error.
    pub fn validate(mut self) -> Result<Self, RenderError> {
        for (name, value) in [
            ("max_lights", &mut self.max_lights),
            ("max_shadow_maps_2d", &mut self.max_shadow_maps_2d),
            ("max_shadow_maps_cube", &mut self.max_shadow_maps_cube),
            ("shadow_map_size", &mut self.shadow_map_size),
            ("cube_shadow_map_size", &mut self.cube_shadow_map_size),
        ] {
            if *value == 0 {
                log::warn!("RendererConfig: '{name}' is 0, clamping to 1");
                *value = 1;
            }
        }
        if !self.depth_format.is_depth() {
            return Err(RenderError::InvalidConfiguration(format!(
                "depth_format {:?} is not a depth format",
                self.depth_format
            )));
        }
        if self.color_format.is_depth() {
            return Err(RenderError::InvalidConfiguration(format!(
                "color_format {:?} is a depth format",
                self.color_format
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config = RendererConfig::from_json_str(r#"{ "max_lights": 4 }"#).unwrap();
        assert_eq!(config.max_lights, 4);
        assert_eq!(config.shadow_map_size, 2048);
        assert_eq!(config.depth_format, TextureFormat::Depth32Float);
    }

    #[test]
    fn json_round_trip() {
        let config = RendererConfig {
            max_shadow_maps_cube: 2,
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(RendererConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn validate_clamps_and_rejects() {
        let config = RendererConfig {
            max_lights: 0,
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(config.max_lights, 1);

        let bad = RendererConfig {
            depth_format: TextureFormat::Rgba8Unorm,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(RenderError::InvalidConfiguration(_))
        ));
        assert!(RendererConfig::from_json_str("not json").is_err());
    }
}
