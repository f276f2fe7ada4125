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

//! CPU-side texture data.

use super::AssetError;
use lucent_core::math::LinearRgba;
use lucent_core::renderer::TextureFormat;
use lucent_core::{Identifiable, Identity, Version, Versioned};
use parking_lot::{RwLock, RwLockReadGuard};

/// The pixel payload of a [`Texture`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel format.
    pub format: TextureFormat,
    /// Tightly packed rows of texels.
    pub pixels: Vec<u8>,
}

impl TextureData {
    fn expected_len(width: u32, height: u32, format: TextureFormat) -> usize {
        width as usize * height as usize * format.bytes_per_pixel() as usize
    }

    /// Bytes in one row of texels.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }
}

/// A 2D texture living in CPU memory.
#[derive(Debug)]
pub struct Texture {
    identity: Identity,
    version: Version,
    data: RwLock<TextureData>,
}

impl Texture {
    /// Creates an RGBA8 texture from tightly packed pixels.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, AssetError> {
        Self::with_format(name, width, height, TextureFormat::Rgba8Unorm, pixels)
    }

    /// Creates a texture in any color format.
    pub fn with_format(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, AssetError> {
        let expected = TextureData::expected_len(width, height, format);
        if pixels.len() != expected {
            return Err(AssetError::PixelSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            identity: Identity::named(name),
            version: Version::new(),
            data: RwLock::new(TextureData {
                width,
                height,
                format,
                pixels,
            }),
        })
    }

    /// A 1x1 texture filled with `color`.
    pub fn solid_color(name: impl Into<String>, color: LinearRgba) -> Self {
        Self {
            identity: Identity::named(name),
            version: Version::new(),
            data: RwLock::new(TextureData {
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
                pixels: color.to_rgba8().to_vec(),
            }),
        }
    }

    /// Read access to the pixel data.
    pub fn data(&self) -> RwLockReadGuard<'_, TextureData> {
        self.data.read()
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.data.read().width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.data.read().height
    }

    /// Texel format.
    pub fn format(&self) -> TextureFormat {
        self.data.read().format
    }

    /// Replaces every pixel, keeping the size.
    pub fn set_pixels(&self, pixels: Vec<u8>) -> Result<(), AssetError> {
        let mut data = self.data.write();
        let expected = TextureData::expected_len(data.width, data.height, data.format);
        if pixels.len() != expected {
            return Err(AssetError::PixelSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        data.pixels = pixels;
        self.version.bump();
        Ok(())
    }

    /// Changes the size. The contents are cleared to zero.
    pub fn resize(&self, width: u32, height: u32) {
        let mut data = self.data.write();
        data.width = width;
        data.height = height;
        data.pixels = vec![0; TextureData::expected_len(width, height, data.format)];
        self.version.bump();
    }
}

impl Identifiable for Texture {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Versioned for Texture {
    fn version(&self) -> u64 {
        self.version.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_pixel_count() {
        let err = Texture::new("bad", 2, 2, vec![0; 3]).unwrap_err();
        assert_eq!(
            err,
            AssetError::PixelSizeMismatch {
                expected: 16,
                actual: 3
            }
        );
    }

    #[test]
    fn mutations_bump_version() {
        let texture = Texture::new("checker", 1, 1, vec![0, 0, 0, 255]).unwrap();
        assert_eq!(texture.version(), 0);

        texture.set_pixels(vec![255; 4]).unwrap();
        assert_eq!(texture.version(), 1);

        assert!(texture.set_pixels(vec![1]).is_err());
        assert_eq!(texture.version(), 1);

        texture.resize(4, 2);
        assert_eq!(texture.version(), 2);
        assert_eq!(texture.data().pixels.len(), 32);
        assert_eq!(texture.data().bytes_per_row(), 16);
    }

    #[test]
    fn solid_color_is_one_texel() {
        let texture = Texture::solid_color("white", LinearRgba::WHITE);
        assert_eq!((texture.width(), texture.height()), (1, 1));
        assert_eq!(texture.data().pixels, vec![255, 255, 255, 255]);
        assert_eq!(texture.name().as_deref(), Some("white"));
    }
}
