//! Sprite textures and the kind-to-sprite table.
//!
//! Textures are plain RGBA8 pixel buffers ([`TextureData`]). They are either
//! decoded from an image file or generated procedurally; a renderer uploads
//! them and hands back a [`TextureHandle`]. The batch builder only ever sees
//! handles and sprite dimensions through a [`SpriteSet`].
//!
//! # Fallback
//!
//! [`TextureData::load_or_fallback`] always tries the procedural radial
//! falloff texture when the asset cannot be loaded, so a missing file never
//! stops a show:
//!
//! ```ignore
//! let (texture, source) = TextureData::load_or_fallback("assets/fire.png", Fallback::default())?;
//! if source == TextureSource::Fallback {
//!     texture.save_png("fallback_fire.png")?;
//! }
//! ```

use std::path::Path;

use tracing::{debug, warn};

use crate::error::TextureError;
use crate::particle::ParticleKind;

/// Filter mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Smooth linear filtering (default). Good for soft sprites.
    #[default]
    Linear,
    /// Sharp nearest-neighbor filtering. Good for pixel art.
    Nearest,
}

/// RGBA8 pixel data with dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filter: FilterMode,
}

/// Parameters of the procedural fallback sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fallback {
    pub width: u32,
    pub height: u32,
    /// Alpha is `(1 - d / max_r) ^ exponent`.
    pub exponent: f32,
}

impl Default for Fallback {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            exponent: 2.0,
        }
    }
}

/// Where a texture returned by [`TextureData::load_or_fallback`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSource {
    File,
    Fallback,
}

impl TextureData {
    /// Wrap raw RGBA data, checking it matches the dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            filter: FilterMode::Linear,
        })
    }

    /// Decode an image file (PNG or JPEG).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| TextureError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(img.into_raw(), width, height)
    }

    /// Create a texture filled with a single color.
    pub fn solid(r: u8, g: u8, b: u8, a: u8, size: u32) -> Result<Self, TextureError> {
        let pixels = size as usize * size as usize;
        let data = [r, g, b, a].repeat(pixels);
        Self::from_rgba(data, size, size)
    }

    /// White sprite whose alpha falls off radially from the center.
    pub fn radial(fallback: Fallback) -> Result<Self, TextureError> {
        let Fallback {
            width,
            height,
            exponent,
        } = fallback;
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let max_r = cx.hypot(cy);

        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let d = (x as f32 - cx).hypot(y as f32 - cy);
                let t = if max_r > 0.0 { (1.0 - d / max_r).max(0.0) } else { 0.0 };
                let a = (t.powf(exponent) * 255.0) as u8;
                data.extend_from_slice(&[255, 255, 255, a]);
            }
        }

        Self::from_rgba(data, width, height)
    }

    /// Load `path`, or build the procedural fallback if that fails.
    ///
    /// Only fails if both the asset and the fallback are unusable.
    pub fn load_or_fallback(
        path: impl AsRef<Path>,
        fallback: Fallback,
    ) -> Result<(Self, TextureSource), TextureError> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(texture) => {
                debug!(
                    path = %path.display(),
                    width = texture.width,
                    height = texture.height,
                    "loaded sprite texture"
                );
                Ok((texture, TextureSource::File))
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "sprite texture unavailable, using procedural fallback"
                );
                Self::radial(fallback)
                    .map(|texture| (texture, TextureSource::Fallback))
                    .map_err(|reason| TextureError::AssetMissing {
                        path: path.to_path_buf(),
                        reason: Box::new(reason),
                    })
            }
        }
    }

    /// Write the texture as a PNG, e.g. to inspect a generated fallback.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), TextureError> {
        let path = path.as_ref();
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|source| TextureError::ImageSave {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the filter mode.
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }
}

/// Opaque reference to a texture uploaded by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

/// A texture plus the size its quads are drawn at (before scaling).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub texture: TextureHandle,
    pub width: f32,
    pub height: f32,
}

impl Sprite {
    pub fn new(texture: TextureHandle, width: f32, height: f32) -> Self {
        Self {
            texture,
            width,
            height,
        }
    }

    /// Sprite sized to the texture it was uploaded from.
    pub fn from_texture(texture: TextureHandle, data: &TextureData) -> Self {
        Self::new(texture, data.width as f32, data.height as f32)
    }
}

/// Which sprite each particle kind is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteSet {
    sprites: [Sprite; ParticleKind::COUNT],
}

impl SpriteSet {
    /// Every kind uses the same sprite.
    pub fn uniform(sprite: Sprite) -> Self {
        Self {
            sprites: [sprite; ParticleKind::COUNT],
        }
    }

    /// Override the sprite for one kind.
    pub fn with(mut self, kind: ParticleKind, sprite: Sprite) -> Self {
        self.sprites[kind.index()] = sprite;
        self
    }

    #[inline]
    pub fn get(&self, kind: ParticleKind) -> &Sprite {
        &self.sprites[kind.index()]
    }
}

impl Default for SpriteSet {
    fn default() -> Self {
        Self::uniform(Sprite::new(TextureHandle::new(0), 32.0, 32.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_validates() {
        assert!(TextureData::from_rgba(vec![0; 16], 2, 2).is_ok());
        assert!(matches!(
            TextureData::from_rgba(vec![0; 15], 2, 2),
            Err(TextureError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        ));
        assert!(matches!(
            TextureData::from_rgba(vec![], 0, 4),
            Err(TextureError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_radial_falloff() {
        let tex = TextureData::radial(Fallback::default()).unwrap();
        assert_eq!(tex.data.len(), 32 * 32 * 4);
        let alpha = |x: u32, y: u32| tex.data[((y * 32 + x) * 4 + 3) as usize];
        assert!(alpha(16, 16) > 250);
        assert!(alpha(0, 0) < 5);
        assert!(alpha(16, 16) > alpha(24, 16));
        // Color channels stay white.
        assert_eq!(&tex.data[0..3], &[255, 255, 255]);
    }

    #[test]
    fn test_missing_asset_falls_back() {
        let (tex, source) =
            TextureData::load_or_fallback("definitely/not/here.png", Fallback::default()).unwrap();
        assert_eq!(source, TextureSource::Fallback);
        assert_eq!((tex.width, tex.height), (32, 32));
    }

    #[test]
    fn test_asset_missing_when_fallback_fails() {
        let bad = Fallback {
            width: 0,
            height: 0,
            exponent: 2.0,
        };
        let err = TextureData::load_or_fallback("definitely/not/here.png", bad).unwrap_err();
        assert!(matches!(err, TextureError::AssetMissing { .. }));
    }

    #[test]
    fn test_solid() {
        let tex = TextureData::solid(1, 2, 3, 4, 2).unwrap();
        assert_eq!(tex.data, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sprite_set_override() {
        let fire = Sprite::new(TextureHandle::new(1), 16.0, 16.0);
        let set = SpriteSet::default().with(ParticleKind::Fire, fire);
        assert_eq!(set.get(ParticleKind::Fire).texture, TextureHandle::new(1));
        assert_eq!(set.get(ParticleKind::Smoke).texture, TextureHandle::new(0));
    }
}
