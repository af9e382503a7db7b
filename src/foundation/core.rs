use crate::foundation::error::{ScreenFxError, ScreenFxResult};
use crate::foundation::math::{decode_unorm8, encode_unorm8};

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// Texture filtering used when a pass samples an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Nearest texel, no interpolation.
    Nearest,
    /// Bilinear interpolation between the four nearest texels.
    #[default]
    Bilinear,
}

/// Storage layout of an [`Image`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Straight-alpha RGBA, one byte per channel.
    #[default]
    Rgba8Unorm,
    /// Single 32-bit float channel, used for depth textures.
    R32Float,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Unorm => 4,
            Self::R32Float => 4,
        }
    }
}

/// Size and format of an image. Scratch pools key on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl ImageDesc {
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8Unorm,
        }
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn byte_len(self) -> usize {
        self.pixel_count()
            .saturating_mul(self.format.bytes_per_pixel())
    }

    fn checked_byte_len(self) -> ScreenFxResult<usize> {
        if self.width == 0 || self.height == 0 {
            return Err(ScreenFxError::validation(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(self.format.bytes_per_pixel()))
            .ok_or_else(|| ScreenFxError::validation("image buffer size overflow"))
    }
}

/// Straight-alpha color with float channels in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "one")]
    pub a: f32,
}

fn one() -> f32 {
    1.0
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A 2D pixel buffer, row-major with the origin at the top-left.
///
/// The filter mode only affects how passes sample the image; it never changes the stored bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    desc: ImageDesc,
    filter: FilterMode,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a zero-filled image.
    pub fn new(desc: ImageDesc) -> ScreenFxResult<Self> {
        let len = desc.checked_byte_len()?;
        Ok(Self {
            desc,
            filter: FilterMode::default(),
            data: vec![0; len],
        })
    }

    /// Wrap tightly packed straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> ScreenFxResult<Self> {
        let desc = ImageDesc::rgba8(width, height);
        let expected = desc.checked_byte_len()?;
        if data.len() != expected {
            return Err(ScreenFxError::validation(format!(
                "rgba8 image {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            desc,
            filter: FilterMode::default(),
            data,
        })
    }

    /// Build a depth texture from per-pixel device depth values in `0..=1`.
    pub fn from_depth(width: u32, height: u32, depth: &[f32]) -> ScreenFxResult<Self> {
        let desc = ImageDesc {
            width,
            height,
            format: PixelFormat::R32Float,
        };
        desc.checked_byte_len()?;
        if depth.len() != desc.pixel_count() {
            return Err(ScreenFxError::validation(format!(
                "depth image {width}x{height} expects {} values, got {}",
                desc.pixel_count(),
                depth.len()
            )));
        }
        let data = depth.iter().flat_map(|d| d.to_le_bytes()).collect();
        Ok(Self {
            desc,
            filter: FilterMode::Nearest,
            data,
        })
    }

    /// A single-color RGBA8 image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ScreenFxResult<Self> {
        let desc = ImageDesc::rgba8(width, height);
        desc.checked_byte_len()?;
        Self::from_rgba8(width, height, rgba.repeat(desc.pixel_count()))
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn desc(&self) -> ImageDesc {
        self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Read one texel as floats. Depth images return the depth in every channel with alpha 1.
    pub fn load(&self, x: u32, y: u32) -> Vec4 {
        let idx = self.texel_offset(x, y);
        decode_texel(self.desc.format, &self.data[idx..idx + 4])
    }

    /// Write one texel, quantizing to the image format.
    pub fn store(&mut self, x: u32, y: u32, value: Vec4) {
        let idx = self.texel_offset(x, y);
        encode_texel(self.desc.format, value, &mut self.data[idx..idx + 4]);
    }

    pub fn pixel_rgba8(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = self.texel_offset(x, y);
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    fn texel_offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.desc.width && y < self.desc.height);
        ((y as usize) * (self.desc.width as usize) + (x as usize))
            * self.desc.format.bytes_per_pixel()
    }
}

pub(crate) fn decode_texel(format: PixelFormat, bytes: &[u8]) -> Vec4 {
    match format {
        PixelFormat::Rgba8Unorm => Vec4::new(
            decode_unorm8(bytes[0]),
            decode_unorm8(bytes[1]),
            decode_unorm8(bytes[2]),
            decode_unorm8(bytes[3]),
        ),
        PixelFormat::R32Float => {
            let d = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            Vec4::new(d, d, d, 1.0)
        }
    }
}

pub(crate) fn encode_texel(format: PixelFormat, value: Vec4, out: &mut [u8]) {
    match format {
        PixelFormat::Rgba8Unorm => {
            out[0] = encode_unorm8(value.x);
            out[1] = encode_unorm8(value.y);
            out[2] = encode_unorm8(value.z);
            out[3] = encode_unorm8(value.w);
        }
        PixelFormat::R32Float => out[..4].copy_from_slice(&value.x.to_le_bytes()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
