/// Texture descriptors, views and the texture resource record

use bitflags::bitflags;
use crate::device::{DataFormat, Handle};

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Type1D,
    Type2D,
    Type3D,
    Cube,
    Type1DArray,
    Type2DArray,
    CubeArray,
}

impl TextureType {
    /// True for types that can hold more than one layer
    pub fn is_array(&self) -> bool {
        matches!(self, TextureType::Type1DArray | TextureType::Type2DArray | TextureType::CubeArray)
    }

    pub fn is_cube(&self) -> bool {
        matches!(self, TextureType::Cube | TextureType::CubeArray)
    }
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSamples {
    X1,
    X2,
    X4,
    X8,
    X16,
    X32,
    X64,
}

impl TextureSamples {
    /// Every sample count, ascending
    pub const ALL: [TextureSamples; 7] = [
        TextureSamples::X1,
        TextureSamples::X2,
        TextureSamples::X4,
        TextureSamples::X8,
        TextureSamples::X16,
        TextureSamples::X32,
        TextureSamples::X64,
    ];

    /// Number of samples per texel
    pub fn count(&self) -> u32 {
        1 << (*self as u32)
    }
}

bitflags! {
    /// How a texture may be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLING                 = 1 << 0;
        const COLOR_ATTACHMENT         = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        const STORAGE                  = 1 << 3;
        const STORAGE_ATOMIC           = 1 << 4;
        const CPU_READ                 = 1 << 5;
        const CAN_UPDATE               = 1 << 6;
        const CAN_COPY_FROM            = 1 << 7;
        const CAN_COPY_TO              = 1 << 8;
        const INPUT_ATTACHMENT         = 1 << 9;
    }
}

impl TextureUsage {
    /// Usage bits relevant to framebuffer attachments
    pub const ATTACHMENT_BITS: TextureUsage = TextureUsage::COLOR_ATTACHMENT
        .union(TextureUsage::DEPTH_STENCIL_ATTACHMENT)
        .union(TextureUsage::INPUT_ATTACHMENT);
}

/// Component swizzle of a texture view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSwizzle {
    Identity,
    Zero,
    One,
    R,
    G,
    B,
    A,
}

/// Kind of slice taken by a shared texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSliceType {
    Slice2D,
    Cubemap,
    Slice3D,
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// Texel format
    pub format: DataFormat,
    /// Width in texels
    pub width: u32,
    /// Height in texels (1 for 1D textures)
    pub height: u32,
    /// Depth in texels (1 unless 3D)
    pub depth: u32,
    /// Array layers (6 for cubes, multiple of 6 for cube arrays)
    pub array_layers: u32,
    /// Mip levels, including the base level
    pub mipmaps: u32,
    pub texture_type: TextureType,
    /// Requested sample count (clamped to what the format supports)
    pub samples: TextureSamples,
    pub usage: TextureUsage,
    /// Additional formats views of this texture may use
    pub shareable_formats: Vec<DataFormat>,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            format: DataFormat::R8G8B8A8_UNORM,
            width: 1,
            height: 1,
            depth: 1,
            array_layers: 1,
            mipmaps: 1,
            texture_type: TextureType::Type2D,
            samples: TextureSamples::X1,
            usage: TextureUsage::SAMPLING,
            shareable_formats: Vec::new(),
        }
    }
}

impl TextureDesc {
    /// Convenience constructor for a single-layer, single-mip 2D texture
    pub fn texture_2d(format: DataFormat, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            format,
            width,
            height,
            usage,
            ..Default::default()
        }
    }
}

// ===== TEXTURE VIEW =====

/// View parameters applied when a texture is sampled or aliased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureView {
    /// Reinterpret the texels with another (shareable) format
    pub format_override: Option<DataFormat>,
    pub swizzle_r: TextureSwizzle,
    pub swizzle_g: TextureSwizzle,
    pub swizzle_b: TextureSwizzle,
    pub swizzle_a: TextureSwizzle,
}

impl Default for TextureView {
    fn default() -> Self {
        Self {
            format_override: None,
            swizzle_r: TextureSwizzle::R,
            swizzle_g: TextureSwizzle::G,
            swizzle_b: TextureSwizzle::B,
            swizzle_a: TextureSwizzle::A,
        }
    }
}

// ===== TEXTURE RECORD =====

/// Range of the source texture an alias covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedSlice {
    /// Root texture owning the memory (never itself an alias)
    pub source: Handle,
    pub base_layer: u32,
    pub layers: u32,
    pub base_mipmap: u32,
    pub mipmaps: u32,
    pub slice_type: Option<TextureSliceType>,
}

/// Registry payload for textures
#[derive(Debug, Clone)]
pub struct TextureRecord {
    /// Effective descriptor (samples already clamped, layers/mips of the alias range)
    pub desc: TextureDesc,
    pub view: TextureView,
    /// Set for aliases created through `texture_create_shared*`
    pub shared: Option<SharedSlice>,
    /// Native image owned by someone else (`texture_create_from_extension`)
    pub external: bool,
}

impl TextureRecord {
    /// Format seen through the view
    pub fn view_format(&self) -> DataFormat {
        self.view.format_override.unwrap_or(self.desc.format)
    }

    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }
}
