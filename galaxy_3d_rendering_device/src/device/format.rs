/// Data format table
///
/// Every format the device knows about is declared once in the
/// `data_formats!` table below; the enum, its name lookup and its block
/// layout are generated from that single list.

/// Numeric interpretation of a format's components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Unorm,
    Snorm,
    Uint,
    Sint,
    Float,
    Srgb,
}

/// Which image aspect(s) a format carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatAspect {
    Color,
    Depth,
    Stencil,
    DepthStencil,
}

/// Static properties of a [`DataFormat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Bytes per block (per texel for uncompressed formats)
    pub block_bytes: u32,
    /// Block width in texels (1 for uncompressed formats)
    pub block_width: u32,
    /// Block height in texels (1 for uncompressed formats)
    pub block_height: u32,
    /// Number of components
    pub components: u32,
    pub numeric: NumericKind,
    pub aspect: FormatAspect,
    pub compressed: bool,
}

macro_rules! data_formats {
    ($( $name:ident => ($bytes:expr, $bw:expr, $bh:expr, $components:expr, $numeric:ident, $aspect:ident, $compressed:expr) ),* $(,)?) => {
        /// Texel / vertex attribute format
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum DataFormat {
            $( $name, )*
        }

        impl DataFormat {
            /// Every declared format, in table order
            pub const ALL: &'static [DataFormat] = &[ $( DataFormat::$name, )* ];

            /// Static block layout of this format
            pub fn info(&self) -> FormatInfo {
                match self {
                    $( DataFormat::$name => FormatInfo {
                        block_bytes: $bytes,
                        block_width: $bw,
                        block_height: $bh,
                        components: $components,
                        numeric: NumericKind::$numeric,
                        aspect: FormatAspect::$aspect,
                        compressed: $compressed,
                    }, )*
                }
            }

            /// Table name (e.g. "R8G8B8A8_UNORM")
            pub fn name(&self) -> &'static str {
                match self {
                    $( DataFormat::$name => stringify!($name), )*
                }
            }
        }
    };
}

data_formats! {
    // 8-bit
    R8_UNORM                => (1, 1, 1, 1, Unorm, Color, false),
    R8_SNORM                => (1, 1, 1, 1, Snorm, Color, false),
    R8_UINT                 => (1, 1, 1, 1, Uint, Color, false),
    R8_SINT                 => (1, 1, 1, 1, Sint, Color, false),
    R8G8_UNORM              => (2, 1, 1, 2, Unorm, Color, false),
    R8G8_UINT               => (2, 1, 1, 2, Uint, Color, false),
    R8G8B8A8_UNORM          => (4, 1, 1, 4, Unorm, Color, false),
    R8G8B8A8_SNORM          => (4, 1, 1, 4, Snorm, Color, false),
    R8G8B8A8_UINT           => (4, 1, 1, 4, Uint, Color, false),
    R8G8B8A8_SINT           => (4, 1, 1, 4, Sint, Color, false),
    R8G8B8A8_SRGB           => (4, 1, 1, 4, Srgb, Color, false),
    B8G8R8A8_UNORM          => (4, 1, 1, 4, Unorm, Color, false),
    B8G8R8A8_SRGB           => (4, 1, 1, 4, Srgb, Color, false),
    A2B10G10R10_UNORM_PACK32 => (4, 1, 1, 4, Unorm, Color, false),

    // 16-bit
    R16_UNORM               => (2, 1, 1, 1, Unorm, Color, false),
    R16_UINT                => (2, 1, 1, 1, Uint, Color, false),
    R16_SFLOAT              => (2, 1, 1, 1, Float, Color, false),
    R16G16_UINT             => (4, 1, 1, 2, Uint, Color, false),
    R16G16_SFLOAT           => (4, 1, 1, 2, Float, Color, false),
    R16G16B16A16_UNORM      => (8, 1, 1, 4, Unorm, Color, false),
    R16G16B16A16_UINT       => (8, 1, 1, 4, Uint, Color, false),
    R16G16B16A16_SFLOAT     => (8, 1, 1, 4, Float, Color, false),

    // 32-bit
    R32_UINT                => (4, 1, 1, 1, Uint, Color, false),
    R32_SINT                => (4, 1, 1, 1, Sint, Color, false),
    R32_SFLOAT              => (4, 1, 1, 1, Float, Color, false),
    R32G32_UINT             => (8, 1, 1, 2, Uint, Color, false),
    R32G32_SFLOAT           => (8, 1, 1, 2, Float, Color, false),
    R32G32B32_UINT          => (12, 1, 1, 3, Uint, Color, false),
    R32G32B32_SFLOAT        => (12, 1, 1, 3, Float, Color, false),
    R32G32B32A32_UINT       => (16, 1, 1, 4, Uint, Color, false),
    R32G32B32A32_SINT       => (16, 1, 1, 4, Sint, Color, false),
    R32G32B32A32_SFLOAT     => (16, 1, 1, 4, Float, Color, false),

    // Packed float
    B10G11R11_UFLOAT_PACK32 => (4, 1, 1, 3, Float, Color, false),
    E5B9G9R9_UFLOAT_PACK32  => (4, 1, 1, 3, Float, Color, false),

    // Depth / stencil
    D16_UNORM               => (2, 1, 1, 1, Unorm, Depth, false),
    X8_D24_UNORM_PACK32     => (4, 1, 1, 1, Unorm, Depth, false),
    D32_SFLOAT              => (4, 1, 1, 1, Float, Depth, false),
    S8_UINT                 => (1, 1, 1, 1, Uint, Stencil, false),
    D16_UNORM_S8_UINT       => (4, 1, 1, 2, Unorm, DepthStencil, false),
    D24_UNORM_S8_UINT       => (4, 1, 1, 2, Unorm, DepthStencil, false),
    D32_SFLOAT_S8_UINT      => (8, 1, 1, 2, Float, DepthStencil, false),

    // Block compressed
    BC1_RGB_UNORM_BLOCK     => (8, 4, 4, 3, Unorm, Color, true),
    BC1_RGBA_UNORM_BLOCK    => (8, 4, 4, 4, Unorm, Color, true),
    BC1_RGBA_SRGB_BLOCK     => (8, 4, 4, 4, Srgb, Color, true),
    BC2_UNORM_BLOCK         => (16, 4, 4, 4, Unorm, Color, true),
    BC3_UNORM_BLOCK         => (16, 4, 4, 4, Unorm, Color, true),
    BC3_SRGB_BLOCK          => (16, 4, 4, 4, Srgb, Color, true),
    BC4_UNORM_BLOCK         => (8, 4, 4, 1, Unorm, Color, true),
    BC5_UNORM_BLOCK         => (16, 4, 4, 2, Unorm, Color, true),
    BC6H_UFLOAT_BLOCK       => (16, 4, 4, 3, Float, Color, true),
    BC7_UNORM_BLOCK         => (16, 4, 4, 4, Unorm, Color, true),
    BC7_SRGB_BLOCK          => (16, 4, 4, 4, Srgb, Color, true),
    ETC2_R8G8B8_UNORM_BLOCK => (8, 4, 4, 3, Unorm, Color, true),
    ETC2_R8G8B8A8_UNORM_BLOCK => (16, 4, 4, 4, Unorm, Color, true),
    ASTC_4x4_UNORM_BLOCK    => (16, 4, 4, 4, Unorm, Color, true),
    ASTC_8x8_UNORM_BLOCK    => (16, 8, 8, 4, Unorm, Color, true),
}

impl DataFormat {
    pub fn is_compressed(&self) -> bool {
        self.info().compressed
    }

    pub fn is_color(&self) -> bool {
        self.info().aspect == FormatAspect::Color
    }

    /// True for depth, stencil and combined depth/stencil formats
    pub fn is_depth_stencil(&self) -> bool {
        !self.is_color()
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self.info().aspect, FormatAspect::Stencil | FormatAspect::DepthStencil)
    }

    /// Integer formats cannot be linearly filtered or blended
    pub fn is_integer(&self) -> bool {
        matches!(self.info().numeric, NumericKind::Uint | NumericKind::Sint)
    }

    pub fn block_bytes(&self) -> u32 {
        self.info().block_bytes
    }

    /// Two formats can alias the same memory when their blocks have the same
    /// shape and size and they share an aspect
    pub fn is_view_compatible(&self, other: DataFormat) -> bool {
        let a = self.info();
        let b = other.info();
        a.block_bytes == b.block_bytes
            && a.block_width == b.block_width
            && a.block_height == b.block_height
            && a.aspect == b.aspect
    }
}

// ===== SIZE HELPERS =====

/// Byte size of one mip level
///
/// # Arguments
///
/// * `format` - Texel format
/// * `width`, `height`, `depth` - Mip level dimensions in texels
pub fn image_size(format: DataFormat, width: u32, height: u32, depth: u32) -> u64 {
    let info = format.info();
    let blocks_x = width.max(1).div_ceil(info.block_width) as u64;
    let blocks_y = height.max(1).div_ceil(info.block_height) as u64;
    blocks_x * blocks_y * depth.max(1) as u64 * info.block_bytes as u64
}

/// Dimensions of mip level `level` of a `width x height x depth` image
pub fn mip_dimensions(width: u32, height: u32, depth: u32, level: u32) -> (u32, u32, u32) {
    (
        (width >> level).max(1),
        (height >> level).max(1),
        (depth >> level).max(1),
    )
}

/// Byte size of one array layer including all `mipmaps` levels
pub fn texture_layer_size(format: DataFormat, width: u32, height: u32, depth: u32, mipmaps: u32) -> u64 {
    (0..mipmaps.max(1))
        .map(|level| {
            let (w, h, d) = mip_dimensions(width, height, depth, level);
            image_size(format, w, h, d)
        })
        .sum()
}

/// Byte offset of mip `level` inside a layer
pub fn mip_offset(format: DataFormat, width: u32, height: u32, depth: u32, level: u32) -> u64 {
    (0..level)
        .map(|l| {
            let (w, h, d) = mip_dimensions(width, height, depth, l);
            image_size(format, w, h, d)
        })
        .sum()
}

/// Length of the full mip chain for the given dimensions
pub fn max_mipmaps(width: u32, height: u32, depth: u32) -> u32 {
    let largest = width.max(height).max(depth).max(1);
    32 - largest.leading_zeros()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
