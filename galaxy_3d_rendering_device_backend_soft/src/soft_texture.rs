/// Host-memory texture storage
///
/// Every array layer is one contiguous blob holding its whole mip chain, laid
/// out exactly like the data accepted by `texture_create` (mip 0 first, then
/// each smaller level). Multisampled textures keep a single value per texel:
/// nothing is rasterized, so all samples of a texel always agree.

use glam::{UVec3, Vec4};
use galaxy_3d_rendering_device::device::format::{image_size, mip_dimensions, mip_offset, texture_layer_size};
use galaxy_3d_rendering_device::engine_bail;
use galaxy_3d_rendering_device::galaxy3d::Result;
use galaxy_3d_rendering_device::galaxy3d::device::{DataFormat, FormatAspect, NumericKind, TextureDesc};

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct SoftTexture {
    pub desc: TextureDesc,
    pub layers: Vec<Vec<u8>>,
    /// Wrapped application image: not counted as backend memory
    pub external: bool,
}

impl SoftTexture {
    /// Allocate a texture, filling layers from `data` (zeroed when absent)
    pub fn new(desc: &TextureDesc, data: &[Vec<u8>]) -> Self {
        let layer_size = Self::layer_size_of(desc);
        let layers = (0..desc.array_layers.max(1) as usize)
            .map(|layer| {
                let mut bytes = vec![0u8; layer_size];
                if let Some(src) = data.get(layer) {
                    let len = src.len().min(layer_size);
                    bytes[..len].copy_from_slice(&src[..len]);
                }
                bytes
            })
            .collect();
        Self { desc: desc.clone(), layers, external: false }
    }

    fn layer_size_of(desc: &TextureDesc) -> usize {
        texture_layer_size(desc.format, desc.width, desc.height, desc.depth, desc.mipmaps) as usize
    }

    pub fn layer_size(&self) -> usize {
        Self::layer_size_of(&self.desc)
    }

    /// Bytes held by the texture
    pub fn byte_size(&self) -> u64 {
        self.layers.iter().map(|layer| layer.len() as u64).sum()
    }

    /// Dimensions of mip `level` in texels
    pub fn mip_extent(&self, level: u32) -> UVec3 {
        let (w, h, d) = mip_dimensions(self.desc.width, self.desc.height, self.desc.depth, level);
        UVec3::new(w, h, d)
    }

    /// Byte range of mip `level` inside a layer blob
    pub fn mip_range(&self, level: u32) -> std::ops::Range<usize> {
        let d = &self.desc;
        let start = mip_offset(d.format, d.width, d.height, d.depth, level) as usize;
        let extent = self.mip_extent(level);
        start..start + image_size(d.format, extent.x, extent.y, extent.z) as usize
    }

    /// Offset of the block row starting at texel (x, y, z) of mip `level`
    fn block_offset(&self, level: u32, x: u32, y: u32, z: u32) -> usize {
        let info = self.desc.format.info();
        let extent = self.mip_extent(level);
        let blocks_w = extent.x.div_ceil(info.block_width) as usize;
        let blocks_h = extent.y.div_ceil(info.block_height) as usize;
        let bx = (x / info.block_width) as usize;
        let by = (y / info.block_height) as usize;
        self.mip_range(level).start + ((z as usize * blocks_h + by) * blocks_w + bx) * info.block_bytes as usize
    }

    /// Number of blocks and bytes per block row covering `size` texels
    fn region_blocks(&self, size: UVec3) -> (usize, usize, usize) {
        let info = self.desc.format.info();
        let row_blocks = size.x.div_ceil(info.block_width) as usize;
        let rows = size.y.div_ceil(info.block_height) as usize;
        (row_blocks * info.block_bytes as usize, rows, size.z.max(1) as usize)
    }

    /// Copy a region out of one mip level, block rows packed tightly
    pub fn read_region(&self, layer: u32, level: u32, from: UVec3, size: UVec3) -> Vec<u8> {
        let info = self.desc.format.info();
        let (row_bytes, rows, slices) = self.region_blocks(size);
        let blob = &self.layers[layer as usize];
        let mut out = Vec::with_capacity(row_bytes * rows * slices);
        for z in 0..slices as u32 {
            for row in 0..rows as u32 {
                let start = self.block_offset(level, from.x, from.y + row * info.block_height, from.z + z);
                out.extend_from_slice(&blob[start..start + row_bytes]);
            }
        }
        out
    }

    /// Write tightly packed block rows (as produced by `read_region`)
    ///
    /// `bytes` must cover the region exactly in this texture's block layout.
    pub fn write_region(&mut self, layer: u32, level: u32, to: UVec3, size: UVec3, bytes: &[u8]) -> Result<()> {
        let info = self.desc.format.info();
        let (row_bytes, rows, slices) = self.region_blocks(size);
        let expected = row_bytes * rows * slices;
        if bytes.len() != expected {
            engine_bail!("galaxy3d::SoftBackend", BackendError,
                "Region {} of {:?} needs {} bytes, got {}", size, self.desc.format, expected, bytes.len());
        }
        let mut chunks = bytes.chunks_exact(row_bytes);
        for z in 0..slices as u32 {
            for row in 0..rows as u32 {
                let start = self.block_offset(level, to.x, to.y + row * info.block_height, to.z + z);
                if let Some(chunk) = chunks.next() {
                    self.layers[layer as usize][start..start + row_bytes].copy_from_slice(chunk);
                }
            }
        }
        Ok(())
    }

    /// Repeat one encoded texel over a region of an uncompressed mip level
    pub fn fill_region(&mut self, layer: u32, level: u32, from: UVec3, size: UVec3, texel: &[u8]) -> Result<()> {
        let (row_bytes, rows, slices) = self.region_blocks(size);
        let row: Vec<u8> = texel.iter().copied().cycle().take(row_bytes).collect();
        let packed: Vec<u8> = row.repeat(rows * slices);
        self.write_region(layer, level, from, size, &packed)
    }

    /// Repeat one encoded texel over a whole mip level
    pub fn fill_mip(&mut self, layer: u32, level: u32, texel: &[u8]) -> Result<()> {
        let extent = self.mip_extent(level);
        self.fill_region(layer, level, UVec3::ZERO, extent, texel)
    }

    /// Copy level 0 of every layer into `into` (single sampled, same size)
    pub fn resolve_into(&self, into: &mut SoftTexture) {
        let range = self.mip_range(0);
        let dst_range = into.mip_range(0);
        let len = range.len().min(dst_range.len());
        for (src, dst) in self.layers.iter().zip(into.layers.iter_mut()) {
            dst[dst_range.start..dst_range.start + len].copy_from_slice(&src[range.start..range.start + len]);
        }
    }
}

// ============================================================================
// Texel Encoding
// ============================================================================

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// IEEE 754 binary16 bits of `value` (mantissa truncated)
pub(crate) fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;

    if exponent == 0xFF {
        let nan = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7C00 | nan;
    }
    let half_exponent = exponent - 127 + 15;
    if half_exponent >= 0x1F {
        return sign | 0x7C00;
    }
    if half_exponent <= 0 {
        if half_exponent < -10 {
            return sign;
        }
        let full = mantissa | 0x0080_0000;
        return sign | (full >> (14 - half_exponent) as u32) as u16;
    }
    sign | ((half_exponent as u16) << 10) | (mantissa >> 13) as u16
}

/// Bytes of one texel of `format` holding `color`
///
/// Returns `None` for compressed, depth/stencil and shared-exponent formats.
pub(crate) fn encode_color(format: DataFormat, color: Vec4) -> Option<Vec<u8>> {
    let info = format.info();
    if info.compressed || info.aspect != FormatAspect::Color {
        return None;
    }

    match format {
        DataFormat::B8G8R8A8_UNORM | DataFormat::B8G8R8A8_SRGB => {
            let rgba = encode_color(
                if format == DataFormat::B8G8R8A8_SRGB { DataFormat::R8G8B8A8_SRGB } else { DataFormat::R8G8B8A8_UNORM },
                color,
            )?;
            return Some(vec![rgba[2], rgba[1], rgba[0], rgba[3]]);
        }
        DataFormat::A2B10G10R10_UNORM_PACK32 => {
            let c = color.clamp(Vec4::ZERO, Vec4::ONE);
            let r = (c.x * 1023.0).round() as u32;
            let g = (c.y * 1023.0).round() as u32;
            let b = (c.z * 1023.0).round() as u32;
            let a = (c.w * 3.0).round() as u32;
            return Some((r | (g << 10) | (b << 20) | (a << 30)).to_le_bytes().to_vec());
        }
        DataFormat::B10G11R11_UFLOAT_PACK32 | DataFormat::E5B9G9R9_UFLOAT_PACK32 => return None,
        _ => {}
    }

    let components = info.components as usize;
    let width = (info.block_bytes / info.components) as usize;
    let channels = color.to_array();
    let mut out = Vec::with_capacity(info.block_bytes as usize);
    for (index, c) in channels.iter().copied().take(components).enumerate() {
        match (info.numeric, width) {
            (NumericKind::Unorm, 1) => out.push((c.clamp(0.0, 1.0) * 255.0).round() as u8),
            (NumericKind::Srgb, 1) => {
                let c = if index < 3 { linear_to_srgb(c.clamp(0.0, 1.0)) } else { c.clamp(0.0, 1.0) };
                out.push((c * 255.0).round() as u8);
            }
            (NumericKind::Snorm, 1) => out.push(((c.clamp(-1.0, 1.0) * 127.0).round() as i8) as u8),
            (NumericKind::Uint, 1) => out.push(c as u8),
            (NumericKind::Sint, 1) => out.push((c as i8) as u8),
            (NumericKind::Unorm, 2) => out.extend_from_slice(&((c.clamp(0.0, 1.0) * 65535.0).round() as u16).to_le_bytes()),
            (NumericKind::Snorm, 2) => out.extend_from_slice(&((c.clamp(-1.0, 1.0) * 32767.0).round() as i16).to_le_bytes()),
            (NumericKind::Uint, 2) => out.extend_from_slice(&(c as u16).to_le_bytes()),
            (NumericKind::Sint, 2) => out.extend_from_slice(&(c as i16).to_le_bytes()),
            (NumericKind::Float, 2) => out.extend_from_slice(&f32_to_f16(c).to_le_bytes()),
            (NumericKind::Uint, 4) => out.extend_from_slice(&(c as u32).to_le_bytes()),
            (NumericKind::Sint, 4) => out.extend_from_slice(&(c as i32).to_le_bytes()),
            (NumericKind::Float, 4) => out.extend_from_slice(bytemuck::bytes_of(&c)),
            _ => return None,
        }
    }
    Some(out)
}

/// Bytes of one texel of a depth/stencil `format`
pub(crate) fn encode_depth_stencil(format: DataFormat, depth: f32, stencil: u32) -> Option<Vec<u8>> {
    let depth = depth.clamp(0.0, 1.0);
    let stencil = stencil.min(0xFF);
    let bytes = match format {
        DataFormat::D16_UNORM => ((depth * 65535.0).round() as u16).to_le_bytes().to_vec(),
        DataFormat::X8_D24_UNORM_PACK32 => ((depth * 16_777_215.0).round() as u32).to_le_bytes().to_vec(),
        DataFormat::D32_SFLOAT => depth.to_le_bytes().to_vec(),
        DataFormat::S8_UINT => vec![stencil as u8],
        DataFormat::D16_UNORM_S8_UINT => {
            let mut bytes = ((depth * 65535.0).round() as u16).to_le_bytes().to_vec();
            bytes.extend_from_slice(&[stencil as u8, 0]);
            bytes
        }
        DataFormat::D24_UNORM_S8_UINT => {
            let d24 = (depth * 16_777_215.0).round() as u32;
            (d24 | (stencil << 24)).to_le_bytes().to_vec()
        }
        DataFormat::D32_SFLOAT_S8_UINT => {
            let mut bytes = depth.to_le_bytes().to_vec();
            bytes.extend_from_slice(&[stencil as u8, 0, 0, 0]);
            bytes
        }
        _ => return None,
    };
    Some(bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "soft_texture_tests.rs"]
mod tests;
