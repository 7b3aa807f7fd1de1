use super::*;
use galaxy_3d_rendering_device::galaxy3d::Error;
use galaxy_3d_rendering_device::galaxy3d::device::{TextureType, TextureUsage};

fn rgba8(width: u32, height: u32, mipmaps: u32) -> TextureDesc {
    TextureDesc {
        mipmaps,
        ..TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, width, height, TextureUsage::SAMPLING)
    }
}

#[test]
fn test_new_texture_is_zeroed_without_data() {
    let texture = SoftTexture::new(&rgba8(4, 4, 1), &[]);
    assert_eq!(texture.layers.len(), 1);
    assert_eq!(texture.layers[0], vec![0u8; 64]);
    assert_eq!(texture.byte_size(), 64);
}

#[test]
fn test_layer_holds_whole_mip_chain() {
    let texture = SoftTexture::new(&rgba8(4, 4, 3), &[]);
    // 4x4 + 2x2 + 1x1 texels
    assert_eq!(texture.layer_size(), (16 + 4 + 1) * 4);
    assert_eq!(texture.mip_range(1), 64..80);
    assert_eq!(texture.mip_range(2), 80..84);
    assert_eq!(texture.mip_extent(2), UVec3::new(1, 1, 1));
}

#[test]
fn test_initial_data_fills_each_layer() {
    let desc = TextureDesc {
        array_layers: 2,
        texture_type: TextureType::Type2DArray,
        ..rgba8(2, 2, 1)
    };
    let texture = SoftTexture::new(&desc, &[vec![1; 16], vec![2; 16]]);
    assert_eq!(texture.layers[0], vec![1; 16]);
    assert_eq!(texture.layers[1], vec![2; 16]);
}

#[test]
fn test_read_region_packs_rows() {
    let data: Vec<u8> = (0..64).collect();
    let texture = SoftTexture::new(&rgba8(4, 4, 1), &[data]);
    let region = texture.read_region(0, 0, UVec3::new(1, 1, 0), UVec3::new(2, 2, 1));
    // Texels (1,1) (2,1) then (1,2) (2,2)
    let expected: Vec<u8> = (20..28).chain(36..44).collect();
    assert_eq!(region, expected);
}

#[test]
fn test_write_region_only_touches_region() {
    let mut texture = SoftTexture::new(&rgba8(4, 4, 1), &[]);
    texture.write_region(0, 0, UVec3::new(3, 3, 0), UVec3::new(1, 1, 1), &[9, 9, 9, 9]).unwrap();
    assert_eq!(&texture.layers[0][60..64], &[9, 9, 9, 9]);
    assert!(texture.layers[0][..60].iter().all(|b| *b == 0));
}

#[test]
fn test_write_region_rejects_mismatched_byte_count() {
    let mut texture = SoftTexture::new(&rgba8(4, 4, 1), &[vec![5; 64]]);
    // 4x4 RGBA8 texels need 64 bytes; 8-byte blocks of a 4x4 BC1 region do not fit
    let result = texture.write_region(0, 0, UVec3::ZERO, UVec3::new(4, 4, 1), &[0xAB; 8]);
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(texture.layers[0], vec![5; 64]);
}

#[test]
fn test_fill_mip_leaves_other_levels() {
    let mut texture = SoftTexture::new(&rgba8(4, 4, 2), &[]);
    texture.fill_mip(0, 1, &[1, 2, 3, 4]).unwrap();
    assert!(texture.layers[0][..64].iter().all(|b| *b == 0));
    assert_eq!(&texture.layers[0][64..80], [1, 2, 3, 4].repeat(4).as_slice());
}

#[test]
fn test_compressed_regions_use_blocks() {
    let desc = TextureDesc::texture_2d(DataFormat::BC1_RGBA_UNORM_BLOCK, 8, 8, TextureUsage::SAMPLING);
    let data: Vec<u8> = (0..32).collect();
    let texture = SoftTexture::new(&desc, &[data]);
    // Second block of the second block row
    let block = texture.read_region(0, 0, UVec3::new(4, 4, 0), UVec3::new(4, 4, 1));
    assert_eq!(block, (24..32).collect::<Vec<u8>>());
}

#[test]
fn test_resolve_copies_base_level() {
    let desc = TextureDesc {
        samples: galaxy_3d_rendering_device::galaxy3d::device::TextureSamples::X4,
        ..rgba8(2, 2, 1)
    };
    let source = SoftTexture::new(&desc, &[vec![7; 16]]);
    let mut target = SoftTexture::new(&rgba8(2, 2, 1), &[]);
    source.resolve_into(&mut target);
    assert_eq!(target.layers[0], vec![7; 16]);
}

#[test]
fn test_encode_unorm_and_bgra() {
    let color = Vec4::new(1.0, 0.0, 0.5, 1.0);
    assert_eq!(encode_color(DataFormat::R8G8B8A8_UNORM, color), Some(vec![255, 0, 128, 255]));
    assert_eq!(encode_color(DataFormat::B8G8R8A8_UNORM, color), Some(vec![128, 0, 255, 255]));
    assert_eq!(encode_color(DataFormat::R8_UNORM, color), Some(vec![255]));
}

#[test]
fn test_encode_srgb_converts_color_channels_only() {
    let bytes = encode_color(DataFormat::R8G8B8A8_SRGB, Vec4::new(0.5, 0.0, 1.0, 0.5)).unwrap();
    assert_eq!(bytes[0], 188);
    assert_eq!(bytes[1], 0);
    assert_eq!(bytes[2], 255);
    assert_eq!(bytes[3], 128);
}

#[test]
fn test_encode_float_formats() {
    let bytes = encode_color(DataFormat::R32_SFLOAT, Vec4::splat(1.5)).unwrap();
    assert_eq!(bytes, 1.5f32.to_le_bytes().to_vec());

    let half = encode_color(DataFormat::R16_SFLOAT, Vec4::splat(1.0)).unwrap();
    assert_eq!(half, 0x3C00u16.to_le_bytes().to_vec());
}

#[test]
fn test_f16_edge_values() {
    assert_eq!(f32_to_f16(0.0), 0);
    assert_eq!(f32_to_f16(-2.0), 0xC000);
    assert_eq!(f32_to_f16(65536.0 * 2.0), 0x7C00);
    assert_eq!(f32_to_f16(f32::INFINITY), 0x7C00);
    assert_eq!(f32_to_f16(2.0f32.powi(-24)), 0x0001);
}

#[test]
fn test_encode_rejects_unencodable_formats() {
    assert_eq!(encode_color(DataFormat::BC1_RGBA_UNORM_BLOCK, Vec4::ONE), None);
    assert_eq!(encode_color(DataFormat::D32_SFLOAT, Vec4::ONE), None);
    assert_eq!(encode_color(DataFormat::E5B9G9R9_UFLOAT_PACK32, Vec4::ONE), None);
}

#[test]
fn test_encode_depth_stencil() {
    assert_eq!(encode_depth_stencil(DataFormat::D32_SFLOAT, 1.0, 0), Some(1.0f32.to_le_bytes().to_vec()));
    assert_eq!(encode_depth_stencil(DataFormat::D16_UNORM, 1.0, 0), Some(vec![0xFF, 0xFF]));
    assert_eq!(
        encode_depth_stencil(DataFormat::D24_UNORM_S8_UINT, 0.0, 3),
        Some(vec![0, 0, 0, 3])
    );
    assert_eq!(encode_depth_stencil(DataFormat::R8_UNORM, 1.0, 0), None);
}
