//! Integration tests for texture transfers on the software backend
//!
//! Texel contents are read back through `texture_get_data`, so these tests
//! check what actually lands in memory: initial zeroing, updates, clears,
//! copies, aliases writing through to their source and deferred release.
//!
//! Run with: cargo test --test texture_integration_tests

mod test_utils;

use galaxy_3d_rendering_device::galaxy3d::Error;
use galaxy_3d_rendering_device::galaxy3d::device::format::texture_layer_size;
use galaxy_3d_rendering_device::galaxy3d::device::{
    DataFormat, FinalAction, InitialAction, MemoryType, TextureDesc, TextureSliceType, TextureType,
    TextureUsage, TextureView,
};
use galaxy_3d_rendering_device::glam::{UVec3, Vec4};
use galaxy_3d_rendering_device::galaxy3d::RenderingDevice;
use galaxy_3d_rendering_device::galaxy3d::device::Handle;
use test_utils::*;

fn texels(data: &[u8]) -> Vec<[u8; 4]> {
    data.chunks_exact(4).map(|t| [t[0], t[1], t[2], t[3]]).collect()
}

fn copyable_texture(device: &mut RenderingDevice, format: DataFormat, size: u32, data: Option<Vec<u8>>) -> Handle {
    let usage = TextureUsage::SAMPLING | TextureUsage::CAN_COPY_FROM | TextureUsage::CAN_COPY_TO | TextureUsage::CAN_UPDATE;
    let desc = TextureDesc::texture_2d(format, size, size, usage);
    let data: Vec<Vec<u8>> = data.into_iter().collect();
    device.texture_create(&desc, &TextureView::default(), &data).unwrap()
}

// ============================================================================
// CREATION AND UPDATES
// ============================================================================

#[test]
fn test_integration_new_texture_reads_back_zeroed() {
    let mut device = local_device();
    let texture = rgba8_target(&mut device, 4, 4);

    let data = device.texture_get_data(texture, 0).unwrap();
    assert_eq!(data.len(), 64);
    assert!(data.iter().all(|b| *b == 0));
}

#[test]
fn test_integration_zeroed_update_reads_back() {
    let mut device = local_device();
    let texture = rgba8_target(&mut device, 4, 4);
    device.texture_clear(texture, Vec4::ONE, 0, 1, 0, 1).unwrap();

    device.texture_update(texture, 0, &[0u8; 64]).unwrap();
    assert_eq!(device.texture_get_data(texture, 0).unwrap(), vec![0u8; 64]);
}

#[test]
fn test_integration_texture_initial_data_and_update() {
    let mut device = local_device();
    let desc = TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, 2, 2, readable_target_usage());
    let initial: Vec<u8> = (0..16).collect();
    let texture = device.texture_create(&desc, &TextureView::default(), &[initial.clone()]).unwrap();
    assert_eq!(device.texture_get_data(texture, 0).unwrap(), initial);

    let updated = vec![7u8; 16];
    device.texture_update(texture, 0, &updated).unwrap();
    assert_eq!(device.texture_get_data(texture, 0).unwrap(), updated);
}

#[test]
fn test_integration_mipmapped_layer_holds_whole_chain() {
    let mut device = local_device();
    let mut desc = TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, 4, 4, readable_target_usage());
    desc.mipmaps = 3;
    let texture = device.texture_create(&desc, &TextureView::default(), &[]).unwrap();

    let expected = texture_layer_size(DataFormat::R8G8B8A8_UNORM, 4, 4, 1, 3);
    assert_eq!(expected, 64 + 16 + 4);
    assert_eq!(device.texture_get_data(texture, 0).unwrap().len() as u64, expected);
}

#[test]
fn test_integration_update_with_wrong_size_is_rejected() {
    let mut device = local_device();
    let texture = rgba8_target(&mut device, 4, 4);
    let result = device.texture_update(texture, 0, &[0u8; 63]);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

// ============================================================================
// CLEARS
// ============================================================================

#[test]
fn test_integration_texture_clear_writes_every_texel() {
    let mut device = local_device();
    let texture = rgba8_target(&mut device, 4, 4);

    device.texture_clear(texture, Vec4::new(1.0, 0.0, 0.0, 1.0), 0, 1, 0, 1).unwrap();

    let data = device.texture_get_data(texture, 0).unwrap();
    assert!(texels(&data).iter().all(|t| *t == [255, 0, 0, 255]));
}

#[test]
fn test_integration_draw_list_clear_visible_after_sync() {
    let mut device = local_device();
    let setup = draw_setup(&mut device);

    begin_clear(&mut device, setup.framebuffer, Vec4::new(0.0, 0.0, 1.0, 1.0));
    device.draw_list_end().unwrap();

    // Lists run at submission, the target is untouched until then
    let before = device.texture_get_data(setup.target, 0).unwrap();
    assert!(before.iter().all(|b| *b == 0));

    device.submit().unwrap();
    device.sync().unwrap();

    let after = device.texture_get_data(setup.target, 0).unwrap();
    assert!(texels(&after).iter().all(|t| *t == [0, 0, 255, 255]));
}

#[test]
fn test_integration_draw_list_load_keeps_contents() {
    let mut device = local_device();
    let setup = draw_setup(&mut device);
    let pattern: Vec<u8> = (0..64).collect();
    device.texture_update(setup.target, 0, &pattern).unwrap();

    let list = device
        .draw_list_begin(
            setup.framebuffer,
            InitialAction::Load,
            FinalAction::Store,
            InitialAction::Discard,
            FinalAction::Discard,
            &[Vec4::ONE],
            1.0,
            0,
            None,
        )
        .unwrap();
    record_triangle(&mut device, list, &setup);
    device.draw_list_end().unwrap();
    device.submit().unwrap();
    device.sync().unwrap();

    assert_eq!(device.texture_get_data(setup.target, 0).unwrap(), pattern);
}

// ============================================================================
// COPIES
// ============================================================================

#[test]
fn test_integration_texture_copy_region() {
    let mut device = local_device();
    let source = rgba8_target(&mut device, 4, 4);
    let destination = rgba8_target(&mut device, 4, 4);
    device.texture_clear(source, Vec4::new(0.0, 1.0, 0.0, 1.0), 0, 1, 0, 1).unwrap();

    device
        .texture_copy(source, destination, UVec3::ZERO, UVec3::new(2, 2, 0), UVec3::new(2, 2, 1), 0, 0, 0, 0)
        .unwrap();

    let data = texels(&device.texture_get_data(destination, 0).unwrap());
    for y in 0..4 {
        for x in 0..4 {
            let expected = if x >= 2 && y >= 2 { [0, 255, 0, 255] } else { [0, 0, 0, 0] };
            assert_eq!(data[y * 4 + x], expected, "texel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_integration_compressed_copy_moves_whole_blocks() {
    let mut device = local_device();
    let data: Vec<u8> = (0..32).collect();
    let source = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 8, Some(data));
    let destination = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 8, None);

    // Block (1, 1) of the source into block (0, 0) of the destination
    device
        .texture_copy(source, destination, UVec3::new(4, 4, 0), UVec3::ZERO, UVec3::new(4, 4, 1), 0, 0, 0, 0)
        .unwrap();

    let copied = device.texture_get_data(destination, 0).unwrap();
    assert_eq!(&copied[..8], &(24..32).collect::<Vec<u8>>()[..]);
    assert!(copied[8..].iter().all(|b| *b == 0));
}

#[test]
fn test_integration_compressed_copy_may_end_on_mip_edge() {
    let mut device = local_device();
    // 6x6 BC1 is 2x2 blocks, the last block column and row are partial
    let source = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 6, Some(vec![0xAB; 32]));
    let destination = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 6, None);

    device
        .texture_copy(source, destination, UVec3::new(4, 4, 0), UVec3::new(4, 4, 0), UVec3::new(2, 2, 1), 0, 0, 0, 0)
        .unwrap();

    let copied = device.texture_get_data(destination, 0).unwrap();
    assert!(copied[..24].iter().all(|b| *b == 0));
    assert_eq!(&copied[24..], &[0xAB; 8]);
}

#[test]
fn test_integration_unaligned_compressed_copy_is_rejected() {
    let mut device = local_device();
    let source = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 8, Some(vec![0xAB; 32]));
    let destination = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 8, None);

    // x = 3, width 2 straddles two blocks
    let straddling = device.texture_copy(source, destination, UVec3::new(3, 0, 0), UVec3::ZERO, UVec3::new(2, 4, 1), 0, 0, 0, 0);
    assert!(matches!(straddling, Err(Error::InvalidParameter(_))));

    // Partial block that does not reach the mip edge
    let partial = device.texture_copy(source, destination, UVec3::ZERO, UVec3::ZERO, UVec3::new(2, 2, 1), 0, 0, 0, 0);
    assert!(matches!(partial, Err(Error::InvalidParameter(_))));

    assert!(device.texture_get_data(destination, 0).unwrap().iter().all(|b| *b == 0));
}

#[test]
fn test_integration_copy_between_block_shapes_is_rejected() {
    let mut device = local_device();
    // Both formats use 8-byte blocks, but BC1 blocks cover 4x4 texels
    let source = copyable_texture(&mut device, DataFormat::BC1_RGBA_UNORM_BLOCK, 8, Some(vec![0xAB; 32]));
    let destination = copyable_texture(&mut device, DataFormat::R16G16B16A16_UNORM, 4, None);

    let result = device.texture_copy(source, destination, UVec3::ZERO, UVec3::ZERO, UVec3::new(4, 4, 1), 0, 0, 0, 0);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
    assert!(device.texture_get_data(destination, 0).unwrap().iter().all(|b| *b == 0));
}

// ============================================================================
// ALIASES
// ============================================================================

#[test]
fn test_integration_slice_alias_writes_through_to_source() {
    let mut device = local_device();
    let mut desc = TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, 2, 2, readable_target_usage());
    desc.texture_type = TextureType::Type2DArray;
    desc.array_layers = 2;
    let array = device.texture_create(&desc, &TextureView::default(), &[]).unwrap();

    let slice = device
        .texture_create_shared_from_slice(&TextureView::default(), array, 1, 0, 1, TextureSliceType::Slice2D)
        .unwrap();
    assert!(device.texture_is_shared(slice));

    device.texture_update(slice, 0, &[9u8; 16]).unwrap();

    assert_eq!(device.texture_get_data(array, 0).unwrap(), vec![0u8; 16]);
    assert_eq!(device.texture_get_data(array, 1).unwrap(), vec![9u8; 16]);
    assert_eq!(device.texture_get_data(slice, 0).unwrap(), vec![9u8; 16]);
}

#[test]
fn test_integration_freeing_source_invalidates_alias() {
    let mut device = local_device();
    let texture = rgba8_target(&mut device, 4, 4);
    let alias = device.texture_create_shared(&TextureView::default(), texture).unwrap();

    device.free(texture).unwrap();

    assert!(!device.texture_is_valid(texture));
    assert!(!device.texture_is_valid(alias));
    assert!(matches!(device.texture_get_data(alias, 0), Err(Error::InvalidHandle(_))));
}

// ============================================================================
// MEMORY
// ============================================================================

#[test]
fn test_integration_texture_memory_released_after_sync() {
    let mut device = local_device();
    let baseline = device.memory_usage(MemoryType::Textures);

    let texture = rgba8_target(&mut device, 4, 4);
    assert_eq!(device.memory_usage(MemoryType::Textures), baseline + 64);

    device.free(texture).unwrap();
    device.submit().unwrap();
    device.sync().unwrap();

    assert_eq!(device.memory_usage(MemoryType::Textures), baseline);
}

#[test]
fn test_integration_texture_over_budget_is_out_of_memory() {
    let mut device = local_device_with_budget(100);
    rgba8_target(&mut device, 4, 4);

    let desc = TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, 4, 4, readable_target_usage());
    let result = device.texture_create(&desc, &TextureView::default(), &[]);
    assert_eq!(result, Err(Error::OutOfMemory));
}
