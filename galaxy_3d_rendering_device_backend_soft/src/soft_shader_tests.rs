use super::*;
use galaxy_3d_rendering_device::galaxy3d::Error;
use galaxy_3d_rendering_device::galaxy3d::device::ShaderStageFlags;
use crate::soft_spirv::{SpirvDescriptor, SpirvModuleBuilder};

fn graphics_spirv() -> ShaderSpirv {
    let vertex = SpirvModuleBuilder::new(ShaderStage::Vertex)
        .input(0)
        .input(2)
        .descriptor(0, 0, SpirvDescriptor::UniformBuffer)
        .push_constant(1)
        .build();
    let fragment = SpirvModuleBuilder::new(ShaderStage::Fragment)
        .output(0)
        .descriptor(0, 0, SpirvDescriptor::UniformBuffer)
        .descriptor(1, 0, SpirvDescriptor::CombinedImageSampler)
        .build();
    ShaderSpirv::new()
        .with_stage(ShaderStage::Vertex, vertex)
        .with_stage(ShaderStage::Fragment, fragment)
}

// ============================================================================
// Reflection
// ============================================================================

#[test]
fn test_reflect_vertex_inputs_and_fragment_outputs() {
    let reflection = reflect_shader(&graphics_spirv()).unwrap();
    assert_eq!(reflection.stages, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT);
    assert_eq!(reflection.vertex_input_mask, 0b101);
    assert_eq!(reflection.fragment_output_mask, 0b1);
    assert!(!reflection.is_compute());
}

#[test]
fn test_reflect_merges_stage_flags_per_binding() {
    let reflection = reflect_shader(&graphics_spirv()).unwrap();
    assert_eq!(reflection.sets.len(), 2);

    let ubo = reflection.set(0).unwrap().uniform(0).unwrap();
    assert_eq!(ubo.uniform_type, UniformType::UniformBuffer);
    assert_eq!(ubo.stages, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT);
    assert_eq!(ubo.length, 1);

    let texture = reflection.set(1).unwrap().uniform(0).unwrap();
    assert_eq!(texture.uniform_type, UniformType::SamplerWithTexture);
    assert_eq!(texture.stages, ShaderStageFlags::FRAGMENT);
}

#[test]
fn test_reflect_push_constant_size() {
    let reflection = reflect_shader(&graphics_spirv()).unwrap();
    assert_eq!(reflection.push_constant_size, 16);
}

#[test]
fn test_reflect_compute_local_size_and_storage_buffer() {
    let compute = SpirvModuleBuilder::new(ShaderStage::Compute)
        .local_size(8, 4, 1)
        .descriptor(0, 1, SpirvDescriptor::StorageBuffer)
        .build();
    let reflection = reflect_shader(&ShaderSpirv::new().with_stage(ShaderStage::Compute, compute)).unwrap();

    assert!(reflection.is_compute());
    assert_eq!(reflection.compute_local_size, [8, 4, 1]);
    let storage = reflection.set(0).unwrap().uniform(1).unwrap();
    assert_eq!(storage.uniform_type, UniformType::StorageBuffer);
    assert!(storage.writable);
}

#[test]
fn test_local_size_scan_stops_on_malformed_words() {
    let words = [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0, 0];
    assert_eq!(local_size(&words), None);
}

#[test]
fn test_reflect_rejects_non_spirv_bytecode() {
    let spirv = ShaderSpirv::new().with_stage(ShaderStage::Vertex, vec![0u8; 24]);
    assert!(matches!(reflect_shader(&spirv), Err(Error::InvalidParameter(_))));

    let short = ShaderSpirv::new().with_stage(ShaderStage::Vertex, vec![0u8; 6]);
    assert!(matches!(reflect_shader(&short), Err(Error::InvalidParameter(_))));
}

// ============================================================================
// Binary Blobs
// ============================================================================

#[test]
fn test_binary_keeps_name_and_stages() {
    let spirv = graphics_spirv();
    let blob = encode_binary(&spirv, "lit");
    assert_eq!(&blob[..4], b"GSB1");

    let (name, decoded) = decode_binary(&blob).unwrap();
    assert_eq!(name, "lit");
    assert_eq!(decoded.stage_flags(), spirv.stage_flags());
    assert_eq!(decoded.stage(ShaderStage::Fragment), spirv.stage(ShaderStage::Fragment));
}

#[test]
fn test_binary_rejects_foreign_and_truncated_blobs() {
    assert!(matches!(decode_binary(b"MOCK...."), Err(Error::InvalidParameter(_))));

    let blob = encode_binary(&graphics_spirv(), "lit");
    assert!(matches!(decode_binary(&blob[..blob.len() - 1]), Err(Error::InvalidParameter(_))));

    let mut trailing = blob.clone();
    trailing.push(0);
    assert!(matches!(decode_binary(&trailing), Err(Error::InvalidParameter(_))));
}

#[test]
fn test_binary_rejects_unknown_stage() {
    let mut blob = BINARY_MAGIC.to_vec();
    blob.extend_from_slice(&0u32.to_le_bytes());
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.push(42);
    blob.extend_from_slice(&0u32.to_le_bytes());
    assert!(matches!(decode_binary(&blob), Err(Error::InvalidParameter(_))));
}
