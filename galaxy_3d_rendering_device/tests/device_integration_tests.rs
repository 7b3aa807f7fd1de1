//! Integration tests for the rendering device facade on the software backend
//!
//! Covers device queries, frame pacing on the primary device, captured
//! timestamps, resource naming, cascading frees and shader binaries.
//!
//! Run with: cargo test --test device_integration_tests

mod test_utils;

use galaxy_3d_rendering_device::galaxy3d::device::{
    DeviceLimits, Limit, ResourceKind, ShaderLanguage, ShaderStage, ShaderStageFlags, TextureSamples,
};
use galaxy_3d_rendering_device::galaxy3d::{DeviceConfig, Error, RenderingDevice};
use galaxy_3d_rendering_device::glam::Vec4;
use galaxy_3d_rendering_device_backend_soft::{SoftBackend, SoftBackendConfig};
use test_utils::*;

// ============================================================================
// DEVICE QUERIES
// ============================================================================

#[test]
fn test_integration_device_identity_from_backend() {
    let device = primary_device();
    assert_eq!(device.get_device_name(), "Galaxy3D Software Device");
    assert_eq!(device.get_device_vendor_name(), "Galaxy3D");
    assert_eq!(device.get_device_api_version(), (1, 0, 0));
    assert!(!device.get_device_pipeline_cache_uuid().is_empty());
    assert!(!device.is_local());
    assert_eq!(device.frame_delay(), 2);
}

#[test]
fn test_integration_custom_backend_limits_are_reported() {
    let mut limits = DeviceLimits::default();
    limits.set(Limit::MaxPushConstantSize, 256);
    let backend = SoftBackend::new(SoftBackendConfig {
        device_name: "Tiny".to_string(),
        limits,
        ..Default::default()
    });
    let device = RenderingDevice::new(Box::new(backend), DeviceConfig::default()).unwrap();

    assert_eq!(device.get_device_name(), "Tiny");
    assert_eq!(device.limit_get(Limit::MaxPushConstantSize), 256);
    assert_eq!(device.limit_get(Limit::MaxTextureSize2D), 16384);
}

#[test]
fn test_integration_invalid_frame_delay_is_rejected() {
    let config = DeviceConfig {
        frame_delay: 0,
        ..Default::default()
    };
    let result = RenderingDevice::new(Box::new(SoftBackend::default()), config);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_integration_framebuffer_format_sample_count() {
    let mut device = primary_device();
    let format = device.framebuffer_format_create_empty(TextureSamples::X4);
    assert_eq!(device.framebuffer_format_get_texture_samples(format, 0).unwrap(), TextureSamples::X4);
}

// ============================================================================
// FRAMES AND TIMESTAMPS
// ============================================================================

#[test]
fn test_integration_swap_buffers_counts_frames() {
    let mut device = primary_device();
    for _ in 0..5 {
        device.swap_buffers().unwrap();
    }
    let stats = device.stats();
    assert_eq!(stats.frames, 5);
    assert_eq!(stats.submissions, 5);
}

#[test]
fn test_integration_submit_is_local_only() {
    let mut device = primary_device();
    assert!(matches!(device.submit(), Err(Error::Unsupported(_))));
    assert!(matches!(device.sync(), Err(Error::Unsupported(_))));
}

#[test]
fn test_integration_timestamps_readable_after_frame_completes() {
    let mut device = primary_device();
    device.capture_timestamp("frame start").unwrap();
    device.full_barrier().unwrap();
    device.capture_timestamp("frame end").unwrap();

    // Frame delay 2: the first frame is recycled by the second swap
    device.swap_buffers().unwrap();
    assert_eq!(device.get_captured_timestamps_count(), 0);
    device.swap_buffers().unwrap();

    assert_eq!(device.get_captured_timestamps_count(), 2);
    assert_eq!(device.get_captured_timestamp_name(0).unwrap(), "frame start");
    assert_eq!(device.get_captured_timestamp_name(1).unwrap(), "frame end");
    let start = device.get_captured_timestamp_gpu_time(0).unwrap();
    let end = device.get_captured_timestamp_gpu_time(1).unwrap();
    assert!(end >= start);
    assert!(device.get_captured_timestamp_cpu_time(1).unwrap() >= device.get_captured_timestamp_cpu_time(0).unwrap());
    assert!(device.get_captured_timestamp_name(2).is_err());
}

#[test]
fn test_integration_unbalanced_frame_labels_are_closed_at_submit() {
    let mut device = primary_device();
    device.draw_command_begin_label("frame", Vec4::ONE).unwrap();
    device.swap_buffers().unwrap();
    // The label was closed by the swap, ending it again only warns
    device.draw_command_end_label().unwrap();
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_integration_resource_names() {
    let mut device = primary_device();
    let buffer = device.uniform_buffer_create(16, None).unwrap();
    assert_eq!(device.get_resource_name(buffer).unwrap(), "");

    device.set_resource_name(buffer, "camera").unwrap();
    assert_eq!(device.get_resource_name(buffer).unwrap(), "camera");
}

#[test]
fn test_integration_freeing_shader_cascades_to_pipeline() {
    let mut device = local_device();
    let setup = draw_setup(&mut device);
    assert!(device.render_pipeline_is_valid(setup.pipeline));

    device.free(setup.shader).unwrap();

    assert!(!device.render_pipeline_is_valid(setup.pipeline));
    assert_eq!(device.resource_count_of(ResourceKind::Shader), 0);
    // Uniform sets only depend on the resources they reference
    assert!(device.uniform_set_is_valid(setup.uniform_set));
    assert!(device.framebuffer_is_valid(setup.framebuffer));
}

#[test]
fn test_integration_freeing_target_frees_framebuffer() {
    let mut device = local_device();
    let setup = draw_setup(&mut device);

    device.free(setup.target).unwrap();
    assert!(!device.framebuffer_is_valid(setup.framebuffer));
}

#[test]
fn test_integration_double_free_is_a_no_op() {
    let mut device = primary_device();
    let buffer = device.vertex_buffer_create(16, None, false).unwrap();
    let count = device.resource_count();

    device.free(buffer).unwrap();
    device.free(buffer).unwrap();
    assert_eq!(device.resource_count(), count - 1);
}

#[test]
fn test_integration_interned_formats_cannot_be_freed() {
    let mut device = primary_device();
    let format = device.framebuffer_format_create_empty(TextureSamples::X1);
    assert!(matches!(device.free(format), Err(Error::InvalidParameter(_))));
}

// ============================================================================
// SHADERS
// ============================================================================

#[test]
fn test_integration_shader_reflection_from_spirv() {
    let mut device = primary_device();
    let shader = device.shader_create_from_spirv(&graphics_spirv(), "triangle").unwrap();

    let reflection = device.shader_get_reflection(shader).unwrap();
    assert_eq!(reflection.stages, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT);
    assert_eq!(device.shader_get_vertex_input_attribute_mask(shader).unwrap(), 0b1);
}

#[test]
fn test_integration_shader_binary_fills_placeholder() {
    let mut device = primary_device();
    let binary = device.shader_compile_binary_from_spirv(&compute_spirv(), "fill").unwrap();

    let placeholder = device.shader_create_placeholder();
    assert!(device.shader_get_reflection(placeholder).is_err());

    let shader = device.shader_create_from_bytecode(&binary, Some(placeholder)).unwrap();
    assert_eq!(shader, placeholder);
    let reflection = device.shader_get_reflection(shader).unwrap();
    assert!(reflection.is_compute());
    assert_eq!(reflection.compute_local_size, [64, 1, 1]);
    assert_eq!(reflection.push_constant_size, 16);
}

#[test]
fn test_integration_source_compilation_is_unsupported() {
    let mut device = primary_device();
    let result = device.shader_compile_spirv_from_source(ShaderStage::Vertex, "void main() {}", ShaderLanguage::Glsl);
    assert!(matches!(result, Err(Error::Unsupported(_))));
}

#[test]
fn test_integration_compute_pipeline_needs_compute_shader() {
    let mut device = primary_device();
    let shader = device.shader_create_from_spirv(&graphics_spirv(), "triangle").unwrap();
    let result = device.compute_pipeline_create(shader, &[]);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}
