#![allow(dead_code)]
//! Test utilities - rendering devices over the software backend
//!
//! Every helper builds real objects through the public device API: shaders
//! are assembled with `SpirvModuleBuilder` and reflected by the backend, so
//! the integration suites exercise the same path an application would.

use galaxy_3d_rendering_device::galaxy3d::device::{
    DataFormat, FinalAction, Handle, InitialAction, ListId, PipelineColorBlendState,
    RenderPipelineDesc, ShaderSpirv, ShaderStage, StorageBufferUsage, TextureDesc, TextureUsage,
    TextureView, Uniform, UniformType, VertexAttribute,
};
use galaxy_3d_rendering_device::galaxy3d::{DeviceConfig, RenderingDevice};
use galaxy_3d_rendering_device::glam::Vec4;
use galaxy_3d_rendering_device_backend_soft::{
    SoftBackend, SoftBackendConfig, SpirvDescriptor, SpirvModuleBuilder,
};

// ============================================================================
// DEVICES
// ============================================================================

/// Primary device with two frames in flight and debug labels enabled
pub fn primary_device() -> RenderingDevice {
    let config = DeviceConfig {
        app_name: "integration".to_string(),
        frame_delay: 2,
        enable_debug_labels: true,
        ..Default::default()
    };
    RenderingDevice::new(Box::new(SoftBackend::default()), config).unwrap()
}

/// Local device driven by `submit()` / `sync()`
pub fn local_device() -> RenderingDevice {
    RenderingDevice::new_local(Box::new(SoftBackend::default())).unwrap()
}

/// Local device whose backend refuses allocations past `budget` bytes
pub fn local_device_with_budget(budget: u64) -> RenderingDevice {
    let backend = SoftBackend::new(SoftBackendConfig {
        memory_budget: Some(budget),
        ..Default::default()
    });
    RenderingDevice::new_local(Box::new(backend)).unwrap()
}

// ============================================================================
// TEXTURES
// ============================================================================

/// Usage of a render target that tests can read back
pub fn readable_target_usage() -> TextureUsage {
    TextureUsage::COLOR_ATTACHMENT
        | TextureUsage::SAMPLING
        | TextureUsage::CAN_COPY_FROM
        | TextureUsage::CAN_COPY_TO
        | TextureUsage::CAN_UPDATE
}

pub fn rgba8_target(device: &mut RenderingDevice, width: u32, height: u32) -> Handle {
    let desc = TextureDesc::texture_2d(DataFormat::R8G8B8A8_UNORM, width, height, readable_target_usage());
    device.texture_create(&desc, &TextureView::default(), &[]).unwrap()
}

// ============================================================================
// SHADERS
// ============================================================================

/// Vertex input at location 0, a uniform buffer at set 0 and one fragment output
pub fn graphics_spirv() -> ShaderSpirv {
    let vertex = SpirvModuleBuilder::new(ShaderStage::Vertex)
        .input(0)
        .descriptor(0, 0, SpirvDescriptor::UniformBuffer)
        .build();
    let fragment = SpirvModuleBuilder::new(ShaderStage::Fragment)
        .output(0)
        .build();
    ShaderSpirv::new()
        .with_stage(ShaderStage::Vertex, vertex)
        .with_stage(ShaderStage::Fragment, fragment)
}

/// Compute shader with a 64 wide workgroup writing a storage buffer at set 0
pub fn compute_spirv() -> ShaderSpirv {
    let compute = SpirvModuleBuilder::new(ShaderStage::Compute)
        .local_size(64, 1, 1)
        .descriptor(0, 0, SpirvDescriptor::StorageBuffer)
        .push_constant(1)
        .build();
    ShaderSpirv::new().with_stage(ShaderStage::Compute, compute)
}

// ============================================================================
// DRAW SETUP
// ============================================================================

/// Everything needed to record a draw into a 4x4 color target
pub struct DrawSetup {
    pub target: Handle,
    pub framebuffer: Handle,
    pub shader: Handle,
    pub pipeline: Handle,
    pub uniform_set: Handle,
    pub vertex_array: Handle,
}

pub fn draw_setup(device: &mut RenderingDevice) -> DrawSetup {
    let target = rgba8_target(device, 4, 4);
    let framebuffer = device.framebuffer_create(&[target], None, 1).unwrap();
    let format = device.framebuffer_get_format(framebuffer).unwrap();
    let shader = device.shader_create_from_spirv(&graphics_spirv(), "triangle").unwrap();

    let vertex_format = device
        .vertex_format_create(&[VertexAttribute::new(0, DataFormat::R32G32B32_SFLOAT)])
        .unwrap();
    let mut desc = RenderPipelineDesc::new(shader, format, Some(vertex_format));
    desc.color_blend = PipelineColorBlendState::create_disabled(1);
    let pipeline = device.render_pipeline_create(&desc).unwrap();

    let uniform_buffer = device.uniform_buffer_create(64, None).unwrap();
    let uniform_set = device
        .uniform_set_create(&[Uniform::new(UniformType::UniformBuffer, 0).with_id(uniform_buffer)], shader, 0)
        .unwrap();

    let vertices = device.vertex_buffer_create(36, None, false).unwrap();
    let vertex_array = device.vertex_array_create(3, vertex_format, &[vertices], &[]).unwrap();

    DrawSetup { target, framebuffer, shader, pipeline, uniform_set, vertex_array }
}

/// Begin a draw list clearing the color target to `color`
pub fn begin_clear(device: &mut RenderingDevice, framebuffer: Handle, color: Vec4) -> ListId {
    device
        .draw_list_begin(
            framebuffer,
            InitialAction::Clear,
            FinalAction::Store,
            InitialAction::Discard,
            FinalAction::Discard,
            &[color],
            1.0,
            0,
            None,
        )
        .unwrap()
}

/// Record one triangle with every binding of `setup`
pub fn record_triangle(device: &mut RenderingDevice, list: ListId, setup: &DrawSetup) {
    device.draw_list_bind_render_pipeline(list, setup.pipeline).unwrap();
    device.draw_list_bind_uniform_set(list, setup.uniform_set, 0).unwrap();
    device.draw_list_bind_vertex_array(list, setup.vertex_array).unwrap();
    device.draw_list_draw(list, false, 1, 0).unwrap();
}

// ============================================================================
// COMPUTE SETUP
// ============================================================================

pub struct ComputeSetup {
    pub pipeline: Handle,
    pub uniform_set: Handle,
    pub storage: Handle,
}

/// Compute pipeline bound to a 256 byte storage buffer usable for indirect dispatch
pub fn compute_setup(device: &mut RenderingDevice) -> ComputeSetup {
    let shader = device.shader_create_from_spirv(&compute_spirv(), "fill").unwrap();
    let pipeline = device.compute_pipeline_create(shader, &[]).unwrap();
    let storage = device
        .storage_buffer_create(256, None, StorageBufferUsage::DISPATCH_INDIRECT)
        .unwrap();
    let uniform_set = device
        .uniform_set_create(&[Uniform::new(UniformType::StorageBuffer, 0).with_id(storage)], shader, 0)
        .unwrap();
    ComputeSetup { pipeline, uniform_set, storage }
}
