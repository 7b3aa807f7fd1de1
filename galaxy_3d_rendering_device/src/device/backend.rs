/// Backend trait: the seam to a concrete graphics API
///
/// The rendering device performs all validation before calling into the
/// backend. A backend only sees native handles it created itself plus plain
/// descriptors, and reports failures as `OutOfMemory`, `DeviceLost`,
/// `Unsupported` or `BackendError`.

use glam::{UVec3, Vec4};
use crate::error::Result;
use crate::device::{
    BufferDesc, DataFormat, DeviceCapabilities, FenceId, MemoryType, NativeHandle,
    PipelineSpecializationConstant, RenderPipelineDesc, ResourceKind, SamplerState,
    ShaderLanguage, ShaderReflection, ShaderSpirv, ShaderStage, ShaderStageSpirv, SubmitBatch,
    TextureDesc, TextureView, UniformType,
};

/// Texture region copied by `Backend::copy_texture`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCopyRegion {
    pub src: NativeHandle,
    pub dst: NativeHandle,
    pub from: UVec3,
    pub to: UVec3,
    pub size: UVec3,
    pub src_mipmap: u32,
    pub dst_mipmap: u32,
    pub src_layer: u32,
    pub dst_layer: u32,
}

/// Subresource range cleared by `Backend::clear_texture`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureClearRange {
    pub base_mipmap: u32,
    pub mipmaps: u32,
    pub base_layer: u32,
    pub layers: u32,
}

/// Attachment of a framebuffer as seen by the backend
///
/// `texture` always names the texture owning the memory; aliases are
/// resolved to their source and the layer/mip offset folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentTarget {
    pub texture: NativeHandle,
    pub format: DataFormat,
    pub layer: u32,
    pub mipmap: u32,
}

/// One binding of a uniform set as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBinding {
    pub binding: u32,
    pub uniform_type: UniformType,
    pub natives: Vec<NativeHandle>,
}

/// Shader created from a binary blob
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryShader {
    pub native: NativeHandle,
    pub reflection: ShaderReflection,
    pub name: String,
}

/// Native graphics backend
///
/// Owned exclusively by one rendering device.
pub trait Backend: Send {
    // ===== SETUP =====

    /// Capabilities of the underlying device (queried once)
    fn capabilities(&self) -> DeviceCapabilities;

    /// Create an independent backend on the same physical device
    fn create_local(&self) -> Result<Box<dyn Backend>>;

    // ===== TEXTURES =====

    /// Allocate a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Validated descriptor (samples already clamped)
    /// * `view` - View parameters
    /// * `data` - Either empty or one blob per layer, each the full layer size
    fn create_texture(&mut self, desc: &TextureDesc, view: &TextureView, data: &[Vec<u8>]) -> Result<NativeHandle>;

    /// Create a view aliasing the memory of `source`
    ///
    /// `desc` describes the alias (its layer/mip range and format).
    fn create_texture_view(
        &mut self,
        source: NativeHandle,
        desc: &TextureDesc,
        view: &TextureView,
        base_layer: u32,
        base_mipmap: u32,
    ) -> Result<NativeHandle>;

    /// Wrap an externally owned native image (never destroyed by the backend)
    fn import_texture(&mut self, desc: &TextureDesc, image: u64) -> Result<NativeHandle>;

    /// Replace one full layer (all mips)
    fn update_texture(&mut self, texture: NativeHandle, layer: u32, data: &[u8]) -> Result<()>;

    /// Read one full layer (all mips)
    fn read_texture(&mut self, texture: NativeHandle, layer: u32) -> Result<Vec<u8>>;

    fn clear_texture(&mut self, texture: NativeHandle, color: Vec4, range: TextureClearRange) -> Result<()>;

    fn copy_texture(&mut self, region: &TextureCopyRegion) -> Result<()>;

    /// Resolve a multisampled texture into a single-sampled one of equal size
    fn resolve_texture(&mut self, from: NativeHandle, into: NativeHandle) -> Result<()>;

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<NativeHandle>;

    fn update_buffer(&mut self, buffer: NativeHandle, offset: u64, data: &[u8]) -> Result<()>;

    /// Zero `size` bytes at `offset`
    fn clear_buffer(&mut self, buffer: NativeHandle, offset: u64, size: u64) -> Result<()>;

    fn read_buffer(&mut self, buffer: NativeHandle, offset: u64, size: u64) -> Result<Vec<u8>>;

    // ===== SAMPLERS & SHADERS =====

    fn create_sampler(&mut self, state: &SamplerState) -> Result<NativeHandle>;

    /// Compile shader source to SPIR-V
    ///
    /// Compiler diagnostics are returned in `ShaderStageSpirv::compile_error`.
    fn compile_spirv_from_source(
        &mut self,
        stage: ShaderStage,
        source: &str,
        language: ShaderLanguage,
    ) -> Result<ShaderStageSpirv>;

    /// Create a shader module and reflect its interface
    fn create_shader(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<(NativeHandle, ShaderReflection)>;

    /// Serialise SPIR-V (plus whatever the backend needs) to a binary blob
    fn compile_shader_binary(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<Vec<u8>>;

    /// Create a shader from a blob produced by `compile_shader_binary`
    fn create_shader_from_binary(&mut self, binary: &[u8]) -> Result<BinaryShader>;

    // ===== PIPELINES, FRAMEBUFFERS, UNIFORM SETS =====

    fn create_render_pipeline(&mut self, shader: NativeHandle, desc: &RenderPipelineDesc) -> Result<NativeHandle>;

    fn create_compute_pipeline(
        &mut self,
        shader: NativeHandle,
        specialization_constants: &[PipelineSpecializationConstant],
    ) -> Result<NativeHandle>;

    fn create_framebuffer(&mut self, attachments: &[AttachmentTarget], width: u32, height: u32) -> Result<NativeHandle>;

    fn create_uniform_set(
        &mut self,
        shader: NativeHandle,
        set_index: u32,
        bindings: &[UniformBinding],
    ) -> Result<NativeHandle>;

    // ===== LIFETIME =====

    /// Destroy a native object (only called once its last use completed)
    fn destroy(&mut self, kind: ResourceKind, native: NativeHandle);

    /// Attach a debug name to a native object
    fn set_name(&mut self, kind: ResourceKind, native: NativeHandle, name: &str);

    /// Bytes currently allocated in `memory`
    fn memory_usage(&self, memory: MemoryType) -> u64;

    // ===== EXECUTION =====

    /// Queue recorded work for execution
    fn submit(&mut self, batch: SubmitBatch) -> Result<FenceId>;

    /// Block until the submission identified by `fence` completed
    fn wait(&mut self, fence: FenceId) -> Result<()>;

    /// GPU timestamps written by the `Timestamp` items of a completed submission
    fn read_timestamps(&mut self, fence: FenceId) -> Result<Vec<u64>>;
}
