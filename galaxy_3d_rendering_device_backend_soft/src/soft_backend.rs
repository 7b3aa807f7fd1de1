/// Software backend - `Backend` implemented in host memory
///
/// Every native object lives in one table keyed by `NativeHandle`. Transfers
/// (updates, reads, clears, copies, resolves) run immediately on the CPU.
/// Submissions execute their work items in order when `submit` is called:
/// render passes apply their clear actions to the attachments, draws and
/// dispatches are counted but not rasterized, timestamps read a monotonic
/// clock. A fence is therefore complete as soon as it is returned.

use std::ops::Range;
use std::time::Instant;
use glam::{UVec3, Vec4};
use rustc_hash::FxHashMap;
use galaxy_3d_rendering_device::galaxy3d::{Error, Result};
use galaxy_3d_rendering_device::galaxy3d::device::{
    AttachmentTarget, Backend, BinaryShader, BufferDesc, DeviceCapabilities, DeviceInfo,
    DeviceLimits, DeviceType, FenceId, InitialAction, ListCommand, MemoryType, NativeHandle,
    PassBegin, PipelineSpecializationConstant, RecordedList, RenderPipelineDesc, ResourceKind,
    SamplerState, ShaderLanguage, ShaderReflection, ShaderSpirv, ShaderStage, ShaderStageSpirv,
    SubmitBatch, TextureClearRange, TextureCopyRegion, TextureDesc, TextureSamples, TextureView,
    UniformBinding, WorkItem,
};
use galaxy_3d_rendering_device::{engine_bail, engine_debug, engine_info, engine_trace, engine_warn};
use crate::soft_shader::{decode_binary, encode_binary, reflect_shader, SoftShader};
use crate::soft_texture::{encode_color, encode_depth_stencil, SoftTexture};

const SOURCE: &str = "galaxy3d::SoftBackend";

/// Size of the `(x, y, z)` workgroup counts read by indirect dispatches
const DISPATCH_INDIRECT_SIZE: u64 = 12;

// ============================================================================
// Configuration & Statistics
// ============================================================================

/// Software backend configuration
#[derive(Debug, Clone)]
pub struct SoftBackendConfig {
    /// Name reported by `get_device_name`
    pub device_name: String,
    /// Limits reported to the rendering device
    pub limits: DeviceLimits,
    /// Sample counts usable by attachments
    pub sample_counts: Vec<TextureSamples>,
    /// Texture and buffer allocations fail with `OutOfMemory` past this many bytes
    pub memory_budget: Option<u64>,
}

impl Default for SoftBackendConfig {
    fn default() -> Self {
        Self {
            device_name: "Galaxy3D Software Device".to_string(),
            limits: DeviceLimits::default(),
            sample_counts: vec![TextureSamples::X1, TextureSamples::X2, TextureSamples::X4, TextureSamples::X8],
            memory_budget: None,
        }
    }
}

/// Work executed by the backend since its creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftStats {
    pub submissions: u64,
    pub render_passes: u64,
    pub draws: u64,
    /// Vertices (or indices) times instances over all draws
    pub vertices: u64,
    pub dispatches: u64,
    pub workgroups: u64,
    pub barriers: u64,
    pub labels: u64,
}

// ============================================================================
// Native Objects
// ============================================================================

#[derive(Debug, Clone)]
struct SoftFramebuffer {
    attachments: Vec<AttachmentTarget>,
    width: u32,
    height: u32,
}

enum SoftObject {
    Texture(SoftTexture),
    /// Alias of a texture's memory, offsets already folded to the root
    TextureView { root: NativeHandle, base_layer: u32, base_mipmap: u32 },
    Buffer(Vec<u8>),
    Sampler,
    Shader(SoftShader),
    Pipeline { shader: NativeHandle, compute: bool },
    Framebuffer(SoftFramebuffer),
    UniformSet { shader: NativeHandle, set_index: u32, bindings: Vec<UniformBinding> },
}

impl SoftObject {
    fn label(&self) -> &'static str {
        match self {
            SoftObject::Texture(_) => "texture",
            SoftObject::TextureView { .. } => "texture view",
            SoftObject::Buffer(_) => "buffer",
            SoftObject::Sampler => "sampler",
            SoftObject::Shader(_) => "shader",
            SoftObject::Pipeline { .. } => "pipeline",
            SoftObject::Framebuffer(_) => "framebuffer",
            SoftObject::UniformSet { .. } => "uniform set",
        }
    }
}

/// Byte range `offset..offset + size` if it lies inside `len` bytes
fn byte_range(len: usize, offset: u64, size: u64) -> Result<Range<usize>> {
    let end = offset.checked_add(size).filter(|end| *end <= len as u64);
    match end {
        Some(end) => Ok(offset as usize..end as usize),
        None => {
            engine_bail!(SOURCE, BackendError,
                "Range {}+{} outside a {} byte buffer", offset, size, len);
        }
    }
}

// ============================================================================
// Soft Backend
// ============================================================================

/// CPU implementation of the rendering device backend
pub struct SoftBackend {
    config: SoftBackendConfig,
    objects: FxHashMap<NativeHandle, SoftObject>,
    names: FxHashMap<NativeHandle, String>,
    next_native: u64,
    next_fence: u64,
    /// Timestamps written by executed submissions, until read
    timestamps: FxHashMap<FenceId, Vec<u64>>,
    epoch: Instant,
    last_timestamp: u64,
    stats: SoftStats,
}

impl Default for SoftBackend {
    fn default() -> Self {
        Self::new(SoftBackendConfig::default())
    }
}

impl SoftBackend {
    pub fn new(config: SoftBackendConfig) -> Self {
        engine_info!(SOURCE, "Software backend created ({})", config.device_name);
        Self {
            config,
            objects: FxHashMap::default(),
            names: FxHashMap::default(),
            next_native: 0,
            next_fence: 0,
            timestamps: FxHashMap::default(),
            epoch: Instant::now(),
            last_timestamp: 0,
            stats: SoftStats::default(),
        }
    }

    pub fn config(&self) -> &SoftBackendConfig {
        &self.config
    }

    pub fn stats(&self) -> SoftStats {
        self.stats
    }

    /// Number of live native objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Debug name attached with `set_name`
    pub fn object_name(&self, native: NativeHandle) -> Option<&str> {
        self.names.get(&native).map(String::as_str)
    }

    // ===== OBJECT TABLE =====

    fn insert(&mut self, object: SoftObject) -> NativeHandle {
        self.next_native += 1;
        let native = NativeHandle(self.next_native);
        engine_trace!(SOURCE, "Created {} {:?}", object.label(), native);
        self.objects.insert(native, object);
        native
    }

    /// Fail with `OutOfMemory` if `bytes` more would exceed the budget
    fn reserve(&self, bytes: u64) -> Result<()> {
        if let Some(budget) = self.config.memory_budget {
            let used = self.memory_usage(MemoryType::Total);
            if used.saturating_add(bytes) > budget {
                engine_warn!(SOURCE,
                    "Allocation of {} bytes exceeds the memory budget ({} of {} used)", bytes, used, budget);
                return Err(Error::OutOfMemory);
            }
        }
        Ok(())
    }

    fn ensure_live(&self, native: NativeHandle) -> Result<()> {
        if !self.objects.contains_key(&native) {
            engine_bail!(SOURCE, BackendError, "Unknown native object {:?}", native);
        }
        Ok(())
    }

    /// Root texture and layer/mip offsets of a texture or view
    fn storage(&self, texture: NativeHandle) -> Result<(NativeHandle, u32, u32)> {
        match self.objects.get(&texture) {
            Some(SoftObject::Texture(_)) => Ok((texture, 0, 0)),
            Some(SoftObject::TextureView { root, base_layer, base_mipmap }) => Ok((*root, *base_layer, *base_mipmap)),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown texture {:?}", texture);
            }
        }
    }

    fn texture(&self, texture: NativeHandle) -> Result<&SoftTexture> {
        match self.objects.get(&texture) {
            Some(SoftObject::Texture(texture)) => Ok(texture),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown texture {:?}", texture);
            }
        }
    }

    fn texture_mut(&mut self, texture: NativeHandle) -> Result<&mut SoftTexture> {
        match self.objects.get_mut(&texture) {
            Some(SoftObject::Texture(texture)) => Ok(texture),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown texture {:?}", texture);
            }
        }
    }

    fn buffer(&self, buffer: NativeHandle) -> Result<&Vec<u8>> {
        match self.objects.get(&buffer) {
            Some(SoftObject::Buffer(bytes)) => Ok(bytes),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown buffer {:?}", buffer);
            }
        }
    }

    fn buffer_mut(&mut self, buffer: NativeHandle) -> Result<&mut Vec<u8>> {
        match self.objects.get_mut(&buffer) {
            Some(SoftObject::Buffer(bytes)) => Ok(bytes),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown buffer {:?}", buffer);
            }
        }
    }

    fn shader(&self, shader: NativeHandle) -> Result<&SoftShader> {
        match self.objects.get(&shader) {
            Some(SoftObject::Shader(shader)) => Ok(shader),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown shader {:?}", shader);
            }
        }
    }

    /// Texture layer blob checked against `layer`
    fn layer_index(texture: &SoftTexture, layer: u32) -> Result<usize> {
        if layer as usize >= texture.layers.len() {
            engine_bail!(SOURCE, BackendError,
                "Layer {} out of range ({} layer(s))", layer, texture.layers.len());
        }
        Ok(layer as usize)
    }

    // ===== EXECUTION =====

    /// Monotonic GPU clock in nanoseconds
    fn tick(&mut self) -> u64 {
        let now = self.epoch.elapsed().as_nanos() as u64;
        self.last_timestamp = now.max(self.last_timestamp + 1);
        self.last_timestamp
    }

    /// Run every work item of `batch`, returning the timestamps it wrote
    fn execute(&mut self, batch: &SubmitBatch) -> Result<Vec<u64>> {
        let mut timestamps = Vec::new();
        let mut label_depth = 0usize;

        for item in &batch.items {
            match item {
                WorkItem::List(list) => self.execute_list(list)?,
                WorkItem::Barrier { .. } => self.stats.barriers += 1,
                WorkItem::BeginLabel { name, .. } => {
                    engine_trace!(SOURCE, "Frame {}: begin '{}'", batch.frame, name);
                    label_depth += 1;
                    self.stats.labels += 1;
                }
                WorkItem::InsertLabel { name, .. } => {
                    engine_trace!(SOURCE, "Frame {}: '{}'", batch.frame, name);
                    self.stats.labels += 1;
                }
                WorkItem::EndLabel => {
                    if label_depth == 0 {
                        engine_warn!(SOURCE, "Frame {}: label closed without a matching begin", batch.frame);
                    }
                    label_depth = label_depth.saturating_sub(1);
                }
                WorkItem::Timestamp { index } => {
                    let index = *index as usize;
                    if timestamps.len() <= index {
                        timestamps.resize(index + 1, 0);
                    }
                    timestamps[index] = self.tick();
                }
            }
        }
        Ok(timestamps)
    }

    fn execute_list(&mut self, list: &RecordedList) -> Result<()> {
        for command in &list.commands {
            match command {
                ListCommand::BeginPass(pass) => {
                    self.begin_pass(pass)?;
                    self.stats.render_passes += 1;
                }
                ListCommand::BindRenderPipeline(native) => self.check_pipeline(*native, false)?,
                ListCommand::BindComputePipeline(native) => self.check_pipeline(*native, true)?,
                ListCommand::BindUniformSet { set, .. } => self.check_uniform_set(*set)?,
                ListCommand::BindIndexArray { buffer, .. } => self.ensure_live(*buffer)?,
                ListCommand::BindVertexArray { buffers, .. } => {
                    for buffer in buffers {
                        self.ensure_live(*buffer)?;
                    }
                }
                ListCommand::Draw { vertex_count, instances, .. } => {
                    self.stats.draws += 1;
                    self.stats.vertices += *vertex_count as u64 * *instances as u64;
                }
                ListCommand::Dispatch { x, y, z } => {
                    self.stats.dispatches += 1;
                    self.stats.workgroups += *x as u64 * *y as u64 * *z as u64;
                }
                ListCommand::DispatchIndirect { buffer, offset } => {
                    let bytes = self.buffer(*buffer)?;
                    let range = byte_range(bytes.len(), *offset, DISPATCH_INDIRECT_SIZE)?;
                    let counts: Vec<u64> = bytes[range]
                        .chunks_exact(4)
                        .map(|chunk| bytemuck::pod_read_unaligned::<u32>(chunk) as u64)
                        .collect();
                    self.stats.dispatches += 1;
                    self.stats.workgroups += counts.iter().product::<u64>();
                }
                ListCommand::Barrier => self.stats.barriers += 1,
                ListCommand::BeginLabel { name, .. } | ListCommand::InsertLabel { name, .. } => {
                    engine_trace!(SOURCE, "{}: '{}'", list.id, name);
                    self.stats.labels += 1;
                }
                ListCommand::NextSubpass
                | ListCommand::EndPass { .. }
                | ListCommand::SetPushConstant(_)
                | ListCommand::SetBlendConstants(_)
                | ListCommand::SetScissor(_)
                | ListCommand::EndLabel => {}
            }
        }
        Ok(())
    }

    /// A bound pipeline must be of the list's kind and its shader still alive
    fn check_pipeline(&self, pipeline: NativeHandle, compute: bool) -> Result<()> {
        match self.objects.get(&pipeline) {
            Some(SoftObject::Pipeline { shader, compute: is_compute }) if *is_compute == compute => {
                self.ensure_live(*shader)
            }
            _ => {
                engine_bail!(SOURCE, BackendError,
                    "{:?} is not a {} pipeline", pipeline, if compute { "compute" } else { "render" });
            }
        }
    }

    /// Every resource referenced by a bound uniform set must still be alive
    fn check_uniform_set(&self, uniform_set: NativeHandle) -> Result<()> {
        let Some(SoftObject::UniformSet { shader, set_index, bindings }) = self.objects.get(&uniform_set) else {
            engine_bail!(SOURCE, BackendError, "Unknown uniform set {:?}", uniform_set);
        };
        self.ensure_live(*shader)?;
        for binding in bindings {
            for native in &binding.natives {
                if !self.objects.contains_key(native) {
                    engine_bail!(SOURCE, BackendError,
                        "Uniform set {:?} (set {}) binding {} uses destroyed {:?}",
                        uniform_set, set_index, binding.binding, native);
                }
            }
        }
        Ok(())
    }

    /// Apply the clear actions of a render pass to its attachments
    fn begin_pass(&mut self, pass: &PassBegin) -> Result<()> {
        let framebuffer = match self.objects.get(&pass.framebuffer) {
            Some(SoftObject::Framebuffer(framebuffer)) => framebuffer.clone(),
            _ => {
                engine_bail!(SOURCE, BackendError, "Unknown framebuffer {:?}", pass.framebuffer);
            }
        };

        let mut clear_colors = pass.clear_colors.iter();
        for attachment in &framebuffer.attachments {
            let texel = if attachment.format.is_color() {
                match (pass.initial_color, clear_colors.next()) {
                    (InitialAction::Clear, Some(color)) => encode_color(attachment.format, *color),
                    _ => continue,
                }
            } else if pass.initial_depth == InitialAction::Clear {
                encode_depth_stencil(attachment.format, pass.clear_depth, pass.clear_stencil)
            } else {
                continue;
            };
            let Some(texel) = texel else {
                engine_warn!(SOURCE, "Cannot clear {:?} attachments, contents kept", attachment.format);
                continue;
            };

            let (root, base_layer, base_mipmap) = self.storage(attachment.texture)?;
            let texture = self.texture_mut(root)?;
            let layer = base_layer + attachment.layer;
            let level = base_mipmap + attachment.mipmap;
            Self::layer_index(texture, layer)?;
            let extent = texture.mip_extent(level);
            let x = pass.region.x.min(extent.x);
            let y = pass.region.y.min(extent.y);
            let size = UVec3::new(
                pass.region.width.min(extent.x - x).min(framebuffer.width.saturating_sub(x)),
                pass.region.height.min(extent.y - y).min(framebuffer.height.saturating_sub(y)),
                1,
            );
            if size.x > 0 && size.y > 0 {
                texture.fill_region(layer, level, UVec3::new(x, y, 0), size, &texel)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Backend Implementation
// ============================================================================

impl Backend for SoftBackend {
    fn capabilities(&self) -> DeviceCapabilities {
        let info = DeviceInfo {
            name: self.config.device_name.clone(),
            vendor: "Galaxy3D".to_string(),
            device_type: DeviceType::Cpu,
            api_name: "Software".to_string(),
            api_version: (1, 0, 0),
            pipeline_cache_uuid: "67616c61-7879-3364-736f-667462616b65".to_string(),
        };
        DeviceCapabilities::new(info, self.config.limits.clone()).with_sample_counts(&self.config.sample_counts)
    }

    fn create_local(&self) -> Result<Box<dyn Backend>> {
        Ok(Box::new(SoftBackend::new(self.config.clone())))
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, desc: &TextureDesc, _view: &TextureView, data: &[Vec<u8>]) -> Result<NativeHandle> {
        let texture = SoftTexture::new(desc, data);
        self.reserve(texture.byte_size())?;
        Ok(self.insert(SoftObject::Texture(texture)))
    }

    fn create_texture_view(
        &mut self,
        source: NativeHandle,
        _desc: &TextureDesc,
        _view: &TextureView,
        base_layer: u32,
        base_mipmap: u32,
    ) -> Result<NativeHandle> {
        let (root, layer_offset, mip_offset) = self.storage(source)?;
        Ok(self.insert(SoftObject::TextureView {
            root,
            base_layer: layer_offset + base_layer,
            base_mipmap: mip_offset + base_mipmap,
        }))
    }

    fn import_texture(&mut self, desc: &TextureDesc, image: u64) -> Result<NativeHandle> {
        let mut texture = SoftTexture::new(desc, &[]);
        texture.external = true;
        engine_debug!(SOURCE, "Imported external image {:#x} ({}x{})", image, desc.width, desc.height);
        Ok(self.insert(SoftObject::Texture(texture)))
    }

    fn update_texture(&mut self, texture: NativeHandle, layer: u32, data: &[u8]) -> Result<()> {
        let (root, base_layer, _) = self.storage(texture)?;
        let texture = self.texture_mut(root)?;
        let layer = Self::layer_index(texture, base_layer + layer)?;
        if data.len() != texture.layer_size() {
            engine_bail!(SOURCE, BackendError,
                "Layer update is {} bytes, layer holds {}", data.len(), texture.layer_size());
        }
        texture.layers[layer].copy_from_slice(data);
        Ok(())
    }

    fn read_texture(&mut self, texture: NativeHandle, layer: u32) -> Result<Vec<u8>> {
        let (root, base_layer, _) = self.storage(texture)?;
        let texture = self.texture(root)?;
        let layer = Self::layer_index(texture, base_layer + layer)?;
        Ok(texture.layers[layer].clone())
    }

    fn clear_texture(&mut self, texture: NativeHandle, color: Vec4, range: TextureClearRange) -> Result<()> {
        let (root, base_layer, base_mipmap) = self.storage(texture)?;
        let texture = self.texture_mut(root)?;
        let Some(texel) = encode_color(texture.desc.format, color) else {
            engine_bail!(SOURCE, Unsupported, "Cannot clear {:?} textures", texture.desc.format);
        };
        for layer in range.base_layer..range.base_layer + range.layers {
            let layer = Self::layer_index(texture, base_layer + layer)? as u32;
            for level in range.base_mipmap..range.base_mipmap + range.mipmaps {
                texture.fill_mip(layer, base_mipmap + level, &texel)?;
            }
        }
        Ok(())
    }

    fn copy_texture(&mut self, region: &TextureCopyRegion) -> Result<()> {
        let (src_root, src_layer, src_mipmap) = self.storage(region.src)?;
        let (dst_root, dst_layer, dst_mipmap) = self.storage(region.dst)?;

        let source = self.texture(src_root)?;
        let src_layer = Self::layer_index(source, src_layer + region.src_layer)? as u32;
        let bytes = source.read_region(src_layer, src_mipmap + region.src_mipmap, region.from, region.size);

        let target = self.texture_mut(dst_root)?;
        let dst_layer = Self::layer_index(target, dst_layer + region.dst_layer)? as u32;
        target.write_region(dst_layer, dst_mipmap + region.dst_mipmap, region.to, region.size, &bytes)
    }

    fn resolve_texture(&mut self, from: NativeHandle, into: NativeHandle) -> Result<()> {
        let (from_root, _, _) = self.storage(from)?;
        let (into_root, _, _) = self.storage(into)?;
        let source = self.texture(from_root)?.clone();
        source.resolve_into(self.texture_mut(into_root)?);
        Ok(())
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<NativeHandle> {
        self.reserve(desc.size)?;
        let mut bytes = vec![0u8; desc.size as usize];
        if let Some(data) = data {
            let len = data.len().min(bytes.len());
            bytes[..len].copy_from_slice(&data[..len]);
        }
        Ok(self.insert(SoftObject::Buffer(bytes)))
    }

    fn update_buffer(&mut self, buffer: NativeHandle, offset: u64, data: &[u8]) -> Result<()> {
        let bytes = self.buffer_mut(buffer)?;
        let range = byte_range(bytes.len(), offset, data.len() as u64)?;
        bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn clear_buffer(&mut self, buffer: NativeHandle, offset: u64, size: u64) -> Result<()> {
        let bytes = self.buffer_mut(buffer)?;
        let range = byte_range(bytes.len(), offset, size)?;
        bytes[range].fill(0);
        Ok(())
    }

    fn read_buffer(&mut self, buffer: NativeHandle, offset: u64, size: u64) -> Result<Vec<u8>> {
        let bytes = self.buffer(buffer)?;
        let range = byte_range(bytes.len(), offset, size)?;
        Ok(bytes[range].to_vec())
    }

    // ===== SAMPLERS & SHADERS =====

    fn create_sampler(&mut self, state: &SamplerState) -> Result<NativeHandle> {
        engine_trace!(SOURCE, "Sampler {:?}/{:?}/{:?}", state.mag_filter, state.min_filter, state.mip_filter);
        Ok(self.insert(SoftObject::Sampler))
    }

    fn compile_spirv_from_source(
        &mut self,
        stage: ShaderStage,
        _source: &str,
        language: ShaderLanguage,
    ) -> Result<ShaderStageSpirv> {
        engine_bail!(SOURCE, Unsupported,
            "The software backend cannot compile {:?} {:?} source, provide SPIR-V", language, stage);
    }

    fn create_shader(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<(NativeHandle, ShaderReflection)> {
        let reflection = reflect_shader(spirv)?;
        let native = self.insert(SoftObject::Shader(SoftShader {
            name: name.to_string(),
            reflection: reflection.clone(),
        }));
        Ok((native, reflection))
    }

    fn compile_shader_binary(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<Vec<u8>> {
        reflect_shader(spirv)?;
        Ok(encode_binary(spirv, name))
    }

    fn create_shader_from_binary(&mut self, binary: &[u8]) -> Result<BinaryShader> {
        let (name, spirv) = decode_binary(binary)?;
        let (native, reflection) = self.create_shader(&spirv, &name)?;
        Ok(BinaryShader { native, reflection, name })
    }

    // ===== PIPELINES, FRAMEBUFFERS, UNIFORM SETS =====

    fn create_render_pipeline(&mut self, shader: NativeHandle, desc: &RenderPipelineDesc) -> Result<NativeHandle> {
        let module = self.shader(shader)?;
        if module.reflection.is_compute() {
            engine_bail!(SOURCE, BackendError, "Render pipeline built on compute shader '{}'", module.name);
        }
        engine_trace!(SOURCE, "Render pipeline on '{}' ({:?}, pass {})",
            module.name, desc.primitive, desc.for_render_pass);
        Ok(self.insert(SoftObject::Pipeline { shader, compute: false }))
    }

    fn create_compute_pipeline(
        &mut self,
        shader: NativeHandle,
        specialization_constants: &[PipelineSpecializationConstant],
    ) -> Result<NativeHandle> {
        let module = self.shader(shader)?;
        if !module.reflection.is_compute() {
            engine_bail!(SOURCE, BackendError, "Compute pipeline built on graphics shader '{}'", module.name);
        }
        engine_trace!(SOURCE, "Compute pipeline on '{}' ({} specialization constant(s))",
            module.name, specialization_constants.len());
        Ok(self.insert(SoftObject::Pipeline { shader, compute: true }))
    }

    fn create_framebuffer(&mut self, attachments: &[AttachmentTarget], width: u32, height: u32) -> Result<NativeHandle> {
        for attachment in attachments {
            self.storage(attachment.texture)?;
        }
        Ok(self.insert(SoftObject::Framebuffer(SoftFramebuffer {
            attachments: attachments.to_vec(),
            width,
            height,
        })))
    }

    fn create_uniform_set(
        &mut self,
        shader: NativeHandle,
        set_index: u32,
        bindings: &[UniformBinding],
    ) -> Result<NativeHandle> {
        let module = self.shader(shader)?;
        if module.reflection.set(set_index).is_none() {
            engine_bail!(SOURCE, BackendError, "Shader '{}' declares no set {}", module.name, set_index);
        }
        for native in bindings.iter().flat_map(|binding| binding.natives.iter()) {
            self.ensure_live(*native)?;
        }
        Ok(self.insert(SoftObject::UniformSet {
            shader,
            set_index,
            bindings: bindings.to_vec(),
        }))
    }

    // ===== LIFETIME =====

    fn destroy(&mut self, kind: ResourceKind, native: NativeHandle) {
        self.names.remove(&native);
        match self.objects.remove(&native) {
            Some(object) => engine_trace!(SOURCE, "Destroyed {} {:?}", object.label(), native),
            None => engine_warn!(SOURCE, "Destroy of unknown {} {:?}", kind.name(), native),
        }
    }

    fn set_name(&mut self, _kind: ResourceKind, native: NativeHandle, name: &str) {
        self.names.insert(native, name.to_string());
    }

    fn memory_usage(&self, memory: MemoryType) -> u64 {
        let mut textures = 0;
        let mut buffers = 0;
        for object in self.objects.values() {
            match object {
                SoftObject::Texture(texture) if !texture.external => textures += texture.byte_size(),
                SoftObject::Buffer(bytes) => buffers += bytes.len() as u64,
                _ => {}
            }
        }
        match memory {
            MemoryType::Textures => textures,
            MemoryType::Buffers => buffers,
            MemoryType::Total => textures + buffers,
        }
    }

    // ===== EXECUTION =====

    fn submit(&mut self, batch: SubmitBatch) -> Result<FenceId> {
        let timestamps = self.execute(&batch)?;
        self.next_fence += 1;
        self.stats.submissions += 1;
        let fence = FenceId(self.next_fence);
        engine_trace!(SOURCE, "Frame {} executed ({} item(s)) as fence {}", batch.frame, batch.items.len(), fence.0);
        if !timestamps.is_empty() {
            self.timestamps.insert(fence, timestamps);
        }
        Ok(fence)
    }

    fn wait(&mut self, fence: FenceId) -> Result<()> {
        if fence.0 == 0 || fence.0 > self.next_fence {
            engine_bail!(SOURCE, BackendError, "Unknown fence {}", fence.0);
        }
        Ok(())
    }

    fn read_timestamps(&mut self, fence: FenceId) -> Result<Vec<u64>> {
        self.wait(fence)?;
        Ok(self.timestamps.remove(&fence).unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "soft_backend_tests.rs"]
mod tests;
