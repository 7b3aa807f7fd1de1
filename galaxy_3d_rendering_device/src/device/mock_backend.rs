/// Mock backend for unit tests (no rasterizer, no GPU)
///
/// Stores buffer and texture bytes so transfers can be checked, logs every
/// call, and can be told to fail the next allocation. The state is shared
/// through an `Arc<Mutex<_>>` so tests can inspect it after the device took
/// ownership of the backend.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::Vec4;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::engine_bail;
use crate::device::format::texture_layer_size;
use crate::device::{
    AttachmentTarget, Backend, BinaryShader, BufferDesc, DeviceCapabilities, DeviceInfo,
    DeviceLimits, DeviceType, FenceId, MemoryType, NativeHandle, PipelineSpecializationConstant,
    RenderPipelineDesc, ResourceKind, SamplerState, ShaderLanguage, ShaderReflection, ShaderSpirv,
    ShaderStage, ShaderStageSpirv, SubmitBatch, TextureClearRange, TextureCopyRegion, TextureDesc,
    TextureView, UniformBinding,
};

// ============================================================================
// Mock State
// ============================================================================

/// Texture storage: one byte blob per layer
#[derive(Debug, Clone)]
pub struct MockTexture {
    pub layers: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_native: u64,
    next_fence: u64,
    /// Live native objects
    pub live: FxHashMap<NativeHandle, ResourceKind>,
    pub destroyed: Vec<(ResourceKind, NativeHandle)>,
    pub buffers: FxHashMap<NativeHandle, Vec<u8>>,
    pub textures: FxHashMap<NativeHandle, MockTexture>,
    /// Alias -> (source, base layer)
    pub views: FxHashMap<NativeHandle, (NativeHandle, u32)>,
    pub names: Vec<(NativeHandle, String)>,
    pub submissions: Vec<SubmitBatch>,
    pub waited: Vec<FenceId>,
    /// Fail the next create call with `OutOfMemory`
    pub fail_next_allocation: bool,
    /// Fail `submit` and `wait` with `DeviceLost`
    pub device_lost: bool,
    /// Reflection returned by shader creation (derived from the stages if `None`)
    pub reflection: Option<ShaderReflection>,
    pub limits: DeviceLimits,
}

impl MockState {
    fn allocate(&mut self, kind: ResourceKind) -> Result<NativeHandle> {
        if self.fail_next_allocation {
            self.fail_next_allocation = false;
            return Err(Error::OutOfMemory);
        }
        self.next_native += 1;
        let native = NativeHandle(self.next_native);
        self.live.insert(native, kind);
        Ok(native)
    }

    /// Backing texture and layer offset of a texture or alias
    fn storage(&self, texture: NativeHandle) -> (NativeHandle, u32) {
        self.views.get(&texture).copied().unwrap_or((texture, 0))
    }

    fn texture_mut(&mut self, texture: NativeHandle) -> Result<&mut MockTexture> {
        match self.textures.get_mut(&texture) {
            Some(texture) => Ok(texture),
            None => {
                engine_bail!("galaxy3d::MockBackend", BackendError, "Unknown texture {:?}", texture);
            }
        }
    }

    /// Number of live objects of `kind`
    pub fn live_count(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }

    pub fn was_destroyed(&self, native: NativeHandle) -> bool {
        self.destroyed.iter().any(|(_, n)| *n == native)
    }
}

// ============================================================================
// Mock Backend
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared state, still readable once the backend is owned by a device
    pub fn state(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Backend for MockBackend {
    fn capabilities(&self) -> DeviceCapabilities {
        let info = DeviceInfo {
            name: "Mock Device".to_string(),
            vendor: "Galaxy3D".to_string(),
            device_type: DeviceType::Cpu,
            api_name: "Mock".to_string(),
            api_version: (1, 0, 0),
            pipeline_cache_uuid: "00000000-0000-0000-0000-000000000000".to_string(),
        };
        DeviceCapabilities::new(info, self.lock().limits.clone())
    }

    fn create_local(&self) -> Result<Box<dyn Backend>> {
        Ok(Box::new(self.clone()))
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, desc: &TextureDesc, _view: &TextureView, data: &[Vec<u8>]) -> Result<NativeHandle> {
        let mut state = self.lock();
        let native = state.allocate(ResourceKind::Texture)?;
        let layer_size = texture_layer_size(desc.format, desc.width, desc.height, desc.depth, desc.mipmaps) as usize;
        let layers = (0..desc.array_layers as usize)
            .map(|layer| data.get(layer).cloned().unwrap_or_else(|| vec![0; layer_size]))
            .collect();
        state.textures.insert(native, MockTexture { layers });
        Ok(native)
    }

    fn create_texture_view(
        &mut self,
        source: NativeHandle,
        _desc: &TextureDesc,
        _view: &TextureView,
        base_layer: u32,
        _base_mipmap: u32,
    ) -> Result<NativeHandle> {
        let mut state = self.lock();
        let native = state.allocate(ResourceKind::Texture)?;
        let (root, offset) = state.storage(source);
        state.views.insert(native, (root, offset + base_layer));
        Ok(native)
    }

    fn import_texture(&mut self, desc: &TextureDesc, _image: u64) -> Result<NativeHandle> {
        self.create_texture(desc, &TextureView::default(), &[])
    }

    fn update_texture(&mut self, texture: NativeHandle, layer: u32, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let (root, offset) = state.storage(texture);
        let texture = state.texture_mut(root)?;
        texture.layers[(offset + layer) as usize] = data.to_vec();
        Ok(())
    }

    fn read_texture(&mut self, texture: NativeHandle, layer: u32) -> Result<Vec<u8>> {
        let mut state = self.lock();
        let (root, offset) = state.storage(texture);
        Ok(state.texture_mut(root)?.layers[(offset + layer) as usize].clone())
    }

    fn clear_texture(&mut self, texture: NativeHandle, _color: Vec4, range: TextureClearRange) -> Result<()> {
        let mut state = self.lock();
        let (root, offset) = state.storage(texture);
        let texture = state.texture_mut(root)?;
        let first = (offset + range.base_layer) as usize;
        for layer in &mut texture.layers[first..first + range.layers as usize] {
            layer.fill(0);
        }
        Ok(())
    }

    fn copy_texture(&mut self, _region: &TextureCopyRegion) -> Result<()> {
        Ok(())
    }

    fn resolve_texture(&mut self, _from: NativeHandle, _into: NativeHandle) -> Result<()> {
        Ok(())
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<NativeHandle> {
        let mut state = self.lock();
        let native = state.allocate(ResourceKind::Buffer)?;
        let mut bytes = vec![0; desc.size as usize];
        if let Some(data) = data {
            bytes[..data.len()].copy_from_slice(data);
        }
        state.buffers.insert(native, bytes);
        Ok(native)
    }

    fn update_buffer(&mut self, buffer: NativeHandle, offset: u64, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let Some(bytes) = state.buffers.get_mut(&buffer) else {
            engine_bail!("galaxy3d::MockBackend", BackendError, "Unknown buffer {:?}", buffer);
        };
        let start = offset as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn clear_buffer(&mut self, buffer: NativeHandle, offset: u64, size: u64) -> Result<()> {
        let mut state = self.lock();
        let Some(bytes) = state.buffers.get_mut(&buffer) else {
            engine_bail!("galaxy3d::MockBackend", BackendError, "Unknown buffer {:?}", buffer);
        };
        bytes[offset as usize..(offset + size) as usize].fill(0);
        Ok(())
    }

    fn read_buffer(&mut self, buffer: NativeHandle, offset: u64, size: u64) -> Result<Vec<u8>> {
        let state = self.lock();
        let Some(bytes) = state.buffers.get(&buffer) else {
            engine_bail!("galaxy3d::MockBackend", BackendError, "Unknown buffer {:?}", buffer);
        };
        Ok(bytes[offset as usize..(offset + size) as usize].to_vec())
    }

    // ===== SAMPLERS & SHADERS =====

    fn create_sampler(&mut self, _state: &SamplerState) -> Result<NativeHandle> {
        self.lock().allocate(ResourceKind::Sampler)
    }

    fn compile_spirv_from_source(
        &mut self,
        stage: ShaderStage,
        source: &str,
        _language: ShaderLanguage,
    ) -> Result<ShaderStageSpirv> {
        let mut bytecode = source.as_bytes().to_vec();
        bytecode.resize(bytecode.len().div_ceil(4) * 4, 0);
        let compile_error = if source.contains("#error") {
            "mock: #error directive".to_string()
        } else {
            String::new()
        };
        Ok(ShaderStageSpirv { stage, bytecode, compile_error })
    }

    fn create_shader(&mut self, spirv: &ShaderSpirv, _name: &str) -> Result<(NativeHandle, ShaderReflection)> {
        let mut state = self.lock();
        let native = state.allocate(ResourceKind::Shader)?;
        let reflection = state.reflection.clone().unwrap_or_else(|| ShaderReflection {
            stages: spirv.stage_flags(),
            ..Default::default()
        });
        Ok((native, reflection))
    }

    fn compile_shader_binary(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<Vec<u8>> {
        let mut blob = b"MOCK".to_vec();
        blob.extend_from_slice(&spirv.stage_flags().bits().to_le_bytes());
        blob.extend_from_slice(name.as_bytes());
        Ok(blob)
    }

    fn create_shader_from_binary(&mut self, binary: &[u8]) -> Result<BinaryShader> {
        if binary.len() < 8 || &binary[..4] != b"MOCK" {
            engine_bail!("galaxy3d::MockBackend", InvalidParameter, "Not a mock shader blob");
        }
        let stages = u32::from_le_bytes([binary[4], binary[5], binary[6], binary[7]]);
        let name = String::from_utf8_lossy(&binary[8..]).into_owned();

        let mut state = self.lock();
        let native = state.allocate(ResourceKind::Shader)?;
        let reflection = state.reflection.clone().unwrap_or_else(|| ShaderReflection {
            stages: crate::device::ShaderStageFlags::from_bits_truncate(stages),
            ..Default::default()
        });
        Ok(BinaryShader { native, reflection, name })
    }

    // ===== PIPELINES, FRAMEBUFFERS, UNIFORM SETS =====

    fn create_render_pipeline(&mut self, _shader: NativeHandle, _desc: &RenderPipelineDesc) -> Result<NativeHandle> {
        self.lock().allocate(ResourceKind::Pipeline)
    }

    fn create_compute_pipeline(
        &mut self,
        _shader: NativeHandle,
        _specialization_constants: &[PipelineSpecializationConstant],
    ) -> Result<NativeHandle> {
        self.lock().allocate(ResourceKind::Pipeline)
    }

    fn create_framebuffer(&mut self, _attachments: &[AttachmentTarget], _width: u32, _height: u32) -> Result<NativeHandle> {
        self.lock().allocate(ResourceKind::Framebuffer)
    }

    fn create_uniform_set(
        &mut self,
        _shader: NativeHandle,
        _set_index: u32,
        _bindings: &[UniformBinding],
    ) -> Result<NativeHandle> {
        self.lock().allocate(ResourceKind::UniformSet)
    }

    // ===== LIFETIME =====

    fn destroy(&mut self, kind: ResourceKind, native: NativeHandle) {
        let mut state = self.lock();
        state.live.remove(&native);
        state.buffers.remove(&native);
        state.textures.remove(&native);
        state.views.remove(&native);
        state.destroyed.push((kind, native));
    }

    fn set_name(&mut self, _kind: ResourceKind, native: NativeHandle, name: &str) {
        self.lock().names.push((native, name.to_string()));
    }

    fn memory_usage(&self, memory: MemoryType) -> u64 {
        let state = self.lock();
        let buffers: u64 = state.buffers.values().map(|b| b.len() as u64).sum();
        let textures: u64 = state
            .textures
            .values()
            .flat_map(|t| t.layers.iter())
            .map(|layer| layer.len() as u64)
            .sum();
        match memory {
            MemoryType::Buffers => buffers,
            MemoryType::Textures => textures,
            MemoryType::Total => buffers + textures,
        }
    }

    // ===== EXECUTION =====

    fn submit(&mut self, batch: SubmitBatch) -> Result<FenceId> {
        let mut state = self.lock();
        if state.device_lost {
            return Err(Error::DeviceLost("mock device lost".to_string()));
        }
        state.next_fence += 1;
        state.submissions.push(batch);
        Ok(FenceId(state.next_fence))
    }

    fn wait(&mut self, fence: FenceId) -> Result<()> {
        let mut state = self.lock();
        if state.device_lost {
            return Err(Error::DeviceLost("mock device lost".to_string()));
        }
        state.waited.push(fence);
        Ok(())
    }

    fn read_timestamps(&mut self, fence: FenceId) -> Result<Vec<u64>> {
        let state = self.lock();
        let count = state
            .submissions
            .get(fence.0 as usize - 1)
            .map_or(0, |batch| batch.timestamp_count());
        Ok((0..count as u64).map(|i| fence.0 * 1000 + i).collect())
    }
}
