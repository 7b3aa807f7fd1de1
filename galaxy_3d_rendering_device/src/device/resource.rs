/// Resource records stored in the handle registry
///
/// One tagged union (`ResourcePayload`) covers every resource kind. Call
/// sites that need kind-specific data match on it; generic bookkeeping
/// (free, naming, dependency tracking) only looks at the record header.

use crate::device::{
    Handle, ResourceKind, TextureRecord, BufferRecord, SamplerState, ShaderRecord,
    PipelineRecord, FramebufferRecord, UniformSetRecord, VertexFormatRecord,
    FramebufferFormatRecord, IndexArrayRecord, VertexArrayRecord,
};

/// Backend-owned object id
///
/// Opaque to the device: it is whatever the backend returned from its
/// create call and is only ever handed back to the same backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

/// Kind-specific data of a registered resource
#[derive(Debug, Clone)]
pub enum ResourcePayload {
    Texture(TextureRecord),
    Buffer(BufferRecord),
    Sampler(SamplerState),
    Shader(ShaderRecord),
    Pipeline(PipelineRecord),
    Framebuffer(FramebufferRecord),
    UniformSet(UniformSetRecord),
    VertexFormat(VertexFormatRecord),
    FramebufferFormat(FramebufferFormatRecord),
    IndexArray(IndexArrayRecord),
    VertexArray(VertexArrayRecord),
}

impl ResourcePayload {
    /// Kind tag matching this payload
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourcePayload::Texture(_) => ResourceKind::Texture,
            ResourcePayload::Buffer(_) => ResourceKind::Buffer,
            ResourcePayload::Sampler(_) => ResourceKind::Sampler,
            ResourcePayload::Shader(_) => ResourceKind::Shader,
            ResourcePayload::Pipeline(_) => ResourceKind::Pipeline,
            ResourcePayload::Framebuffer(_) => ResourceKind::Framebuffer,
            ResourcePayload::UniformSet(_) => ResourceKind::UniformSet,
            ResourcePayload::VertexFormat(_) => ResourceKind::VertexFormat,
            ResourcePayload::FramebufferFormat(_) => ResourceKind::FramebufferFormat,
            ResourcePayload::IndexArray(_) => ResourceKind::IndexArray,
            ResourcePayload::VertexArray(_) => ResourceKind::VertexArray,
        }
    }
}

/// A registered resource
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    native: Option<NativeHandle>,
    payload: ResourcePayload,
    name: Option<String>,
    /// Resources this one was built from (freeing any of them frees this one)
    dependencies: Vec<Handle>,
}

impl ResourceRecord {
    /// Create a record
    ///
    /// # Arguments
    ///
    /// * `native` - Backend object, `None` for CPU-only records (formats, arrays, placeholders)
    /// * `payload` - Kind-specific data
    pub fn new(native: Option<NativeHandle>, payload: ResourcePayload) -> Self {
        Self {
            native,
            payload,
            name: None,
            dependencies: Vec::new(),
        }
    }

    /// Attach dependency handles
    pub fn with_dependencies(mut self, dependencies: Vec<Handle>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.payload.kind()
    }

    pub fn native(&self) -> Option<NativeHandle> {
        self.native
    }

    pub(crate) fn set_native(&mut self, native: Option<NativeHandle>) {
        self.native = native;
    }

    pub fn payload(&self) -> &ResourcePayload {
        &self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut ResourcePayload {
        &mut self.payload
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn dependencies(&self) -> &[Handle] {
        &self.dependencies
    }

    // ===== TYPED ACCESSORS =====

    pub fn as_texture(&self) -> Option<&TextureRecord> {
        match &self.payload {
            ResourcePayload::Texture(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&BufferRecord> {
        match &self.payload {
            ResourcePayload::Buffer(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_sampler(&self) -> Option<&SamplerState> {
        match &self.payload {
            ResourcePayload::Sampler(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_shader(&self) -> Option<&ShaderRecord> {
        match &self.payload {
            ResourcePayload::Shader(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_pipeline(&self) -> Option<&PipelineRecord> {
        match &self.payload {
            ResourcePayload::Pipeline(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_framebuffer(&self) -> Option<&FramebufferRecord> {
        match &self.payload {
            ResourcePayload::Framebuffer(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_uniform_set(&self) -> Option<&UniformSetRecord> {
        match &self.payload {
            ResourcePayload::UniformSet(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_vertex_format(&self) -> Option<&VertexFormatRecord> {
        match &self.payload {
            ResourcePayload::VertexFormat(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_framebuffer_format(&self) -> Option<&FramebufferFormatRecord> {
        match &self.payload {
            ResourcePayload::FramebufferFormat(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_index_array(&self) -> Option<&IndexArrayRecord> {
        match &self.payload {
            ResourcePayload::IndexArray(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_vertex_array(&self) -> Option<&VertexArrayRecord> {
        match &self.payload {
            ResourcePayload::VertexArray(record) => Some(record),
            _ => None,
        }
    }
}
