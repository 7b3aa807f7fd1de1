/// Buffer descriptors and buffer-derived records (index/vertex arrays)

use bitflags::bitflags;
use crate::device::{DataFormat, Handle};

bitflags! {
    /// Role(s) a buffer was created for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX            = 1 << 0;
        const INDEX             = 1 << 1;
        const UNIFORM           = 1 << 2;
        const STORAGE           = 1 << 3;
        const TEXEL             = 1 << 4;
        const DISPATCH_INDIRECT = 1 << 5;
    }
}

bitflags! {
    /// Extra usage accepted by `storage_buffer_create`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StorageBufferUsage: u32 {
        const DISPATCH_INDIRECT = 1 << 0;
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes
    pub fn bytes(&self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// Descriptor handed to the backend when allocating a buffer
#[derive(Debug, Clone, PartialEq)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
    /// Texel format for texel buffers
    pub texel_format: Option<DataFormat>,
}

/// Index layout of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLayout {
    pub format: IndexFormat,
    pub count: u32,
    pub use_restart_indices: bool,
}

/// Registry payload for buffers
#[derive(Debug, Clone)]
pub struct BufferRecord {
    pub desc: BufferDesc,
    /// Present for index buffers
    pub index: Option<IndexLayout>,
}

impl BufferRecord {
    pub fn size(&self) -> u64 {
        self.desc.size
    }

    pub fn usage(&self) -> BufferUsage {
        self.desc.usage
    }
}

/// Registry payload for index arrays (a range of an index buffer)
#[derive(Debug, Clone, Copy)]
pub struct IndexArrayRecord {
    pub buffer: Handle,
    /// First index
    pub offset: u32,
    pub count: u32,
    pub format: IndexFormat,
}

/// Registry payload for vertex arrays
#[derive(Debug, Clone)]
pub struct VertexArrayRecord {
    pub vertex_count: u32,
    pub vertex_format: Handle,
    /// One vertex buffer per attribute
    pub buffers: Vec<Handle>,
    /// Byte offset into each buffer
    pub offsets: Vec<u64>,
}
