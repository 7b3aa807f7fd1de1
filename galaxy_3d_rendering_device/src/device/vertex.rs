/// Vertex attribute layout and interned vertex formats

use crate::device::DataFormat;

/// Rate at which an attribute advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFrequency {
    Vertex,
    Instance,
}

/// One vertex attribute (one buffer binding per attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Byte offset inside one element
    pub offset: u32,
    pub format: DataFormat,
    /// Bytes between consecutive elements
    pub stride: u32,
    pub frequency: VertexFrequency,
}

impl VertexAttribute {
    /// Tightly packed per-vertex attribute
    pub fn new(location: u32, format: DataFormat) -> Self {
        Self {
            location,
            offset: 0,
            format,
            stride: format.block_bytes(),
            frequency: VertexFrequency::Vertex,
        }
    }

    /// Minimum byte size of a buffer feeding `element_count` elements
    pub fn required_bytes(&self, element_count: u32) -> u64 {
        if element_count == 0 {
            return 0;
        }
        (element_count as u64 - 1) * self.stride as u64
            + self.offset as u64
            + self.format.block_bytes() as u64
    }
}

/// Registry payload for vertex formats, attributes in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexFormatRecord {
    pub attributes: Vec<VertexAttribute>,
}

impl VertexFormatRecord {
    /// Bit `n` set for every attribute location `n`
    pub fn location_mask(&self) -> u64 {
        self.attributes
            .iter()
            .filter(|a| a.location < 64)
            .fold(0u64, |mask, a| mask | (1u64 << a.location))
    }
}
