/// Uniform bindings and uniform sets

use crate::device::{Handle, ReflectedSet, UniformType};

/// Resources bound to one binding of a uniform set
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub uniform_type: UniformType,
    pub binding: u32,
    /// Resource ids; `SamplerWithTexture*` types take (sampler, texture) pairs
    pub ids: Vec<Handle>,
}

impl Uniform {
    pub fn new(uniform_type: UniformType, binding: u32) -> Self {
        Self {
            uniform_type,
            binding,
            ids: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: Handle) -> Self {
        self.ids.push(id);
        self
    }

    pub fn add_id(&mut self, id: Handle) {
        self.ids.push(id);
    }

    pub fn clear_ids(&mut self) {
        self.ids.clear();
    }
}

/// Registry payload for uniform sets
#[derive(Debug, Clone)]
pub struct UniformSetRecord {
    /// Shader the set was validated against
    pub shader: Handle,
    pub set_index: u32,
    /// Layout copied from the shader reflection
    pub layout: ReflectedSet,
    pub uniforms: Vec<Uniform>,
}
