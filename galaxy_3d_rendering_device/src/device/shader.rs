/// Shader stages, SPIR-V containers and shader reflection

use bitflags::bitflags;

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    TessellationControl,
    TessellationEvaluation,
    Compute,
}

impl ShaderStage {
    pub fn flag(&self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderStage::TessellationControl => ShaderStageFlags::TESSELLATION_CONTROL,
            ShaderStage::TessellationEvaluation => ShaderStageFlags::TESSELLATION_EVALUATION,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }

    /// Stable numeric id (used by binary shader blobs)
    pub fn to_u8(&self) -> u8 {
        *self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ShaderStage::Vertex),
            1 => Some(ShaderStage::Fragment),
            2 => Some(ShaderStage::TessellationControl),
            3 => Some(ShaderStage::TessellationEvaluation),
            4 => Some(ShaderStage::Compute),
            _ => None,
        }
    }
}

bitflags! {
    /// Set of shader stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX                  = 1 << 0;
        const FRAGMENT                = 1 << 1;
        const TESSELLATION_CONTROL    = 1 << 2;
        const TESSELLATION_EVALUATION = 1 << 3;
        const COMPUTE                 = 1 << 4;
    }
}

/// Source language for `shader_compile_spirv_from_source`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderLanguage {
    Glsl,
    Hlsl,
}

// ===== SPIR-V CONTAINER =====

/// SPIR-V bytecode of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStageSpirv {
    pub stage: ShaderStage,
    /// SPIR-V words as little-endian bytes
    pub bytecode: Vec<u8>,
    /// Compiler diagnostics (must be empty to create a shader)
    pub compile_error: String,
}

/// SPIR-V bytecode for every stage of a shader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSpirv {
    pub stages: Vec<ShaderStageSpirv>,
}

impl ShaderSpirv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the bytecode of `stage`
    pub fn with_stage(mut self, stage: ShaderStage, bytecode: Vec<u8>) -> Self {
        self.stages.retain(|s| s.stage != stage);
        self.stages.push(ShaderStageSpirv {
            stage,
            bytecode,
            compile_error: String::new(),
        });
        self
    }

    /// Bytecode of `stage`, if present
    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderStageSpirv> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn stage_flags(&self) -> ShaderStageFlags {
        self.stages
            .iter()
            .fold(ShaderStageFlags::empty(), |acc, s| acc | s.stage.flag())
    }
}

// ===== REFLECTION =====

/// Resource type of a uniform binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Sampler,
    SamplerWithTexture,
    Texture,
    Image,
    TextureBuffer,
    SamplerWithTextureBuffer,
    ImageBuffer,
    UniformBuffer,
    StorageBuffer,
    InputAttachment,
}

impl UniformType {
    /// Number of ids one array element consumes
    pub fn ids_per_element(&self) -> usize {
        match self {
            UniformType::SamplerWithTexture | UniformType::SamplerWithTextureBuffer => 2,
            _ => 1,
        }
    }
}

/// One binding declared by a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReflectedUniform {
    pub binding: u32,
    pub uniform_type: UniformType,
    /// Array length (1 for non-arrays)
    pub length: u32,
    /// Stages that access the binding
    pub stages: ShaderStageFlags,
    /// Written by the shader (storage resources)
    pub writable: bool,
}

/// One descriptor set declared by a shader
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReflectedSet {
    pub set: u32,
    /// Sorted by binding
    pub uniforms: Vec<ReflectedUniform>,
}

impl ReflectedSet {
    pub fn uniform(&self, binding: u32) -> Option<&ReflectedUniform> {
        self.uniforms.iter().find(|u| u.binding == binding)
    }

    /// Layouts match when binding numbers, types and lengths match (stages may differ)
    pub fn is_compatible(&self, other: &ReflectedSet) -> bool {
        self.uniforms.len() == other.uniforms.len()
            && self.uniforms.iter().zip(&other.uniforms).all(|(a, b)| {
                a.binding == b.binding && a.uniform_type == b.uniform_type && a.length == b.length
            })
    }
}

/// Interface of a shader as extracted from its bytecode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    pub stages: ShaderStageFlags,
    /// Bit `n` set if the vertex stage reads input location `n`
    pub vertex_input_mask: u64,
    /// Bit `n` set if the fragment stage writes output location `n`
    pub fragment_output_mask: u32,
    /// Push constant block size in bytes (0 if none)
    pub push_constant_size: u32,
    /// Sorted by set index
    pub sets: Vec<ReflectedSet>,
    /// Declared specialization constant ids
    pub specialization_constants: Vec<u32>,
    /// Compute local workgroup size
    pub compute_local_size: [u32; 3],
}

impl ShaderReflection {
    pub fn is_compute(&self) -> bool {
        self.stages.contains(ShaderStageFlags::COMPUTE)
    }

    pub fn set(&self, index: u32) -> Option<&ReflectedSet> {
        self.sets.iter().find(|s| s.set == index)
    }

    /// Insert a binding, keeping sets and bindings sorted
    ///
    /// A binding seen again from another stage merges its stage flags.
    pub fn add_uniform(&mut self, set: u32, uniform: ReflectedUniform) {
        let position = match self.sets.iter().position(|s| s.set == set) {
            Some(position) => position,
            None => {
                self.sets.push(ReflectedSet { set, uniforms: Vec::new() });
                self.sets.sort_by_key(|s| s.set);
                self.sets.iter().position(|s| s.set == set).unwrap_or(0)
            }
        };
        let target = &mut self.sets[position];
        match target.uniforms.iter_mut().find(|u| u.binding == uniform.binding) {
            Some(existing) => {
                existing.stages |= uniform.stages;
                existing.writable |= uniform.writable;
            }
            None => {
                target.uniforms.push(uniform);
                target.uniforms.sort_by_key(|u| u.binding);
            }
        }
    }
}

/// Registry payload for shaders
#[derive(Debug, Clone)]
pub struct ShaderRecord {
    pub name: String,
    /// `None` while the shader is a placeholder
    pub reflection: Option<ShaderReflection>,
}

impl ShaderRecord {
    pub fn is_placeholder(&self) -> bool {
        self.reflection.is_none()
    }
}
