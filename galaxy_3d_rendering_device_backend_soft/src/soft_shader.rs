/// Shader modules of the software backend: SPIR-V reflection and binary blobs
///
/// Reflection goes through `spirq`. Every stage is reflected separately and
/// merged into one `ShaderReflection`; a binding declared by several stages
/// accumulates their stage flags.

use galaxy_3d_rendering_device::galaxy3d::Result;
use galaxy_3d_rendering_device::galaxy3d::device::{
    ReflectedUniform, ShaderReflection, ShaderSpirv, ShaderStage, ShaderStageSpirv, UniformType,
};
use galaxy_3d_rendering_device::{engine_bail, engine_err};

const SOURCE: &str = "galaxy3d::SoftBackend";

const SPIRV_MAGIC: u32 = 0x0723_0203;
const SPIRV_HEADER_WORDS: usize = 5;
const OP_EXECUTION_MODE: u32 = 16;
const EXECUTION_MODE_LOCAL_SIZE: u32 = 17;

/// Header of blobs produced by `encode_binary`
const BINARY_MAGIC: &[u8; 4] = b"GSB1";

/// A created shader module
#[derive(Debug, Clone)]
pub(crate) struct SoftShader {
    pub name: String,
    pub reflection: ShaderReflection,
}

// ============================================================================
// Reflection
// ============================================================================

/// SPIR-V words of a stage, checking size and magic number
fn spirv_words(stage: &ShaderStageSpirv) -> Result<Vec<u32>> {
    if stage.bytecode.len() < SPIRV_HEADER_WORDS * 4 || stage.bytecode.len() % 4 != 0 {
        engine_bail!(SOURCE, InvalidParameter,
            "{:?} bytecode is {} bytes, not a SPIR-V module", stage.stage, stage.bytecode.len());
    }
    let words: Vec<u32> = stage
        .bytecode
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<u32>)
        .collect();
    if words[0] != SPIRV_MAGIC {
        engine_bail!(SOURCE, InvalidParameter,
            "{:?} bytecode has magic {:#010x}, expected {:#010x}", stage.stage, words[0], SPIRV_MAGIC);
    }
    Ok(words)
}

/// `LocalSize` execution mode of the first entry point declaring one
fn local_size(words: &[u32]) -> Option<[u32; 3]> {
    let mut cursor = SPIRV_HEADER_WORDS;
    while cursor < words.len() {
        let count = (words[cursor] >> 16) as usize;
        let opcode = words[cursor] & 0xFFFF;
        if count == 0 || cursor + count > words.len() {
            return None;
        }
        if opcode == OP_EXECUTION_MODE && count >= 6 && words[cursor + 2] == EXECUTION_MODE_LOCAL_SIZE {
            return Some([words[cursor + 3], words[cursor + 4], words[cursor + 5]]);
        }
        cursor += count;
    }
    None
}

fn uniform_type(desc_ty: &spirq::ty::DescriptorType) -> Result<(UniformType, bool)> {
    use spirq::ty::{AccessType, DescriptorType};
    let writable = |access: &AccessType| !matches!(access, AccessType::ReadOnly);
    Ok(match desc_ty {
        DescriptorType::Sampler() => (UniformType::Sampler, false),
        DescriptorType::CombinedImageSampler() => (UniformType::SamplerWithTexture, false),
        DescriptorType::SampledImage() => (UniformType::Texture, false),
        DescriptorType::StorageImage(access) => (UniformType::Image, writable(access)),
        DescriptorType::UniformTexelBuffer() => (UniformType::TextureBuffer, false),
        DescriptorType::StorageTexelBuffer(access) => (UniformType::ImageBuffer, writable(access)),
        DescriptorType::UniformBuffer() => (UniformType::UniformBuffer, false),
        DescriptorType::StorageBuffer(access) => (UniformType::StorageBuffer, writable(access)),
        DescriptorType::InputAttachment(..) => (UniformType::InputAttachment, false),
        other => {
            engine_bail!(SOURCE, Unsupported, "Unsupported SPIR-V descriptor type: {:?}", other);
        }
    })
}

/// Merge the interface of one stage into `reflection`
fn reflect_stage(stage: &ShaderStageSpirv, reflection: &mut ShaderReflection) -> Result<()> {
    let words = spirv_words(stage)?;
    let entry_points = spirq::ReflectConfig::new()
        .spv(words.as_slice())
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!(SOURCE, InvalidParameter,
            "SPIR-V reflection of the {:?} stage failed: {:?}", stage.stage, e))?;
    if entry_points.is_empty() {
        engine_bail!(SOURCE, InvalidParameter, "{:?} bytecode declares no entry point", stage.stage);
    }

    let flag = stage.stage.flag();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            match var {
                spirq::var::Variable::Input { location, .. } if stage.stage == ShaderStage::Vertex => {
                    if location.loc() < 64 {
                        reflection.vertex_input_mask |= 1u64 << location.loc();
                    }
                }
                spirq::var::Variable::Output { location, .. } if stage.stage == ShaderStage::Fragment => {
                    if location.loc() < 32 {
                        reflection.fragment_output_mask |= 1u32 << location.loc();
                    }
                }
                spirq::var::Variable::Descriptor { desc_bind, desc_ty, nbind, .. } => {
                    let (uniform_type, writable) = uniform_type(desc_ty)?;
                    reflection.add_uniform(desc_bind.set(), ReflectedUniform {
                        binding: desc_bind.bind(),
                        uniform_type,
                        length: (*nbind).max(1),
                        stages: flag,
                        writable,
                    });
                }
                spirq::var::Variable::PushConstant { ty, .. } => {
                    let size = ty.nbyte().unwrap_or(0) as u32;
                    reflection.push_constant_size = reflection.push_constant_size.max(size);
                }
                spirq::var::Variable::SpecConstant { spec_id, .. } => {
                    reflection.specialization_constants.push(*spec_id);
                }
                _ => {}
            }
        }
    }

    if stage.stage == ShaderStage::Compute {
        reflection.compute_local_size = local_size(&words).unwrap_or([1, 1, 1]);
    }
    Ok(())
}

/// Reflect every stage of `spirv`
pub(crate) fn reflect_shader(spirv: &ShaderSpirv) -> Result<ShaderReflection> {
    let mut reflection = ShaderReflection {
        stages: spirv.stage_flags(),
        compute_local_size: [1, 1, 1],
        ..Default::default()
    };
    for stage in &spirv.stages {
        reflect_stage(stage, &mut reflection)?;
    }
    reflection.specialization_constants.sort_unstable();
    reflection.specialization_constants.dedup();
    Ok(reflection)
}

// ============================================================================
// Binary Blobs
// ============================================================================

/// Serialise a shader as `GSB1 | name | stage count | (stage, len, bytecode)*`
pub(crate) fn encode_binary(spirv: &ShaderSpirv, name: &str) -> Vec<u8> {
    let mut blob = BINARY_MAGIC.to_vec();
    blob.extend_from_slice(&(name.len() as u32).to_le_bytes());
    blob.extend_from_slice(name.as_bytes());
    blob.extend_from_slice(&(spirv.stages.len() as u32).to_le_bytes());
    for stage in &spirv.stages {
        blob.push(stage.stage.to_u8());
        blob.extend_from_slice(&(stage.bytecode.len() as u32).to_le_bytes());
        blob.extend_from_slice(&stage.bytecode);
    }
    blob
}

struct BlobReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BlobReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.position.checked_add(len).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            engine_bail!(SOURCE, InvalidParameter,
                "Shader binary truncated at byte {} (needs {} more)", self.position, len);
        };
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(bytemuck::pod_read_unaligned::<u32>(self.take(4)?))
    }
}

/// Parse a blob written by `encode_binary`
pub(crate) fn decode_binary(binary: &[u8]) -> Result<(String, ShaderSpirv)> {
    let mut reader = BlobReader { bytes: binary, position: 0 };
    if reader.take(4).ok() != Some(BINARY_MAGIC.as_slice()) {
        engine_bail!(SOURCE, InvalidParameter, "Not a software backend shader binary");
    }

    let name_len = reader.read_u32()? as usize;
    let name = String::from_utf8_lossy(reader.take(name_len)?).into_owned();

    let stage_count = reader.read_u32()?;
    let mut spirv = ShaderSpirv::new();
    for _ in 0..stage_count {
        let raw = reader.read_u8()?;
        let Some(stage) = ShaderStage::from_u8(raw) else {
            engine_bail!(SOURCE, InvalidParameter, "Unknown shader stage id {} in binary", raw);
        };
        let len = reader.read_u32()? as usize;
        spirv = spirv.with_stage(stage, reader.take(len)?.to_vec());
    }

    if reader.position != binary.len() {
        engine_bail!(SOURCE, InvalidParameter,
            "Shader binary has {} trailing byte(s)", binary.len() - reader.position);
    }
    Ok((name, spirv))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "soft_shader_tests.rs"]
mod tests;
