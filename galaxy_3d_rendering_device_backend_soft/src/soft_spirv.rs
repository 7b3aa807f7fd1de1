/// Minimal SPIR-V module assembler
///
/// Produces small but valid shader modules declaring an interface (inputs,
/// outputs, descriptors, push constants) around an empty `main`. The software
/// backend never executes shader code, so these modules are enough to drive
/// reflection and pipeline validation without an external compiler.

use galaxy_3d_rendering_device::galaxy3d::device::ShaderStage;

const MAGIC: u32 = 0x0723_0203;
const VERSION_1_0: u32 = 0x0001_0000;

// Opcodes
const OP_CAPABILITY: u16 = 17;
const OP_MEMORY_MODEL: u16 = 14;
const OP_ENTRY_POINT: u16 = 15;
const OP_EXECUTION_MODE: u16 = 16;
const OP_DECORATE: u16 = 71;
const OP_MEMBER_DECORATE: u16 = 72;
const OP_TYPE_VOID: u16 = 19;
const OP_TYPE_FLOAT: u16 = 22;
const OP_TYPE_VECTOR: u16 = 23;
const OP_TYPE_IMAGE: u16 = 25;
const OP_TYPE_SAMPLED_IMAGE: u16 = 27;
const OP_TYPE_STRUCT: u16 = 30;
const OP_TYPE_POINTER: u16 = 32;
const OP_TYPE_FUNCTION: u16 = 33;
const OP_VARIABLE: u16 = 59;
const OP_FUNCTION: u16 = 54;
const OP_LABEL: u16 = 248;
const OP_RETURN: u16 = 253;
const OP_FUNCTION_END: u16 = 56;

// Decorations
const DECORATION_BLOCK: u32 = 2;
const DECORATION_BUFFER_BLOCK: u32 = 3;
const DECORATION_LOCATION: u32 = 30;
const DECORATION_BINDING: u32 = 33;
const DECORATION_DESCRIPTOR_SET: u32 = 34;
const DECORATION_OFFSET: u32 = 35;

// Storage classes
const STORAGE_UNIFORM_CONSTANT: u32 = 0;
const STORAGE_INPUT: u32 = 1;
const STORAGE_UNIFORM: u32 = 2;
const STORAGE_OUTPUT: u32 = 3;
const STORAGE_PUSH_CONSTANT: u32 = 9;

const EXECUTION_MODE_ORIGIN_UPPER_LEFT: u32 = 7;
const EXECUTION_MODE_LOCAL_SIZE: u32 = 17;

/// Kind of descriptor declared by [`SpirvModuleBuilder::descriptor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpirvDescriptor {
    /// `uniform Block { vec4 }`
    UniformBuffer,
    /// `buffer Block { vec4 }`
    StorageBuffer,
    /// `sampler2D`
    CombinedImageSampler,
}

/// Builder for an interface-only SPIR-V module of one stage
///
/// # Example
///
/// ```
/// use galaxy_3d_rendering_device::galaxy3d::device::ShaderStage;
/// use galaxy_3d_rendering_device_backend_soft::{SpirvDescriptor, SpirvModuleBuilder};
///
/// let bytecode = SpirvModuleBuilder::new(ShaderStage::Vertex)
///     .input(0)
///     .descriptor(0, 0, SpirvDescriptor::UniformBuffer)
///     .build();
/// assert_eq!(bytecode.len() % 4, 0);
/// ```
#[derive(Debug, Clone)]
pub struct SpirvModuleBuilder {
    stage: ShaderStage,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
    descriptors: Vec<(u32, u32, SpirvDescriptor)>,
    push_constant_vec4s: u32,
    local_size: [u32; 3],
}

impl SpirvModuleBuilder {
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            inputs: Vec::new(),
            outputs: Vec::new(),
            descriptors: Vec::new(),
            push_constant_vec4s: 0,
            local_size: [1, 1, 1],
        }
    }

    /// Declare a `vec4` input at `location`
    pub fn input(mut self, location: u32) -> Self {
        self.inputs.push(location);
        self
    }

    /// Declare a `vec4` output at `location`
    pub fn output(mut self, location: u32) -> Self {
        self.outputs.push(location);
        self
    }

    pub fn descriptor(mut self, set: u32, binding: u32, kind: SpirvDescriptor) -> Self {
        self.descriptors.push((set, binding, kind));
        self
    }

    /// Declare a push constant block of `vec4_count` vec4 members
    pub fn push_constant(mut self, vec4_count: u32) -> Self {
        self.push_constant_vec4s = vec4_count;
        self
    }

    /// Compute workgroup size (compute stage only)
    pub fn local_size(mut self, x: u32, y: u32, z: u32) -> Self {
        self.local_size = [x, y, z];
        self
    }

    /// Assemble the module as little-endian bytes
    pub fn build(&self) -> Vec<u8> {
        let words = self.assemble();
        words.iter().flat_map(|word| word.to_le_bytes()).collect()
    }

    fn execution_model(&self) -> u32 {
        match self.stage {
            ShaderStage::Vertex => 0,
            ShaderStage::TessellationControl => 1,
            ShaderStage::TessellationEvaluation => 2,
            ShaderStage::Fragment => 4,
            ShaderStage::Compute => 5,
        }
    }

    fn assemble(&self) -> Vec<u32> {
        let mut ids = IdAllocator::default();
        let main = ids.next();
        let void = ids.next();
        let function_type = ids.next();
        let float = ids.next();
        let vec4 = ids.next();

        let mut decorations = Words::default();
        let mut types = Words::default();
        types.push(OP_TYPE_VOID, &[void]);
        types.push(OP_TYPE_FUNCTION, &[function_type, void]);
        types.push(OP_TYPE_FLOAT, &[float, 32]);
        types.push(OP_TYPE_VECTOR, &[vec4, float, 4]);

        // Stage inputs and outputs
        let mut interface = Vec::new();
        for (locations, storage) in [(&self.inputs, STORAGE_INPUT), (&self.outputs, STORAGE_OUTPUT)] {
            if locations.is_empty() {
                continue;
            }
            let pointer = ids.next();
            types.push(OP_TYPE_POINTER, &[pointer, storage, vec4]);
            for location in locations {
                let variable = ids.next();
                types.push(OP_VARIABLE, &[pointer, variable, storage]);
                decorations.push(OP_DECORATE, &[variable, DECORATION_LOCATION, *location]);
                interface.push(variable);
            }
        }

        // Descriptors
        for (set, binding, kind) in &self.descriptors {
            let (pointee, storage) = match kind {
                SpirvDescriptor::UniformBuffer | SpirvDescriptor::StorageBuffer => {
                    let block = ids.next();
                    let decoration = if *kind == SpirvDescriptor::UniformBuffer {
                        DECORATION_BLOCK
                    } else {
                        DECORATION_BUFFER_BLOCK
                    };
                    types.push(OP_TYPE_STRUCT, &[block, vec4]);
                    decorations.push(OP_DECORATE, &[block, decoration]);
                    decorations.push(OP_MEMBER_DECORATE, &[block, 0, DECORATION_OFFSET, 0]);
                    (block, STORAGE_UNIFORM)
                }
                SpirvDescriptor::CombinedImageSampler => {
                    let image = ids.next();
                    let sampled_image = ids.next();
                    // 2D, not depth, not arrayed, single sampled, used with a sampler, unknown format
                    types.push(OP_TYPE_IMAGE, &[image, float, 1, 0, 0, 0, 1, 0]);
                    types.push(OP_TYPE_SAMPLED_IMAGE, &[sampled_image, image]);
                    (sampled_image, STORAGE_UNIFORM_CONSTANT)
                }
            };
            let pointer = ids.next();
            let variable = ids.next();
            types.push(OP_TYPE_POINTER, &[pointer, storage, pointee]);
            types.push(OP_VARIABLE, &[pointer, variable, storage]);
            decorations.push(OP_DECORATE, &[variable, DECORATION_DESCRIPTOR_SET, *set]);
            decorations.push(OP_DECORATE, &[variable, DECORATION_BINDING, *binding]);
        }

        // Push constants
        if self.push_constant_vec4s > 0 {
            let block = ids.next();
            let members = vec![vec4; self.push_constant_vec4s as usize];
            let mut operands = vec![block];
            operands.extend(members);
            types.push(OP_TYPE_STRUCT, &operands);
            decorations.push(OP_DECORATE, &[block, DECORATION_BLOCK]);
            for member in 0..self.push_constant_vec4s {
                decorations.push(OP_MEMBER_DECORATE, &[block, member, DECORATION_OFFSET, member * 16]);
            }
            let pointer = ids.next();
            let variable = ids.next();
            types.push(OP_TYPE_POINTER, &[pointer, STORAGE_PUSH_CONSTANT, block]);
            types.push(OP_VARIABLE, &[pointer, variable, STORAGE_PUSH_CONSTANT]);
        }

        let label = ids.next();

        let mut module = Words::default();
        module.push(OP_CAPABILITY, &[1]);
        module.push(OP_MEMORY_MODEL, &[0, 1]);
        let mut entry = vec![self.execution_model(), main];
        entry.extend(literal_string("main"));
        entry.extend(&interface);
        module.push(OP_ENTRY_POINT, &entry);
        match self.stage {
            ShaderStage::Compute => {
                let [x, y, z] = self.local_size;
                module.push(OP_EXECUTION_MODE, &[main, EXECUTION_MODE_LOCAL_SIZE, x, y, z]);
            }
            ShaderStage::Fragment => {
                module.push(OP_EXECUTION_MODE, &[main, EXECUTION_MODE_ORIGIN_UPPER_LEFT]);
            }
            _ => {}
        }
        module.0.extend(decorations.0);
        module.0.extend(types.0);
        module.push(OP_FUNCTION, &[void, main, 0, function_type]);
        module.push(OP_LABEL, &[label]);
        module.push(OP_RETURN, &[]);
        module.push(OP_FUNCTION_END, &[]);

        let mut words = vec![MAGIC, VERSION_1_0, 0, ids.bound(), 0];
        words.extend(module.0);
        words
    }
}

#[derive(Default)]
struct IdAllocator(u32);

impl IdAllocator {
    fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }

    /// Upper bound of every id used (header field)
    fn bound(&self) -> u32 {
        self.0 + 1
    }
}

#[derive(Default)]
struct Words(Vec<u32>);

impl Words {
    fn push(&mut self, opcode: u16, operands: &[u32]) {
        let count = operands.len() as u32 + 1;
        self.0.push((count << 16) | opcode as u32);
        self.0.extend_from_slice(operands);
    }
}

/// Nul-terminated UTF-8 literal packed into words
fn literal_string(text: &str) -> Vec<u32> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    bytes.resize(bytes.len().div_ceil(4) * 4, 0);
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
