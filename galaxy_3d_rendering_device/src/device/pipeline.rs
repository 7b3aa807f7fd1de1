/// Render and compute pipeline descriptors

use bitflags::bitflags;
use glam::Vec4;
use crate::device::{CompareOperator, Handle, ReflectedSet, TextureSamples};

// ===== RASTERIZATION =====

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPrimitive {
    Points,
    Lines,
    LinesWithAdjacency,
    LineStrips,
    LineStripsWithAdjacency,
    Triangles,
    TrianglesWithAdjacency,
    TriangleStrips,
    TriangleStripsWithAdjacency,
    TriangleStripsWithRestartIndex,
    TesselationPatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonCullMode {
    Disabled,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonFrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRasterizationState {
    pub enable_depth_clamp: bool,
    pub discard_primitives: bool,
    pub wireframe: bool,
    pub cull_mode: PolygonCullMode,
    pub front_face: PolygonFrontFace,
    pub depth_bias_enabled: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
    pub patch_control_points: u32,
}

impl Default for PipelineRasterizationState {
    fn default() -> Self {
        Self {
            enable_depth_clamp: false,
            discard_primitives: false,
            wireframe: false,
            cull_mode: PolygonCullMode::Disabled,
            front_face: PolygonFrontFace::Clockwise,
            depth_bias_enabled: false,
            depth_bias_constant_factor: 0.0,
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: 0.0,
            line_width: 1.0,
            patch_control_points: 1,
        }
    }
}

// ===== MULTISAMPLE =====

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineMultisampleState {
    pub sample_count: TextureSamples,
    pub enable_sample_shading: bool,
    pub min_sample_shading: f32,
    pub sample_masks: Vec<u32>,
    pub enable_alpha_to_coverage: bool,
    pub enable_alpha_to_one: bool,
}

impl Default for PipelineMultisampleState {
    fn default() -> Self {
        Self {
            sample_count: TextureSamples::X1,
            enable_sample_shading: false,
            min_sample_shading: 0.0,
            sample_masks: Vec::new(),
            enable_alpha_to_coverage: false,
            enable_alpha_to_one: false,
        }
    }
}

// ===== DEPTH / STENCIL =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilOpState {
    pub fail: StencilOperation,
    pub pass: StencilOperation,
    pub depth_fail: StencilOperation,
    pub compare: CompareOperator,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail: StencilOperation::Zero,
            pass: StencilOperation::Zero,
            depth_fail: StencilOperation::Zero,
            compare: CompareOperator::Always,
            compare_mask: 0,
            write_mask: 0,
            reference: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDepthStencilState {
    pub enable_depth_test: bool,
    pub enable_depth_write: bool,
    pub depth_compare_operator: CompareOperator,
    pub enable_depth_range: bool,
    pub depth_range_min: f32,
    pub depth_range_max: f32,
    pub enable_stencil: bool,
    pub front_op: StencilOpState,
    pub back_op: StencilOpState,
}

impl Default for PipelineDepthStencilState {
    fn default() -> Self {
        Self {
            enable_depth_test: false,
            enable_depth_write: false,
            depth_compare_operator: CompareOperator::Always,
            enable_depth_range: false,
            depth_range_min: 0.0,
            depth_range_max: 0.0,
            enable_stencil: false,
            front_op: StencilOpState::default(),
            back_op: StencilOpState::default(),
        }
    }
}

// ===== COLOR BLEND =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Minimum,
    Maximum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOperation {
    Clear,
    And,
    Copy,
    NoOp,
    Xor,
    Or,
    Invert,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineColorBlendAttachment {
    pub enable_blend: bool,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOperation,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOperation,
    pub write_r: bool,
    pub write_g: bool,
    pub write_b: bool,
    pub write_a: bool,
}

impl Default for PipelineColorBlendAttachment {
    fn default() -> Self {
        Self {
            enable_blend: false,
            src_color_blend_factor: BlendFactor::Zero,
            dst_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOperation::Add,
            src_alpha_blend_factor: BlendFactor::Zero,
            dst_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOperation::Add,
            write_r: true,
            write_g: true,
            write_b: true,
            write_a: true,
        }
    }
}

impl PipelineColorBlendAttachment {
    /// Standard "source over" alpha blending
    pub fn alpha_blend() -> Self {
        Self {
            enable_blend: true,
            src_color_blend_factor: BlendFactor::SrcAlpha,
            dst_color_blend_factor: BlendFactor::OneMinusSrcAlpha,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::OneMinusSrcAlpha,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineColorBlendState {
    pub enable_logic_op: bool,
    pub logic_op: LogicOperation,
    pub blend_constant: Vec4,
    /// One entry per color attachment of the target pass
    pub attachments: Vec<PipelineColorBlendAttachment>,
}

impl Default for PipelineColorBlendState {
    fn default() -> Self {
        Self {
            enable_logic_op: false,
            logic_op: LogicOperation::Clear,
            blend_constant: Vec4::ZERO,
            attachments: Vec::new(),
        }
    }
}

impl PipelineColorBlendState {
    /// Blending disabled on `attachment_count` attachments
    pub fn create_disabled(attachment_count: usize) -> Self {
        Self {
            attachments: vec![PipelineColorBlendAttachment::default(); attachment_count],
            ..Default::default()
        }
    }

    /// Alpha blending on `attachment_count` attachments
    pub fn create_blend(attachment_count: usize) -> Self {
        Self {
            attachments: vec![PipelineColorBlendAttachment::alpha_blend(); attachment_count],
            ..Default::default()
        }
    }
}

bitflags! {
    /// Pipeline state that may be changed while recording
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PipelineDynamicState: u32 {
        const LINE_WIDTH           = 1 << 0;
        const DEPTH_BIAS           = 1 << 1;
        const BLEND_CONSTANTS      = 1 << 2;
        const DEPTH_BOUNDS         = 1 << 3;
        const STENCIL_COMPARE_MASK = 1 << 4;
        const STENCIL_WRITE_MASK   = 1 << 5;
        const STENCIL_REFERENCE    = 1 << 6;
    }
}

// ===== SPECIALIZATION =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecializationValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSpecializationConstant {
    pub constant_id: u32,
    pub value: SpecializationValue,
}

// ===== PIPELINE DESC =====

/// Descriptor for `render_pipeline_create`
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPipelineDesc {
    pub shader: Handle,
    pub framebuffer_format: Handle,
    /// `None` for pipelines without vertex input
    pub vertex_format: Option<Handle>,
    pub primitive: RenderPrimitive,
    pub rasterization: PipelineRasterizationState,
    pub multisample: PipelineMultisampleState,
    pub depth_stencil: PipelineDepthStencilState,
    pub color_blend: PipelineColorBlendState,
    pub dynamic_state: PipelineDynamicState,
    /// Pass of the framebuffer format this pipeline renders in
    pub for_render_pass: u32,
    pub specialization_constants: Vec<PipelineSpecializationConstant>,
}

impl RenderPipelineDesc {
    /// Descriptor with default fixed-function state
    pub fn new(shader: Handle, framebuffer_format: Handle, vertex_format: Option<Handle>) -> Self {
        Self {
            shader,
            framebuffer_format,
            vertex_format,
            primitive: RenderPrimitive::Triangles,
            rasterization: PipelineRasterizationState::default(),
            multisample: PipelineMultisampleState::default(),
            depth_stencil: PipelineDepthStencilState::default(),
            color_blend: PipelineColorBlendState::default(),
            dynamic_state: PipelineDynamicState::empty(),
            for_render_pass: 0,
            specialization_constants: Vec::new(),
        }
    }
}

// ===== PIPELINE RECORD =====

/// Pipeline variant
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineKind {
    Render {
        framebuffer_format: Handle,
        vertex_format: Option<Handle>,
        render_pass: u32,
        dynamic_state: PipelineDynamicState,
    },
    Compute,
}

/// Registry payload for pipelines
#[derive(Debug, Clone)]
pub struct PipelineRecord {
    pub shader: Handle,
    pub kind: PipelineKind,
    /// Copied from the shader reflection at creation
    pub push_constant_size: u32,
    pub sets: Vec<ReflectedSet>,
    pub vertex_input_mask: u64,
}

impl PipelineRecord {
    pub fn is_compute(&self) -> bool {
        self.kind == PipelineKind::Compute
    }
}
