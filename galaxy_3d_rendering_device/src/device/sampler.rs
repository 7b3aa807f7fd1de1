/// Sampler state

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerFilter {
    Nearest,
    Linear,
}

/// Addressing mode outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerRepeatMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

/// Border color used with `ClampToBorder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerBorderColor {
    FloatTransparentBlack,
    IntTransparentBlack,
    FloatOpaqueBlack,
    IntOpaqueBlack,
    FloatOpaqueWhite,
    IntOpaqueWhite,
}

/// Comparison used by depth samplers and depth/stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOperator {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Full sampler description (also the registry payload of samplers)
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerState {
    pub mag_filter: SamplerFilter,
    pub min_filter: SamplerFilter,
    pub mip_filter: SamplerFilter,
    pub repeat_u: SamplerRepeatMode,
    pub repeat_v: SamplerRepeatMode,
    pub repeat_w: SamplerRepeatMode,
    pub lod_bias: f32,
    pub use_anisotropy: bool,
    /// Max anisotropy, 1..=16 when `use_anisotropy` is set
    pub anisotropy_max: f32,
    pub enable_compare: bool,
    pub compare_op: CompareOperator,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: SamplerBorderColor,
    pub unnormalized_uvw: bool,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            mag_filter: SamplerFilter::Nearest,
            min_filter: SamplerFilter::Nearest,
            mip_filter: SamplerFilter::Nearest,
            repeat_u: SamplerRepeatMode::ClampToEdge,
            repeat_v: SamplerRepeatMode::ClampToEdge,
            repeat_w: SamplerRepeatMode::ClampToEdge,
            lod_bias: 0.0,
            use_anisotropy: false,
            anisotropy_max: 1.0,
            enable_compare: false,
            compare_op: CompareOperator::Always,
            min_lod: 0.0,
            max_lod: 1e20,
            border_color: SamplerBorderColor::FloatTransparentBlack,
            unnormalized_uvw: false,
        }
    }
}

impl SamplerState {
    /// True if any stage of the sampler filters linearly
    pub fn uses_linear_filter(&self) -> bool {
        self.mag_filter == SamplerFilter::Linear
            || self.min_filter == SamplerFilter::Linear
            || self.mip_filter == SamplerFilter::Linear
    }
}
