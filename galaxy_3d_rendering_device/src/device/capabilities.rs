/// Device capabilities: identity, limits and per-format feature table
///
/// Filled once by the backend when the device is created and read-only
/// afterwards. Factories and command validation consult this table instead
/// of hardcoding limits.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use crate::device::{DataFormat, NumericKind, SamplerFilter, TextureSamples, TextureUsage};

bitflags! {
    /// What the device can do with a given format
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FormatFeatures: u32 {
        const SAMPLED                  = 1 << 0;
        const LINEAR_FILTER            = 1 << 1;
        const STORAGE                  = 1 << 2;
        const STORAGE_ATOMIC           = 1 << 3;
        const COLOR_ATTACHMENT         = 1 << 4;
        const COLOR_ATTACHMENT_BLEND   = 1 << 5;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 6;
        const VERTEX_BUFFER            = 1 << 7;
        const TEXEL_BUFFER             = 1 << 8;
        const TRANSFER                 = 1 << 9;
    }
}

/// Physical device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Other,
    IntegratedGpu,
    DiscreteGpu,
    VirtualGpu,
    Cpu,
}

/// Memory pool queried by `memory_usage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryType {
    Textures,
    Buffers,
    Total,
}

/// Identity of the device behind a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub device_type: DeviceType,
    /// Backend API name (e.g. "Vulkan", "Software")
    pub api_name: String,
    pub api_version: (u32, u32, u32),
    /// Identifies compatible pipeline caches
    pub pipeline_cache_uuid: String,
}

// ===== LIMITS =====

macro_rules! device_limits {
    ($( $variant:ident => $field:ident = $default:expr ),* $(,)?) => {
        /// Queryable device limit
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Limit {
            $( $variant, )*
        }

        impl Limit {
            /// Every limit, in table order
            pub const ALL: &'static [Limit] = &[ $( Limit::$variant, )* ];
        }

        /// Numeric device limits
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct DeviceLimits {
            $( pub $field: u64, )*
        }

        impl Default for DeviceLimits {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl DeviceLimits {
            /// Value of `limit`
            pub fn get(&self, limit: Limit) -> u64 {
                match limit {
                    $( Limit::$variant => self.$field, )*
                }
            }

            /// Override `limit` (backends adjusting the defaults)
            pub fn set(&mut self, limit: Limit, value: u64) {
                match limit {
                    $( Limit::$variant => self.$field = value, )*
                }
            }
        }
    };
}

device_limits! {
    MaxBoundUniformSets             => max_bound_uniform_sets = 8,
    MaxFramebufferColorAttachments  => max_framebuffer_color_attachments = 8,
    MaxTexturesPerUniformSet        => max_textures_per_uniform_set = 16,
    MaxSamplersPerUniformSet        => max_samplers_per_uniform_set = 16,
    MaxStorageBuffersPerUniformSet  => max_storage_buffers_per_uniform_set = 8,
    MaxStorageImagesPerUniformSet   => max_storage_images_per_uniform_set = 8,
    MaxUniformBuffersPerUniformSet  => max_uniform_buffers_per_uniform_set = 12,
    MaxDrawIndexedIndex             => max_draw_indexed_index = u32::MAX as u64,
    MaxFramebufferWidth             => max_framebuffer_width = 16384,
    MaxFramebufferHeight            => max_framebuffer_height = 16384,
    MaxTextureArrayLayers           => max_texture_array_layers = 2048,
    MaxTextureSize1D                => max_texture_size_1d = 16384,
    MaxTextureSize2D                => max_texture_size_2d = 16384,
    MaxTextureSize3D                => max_texture_size_3d = 2048,
    MaxTextureSizeCube              => max_texture_size_cube = 16384,
    MaxPushConstantSize             => max_push_constant_size = 128,
    MaxUniformBufferSize            => max_uniform_buffer_size = 65536,
    MaxVertexInputAttributeOffset   => max_vertex_input_attribute_offset = 2047,
    MaxVertexInputAttributes        => max_vertex_input_attributes = 16,
    MaxVertexInputBindings          => max_vertex_input_bindings = 16,
    MaxVertexInputBindingStride     => max_vertex_input_binding_stride = 2048,
    MaxComputeSharedMemorySize      => max_compute_shared_memory_size = 32768,
    MaxComputeWorkgroupCountX       => max_compute_workgroup_count_x = 65535,
    MaxComputeWorkgroupCountY       => max_compute_workgroup_count_y = 65535,
    MaxComputeWorkgroupCountZ       => max_compute_workgroup_count_z = 65535,
    MaxComputeWorkgroupInvocations  => max_compute_workgroup_invocations = 1024,
    MaxComputeWorkgroupSizeX        => max_compute_workgroup_size_x = 1024,
    MaxComputeWorkgroupSizeY        => max_compute_workgroup_size_y = 1024,
    MaxComputeWorkgroupSizeZ        => max_compute_workgroup_size_z = 64,
    MaxViewportDimensionsX          => max_viewport_dimensions_x = 16384,
    MaxViewportDimensionsY          => max_viewport_dimensions_y = 16384,
    MaxSamplerAnisotropy            => max_sampler_anisotropy = 16,
    MaxSamplerLodBias               => max_sampler_lod_bias = 16,
}

// ===== CAPABILITIES =====

/// Everything the device knows about its backend's hardware
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    pub info: DeviceInfo,
    pub limits: DeviceLimits,
    format_features: FxHashMap<DataFormat, FormatFeatures>,
    /// Sample counts usable by attachment formats (always contains X1)
    sample_counts: Vec<TextureSamples>,
}

impl DeviceCapabilities {
    /// Capabilities with the default feature set for every known format
    pub fn new(info: DeviceInfo, limits: DeviceLimits) -> Self {
        let format_features = DataFormat::ALL
            .iter()
            .map(|format| (*format, Self::default_features(*format)))
            .collect();
        Self {
            info,
            limits,
            format_features,
            sample_counts: vec![TextureSamples::X1, TextureSamples::X2, TextureSamples::X4, TextureSamples::X8],
        }
    }

    /// Feature set a typical desktop device exposes for `format`
    pub fn default_features(format: DataFormat) -> FormatFeatures {
        let info = format.info();
        if info.compressed {
            return FormatFeatures::SAMPLED | FormatFeatures::LINEAR_FILTER | FormatFeatures::TRANSFER;
        }
        if format.is_depth_stencil() {
            return FormatFeatures::SAMPLED
                | FormatFeatures::DEPTH_STENCIL_ATTACHMENT
                | FormatFeatures::TRANSFER;
        }

        let mut features = FormatFeatures::SAMPLED
            | FormatFeatures::COLOR_ATTACHMENT
            | FormatFeatures::TRANSFER;
        if !format.is_integer() {
            features |= FormatFeatures::LINEAR_FILTER | FormatFeatures::COLOR_ATTACHMENT_BLEND;
        }
        if info.numeric != NumericKind::Srgb {
            features |= FormatFeatures::STORAGE
                | FormatFeatures::VERTEX_BUFFER
                | FormatFeatures::TEXEL_BUFFER;
        }
        if matches!(format, DataFormat::R32_UINT | DataFormat::R32_SINT) {
            features |= FormatFeatures::STORAGE_ATOMIC;
        }
        features
    }

    /// Replace the feature set of `format`
    pub fn with_format_features(mut self, format: DataFormat, features: FormatFeatures) -> Self {
        self.format_features.insert(format, features);
        self
    }

    /// Replace the attachment sample counts (X1 is always kept)
    pub fn with_sample_counts(mut self, counts: &[TextureSamples]) -> Self {
        let mut counts: Vec<TextureSamples> = counts.to_vec();
        counts.push(TextureSamples::X1);
        counts.sort_unstable();
        counts.dedup();
        self.sample_counts = counts;
        self
    }

    // ===== QUERIES =====

    /// Features of `format` (empty if the device does not know it)
    pub fn features(&self, format: DataFormat) -> FormatFeatures {
        self.format_features.get(&format).copied().unwrap_or_default()
    }

    /// Returns true if a texture of `format` can be created with `usage`
    pub fn is_format_supported_for_usage(&self, format: DataFormat, usage: TextureUsage) -> bool {
        let features = self.features(format);
        if features.is_empty() {
            return false;
        }
        let required = [
            (TextureUsage::SAMPLING, FormatFeatures::SAMPLED),
            (TextureUsage::COLOR_ATTACHMENT, FormatFeatures::COLOR_ATTACHMENT),
            (TextureUsage::DEPTH_STENCIL_ATTACHMENT, FormatFeatures::DEPTH_STENCIL_ATTACHMENT),
            (TextureUsage::STORAGE, FormatFeatures::STORAGE),
            (TextureUsage::STORAGE_ATOMIC, FormatFeatures::STORAGE_ATOMIC),
            (TextureUsage::CAN_UPDATE, FormatFeatures::TRANSFER),
            (TextureUsage::CAN_COPY_FROM, FormatFeatures::TRANSFER),
            (TextureUsage::CAN_COPY_TO, FormatFeatures::TRANSFER),
            (TextureUsage::CPU_READ, FormatFeatures::TRANSFER),
        ];
        let plain_ok = required
            .iter()
            .filter(|(bit, _)| usage.contains(*bit))
            .all(|(_, feature)| features.contains(*feature));
        let input_ok = !usage.contains(TextureUsage::INPUT_ATTACHMENT)
            || features.intersects(FormatFeatures::COLOR_ATTACHMENT | FormatFeatures::DEPTH_STENCIL_ATTACHMENT);
        plain_ok && input_ok
    }

    /// Returns true if `format` can be sampled with `filter`
    pub fn is_format_supported_for_filter(&self, format: DataFormat, filter: SamplerFilter) -> bool {
        let features = self.features(format);
        match filter {
            SamplerFilter::Nearest => features.contains(FormatFeatures::SAMPLED),
            SamplerFilter::Linear => features.contains(FormatFeatures::SAMPLED | FormatFeatures::LINEAR_FILTER),
        }
    }

    /// Sample counts a texture of `format` may use, ascending
    pub fn supported_sample_counts(&self, format: DataFormat) -> Vec<TextureSamples> {
        let features = self.features(format);
        if features.intersects(FormatFeatures::COLOR_ATTACHMENT | FormatFeatures::DEPTH_STENCIL_ATTACHMENT) {
            self.sample_counts.clone()
        } else {
            vec![TextureSamples::X1]
        }
    }

    /// Largest supported sample count not above `requested`
    pub fn texture_samples_for_format(&self, format: DataFormat, requested: TextureSamples) -> TextureSamples {
        self.supported_sample_counts(format)
            .into_iter()
            .filter(|samples| *samples <= requested)
            .max()
            .unwrap_or(TextureSamples::X1)
    }

    /// Value of a device limit
    pub fn limit(&self, limit: Limit) -> u64 {
        self.limits.get(limit)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
