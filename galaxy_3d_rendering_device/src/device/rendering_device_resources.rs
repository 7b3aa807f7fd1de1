/// Textures, buffers, samplers and vertex/index arrays

use glam::{UVec3, Vec4};
use crate::error::Result;
use crate::{engine_bail, engine_warn};
use crate::device::format::{max_mipmaps, mip_dimensions, texture_layer_size};
use crate::device::{
    BufferDesc, BufferRecord, BufferUsage, DataFormat, FormatFeatures, Handle, IndexArrayRecord,
    IndexFormat, IndexLayout, Limit, NativeHandle, ResourceKind, ResourcePayload, SamplerFilter,
    SamplerState, SharedSlice, StorageBufferUsage, TextureClearRange, TextureCopyRegion,
    TextureDesc, TextureRecord, TextureSamples, TextureSliceType, TextureType, TextureUsage,
    TextureView, VertexArrayRecord, VertexFrequency,
};
use super::RenderingDevice;

/// True if `[offset, offset + size)` lies inside `total` bytes
fn range_inside(offset: u64, size: u64, total: u64) -> bool {
    offset.checked_add(size).is_some_and(|end| end <= total)
}

impl RenderingDevice {
    // ===== TEXTURES =====

    /// Create a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture descriptor; the sample count is clamped to what the format supports
    /// * `view` - View parameters (format override must be a shareable format)
    /// * `data` - Empty, or one blob per layer holding every mip of the layer
    pub fn texture_create(&mut self, desc: &TextureDesc, view: &TextureView, data: &[Vec<u8>]) -> Result<Handle> {
        let desc = self.validate_texture_desc(desc)?;
        self.validate_view_format(&desc, view)?;

        if !data.is_empty() {
            self.ensure_not_recording("texture_create with initial data")?;
            if data.len() != desc.array_layers as usize {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Initial data has {} layer(s), texture has {}", data.len(), desc.array_layers);
            }
            let layer_size = texture_layer_size(desc.format, desc.width, desc.height, desc.depth, desc.mipmaps);
            if let Some((layer, blob)) = data.iter().enumerate().find(|(_, b)| b.len() as u64 != layer_size) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Initial data of layer {} is {} bytes, expected {}", layer, blob.len(), layer_size);
            }
        }

        let view = *view;
        self.create_resource(ResourceKind::Texture, Vec::new(), move |backend| {
            let native = backend.create_texture(&desc, &view, data)?;
            Ok((Some(native), ResourcePayload::Texture(TextureRecord {
                desc,
                view,
                shared: None,
                external: false,
            })))
        })
    }

    /// Create a texture aliasing the whole of `with`
    ///
    /// No memory is allocated; freeing `with` frees the alias too.
    pub fn texture_create_shared(&mut self, view: &TextureView, with: Handle) -> Result<Handle> {
        let source = self.texture_record(with)?.clone();
        self.validate_view_format(&source.desc, view)?;

        let (root, base_layer, base_mipmap) = match source.shared {
            Some(slice) => (slice.source, slice.base_layer, slice.base_mipmap),
            None => (with, 0, 0),
        };
        let root_native = self.native(root, ResourceKind::Texture)?;
        let desc = source.desc;
        let slice = SharedSlice {
            source: root,
            base_layer,
            layers: desc.array_layers,
            base_mipmap,
            mipmaps: desc.mipmaps,
            slice_type: None,
        };

        let view = *view;
        self.create_resource(ResourceKind::Texture, vec![with], move |backend| {
            let native = backend.create_texture_view(root_native, &desc, &view, base_layer, base_mipmap)?;
            Ok((Some(native), ResourcePayload::Texture(TextureRecord {
                desc,
                view,
                shared: Some(slice),
                external: false,
            })))
        })
    }

    /// Create a texture aliasing a layer/mip range of `with`
    ///
    /// # Arguments
    ///
    /// * `view` - View parameters of the alias
    /// * `with` - Source texture (may itself be an alias)
    /// * `layer` - First layer of the slice
    /// * `mipmap` - First mip level of the slice
    /// * `mipmaps` - Number of mip levels
    /// * `slice_type` - One 2D layer, six cube faces or the whole 3D volume
    pub fn texture_create_shared_from_slice(
        &mut self,
        view: &TextureView,
        with: Handle,
        layer: u32,
        mipmap: u32,
        mipmaps: u32,
        slice_type: TextureSliceType,
    ) -> Result<Handle> {
        let source = self.texture_record(with)?.clone();
        self.validate_view_format(&source.desc, view)?;
        let source_desc = &source.desc;

        if mipmaps == 0 || !range_inside(mipmap as u64, mipmaps as u64, source_desc.mipmaps as u64) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Mip range {}+{} outside source with {} mip(s)", mipmap, mipmaps, source_desc.mipmaps);
        }

        let (layers, texture_type) = match slice_type {
            TextureSliceType::Slice2D => {
                if source_desc.texture_type == TextureType::Type3D {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "2D slices of 3D textures are not supported, use Slice3D");
                }
                (1, TextureType::Type2D)
            }
            TextureSliceType::Cubemap => {
                if !source_desc.texture_type.is_cube() {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Cubemap slices need a cube or cube array source");
                }
                if layer % 6 != 0 {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Cubemap slice must start on a multiple of 6 (got layer {})", layer);
                }
                (6, TextureType::Cube)
            }
            TextureSliceType::Slice3D => {
                if source_desc.texture_type != TextureType::Type3D || layer != 0 {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "3D slices need a 3D source and layer 0");
                }
                (1, TextureType::Type3D)
            }
        };
        if !range_inside(layer as u64, layers as u64, source_desc.array_layers as u64) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Layer range {}+{} outside source with {} layer(s)", layer, layers, source_desc.array_layers);
        }

        let (width, height, depth) = mip_dimensions(source_desc.width, source_desc.height, source_desc.depth, mipmap);
        let desc = TextureDesc {
            width,
            height,
            depth: if slice_type == TextureSliceType::Slice3D { depth } else { 1 },
            array_layers: layers,
            mipmaps,
            texture_type,
            ..source_desc.clone()
        };

        let (root, base_layer, base_mipmap) = match source.shared {
            Some(slice) => (slice.source, slice.base_layer + layer, slice.base_mipmap + mipmap),
            None => (with, layer, mipmap),
        };
        let root_native = self.native(root, ResourceKind::Texture)?;
        let slice = SharedSlice {
            source: root,
            base_layer,
            layers,
            base_mipmap,
            mipmaps,
            slice_type: Some(slice_type),
        };

        let view = *view;
        self.create_resource(ResourceKind::Texture, vec![with], move |backend| {
            let native = backend.create_texture_view(root_native, &desc, &view, base_layer, base_mipmap)?;
            Ok((Some(native), ResourcePayload::Texture(TextureRecord {
                desc,
                view,
                shared: Some(slice),
                external: false,
            })))
        })
    }

    /// Wrap a native image owned by someone else
    ///
    /// The image is never destroyed by the device or the backend.
    #[allow(clippy::too_many_arguments)]
    pub fn texture_create_from_extension(
        &mut self,
        texture_type: TextureType,
        format: DataFormat,
        samples: TextureSamples,
        usage: TextureUsage,
        image: u64,
        width: u32,
        height: u32,
        depth: u32,
        layers: u32,
    ) -> Result<Handle> {
        if image == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "External image handle is null");
        }
        let desc = self.validate_texture_desc(&TextureDesc {
            format,
            width,
            height,
            depth,
            array_layers: layers,
            mipmaps: 1,
            texture_type,
            samples,
            usage,
            shareable_formats: Vec::new(),
        })?;

        self.create_resource(ResourceKind::Texture, Vec::new(), move |backend| {
            let native = backend.import_texture(&desc, image)?;
            Ok((Some(native), ResourcePayload::Texture(TextureRecord {
                desc,
                view: TextureView::default(),
                shared: None,
                external: true,
            })))
        })
    }

    /// Replace one layer (every mip) of a texture
    ///
    /// Updating an alias writes through to its source.
    pub fn texture_update(&mut self, texture: Handle, layer: u32, data: &[u8]) -> Result<()> {
        self.ensure_not_recording("texture_update")?;
        let record = self.texture_record(texture)?;
        let desc = &record.desc;

        if !desc.usage.contains(TextureUsage::CAN_UPDATE) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} was not created with CAN_UPDATE", texture);
        }
        if layer >= desc.array_layers {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Layer {} out of range ({} layer(s))", layer, desc.array_layers);
        }
        let expected = texture_layer_size(desc.format, desc.width, desc.height, desc.depth, desc.mipmaps);
        if data.len() as u64 != expected {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Update data is {} bytes, layer size is {}", data.len(), expected);
        }

        let (native, root_layer) = self.texture_layer_target(texture, record, layer)?;
        self.backend.update_texture(native, root_layer, data)
    }

    /// Read one layer (every mip) of a texture
    pub fn texture_get_data(&mut self, texture: Handle, layer: u32) -> Result<Vec<u8>> {
        self.ensure_not_touched(&[texture], "texture_get_data")?;
        let record = self.texture_record(texture)?;

        if !record.desc.usage.contains(TextureUsage::CAN_COPY_FROM) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} was not created with CAN_COPY_FROM", texture);
        }
        if layer >= record.desc.array_layers {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Layer {} out of range ({} layer(s))", layer, record.desc.array_layers);
        }

        let (native, root_layer) = self.texture_layer_target(texture, record, layer)?;
        self.backend.read_texture(native, root_layer)
    }

    /// Clear a mip/layer range of a color texture
    pub fn texture_clear(
        &mut self,
        texture: Handle,
        color: Vec4,
        base_mipmap: u32,
        mipmap_count: u32,
        base_layer: u32,
        layer_count: u32,
    ) -> Result<()> {
        self.ensure_not_recording("texture_clear")?;
        let record = self.texture_record(texture)?;

        if !record.desc.usage.contains(TextureUsage::CAN_COPY_TO) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} was not created with CAN_COPY_TO", texture);
        }
        if !record.view_format().is_color() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Only color textures can be cleared ({:?})", record.view_format());
        }
        if mipmap_count == 0 || !range_inside(base_mipmap as u64, mipmap_count as u64, record.desc.mipmaps as u64) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Mip range {}+{} outside texture with {} mip(s)", base_mipmap, mipmap_count, record.desc.mipmaps);
        }
        if layer_count == 0 || !range_inside(base_layer as u64, layer_count as u64, record.desc.array_layers as u64) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Layer range {}+{} outside texture with {} layer(s)", base_layer, layer_count, record.desc.array_layers);
        }

        let (native, root_layer, root_mipmap) = self.texture_subresource(texture, record, base_layer, base_mipmap)?;
        self.backend.clear_texture(native, color, TextureClearRange {
            base_mipmap: root_mipmap,
            mipmaps: mipmap_count,
            base_layer: root_layer,
            layers: layer_count,
        })
    }

    /// Copy a region between two textures
    #[allow(clippy::too_many_arguments)]
    pub fn texture_copy(
        &mut self,
        from: Handle,
        to: Handle,
        from_pos: UVec3,
        to_pos: UVec3,
        size: UVec3,
        src_mipmap: u32,
        dst_mipmap: u32,
        src_layer: u32,
        dst_layer: u32,
    ) -> Result<()> {
        self.ensure_not_recording("texture_copy")?;
        let src = self.texture_record(from)?;
        let dst = self.texture_record(to)?;

        if !src.desc.usage.contains(TextureUsage::CAN_COPY_FROM) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Source {} was not created with CAN_COPY_FROM", from);
        }
        if !dst.desc.usage.contains(TextureUsage::CAN_COPY_TO) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Destination {} was not created with CAN_COPY_TO", to);
        }
        if size.x == 0 || size.y == 0 || size.z == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Copy size {} is empty", size);
        }

        for (label, record, position, mipmap, layer) in [
            ("Source", src, from_pos, src_mipmap, src_layer),
            ("Destination", dst, to_pos, dst_mipmap, dst_layer),
        ] {
            let desc = &record.desc;
            if mipmap >= desc.mipmaps || layer >= desc.array_layers {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} mip {} / layer {} out of range ({} mip(s), {} layer(s))",
                    label, mipmap, layer, desc.mipmaps, desc.array_layers);
            }
            let (width, height, depth) = mip_dimensions(desc.width, desc.height, desc.depth, mipmap);
            let fits = range_inside(position.x as u64, size.x as u64, width as u64)
                && range_inside(position.y as u64, size.y as u64, height as u64)
                && range_inside(position.z as u64, size.z as u64, depth as u64);
            if !fits {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} region {}+{} outside mip {} ({}x{}x{})", label, position, size, mipmap, width, height, depth);
            }
        }

        let (src_format, dst_format) = (src.view_format(), dst.view_format());
        if src_format.info().aspect != dst_format.info().aspect {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Cannot copy between {:?} and {:?}: aspects differ", src_format, dst_format);
        }
        if src.desc.samples != dst.desc.samples {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Cannot copy between textures with {:?} and {:?} samples", src.desc.samples, dst.desc.samples);
        }
        let (src_info, dst_info) = (src_format.info(), dst_format.info());
        if src_info.block_bytes != dst_info.block_bytes
            || src_info.block_width != dst_info.block_width
            || src_info.block_height != dst_info.block_height
        {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Cannot copy between {:?} and {:?}: block sizes differ", src_format, dst_format);
        }

        // Compressed regions start on a block and cover whole blocks, unless they end on the mip edge
        let (block_width, block_height) = (src_info.block_width, src_info.block_height);
        for (label, record, position, mipmap) in [
            ("Source", src, from_pos, src_mipmap),
            ("Destination", dst, to_pos, dst_mipmap),
        ] {
            let (width, height, _) = mip_dimensions(record.desc.width, record.desc.height, record.desc.depth, mipmap);
            let aligned = position.x % block_width == 0
                && position.y % block_height == 0
                && (size.x % block_width == 0 || position.x + size.x == width)
                && (size.y % block_height == 0 || position.y + size.y == height);
            if !aligned {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} region {}+{} is not aligned to {}x{} blocks of {:?}",
                    label, position, size, block_width, block_height, record.view_format());
            }
        }

        let (src_native, src_root_layer, src_root_mipmap) = self.texture_subresource(from, src, src_layer, src_mipmap)?;
        let (dst_native, dst_root_layer, dst_root_mipmap) = self.texture_subresource(to, dst, dst_layer, dst_mipmap)?;
        let region = TextureCopyRegion {
            src: src_native,
            dst: dst_native,
            from: from_pos,
            to: to_pos,
            size,
            src_mipmap: src_root_mipmap,
            dst_mipmap: dst_root_mipmap,
            src_layer: src_root_layer,
            dst_layer: dst_root_layer,
        };
        self.backend.copy_texture(&region)
    }

    /// Resolve a multisampled texture into a single-sampled one
    pub fn texture_resolve_multisample(&mut self, from: Handle, into: Handle) -> Result<()> {
        self.ensure_not_recording("texture_resolve_multisample")?;
        let src = self.texture_record(from)?;
        let dst = self.texture_record(into)?;

        if src.desc.samples == TextureSamples::X1 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Source {} is not multisampled", from);
        }
        if dst.desc.samples != TextureSamples::X1 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Destination {} is multisampled", into);
        }
        if src.desc.width != dst.desc.width || src.desc.height != dst.desc.height {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Resolve needs equal sizes ({}x{} vs {}x{})",
                src.desc.width, src.desc.height, dst.desc.width, dst.desc.height);
        }
        if src.view_format() != dst.view_format() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Resolve needs equal formats ({:?} vs {:?})", src.view_format(), dst.view_format());
        }
        if !src.desc.usage.contains(TextureUsage::CAN_COPY_FROM) || !dst.desc.usage.contains(TextureUsage::CAN_COPY_TO) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Resolve needs CAN_COPY_FROM on the source and CAN_COPY_TO on the destination");
        }

        let (src_native, _, _) = self.texture_subresource(from, src, 0, 0)?;
        let (dst_native, _, _) = self.texture_subresource(into, dst, 0, 0)?;
        self.backend.resolve_texture(src_native, dst_native)
    }

    // ===== TEXTURE QUERIES =====

    pub fn texture_is_valid(&self, texture: Handle) -> bool {
        texture.kind() == ResourceKind::Texture && self.registry.is_valid(texture)
    }

    /// True if `texture` aliases another texture's memory
    pub fn texture_is_shared(&self, texture: Handle) -> bool {
        self.registry
            .resolve(texture)
            .ok()
            .and_then(|record| record.as_texture())
            .is_some_and(|record| record.is_shared())
    }

    /// Effective descriptor (clamped samples, alias range)
    pub fn texture_get_format(&self, texture: Handle) -> Result<TextureDesc> {
        Ok(self.texture_record(texture)?.desc.clone())
    }

    /// Backend object of a texture, for interop
    pub fn texture_get_native_handle(&self, texture: Handle) -> Result<NativeHandle> {
        self.native(texture, ResourceKind::Texture)
    }

    pub fn texture_is_format_supported_for_usage(&self, format: DataFormat, usage: TextureUsage) -> bool {
        self.capabilities.is_format_supported_for_usage(format, usage)
    }

    // ===== TEXTURE HELPERS =====

    /// Check a texture descriptor and return it with the sample count clamped
    fn validate_texture_desc(&self, desc: &TextureDesc) -> Result<TextureDesc> {
        if desc.width == 0 || desc.height == 0 || desc.depth == 0 || desc.array_layers == 0 || desc.mipmaps == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Texture dimensions, layers and mipmaps must be at least 1 (got {}x{}x{}, {} layer(s), {} mip(s))",
                desc.width, desc.height, desc.depth, desc.array_layers, desc.mipmaps);
        }

        match desc.texture_type {
            TextureType::Type1D | TextureType::Type1DArray if desc.height != 1 || desc.depth != 1 => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "1D textures need height and depth 1 (got {}x{})", desc.height, desc.depth);
            }
            TextureType::Type2D | TextureType::Type2DArray if desc.depth != 1 => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "2D textures need depth 1 (got {})", desc.depth);
            }
            TextureType::Cube | TextureType::CubeArray => {
                if desc.width != desc.height || desc.depth != 1 {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Cube textures need square faces and depth 1 (got {}x{}x{})", desc.width, desc.height, desc.depth);
                }
                if desc.texture_type == TextureType::Cube && desc.array_layers != 6 {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Cube textures need exactly 6 layers (got {})", desc.array_layers);
                }
                if desc.array_layers % 6 != 0 {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Cube array layers must be a multiple of 6 (got {})", desc.array_layers);
                }
            }
            _ => {}
        }
        let single_layer_type = matches!(
            desc.texture_type,
            TextureType::Type1D | TextureType::Type2D | TextureType::Type3D
        );
        if single_layer_type && desc.array_layers != 1 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{:?} textures have exactly one layer (got {})", desc.texture_type, desc.array_layers);
        }

        let size_limit = match desc.texture_type {
            TextureType::Type1D | TextureType::Type1DArray => Limit::MaxTextureSize1D,
            TextureType::Type2D | TextureType::Type2DArray => Limit::MaxTextureSize2D,
            TextureType::Type3D => Limit::MaxTextureSize3D,
            TextureType::Cube | TextureType::CubeArray => Limit::MaxTextureSizeCube,
        };
        let max_size = self.limit_get(size_limit);
        if [desc.width, desc.height, desc.depth].iter().any(|d| *d as u64 > max_size) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Texture {}x{}x{} exceeds the device limit of {}", desc.width, desc.height, desc.depth, max_size);
        }
        if desc.array_layers as u64 > self.limit_get(Limit::MaxTextureArrayLayers) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} layers exceed the device limit of {}", desc.array_layers, self.limit_get(Limit::MaxTextureArrayLayers));
        }

        let max_mips = max_mipmaps(desc.width, desc.height, desc.depth);
        if desc.mipmaps > max_mips {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} mipmaps requested, at most {} for {}x{}x{}", desc.mipmaps, max_mips, desc.width, desc.height, desc.depth);
        }

        if desc.samples != TextureSamples::X1 {
            if !matches!(desc.texture_type, TextureType::Type2D | TextureType::Type2DArray) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Multisampling is only available for 2D textures ({:?})", desc.texture_type);
            }
            if desc.mipmaps != 1 {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Multisampled textures cannot have mipmaps");
            }
        }

        let format = desc.format;
        let usage = desc.usage;
        if usage.is_empty() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Texture usage is empty");
        }
        if usage.contains(TextureUsage::COLOR_ATTACHMENT) && !format.is_color() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "COLOR_ATTACHMENT needs a color format ({:?})", format);
        }
        if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) && !format.is_depth_stencil() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "DEPTH_STENCIL_ATTACHMENT needs a depth format ({:?})", format);
        }
        let forbidden_compressed = TextureUsage::ATTACHMENT_BITS | TextureUsage::STORAGE | TextureUsage::STORAGE_ATOMIC;
        if format.is_compressed() && usage.intersects(forbidden_compressed) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Compressed format {:?} cannot be used as attachment or storage", format);
        }
        if let Some(shareable) = desc.shareable_formats.iter().find(|f| !format.is_view_compatible(**f)) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Shareable format {:?} is not view compatible with {:?}", shareable, format);
        }
        if !self.capabilities.is_format_supported_for_usage(format, usage) {
            engine_bail!("galaxy3d::RenderingDevice", Unsupported,
                "Format {:?} does not support usage {:?} on this device", format, usage);
        }

        let samples = self.capabilities.texture_samples_for_format(format, desc.samples);
        if samples != desc.samples {
            engine_warn!("galaxy3d::RenderingDevice",
                "{:?} samples not supported for {:?}, using {:?}", desc.samples, format, samples);
        }

        Ok(TextureDesc {
            samples,
            ..desc.clone()
        })
    }

    /// A view may use the texture format or one of its shareable formats
    fn validate_view_format(&self, desc: &TextureDesc, view: &TextureView) -> Result<()> {
        match view.format_override {
            None => Ok(()),
            Some(format) if format == desc.format => Ok(()),
            Some(format) if desc.shareable_formats.contains(&format) && desc.format.is_view_compatible(format) => Ok(()),
            Some(format) => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "View format {:?} is neither {:?} nor one of its shareable formats", format, desc.format);
            }
        }
    }

    /// Native object, layer and mip level owning `layer`/`mipmap` of a texture
    ///
    /// Aliases are resolved to their root source with the slice offsets applied.
    pub(super) fn texture_subresource(
        &self,
        texture: Handle,
        record: &TextureRecord,
        layer: u32,
        mipmap: u32,
    ) -> Result<(NativeHandle, u32, u32)> {
        match record.shared {
            None => Ok((self.native(texture, ResourceKind::Texture)?, layer, mipmap)),
            Some(slice) => Ok((
                self.native(slice.source, ResourceKind::Texture)?,
                slice.base_layer + layer,
                slice.base_mipmap + mipmap,
            )),
        }
    }

    /// Native object and layer for a whole-layer transfer
    ///
    /// Aliases must cover every mip of their source, so that one alias layer
    /// maps onto one source layer.
    fn texture_layer_target(&self, texture: Handle, record: &TextureRecord, layer: u32) -> Result<(NativeHandle, u32)> {
        if let Some(slice) = record.shared {
            let root = self.texture_record(slice.source)?;
            if slice.base_mipmap != 0 || slice.mipmaps != root.desc.mipmaps || record.desc.depth != root.desc.depth {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Layer transfers on {} need the alias to cover every mip of its source", texture);
            }
        }
        let (native, root_layer, _) = self.texture_subresource(texture, record, layer, 0)?;
        Ok((native, root_layer))
    }

    // ===== BUFFERS =====

    fn create_buffer_resource(&mut self, desc: BufferDesc, index: Option<IndexLayout>, data: Option<&[u8]>) -> Result<Handle> {
        if desc.size == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Buffer size must be greater than 0");
        }
        if let Some(data) = data {
            self.ensure_not_recording("buffer creation with initial data")?;
            if data.len() as u64 != desc.size {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Initial data is {} bytes, buffer is {}", data.len(), desc.size);
            }
        }

        self.create_resource(ResourceKind::Buffer, Vec::new(), move |backend| {
            let native = backend.create_buffer(&desc, data)?;
            Ok((Some(native), ResourcePayload::Buffer(BufferRecord { desc, index })))
        })
    }

    /// Create a vertex buffer
    ///
    /// # Arguments
    ///
    /// * `size` - Size in bytes
    /// * `data` - Optional initial contents (exactly `size` bytes)
    /// * `use_as_storage` - Also allow binding as a storage buffer
    pub fn vertex_buffer_create(&mut self, size: u64, data: Option<&[u8]>, use_as_storage: bool) -> Result<Handle> {
        let mut usage = BufferUsage::VERTEX;
        if use_as_storage {
            usage |= BufferUsage::STORAGE;
        }
        self.create_buffer_resource(BufferDesc { size, usage, texel_format: None }, None, data)
    }

    /// Create an index buffer holding `index_count` indices of `format`
    pub fn index_buffer_create(
        &mut self,
        index_count: u32,
        format: IndexFormat,
        data: Option<&[u8]>,
        use_restart_indices: bool,
    ) -> Result<Handle> {
        if index_count == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Index count must be greater than 0");
        }
        let desc = BufferDesc {
            size: index_count as u64 * format.bytes(),
            usage: BufferUsage::INDEX,
            texel_format: None,
        };
        let layout = IndexLayout {
            format,
            count: index_count,
            use_restart_indices,
        };
        self.create_buffer_resource(desc, Some(layout), data)
    }

    pub fn index_buffer_create_u16(&mut self, indices: &[u16], use_restart_indices: bool) -> Result<Handle> {
        self.index_buffer_create(
            indices.len() as u32,
            IndexFormat::Uint16,
            Some(bytemuck::cast_slice(indices)),
            use_restart_indices,
        )
    }

    pub fn index_buffer_create_u32(&mut self, indices: &[u32], use_restart_indices: bool) -> Result<Handle> {
        self.index_buffer_create(
            indices.len() as u32,
            IndexFormat::Uint32,
            Some(bytemuck::cast_slice(indices)),
            use_restart_indices,
        )
    }

    pub fn uniform_buffer_create(&mut self, size: u64, data: Option<&[u8]>) -> Result<Handle> {
        let max = self.limit_get(Limit::MaxUniformBufferSize);
        if size > max {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Uniform buffer of {} bytes exceeds the device limit of {}", size, max);
        }
        self.create_buffer_resource(BufferDesc { size, usage: BufferUsage::UNIFORM, texel_format: None }, None, data)
    }

    pub fn storage_buffer_create(&mut self, size: u64, data: Option<&[u8]>, usage: StorageBufferUsage) -> Result<Handle> {
        let mut buffer_usage = BufferUsage::STORAGE;
        if usage.contains(StorageBufferUsage::DISPATCH_INDIRECT) {
            buffer_usage |= BufferUsage::DISPATCH_INDIRECT;
        }
        self.create_buffer_resource(BufferDesc { size, usage: buffer_usage, texel_format: None }, None, data)
    }

    /// Create a texel buffer read through `format`
    pub fn texture_buffer_create(&mut self, size: u64, format: DataFormat, data: Option<&[u8]>) -> Result<Handle> {
        if !self.capabilities.features(format).contains(FormatFeatures::TEXEL_BUFFER) {
            engine_bail!("galaxy3d::RenderingDevice", Unsupported,
                "Format {:?} cannot be used for texel buffers", format);
        }
        let block = format.block_bytes() as u64;
        if block == 0 || size % block != 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Texel buffer size {} is not a multiple of the {:?} texel size", size, format);
        }
        let desc = BufferDesc {
            size,
            usage: BufferUsage::TEXEL,
            texel_format: Some(format),
        };
        self.create_buffer_resource(desc, None, data)
    }

    /// Write `data` at `offset`
    pub fn buffer_update(&mut self, buffer: Handle, offset: u64, data: &[u8]) -> Result<()> {
        self.ensure_not_recording("buffer_update")?;
        let size = self.buffer_record(buffer)?.size();
        if data.is_empty() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Buffer update with no data");
        }
        if !range_inside(offset, data.len() as u64, size) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Update of {} bytes at {} overflows {} ({} bytes)", data.len(), offset, buffer, size);
        }
        let native = self.native(buffer, ResourceKind::Buffer)?;
        self.backend.update_buffer(native, offset, data)
    }

    /// Zero `size` bytes at `offset` (both multiples of 4)
    pub fn buffer_clear(&mut self, buffer: Handle, offset: u64, size: u64) -> Result<()> {
        self.ensure_not_recording("buffer_clear")?;
        let total = self.buffer_record(buffer)?.size();
        if offset % 4 != 0 || size % 4 != 0 || size == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Buffer clear needs a non-empty size and offset multiple of 4 (offset {}, size {})", offset, size);
        }
        if !range_inside(offset, size, total) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Clear of {} bytes at {} overflows {} ({} bytes)", size, offset, buffer, total);
        }
        let native = self.native(buffer, ResourceKind::Buffer)?;
        self.backend.clear_buffer(native, offset, size)
    }

    /// Read `size` bytes at `offset` (`size` 0 reads to the end)
    pub fn buffer_get_data(&mut self, buffer: Handle, offset: u64, size: u64) -> Result<Vec<u8>> {
        self.ensure_not_touched(&[buffer], "buffer_get_data")?;
        let total = self.buffer_record(buffer)?.size();
        if offset > total {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Read offset {} past the end of {} ({} bytes)", offset, buffer, total);
        }
        let size = if size == 0 { total - offset } else { size };
        if !range_inside(offset, size, total) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Read of {} bytes at {} overflows {} ({} bytes)", size, offset, buffer, total);
        }
        if size == 0 {
            return Ok(Vec::new());
        }
        let native = self.native(buffer, ResourceKind::Buffer)?;
        self.backend.read_buffer(native, offset, size)
    }

    // ===== ARRAYS =====

    /// Describe a range of an index buffer
    pub fn index_array_create(&mut self, index_buffer: Handle, index_offset: u32, index_count: u32) -> Result<Handle> {
        let record = self.buffer_record(index_buffer)?;
        let Some(layout) = record.index else {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "{} is not an index buffer", index_buffer);
        };
        if index_count == 0 || !range_inside(index_offset as u64, index_count as u64, layout.count as u64) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Index range {}+{} outside buffer with {} indices", index_offset, index_count, layout.count);
        }

        let payload = ResourcePayload::IndexArray(IndexArrayRecord {
            buffer: index_buffer,
            offset: index_offset,
            count: index_count,
            format: layout.format,
        });
        Ok(self.insert_cpu_resource(payload, vec![index_buffer]))
    }

    /// Bind one vertex buffer per attribute of `vertex_format`
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Vertices drawn from the array
    /// * `vertex_format` - Interned vertex format
    /// * `buffers` - One vertex buffer per attribute, in attribute order
    /// * `offsets` - Empty, or one byte offset per buffer
    pub fn vertex_array_create(
        &mut self,
        vertex_count: u32,
        vertex_format: Handle,
        buffers: &[Handle],
        offsets: &[u64],
    ) -> Result<Handle> {
        if vertex_count == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Vertex count must be greater than 0");
        }
        let attributes = self.vertex_format_record(vertex_format)?.attributes.clone();
        if buffers.len() != attributes.len() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Vertex format has {} attribute(s), {} buffer(s) given", attributes.len(), buffers.len());
        }
        if !offsets.is_empty() && offsets.len() != buffers.len() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} offset(s) given for {} buffer(s)", offsets.len(), buffers.len());
        }
        let offsets: Vec<u64> = if offsets.is_empty() { vec![0; buffers.len()] } else { offsets.to_vec() };

        for ((attribute, buffer), offset) in attributes.iter().zip(buffers).zip(&offsets) {
            let record = self.buffer_record(*buffer)?;
            if !record.usage().contains(BufferUsage::VERTEX) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "{} is not a vertex buffer", buffer);
            }
            let elements = match attribute.frequency {
                VertexFrequency::Vertex => vertex_count,
                VertexFrequency::Instance => 1,
            };
            let required = attribute.required_bytes(elements);
            if !range_inside(*offset, required, record.size()) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} ({} bytes) is too small for location {}: {} bytes needed at offset {}",
                    buffer, record.size(), attribute.location, required, offset);
            }
        }

        let mut dependencies = buffers.to_vec();
        dependencies.sort_by_key(|h| h.id());
        dependencies.dedup();

        let payload = ResourcePayload::VertexArray(VertexArrayRecord {
            vertex_count,
            vertex_format,
            buffers: buffers.to_vec(),
            offsets,
        });
        Ok(self.insert_cpu_resource(payload, dependencies))
    }

    // ===== SAMPLERS =====

    pub fn sampler_create(&mut self, state: &SamplerState) -> Result<Handle> {
        if state.use_anisotropy {
            let max = self.limit_get(Limit::MaxSamplerAnisotropy) as f32;
            if !(1.0..=max).contains(&state.anisotropy_max) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Anisotropy {} outside 1..={}", state.anisotropy_max, max);
            }
        }
        if state.min_lod > state.max_lod {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "min_lod {} is greater than max_lod {}", state.min_lod, state.max_lod);
        }
        let max_bias = self.limit_get(Limit::MaxSamplerLodBias) as f32;
        if state.lod_bias.abs() > max_bias {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "LOD bias {} outside -{}..={}", state.lod_bias, max_bias, max_bias);
        }

        let state = state.clone();
        self.create_resource(ResourceKind::Sampler, Vec::new(), move |backend| {
            let native = backend.create_sampler(&state)?;
            Ok((Some(native), ResourcePayload::Sampler(state)))
        })
    }

    pub fn sampler_is_format_supported_for_filter(&self, format: DataFormat, filter: SamplerFilter) -> bool {
        self.capabilities.is_format_supported_for_filter(format, filter)
    }
}
