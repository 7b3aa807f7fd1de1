/// Shaders, uniform sets, pipelines, framebuffer/vertex formats and framebuffers

use glam::UVec2;
use crate::error::Result;
use crate::{engine_bail, engine_err, engine_warn};
use crate::device::{
    AttachmentFormat, AttachmentTarget, BufferUsage, FormatFeatures, FramebufferFormatKey,
    FramebufferFormatRecord, FramebufferPass, FramebufferRecord, Handle, Limit, NativeHandle,
    PipelineKind, PipelineRecord, PipelineSpecializationConstant, RenderPipelineDesc, ResourceKind,
    ResourcePayload, ShaderLanguage, ShaderRecord, ShaderReflection, ShaderSpirv, ShaderStage,
    ShaderStageFlags, ShaderStageSpirv, TextureSamples, TextureUsage, Uniform, UniformBinding,
    UniformSetRecord, UniformType, VertexAttribute, VertexFormatRecord,
};
use super::RenderingDevice;

/// Reject reflections exceeding the device limits
fn check_reflection(reflection: &ShaderReflection, max_push_constant: u64, max_sets: u64) -> Result<()> {
    if reflection.push_constant_size as u64 > max_push_constant {
        return Err(engine_err!("galaxy3d::RenderingDevice", InvalidParameter,
            "Push constant block of {} bytes exceeds the device limit of {}",
            reflection.push_constant_size, max_push_constant));
    }
    if let Some(set) = reflection.sets.iter().find(|s| s.set as u64 >= max_sets) {
        return Err(engine_err!("galaxy3d::RenderingDevice", InvalidParameter,
            "Shader declares set {}, the device binds at most {}", set.set, max_sets));
    }
    Ok(())
}

fn check_specialization_ids(constants: &[PipelineSpecializationConstant]) -> Result<()> {
    let mut ids: Vec<u32> = constants.iter().map(|c| c.constant_id).collect();
    ids.sort_unstable();
    if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(engine_err!("galaxy3d::RenderingDevice", InvalidParameter,
            "Specialization constant {} given more than once", pair[0]));
    }
    Ok(())
}

impl RenderingDevice {
    // ===== SHADERS =====

    /// Compile one stage to SPIR-V with the backend compiler
    ///
    /// Compiler diagnostics are returned in `compile_error`, not as an error.
    pub fn shader_compile_spirv_from_source(
        &mut self,
        stage: ShaderStage,
        source: &str,
        language: ShaderLanguage,
    ) -> Result<ShaderStageSpirv> {
        if source.trim().is_empty() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Shader source is empty");
        }
        let spirv = self.backend.compile_spirv_from_source(stage, source, language)?;
        if !spirv.compile_error.is_empty() {
            engine_warn!("galaxy3d::RenderingDevice",
                "{:?} stage compiled with errors: {}", stage, spirv.compile_error);
        }
        Ok(spirv)
    }

    /// Create a shader from SPIR-V stages; reflection comes from the backend
    pub fn shader_create_from_spirv(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<Handle> {
        self.validate_spirv(spirv)?;
        let max_push_constant = self.limit_get(Limit::MaxPushConstantSize);
        let max_sets = self.limit_get(Limit::MaxBoundUniformSets);

        self.create_resource(ResourceKind::Shader, Vec::new(), move |backend| {
            let (native, reflection) = backend.create_shader(spirv, name)?;
            if let Err(err) = check_reflection(&reflection, max_push_constant, max_sets) {
                backend.destroy(ResourceKind::Shader, native);
                return Err(err);
            }
            Ok((Some(native), ResourcePayload::Shader(ShaderRecord {
                name: name.to_string(),
                reflection: Some(reflection),
            })))
        })
    }

    /// Serialise SPIR-V stages into a backend binary blob
    pub fn shader_compile_binary_from_spirv(&mut self, spirv: &ShaderSpirv, name: &str) -> Result<Vec<u8>> {
        self.validate_spirv(spirv)?;
        self.backend.compile_shader_binary(spirv, name)
    }

    /// Create a shader from a blob produced by `shader_compile_binary_from_spirv`
    ///
    /// # Arguments
    ///
    /// * `binary` - Backend blob
    /// * `placeholder` - Placeholder handle to fill in place (keeps its id)
    pub fn shader_create_from_bytecode(&mut self, binary: &[u8], placeholder: Option<Handle>) -> Result<Handle> {
        if binary.is_empty() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Shader binary is empty");
        }
        let max_push_constant = self.limit_get(Limit::MaxPushConstantSize);
        let max_sets = self.limit_get(Limit::MaxBoundUniformSets);

        let Some(placeholder) = placeholder else {
            return self.create_resource(ResourceKind::Shader, Vec::new(), move |backend| {
                let shader = backend.create_shader_from_binary(binary)?;
                if let Err(err) = check_reflection(&shader.reflection, max_push_constant, max_sets) {
                    backend.destroy(ResourceKind::Shader, shader.native);
                    return Err(err);
                }
                Ok((Some(shader.native), ResourcePayload::Shader(ShaderRecord {
                    name: shader.name,
                    reflection: Some(shader.reflection),
                })))
            });
        };

        if !self.shader_record(placeholder)?.is_placeholder() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} is not a shader placeholder", placeholder);
        }
        let shader = self.backend.create_shader_from_binary(binary)?;
        if let Err(err) = check_reflection(&shader.reflection, max_push_constant, max_sets) {
            self.backend.destroy(ResourceKind::Shader, shader.native);
            return Err(err);
        }

        let record = self.registry.resolve_mut(placeholder)?;
        record.set_native(Some(shader.native));
        *record.payload_mut() = ResourcePayload::Shader(ShaderRecord {
            name: shader.name,
            reflection: Some(shader.reflection),
        });
        Ok(placeholder)
    }

    /// Reserve a shader handle to be filled later by `shader_create_from_bytecode`
    pub fn shader_create_placeholder(&mut self) -> Handle {
        self.insert_cpu_resource(
            ResourcePayload::Shader(ShaderRecord {
                name: String::new(),
                reflection: None,
            }),
            Vec::new(),
        )
    }

    /// Reflected interface of a shader
    pub fn shader_get_reflection(&self, shader: Handle) -> Result<&ShaderReflection> {
        match &self.shader_record(shader)?.reflection {
            Some(reflection) => Ok(reflection),
            None => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "{} is a placeholder", shader);
            }
        }
    }

    /// Bit `n` set for every vertex input location the shader reads
    pub fn shader_get_vertex_input_attribute_mask(&self, shader: Handle) -> Result<u64> {
        Ok(self.shader_get_reflection(shader)?.vertex_input_mask)
    }

    fn validate_spirv(&self, spirv: &ShaderSpirv) -> Result<()> {
        if spirv.stages.is_empty() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Shader has no stage");
        }

        let mut flags = ShaderStageFlags::empty();
        for stage in &spirv.stages {
            if !stage.compile_error.is_empty() {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{:?} stage failed to compile: {}", stage.stage, stage.compile_error);
            }
            if stage.bytecode.is_empty() || stage.bytecode.len() % 4 != 0 {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{:?} bytecode must be a non-empty multiple of 4 bytes (got {})",
                    stage.stage, stage.bytecode.len());
            }
            if flags.contains(stage.stage.flag()) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{:?} stage given more than once", stage.stage);
            }
            flags |= stage.stage.flag();
        }

        if flags.contains(ShaderStageFlags::COMPUTE) && flags != ShaderStageFlags::COMPUTE {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Compute shaders cannot be combined with other stages");
        }
        let needs_vertex = ShaderStageFlags::FRAGMENT
            | ShaderStageFlags::TESSELLATION_CONTROL
            | ShaderStageFlags::TESSELLATION_EVALUATION;
        if flags.intersects(needs_vertex) && !flags.contains(ShaderStageFlags::VERTEX) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Graphics shaders need a vertex stage ({:?})", flags);
        }
        Ok(())
    }

    // ===== UNIFORM SETS =====

    /// Create a uniform set matching set `set_index` of `shader`
    ///
    /// Every binding the shader declares for the set must be supplied once,
    /// with the declared type and id count. The set is freed along with any
    /// resource it references.
    pub fn uniform_set_create(&mut self, uniforms: &[Uniform], shader: Handle, set_index: u32) -> Result<Handle> {
        let max_sets = self.limit_get(Limit::MaxBoundUniformSets);
        if set_index as u64 >= max_sets {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Set index {} exceeds the device limit of {} bound sets", set_index, max_sets);
        }
        let layout = match self.shader_get_reflection(shader)?.set(set_index) {
            Some(layout) => layout.clone(),
            None => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} does not declare set {}", shader, set_index);
            }
        };
        let shader_native = self.native(shader, ResourceKind::Shader)?;

        if let Some(extra) = uniforms.iter().find(|u| layout.uniform(u.binding).is_none()) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Binding {} is not declared in set {}", extra.binding, set_index);
        }

        let mut bindings = Vec::with_capacity(layout.uniforms.len());
        let mut dependencies = Vec::new();
        for declared in &layout.uniforms {
            let mut matching = uniforms.iter().filter(|u| u.binding == declared.binding);
            let Some(uniform) = matching.next() else {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Binding {} of set {} is not supplied", declared.binding, set_index);
            };
            if matching.next().is_some() {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Binding {} supplied more than once", declared.binding);
            }
            if uniform.uniform_type != declared.uniform_type {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Binding {} expects {:?}, got {:?}", declared.binding, declared.uniform_type, uniform.uniform_type);
            }
            let expected_ids = declared.length as usize * declared.uniform_type.ids_per_element();
            if uniform.ids.len() != expected_ids {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Binding {} expects {} id(s), got {}", declared.binding, expected_ids, uniform.ids.len());
            }

            let mut natives = Vec::with_capacity(uniform.ids.len());
            for (position, id) in uniform.ids.iter().enumerate() {
                natives.push(self.uniform_id_native(declared.uniform_type, position, *id, declared.binding)?);
                dependencies.push(*id);
            }
            bindings.push(UniformBinding {
                binding: declared.binding,
                uniform_type: declared.uniform_type,
                natives,
            });
        }
        dependencies.sort_by_key(|h| h.id());
        dependencies.dedup();

        let record = UniformSetRecord {
            shader,
            set_index,
            layout,
            uniforms: uniforms.to_vec(),
        };
        self.create_resource(ResourceKind::UniformSet, dependencies, move |backend| {
            let native = backend.create_uniform_set(shader_native, set_index, &bindings)?;
            Ok((Some(native), ResourcePayload::UniformSet(record)))
        })
    }

    pub fn uniform_set_is_valid(&self, uniform_set: Handle) -> bool {
        uniform_set.kind() == ResourceKind::UniformSet && self.registry.is_valid(uniform_set)
    }

    /// Native object bound at position `position` of a binding of `uniform_type`
    fn uniform_id_native(&self, uniform_type: UniformType, position: usize, id: Handle, binding: u32) -> Result<NativeHandle> {
        let sampler_slot = uniform_type.ids_per_element() == 2 && position % 2 == 0;
        if uniform_type == UniformType::Sampler || sampler_slot {
            return self.native(id, ResourceKind::Sampler);
        }
        match uniform_type {
            UniformType::SamplerWithTexture | UniformType::Texture => {
                self.texture_for_binding(id, TextureUsage::SAMPLING, binding)
            }
            UniformType::Image => self.texture_for_binding(id, TextureUsage::STORAGE, binding),
            UniformType::InputAttachment => self.texture_for_binding(id, TextureUsage::INPUT_ATTACHMENT, binding),
            UniformType::TextureBuffer | UniformType::SamplerWithTextureBuffer | UniformType::ImageBuffer => {
                self.buffer_for_binding(id, BufferUsage::TEXEL, binding)
            }
            UniformType::UniformBuffer => self.buffer_for_binding(id, BufferUsage::UNIFORM, binding),
            UniformType::StorageBuffer => self.buffer_for_binding(id, BufferUsage::STORAGE, binding),
            UniformType::Sampler => self.native(id, ResourceKind::Sampler),
        }
    }

    fn texture_for_binding(&self, texture: Handle, usage: TextureUsage, binding: u32) -> Result<NativeHandle> {
        let record = self.texture_record(texture)?;
        if !record.desc.usage.contains(usage) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} bound at binding {} lacks {:?} usage", texture, binding, usage);
        }
        self.native(texture, ResourceKind::Texture)
    }

    fn buffer_for_binding(&self, buffer: Handle, usage: BufferUsage, binding: u32) -> Result<NativeHandle> {
        let record = self.buffer_record(buffer)?;
        if !record.usage().contains(usage) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} bound at binding {} lacks {:?} usage", buffer, binding, usage);
        }
        self.native(buffer, ResourceKind::Buffer)
    }

    // ===== PIPELINES =====

    /// Create a render pipeline for one pass of a framebuffer format
    pub fn render_pipeline_create(&mut self, desc: &RenderPipelineDesc) -> Result<Handle> {
        let reflection = self.shader_get_reflection(desc.shader)?.clone();
        if reflection.is_compute() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} is a compute shader", desc.shader);
        }

        let format = self.framebuffer_format_record(desc.framebuffer_format)?;
        let pass = desc.for_render_pass;
        if pass >= format.pass_count() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Pass {} out of range ({} pass(es))", pass, format.pass_count());
        }
        let color_count = format.color_attachment_count(pass);
        if desc.color_blend.attachments.len() != color_count {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} blend attachment(s) given, pass {} has {} color attachment(s)",
                desc.color_blend.attachments.len(), pass, color_count);
        }
        let pass_samples = format.pass_samples(pass).unwrap_or(TextureSamples::X1);
        if desc.multisample.sample_count != pass_samples {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Pipeline uses {:?} samples, pass {} renders with {:?}",
                desc.multisample.sample_count, pass, pass_samples);
        }

        match desc.vertex_format {
            Some(vertex_format) => {
                let provided = self.vertex_format_record(vertex_format)?.location_mask();
                let missing = reflection.vertex_input_mask & !provided;
                if missing != 0 {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Shader reads vertex locations {:#x} that {} does not provide", missing, vertex_format);
                }
            }
            None if reflection.vertex_input_mask != 0 => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Shader reads vertex input ({:#x}) but no vertex format was given", reflection.vertex_input_mask);
            }
            None => {}
        }
        check_specialization_ids(&desc.specialization_constants)?;

        let shader_native = self.native(desc.shader, ResourceKind::Shader)?;
        let record = PipelineRecord {
            shader: desc.shader,
            kind: PipelineKind::Render {
                framebuffer_format: desc.framebuffer_format,
                vertex_format: desc.vertex_format,
                render_pass: pass,
                dynamic_state: desc.dynamic_state,
            },
            push_constant_size: reflection.push_constant_size,
            sets: reflection.sets,
            vertex_input_mask: reflection.vertex_input_mask,
        };
        self.create_resource(ResourceKind::Pipeline, vec![desc.shader], move |backend| {
            let native = backend.create_render_pipeline(shader_native, desc)?;
            Ok((Some(native), ResourcePayload::Pipeline(record)))
        })
    }

    /// Create a compute pipeline
    pub fn compute_pipeline_create(
        &mut self,
        shader: Handle,
        specialization_constants: &[PipelineSpecializationConstant],
    ) -> Result<Handle> {
        let reflection = self.shader_get_reflection(shader)?.clone();
        if !reflection.is_compute() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "{} is not a compute shader", shader);
        }
        check_specialization_ids(specialization_constants)?;

        let shader_native = self.native(shader, ResourceKind::Shader)?;
        let record = PipelineRecord {
            shader,
            kind: PipelineKind::Compute,
            push_constant_size: reflection.push_constant_size,
            sets: reflection.sets,
            vertex_input_mask: 0,
        };
        self.create_resource(ResourceKind::Pipeline, vec![shader], move |backend| {
            let native = backend.create_compute_pipeline(shader_native, specialization_constants)?;
            Ok((Some(native), ResourcePayload::Pipeline(record)))
        })
    }

    pub fn render_pipeline_is_valid(&self, pipeline: Handle) -> bool {
        self.pipeline_kind_is(pipeline, false)
    }

    pub fn compute_pipeline_is_valid(&self, pipeline: Handle) -> bool {
        self.pipeline_kind_is(pipeline, true)
    }

    fn pipeline_kind_is(&self, pipeline: Handle, compute: bool) -> bool {
        pipeline.kind() == ResourceKind::Pipeline
            && self
                .registry
                .resolve(pipeline)
                .ok()
                .and_then(|record| record.as_pipeline())
                .is_some_and(|record| record.is_compute() == compute)
    }

    // ===== FRAMEBUFFER FORMATS =====

    /// Intern a single-pass framebuffer format
    pub fn framebuffer_format_create(&mut self, attachments: &[AttachmentFormat], view_count: u32) -> Result<Handle> {
        self.framebuffer_format_create_multipass(attachments, &[], view_count)
    }

    /// Intern a framebuffer format
    ///
    /// Equal descriptions always return the same handle. Formats live as long
    /// as the device.
    ///
    /// # Arguments
    ///
    /// * `attachments` - Attachment formats in binding order
    /// * `passes` - Subpasses; empty means one pass over every attachment
    /// * `view_count` - Multiview count (at least 1)
    pub fn framebuffer_format_create_multipass(
        &mut self,
        attachments: &[AttachmentFormat],
        passes: &[FramebufferPass],
        view_count: u32,
    ) -> Result<Handle> {
        if view_count == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "View count must be at least 1");
        }
        for (index, attachment) in attachments.iter().enumerate() {
            if !attachment.usage.intersects(TextureUsage::ATTACHMENT_BITS) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Attachment {} has no attachment usage", index);
            }
            if attachment.usage.contains(TextureUsage::COLOR_ATTACHMENT) && !attachment.format.is_color() {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Attachment {} ({:?}) is not a color format", index, attachment.format);
            }
            if attachment.usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) && !attachment.format.is_depth_stencil() {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Attachment {} ({:?}) is not a depth format", index, attachment.format);
            }
        }

        let key = FramebufferFormatKey::canonical(attachments, passes, view_count);
        let max_colors = self.limit_get(Limit::MaxFramebufferColorAttachments);
        for (pass_index, pass) in key.passes.iter().enumerate() {
            if let Some(index) = pass.referenced().find(|i| *i as usize >= attachments.len()) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Pass {} references attachment {}, only {} given", pass_index, index, attachments.len());
            }
            if let Some(index) = pass.color_attachments.iter().find(|i| !attachments[**i as usize].format.is_color()) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Pass {} uses depth attachment {} as color", pass_index, index);
            }
            if let Some(index) = pass.depth_attachment.filter(|i| !attachments[*i as usize].format.is_depth_stencil()) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Pass {} uses color attachment {} as depth", pass_index, index);
            }
            if pass.color_attachments.len() as u64 > max_colors {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Pass {} has {} color attachments, the device allows {}",
                    pass_index, pass.color_attachments.len(), max_colors);
            }
            if !pass.resolve_attachments.is_empty() {
                if pass.resolve_attachments.len() != pass.color_attachments.len() {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Pass {} needs one resolve attachment per color attachment", pass_index);
                }
                if let Some(index) = pass
                    .resolve_attachments
                    .iter()
                    .find(|i| attachments[**i as usize].samples != TextureSamples::X1)
                {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Resolve attachment {} of pass {} is multisampled", index, pass_index);
                }
            }
        }

        Ok(self.intern_framebuffer_format(key))
    }

    /// Intern the format of an attachment-less framebuffer
    pub fn framebuffer_format_create_empty(&mut self, samples: TextureSamples) -> Handle {
        self.intern_framebuffer_format(FramebufferFormatKey::empty(samples))
    }

    fn intern_framebuffer_format(&mut self, key: FramebufferFormatKey) -> Handle {
        if let Some(handle) = self.framebuffer_formats.get(&key) {
            return handle;
        }
        let handle = self.insert_cpu_resource(
            ResourcePayload::FramebufferFormat(FramebufferFormatRecord { key: key.clone() }),
            Vec::new(),
        );
        self.framebuffer_formats.insert(key, handle);
        handle
    }

    /// Sample count rendered by one pass of a framebuffer format
    pub fn framebuffer_format_get_texture_samples(&self, format: Handle, pass: u32) -> Result<TextureSamples> {
        let record = self.framebuffer_format_record(format)?;
        match record.pass_samples(pass) {
            Some(samples) => Ok(samples),
            None => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Pass {} out of range ({} pass(es))", pass, record.pass_count());
            }
        }
    }

    // ===== FRAMEBUFFERS =====

    pub fn framebuffer_create(
        &mut self,
        textures: &[Handle],
        validate_with_format: Option<Handle>,
        view_count: u32,
    ) -> Result<Handle> {
        self.framebuffer_create_multipass(textures, &[], validate_with_format, view_count)
    }

    /// Create a framebuffer from attachment textures
    ///
    /// The format is derived from the textures and interned; when
    /// `validate_with_format` is given it must be that same format.
    pub fn framebuffer_create_multipass(
        &mut self,
        textures: &[Handle],
        passes: &[FramebufferPass],
        validate_with_format: Option<Handle>,
        view_count: u32,
    ) -> Result<Handle> {
        if textures.is_empty() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Framebuffer without textures, use framebuffer_create_empty");
        }

        let mut attachments = Vec::with_capacity(textures.len());
        let mut targets = Vec::with_capacity(textures.len());
        let mut size: Option<(u32, u32)> = None;
        for texture in textures {
            let record = self.texture_record(*texture)?;
            if !record.desc.usage.intersects(TextureUsage::ATTACHMENT_BITS) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} has no attachment usage", texture);
            }
            let dimensions = (record.desc.width, record.desc.height);
            match size {
                None => size = Some(dimensions),
                Some(expected) if expected != dimensions => {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "{} is {}x{}, other attachments are {}x{}",
                        texture, dimensions.0, dimensions.1, expected.0, expected.1);
                }
                Some(_) => {}
            }

            attachments.push(AttachmentFormat::new(record.view_format(), record.desc.samples, record.desc.usage));
            let (native, layer, mipmap) = self.texture_subresource(*texture, record, 0, 0)?;
            targets.push(AttachmentTarget {
                texture: native,
                format: record.view_format(),
                layer,
                mipmap,
            });
        }
        let (width, height) = size.unwrap_or((1, 1));
        self.check_framebuffer_size(width, height)?;

        let format = self.framebuffer_format_create_multipass(&attachments, passes, view_count)?;
        if let Some(expected) = validate_with_format {
            if expected != format {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Framebuffer textures do not match format {}", expected);
            }
        }

        let mut dependencies = textures.to_vec();
        dependencies.sort_by_key(|h| h.id());
        dependencies.dedup();

        let record = FramebufferRecord {
            format,
            textures: textures.to_vec(),
            width,
            height,
            view_count,
        };
        self.create_resource(ResourceKind::Framebuffer, dependencies, move |backend| {
            let native = backend.create_framebuffer(&targets, width, height)?;
            Ok((Some(native), ResourcePayload::Framebuffer(record)))
        })
    }

    /// Create a framebuffer without attachments
    pub fn framebuffer_create_empty(
        &mut self,
        size: UVec2,
        samples: TextureSamples,
        validate_with_format: Option<Handle>,
    ) -> Result<Handle> {
        self.check_framebuffer_size(size.x, size.y)?;
        let format = self.framebuffer_format_create_empty(samples);
        if let Some(expected) = validate_with_format {
            if expected != format {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Empty framebuffer does not match format {}", expected);
            }
        }

        let record = FramebufferRecord {
            format,
            textures: Vec::new(),
            width: size.x,
            height: size.y,
            view_count: 1,
        };
        self.create_resource(ResourceKind::Framebuffer, Vec::new(), move |backend| {
            let native = backend.create_framebuffer(&[], size.x, size.y)?;
            Ok((Some(native), ResourcePayload::Framebuffer(record)))
        })
    }

    /// Interned format of a framebuffer
    pub fn framebuffer_get_format(&self, framebuffer: Handle) -> Result<Handle> {
        Ok(self.framebuffer_record(framebuffer)?.format)
    }

    pub fn framebuffer_is_valid(&self, framebuffer: Handle) -> bool {
        framebuffer.kind() == ResourceKind::Framebuffer && self.registry.is_valid(framebuffer)
    }

    fn check_framebuffer_size(&self, width: u32, height: u32) -> Result<()> {
        let max_width = self.limit_get(Limit::MaxFramebufferWidth);
        let max_height = self.limit_get(Limit::MaxFramebufferHeight);
        if width == 0 || height == 0 || width as u64 > max_width || height as u64 > max_height {
            return Err(engine_err!("galaxy3d::RenderingDevice", InvalidParameter,
                "Framebuffer size {}x{} outside 1x1..={}x{}", width, height, max_width, max_height));
        }
        Ok(())
    }

    // ===== VERTEX FORMATS =====

    /// Intern a vertex format
    ///
    /// Attribute order is significant: vertex arrays bind `buffers[i]` to
    /// `attributes[i]`, so `[loc1, loc0]` and `[loc0, loc1]` are distinct formats.
    pub fn vertex_format_create(&mut self, attributes: &[VertexAttribute]) -> Result<Handle> {
        let max_attributes = self.limit_get(Limit::MaxVertexInputAttributes);
        if attributes.is_empty() || attributes.len() as u64 > max_attributes {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Vertex formats need 1..={} attributes (got {})", max_attributes, attributes.len());
        }

        let mut locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();
        locations.sort_unstable();
        if let Some(pair) = locations.windows(2).find(|pair| pair[0] == pair[1]) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Vertex location {} given more than once", pair[0]);
        }

        let max_stride = self.limit_get(Limit::MaxVertexInputBindingStride);
        let max_offset = self.limit_get(Limit::MaxVertexInputAttributeOffset);
        for attribute in attributes {
            if attribute.location as u64 >= max_attributes {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Vertex location {} exceeds the device limit of {}", attribute.location, max_attributes);
            }
            if !self.capabilities.features(attribute.format).contains(FormatFeatures::VERTEX_BUFFER) {
                engine_bail!("galaxy3d::RenderingDevice", Unsupported,
                    "Format {:?} cannot be used for vertex input", attribute.format);
            }
            if attribute.stride as u64 > max_stride || attribute.offset as u64 > max_offset {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Location {}: stride {} / offset {} exceed the device limits ({} / {})",
                    attribute.location, attribute.stride, attribute.offset, max_stride, max_offset);
            }
            if attribute.stride != 0 && attribute.offset + attribute.format.block_bytes() > attribute.stride {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Location {}: attribute does not fit its stride of {}", attribute.location, attribute.stride);
            }
        }

        let key = attributes.to_vec();
        if let Some(handle) = self.vertex_formats.get(&key) {
            return Ok(handle);
        }
        let handle = self.insert_cpu_resource(
            ResourcePayload::VertexFormat(VertexFormatRecord { attributes: key.clone() }),
            Vec::new(),
        );
        self.vertex_formats.insert(key, handle);
        Ok(handle)
    }
}
