/// Draw and compute lists, debug labels

use glam::Vec4;
use crate::error::{Error, Result};
use crate::{engine_bail, engine_error, engine_trace, engine_warn};
use crate::device::{
    BufferUsage, CommandList, DrawTarget, FinalAction, Handle, InitialAction, Limit, ListCommand,
    ListId, ListKind, PassBegin, PipelineKind, PipelineRecord, Rect2D, ResourceKind, WorkItem,
};
use super::RenderingDevice;

/// Bytes read by an indirect dispatch (three u32 group counts)
const DISPATCH_INDIRECT_SIZE: u64 = 12;

/// Close labels left open in a list before it ends
fn close_labels(list: &mut CommandList, record: bool) {
    let mut closed = 0;
    while list.pop_label() {
        closed += 1;
        if record {
            list.record(ListCommand::EndLabel);
        }
    }
    if closed > 0 {
        engine_warn!("galaxy3d::RenderingDevice",
            "{} debug label(s) left open in {}, closing them", closed, list.id());
    }
}

impl RenderingDevice {
    // ===== LIST ACCESS =====

    fn list_slot(&self, kind: ListKind) -> Option<&CommandList> {
        match kind {
            ListKind::Draw => self.draw_list.as_ref(),
            ListKind::Compute => self.compute_list.as_ref(),
        }
    }

    fn list_slot_mut(&mut self, kind: ListKind) -> Option<&mut CommandList> {
        match kind {
            ListKind::Draw => self.draw_list.as_mut(),
            ListKind::Compute => self.compute_list.as_mut(),
        }
    }

    /// Open list of `kind` identified by `id`
    fn open_list(&self, kind: ListKind, id: ListId) -> Result<&CommandList> {
        match self.list_slot(kind) {
            None => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "No {:?} list is recording ({} given)", kind, id);
            }
            Some(list) if list.id() != id => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} is not the recording {:?} list ({})", id, kind, list.id());
            }
            Some(list) => Ok(list),
        }
    }

    fn open_list_mut(&mut self, kind: ListKind, id: ListId) -> Result<&mut CommandList> {
        self.open_list(kind, id)?;
        self.list_slot_mut(kind).ok_or_else(|| Error::InvalidParameter(format!("No {:?} list is recording", kind)))
    }

    fn next_list_id(&mut self) -> ListId {
        let id = ListId(self.next_list_id);
        self.next_list_id += 1;
        id
    }

    /// Handles a list must consider in use once it binds `handles`
    fn with_texture_roots(&self, handles: &[Handle]) -> Vec<Handle> {
        let mut touched = Vec::with_capacity(handles.len());
        for handle in handles {
            touched.push(*handle);
            let root = self.texture_root(*handle);
            if root != *handle {
                touched.push(root);
            }
        }
        touched
    }

    // ===== DRAW LISTS =====

    /// Begin a draw list on a framebuffer
    ///
    /// # Arguments
    ///
    /// * `framebuffer` - Target framebuffer
    /// * `initial_color` / `final_color` - Load and store actions of color attachments
    /// * `initial_depth` / `final_depth` - Load and store actions of the depth attachment
    /// * `clear_colors` - One color per color attachment when `initial_color` is `Clear`
    /// * `clear_depth` / `clear_stencil` - Depth clear values
    /// * `region` - Drawn area, the whole framebuffer if `None`
    #[allow(clippy::too_many_arguments)]
    pub fn draw_list_begin(
        &mut self,
        framebuffer: Handle,
        initial_color: InitialAction,
        final_color: FinalAction,
        initial_depth: InitialAction,
        final_depth: FinalAction,
        clear_colors: &[Vec4],
        clear_depth: f32,
        clear_stencil: u32,
        region: Option<Rect2D>,
    ) -> Result<ListId> {
        if self.draw_list.is_some() {
            engine_error!("galaxy3d::RenderingDevice",
                "draw_list_begin: a draw list is already recording");
            return Err(Error::ListAlreadyOpen(ListKind::Draw));
        }

        let record = self.framebuffer_record(framebuffer)?;
        if let Some(stale) = record.textures.iter().find(|t| !self.registry.is_valid(**t)) {
            engine_error!("galaxy3d::RenderingDevice",
                "Attachment {} of {} no longer resolves", stale, framebuffer);
            return Err(Error::InvalidHandle(*stale));
        }
        let (width, height) = (record.width, record.height);
        let format_handle = record.format;
        let textures = record.textures.clone();

        let format = self.framebuffer_format_record(format_handle)?;
        let color_count = format.key.attachments.iter().filter(|a| a.format.is_color()).count();
        if initial_color == InitialAction::Clear && clear_colors.len() < color_count {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} clear color(s) given for {} color attachment(s)", clear_colors.len(), color_count);
        }
        let pass_count = format.pass_count();

        let region = match region {
            None => Rect2D::new(0, 0, width, height),
            Some(region) if region.is_empty() || !region.fits_in(width, height) => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Region {:?} is empty or outside the {}x{} framebuffer", region, width, height);
            }
            Some(region) => region,
        };
        let native = self.native(framebuffer, ResourceKind::Framebuffer)?;
        let touched = self.with_texture_roots(&textures);

        let id = self.next_list_id();
        let mut list = CommandList::new_draw(id, DrawTarget {
            framebuffer,
            framebuffer_format: format_handle,
            current_pass: 0,
            pass_count,
            region,
            final_color,
            final_depth,
        });
        for handle in touched {
            list.touch(handle);
        }
        list.record(ListCommand::BeginPass(PassBegin {
            framebuffer: native,
            region,
            initial_color,
            initial_depth,
            clear_colors: if initial_color == InitialAction::Clear {
                clear_colors[..color_count].to_vec()
            } else {
                Vec::new()
            },
            clear_depth,
            clear_stencil,
        }));
        self.draw_list = Some(list);

        engine_trace!("galaxy3d::RenderingDevice", "Draw list {} begun on {}", id, framebuffer);
        Ok(id)
    }

    /// Bind a render pipeline built for the framebuffer format and current pass
    pub fn draw_list_bind_render_pipeline(&mut self, list: ListId, pipeline: Handle) -> Result<()> {
        let target = match self.open_list(ListKind::Draw, list)?.target() {
            Some(target) => (target.framebuffer_format, target.current_pass),
            None => return Err(Error::InvalidParameter(format!("{} has no framebuffer", list))),
        };
        let record = self.pipeline_record(pipeline)?;
        match record.kind {
            PipelineKind::Render { framebuffer_format, render_pass, .. } => {
                if (framebuffer_format, render_pass) != target {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "{} was built for {} pass {}, the list renders {} pass {}",
                        pipeline, framebuffer_format, render_pass, target.0, target.1);
                }
            }
            PipelineKind::Compute => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} is a compute pipeline", pipeline);
            }
        }
        let native = self.native(pipeline, ResourceKind::Pipeline)?;

        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.bound_mut().pipeline = Some(pipeline);
        list.touch(pipeline);
        list.record(ListCommand::BindRenderPipeline(native));
        Ok(())
    }

    pub fn draw_list_bind_uniform_set(&mut self, list: ListId, uniform_set: Handle, set_index: u32) -> Result<()> {
        self.bind_uniform_set(ListKind::Draw, list, uniform_set, set_index)
    }

    /// Bind the vertex buffers of a vertex array
    pub fn draw_list_bind_vertex_array(&mut self, list: ListId, vertex_array: Handle) -> Result<()> {
        self.open_list(ListKind::Draw, list)?;
        let record = self.vertex_array_record(vertex_array)?;
        let buffers = record.buffers.clone();
        let offsets = record.offsets.clone();
        let natives = buffers
            .iter()
            .map(|buffer| self.native(*buffer, ResourceKind::Buffer))
            .collect::<Result<Vec<_>>>()?;

        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.bound_mut().vertex_array = Some(vertex_array);
        list.touch(vertex_array);
        for buffer in buffers {
            list.touch(buffer);
        }
        list.record(ListCommand::BindVertexArray { buffers: natives, offsets });
        Ok(())
    }

    pub fn draw_list_bind_index_array(&mut self, list: ListId, index_array: Handle) -> Result<()> {
        self.open_list(ListKind::Draw, list)?;
        let record = *self.index_array_record(index_array)?;
        let native = self.native(record.buffer, ResourceKind::Buffer)?;

        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.bound_mut().index_array = Some(index_array);
        list.touch(index_array);
        list.touch(record.buffer);
        list.record(ListCommand::BindIndexArray {
            buffer: native,
            format: record.format,
            offset: record.offset,
            count: record.count,
        });
        Ok(())
    }

    pub fn draw_list_set_push_constant(&mut self, list: ListId, data: &[u8]) -> Result<()> {
        self.set_push_constant(ListKind::Draw, list, data)
    }

    pub fn draw_list_set_blend_constants(&mut self, list: ListId, color: Vec4) -> Result<()> {
        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.bound_mut().blend_constants = Some(color);
        list.record(ListCommand::SetBlendConstants(color));
        Ok(())
    }

    /// Restrict drawing to `rect` (must lie inside the framebuffer)
    pub fn draw_list_enable_scissor(&mut self, list: ListId, rect: Rect2D) -> Result<()> {
        let framebuffer = match self.open_list(ListKind::Draw, list)?.target() {
            Some(target) => target.framebuffer,
            None => return Err(Error::InvalidParameter(format!("{} has no framebuffer", list))),
        };
        let record = self.framebuffer_record(framebuffer)?;
        if !rect.fits_in(record.width, record.height) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Scissor {:?} outside the {}x{} framebuffer", rect, record.width, record.height);
        }

        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.bound_mut().scissor = Some(rect);
        list.record(ListCommand::SetScissor(Some(rect)));
        Ok(())
    }

    pub fn draw_list_disable_scissor(&mut self, list: ListId) -> Result<()> {
        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.bound_mut().scissor = None;
        list.record(ListCommand::SetScissor(None));
        Ok(())
    }

    /// Move to the next pass of a multipass framebuffer
    ///
    /// The bound pipeline is dropped: pipelines are built per pass.
    pub fn draw_list_switch_to_next_pass(&mut self, list: ListId) -> Result<ListId> {
        let list_ref = self.open_list_mut(ListKind::Draw, list)?;
        let Some(target) = list_ref.target_mut() else {
            return Err(Error::InvalidParameter(format!("{} has no framebuffer", list)));
        };
        if target.current_pass + 1 >= target.pass_count {
            let (current, count) = (target.current_pass, target.pass_count);
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Already on the last pass ({} of {})", current + 1, count);
        }
        target.current_pass += 1;
        list_ref.bound_mut().pipeline = None;
        list_ref.record(ListCommand::NextSubpass);
        Ok(list)
    }

    pub fn draw_list_get_current_pass(&self, list: ListId) -> Result<u32> {
        Ok(self
            .open_list(ListKind::Draw, list)?
            .target()
            .map_or(0, |target| target.current_pass))
    }

    /// Record a draw
    ///
    /// # Arguments
    ///
    /// * `use_indices` - Draw the bound index array
    /// * `instances` - Instance count (at least 1)
    /// * `procedural_vertex_count` - Vertices generated by the shader; 0 to
    ///   draw the bound vertex array
    pub fn draw_list_draw(
        &mut self,
        list: ListId,
        use_indices: bool,
        instances: u32,
        procedural_vertex_count: u32,
    ) -> Result<()> {
        if instances == 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "Draw needs at least one instance");
        }
        let open = self.open_list(ListKind::Draw, list)?;
        let pipeline = self.validate_bound_state(open)?;
        let bound = open.bound();

        if bound.vertex_array.is_none() && pipeline.vertex_input_mask != 0 {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Pipeline reads vertex input but no vertex array is bound");
        }
        if let (Some(vertex_array), PipelineKind::Render { vertex_format: Some(expected), .. }) =
            (bound.vertex_array, &pipeline.kind)
        {
            let actual = self.vertex_array_record(vertex_array)?.vertex_format;
            if actual != *expected {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} uses vertex format {} but the pipeline expects {}", vertex_array, actual, expected);
            }
        }

        let vertex_count = if procedural_vertex_count > 0 {
            if use_indices || pipeline.vertex_input_mask != 0 {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Procedural draws cannot use indices or vertex input");
            }
            procedural_vertex_count
        } else if use_indices {
            match bound.index_array {
                Some(index_array) => self.index_array_record(index_array)?.count,
                None => {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Indexed draw without a bound index array");
                }
            }
        } else {
            match bound.vertex_array {
                Some(vertex_array) => self.vertex_array_record(vertex_array)?.vertex_count,
                None => {
                    engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                        "Draw without a vertex array nor a procedural vertex count");
                }
            }
        };

        let list = self.open_list_mut(ListKind::Draw, list)?;
        list.record(ListCommand::Draw {
            indexed: use_indices,
            vertex_count,
            instances,
        });
        Ok(())
    }

    /// Close the draw list and queue it in the current frame
    pub fn draw_list_end(&mut self) -> Result<()> {
        let Some(mut list) = self.draw_list.take() else {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "No draw list is recording");
        };
        close_labels(&mut list, self.config.enable_debug_labels);
        if let Some(target) = list.target() {
            let (final_color, final_depth) = (target.final_color, target.final_depth);
            list.record(ListCommand::EndPass { final_color, final_depth });
        }

        self.stats.draw_calls += list.draw_calls() as u64;
        engine_trace!("galaxy3d::RenderingDevice",
            "Draw list {} ended ({} draw call(s))", list.id(), list.draw_calls());
        self.submission.push_work(WorkItem::List(list.finish()));
        Ok(())
    }

    // ===== COMPUTE LISTS =====

    /// Begin a compute list
    pub fn compute_list_begin(&mut self) -> Result<ListId> {
        if self.compute_list.is_some() {
            engine_error!("galaxy3d::RenderingDevice",
                "compute_list_begin: a compute list is already recording");
            return Err(Error::ListAlreadyOpen(ListKind::Compute));
        }
        let id = self.next_list_id();
        self.compute_list = Some(CommandList::new_compute(id));
        engine_trace!("galaxy3d::RenderingDevice", "Compute list {} begun", id);
        Ok(id)
    }

    pub fn compute_list_bind_compute_pipeline(&mut self, list: ListId, pipeline: Handle) -> Result<()> {
        self.open_list(ListKind::Compute, list)?;
        if !self.pipeline_record(pipeline)?.is_compute() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} is a render pipeline", pipeline);
        }
        let native = self.native(pipeline, ResourceKind::Pipeline)?;

        let list = self.open_list_mut(ListKind::Compute, list)?;
        list.bound_mut().pipeline = Some(pipeline);
        list.touch(pipeline);
        list.record(ListCommand::BindComputePipeline(native));
        Ok(())
    }

    pub fn compute_list_bind_uniform_set(&mut self, list: ListId, uniform_set: Handle, set_index: u32) -> Result<()> {
        self.bind_uniform_set(ListKind::Compute, list, uniform_set, set_index)
    }

    pub fn compute_list_set_push_constant(&mut self, list: ListId, data: &[u8]) -> Result<()> {
        self.set_push_constant(ListKind::Compute, list, data)
    }

    /// Dispatch `x * y * z` workgroups
    pub fn compute_list_dispatch(&mut self, list: ListId, x: u32, y: u32, z: u32) -> Result<()> {
        let limits = [
            (x, Limit::MaxComputeWorkgroupCountX),
            (y, Limit::MaxComputeWorkgroupCountY),
            (z, Limit::MaxComputeWorkgroupCountZ),
        ];
        for (count, limit) in limits {
            let max = self.limit_get(limit);
            if count == 0 || count as u64 > max {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Workgroup count {} outside 1..={} ({:?})", count, max, limit);
            }
        }
        let open = self.open_list(ListKind::Compute, list)?;
        self.validate_bound_state(open)?;

        let list = self.open_list_mut(ListKind::Compute, list)?;
        list.record(ListCommand::Dispatch { x, y, z });
        Ok(())
    }

    /// Dispatch with group counts read from a storage buffer
    pub fn compute_list_dispatch_indirect(&mut self, list: ListId, buffer: Handle, offset: u64) -> Result<()> {
        let record = self.buffer_record(buffer)?;
        if !record.usage().contains(BufferUsage::DISPATCH_INDIRECT) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} was not created with dispatch-indirect usage", buffer);
        }
        if offset % 4 != 0 || offset.saturating_add(DISPATCH_INDIRECT_SIZE) > record.size() {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Indirect offset {} must be a multiple of 4 with {} bytes inside the {} byte buffer",
                offset, DISPATCH_INDIRECT_SIZE, record.size());
        }
        let native = self.native(buffer, ResourceKind::Buffer)?;
        let open = self.open_list(ListKind::Compute, list)?;
        self.validate_bound_state(open)?;

        let list = self.open_list_mut(ListKind::Compute, list)?;
        list.touch(buffer);
        list.record(ListCommand::DispatchIndirect { buffer: native, offset });
        Ok(())
    }

    /// Make writes of previous dispatches visible to the next ones
    pub fn compute_list_add_barrier(&mut self, list: ListId) -> Result<()> {
        let list = self.open_list_mut(ListKind::Compute, list)?;
        list.record(ListCommand::Barrier);
        Ok(())
    }

    /// Close the compute list and queue it in the current frame
    pub fn compute_list_end(&mut self) -> Result<()> {
        let Some(mut list) = self.compute_list.take() else {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter, "No compute list is recording");
        };
        close_labels(&mut list, self.config.enable_debug_labels);
        self.stats.dispatches += list.dispatches() as u64;
        engine_trace!("galaxy3d::RenderingDevice",
            "Compute list {} ended ({} dispatch(es))", list.id(), list.dispatches());
        self.submission.push_work(WorkItem::List(list.finish()));
        Ok(())
    }

    // ===== SHARED BINDINGS =====

    fn bind_uniform_set(&mut self, kind: ListKind, list: ListId, uniform_set: Handle, set_index: u32) -> Result<()> {
        self.open_list(kind, list)?;
        let max_sets = self.limit_get(Limit::MaxBoundUniformSets);
        if set_index as u64 >= max_sets {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Set index {} exceeds the device limit of {}", set_index, max_sets);
        }
        let record = self.uniform_set_record(uniform_set)?;
        if record.set_index != set_index {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} was created for set {}, not {}", uniform_set, record.set_index, set_index);
        }
        let ids: Vec<Handle> = record.uniforms.iter().flat_map(|u| u.ids.iter().copied()).collect();
        let touched = self.with_texture_roots(&ids);
        let native = self.native(uniform_set, ResourceKind::UniformSet)?;

        let list = self.open_list_mut(kind, list)?;
        list.bound_mut().uniform_sets.insert(set_index, uniform_set);
        list.touch(uniform_set);
        for handle in touched {
            list.touch(handle);
        }
        list.record(ListCommand::BindUniformSet { set: native, index: set_index });
        Ok(())
    }

    fn set_push_constant(&mut self, kind: ListKind, list: ListId, data: &[u8]) -> Result<()> {
        let max = self.limit_get(Limit::MaxPushConstantSize);
        if data.is_empty() || data.len() % 4 != 0 || data.len() as u64 > max {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Push constant block of {} bytes must be a non-zero multiple of 4 up to {}", data.len(), max);
        }
        if let Some(pipeline) = self.open_list(kind, list)?.bound().pipeline {
            let expected = self.pipeline_record(pipeline)?.push_constant_size;
            if data.len() != expected as usize {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Push constant block of {} bytes, {} expects {}", data.len(), pipeline, expected);
            }
        }

        let list = self.open_list_mut(kind, list)?;
        list.bound_mut().push_constant_size = Some(data.len() as u32);
        list.record(ListCommand::SetPushConstant(data.to_vec()));
        Ok(())
    }

    /// Pipeline, uniform sets and push constants needed by a draw or dispatch
    fn validate_bound_state(&self, list: &CommandList) -> Result<&PipelineRecord> {
        let bound = list.bound();
        let Some(pipeline) = bound.pipeline else {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "No pipeline bound on {}", list.id());
        };
        let record = self.pipeline_record(pipeline)?;

        for declared in &record.sets {
            let Some(uniform_set) = bound.uniform_sets.get(&declared.set) else {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} uses set {} but nothing is bound there", pipeline, declared.set);
            };
            if !self.uniform_set_record(*uniform_set)?.layout.is_compatible(declared) {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "{} bound at set {} does not match the layout of {}", uniform_set, declared.set, pipeline);
            }
        }

        if record.push_constant_size > 0 && bound.push_constant_size != Some(record.push_constant_size) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} expects a {} byte push constant block", pipeline, record.push_constant_size);
        }
        Ok(record)
    }

    // ===== DEBUG LABELS =====

    /// Open a debug label in the recording draw list, else the recording
    /// compute list, else the frame stream
    pub fn draw_command_begin_label(&mut self, name: &str, color: Vec4) -> Result<()> {
        let record = self.config.enable_debug_labels;
        match self.recording_list() {
            Some(kind) => {
                if let Some(list) = self.list_slot_mut(kind) {
                    list.push_label();
                    if record {
                        list.record(ListCommand::BeginLabel { name: name.to_string(), color });
                    }
                }
            }
            None => {
                self.frame_label_depth += 1;
                if record {
                    self.submission.push_work(WorkItem::BeginLabel { name: name.to_string(), color });
                }
            }
        }
        Ok(())
    }

    pub fn draw_command_insert_label(&mut self, name: &str, color: Vec4) -> Result<()> {
        if !self.config.enable_debug_labels {
            return Ok(());
        }
        match self.recording_list() {
            Some(kind) => {
                if let Some(list) = self.list_slot_mut(kind) {
                    list.record(ListCommand::InsertLabel { name: name.to_string(), color });
                }
            }
            None => self.submission.push_work(WorkItem::InsertLabel { name: name.to_string(), color }),
        }
        Ok(())
    }

    /// Close the innermost open label; an unbalanced call is only a warning
    pub fn draw_command_end_label(&mut self) -> Result<()> {
        let record = self.config.enable_debug_labels;
        let closed = match self.recording_list() {
            Some(kind) => match self.list_slot_mut(kind) {
                Some(list) => {
                    let popped = list.pop_label();
                    if popped && record {
                        list.record(ListCommand::EndLabel);
                    }
                    popped
                }
                None => false,
            },
            None if self.frame_label_depth > 0 => {
                self.frame_label_depth -= 1;
                if record {
                    self.submission.push_work(WorkItem::EndLabel);
                }
                true
            }
            None => false,
        };
        if !closed {
            engine_warn!("galaxy3d::RenderingDevice", "draw_command_end_label without an open label");
        }
        Ok(())
    }
}
