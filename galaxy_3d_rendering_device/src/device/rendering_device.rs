/// RenderingDevice: the single entry point of the crate
///
/// The device owns every resource it creates (through the handle registry),
/// validates every request before it reaches the backend, records command
/// lists and paces submissions through a ring of frame slots.
///
/// Operations are grouped over several files:
/// - this file: construction, queries, lifetime (free/cascade), names,
///   submission, timestamps and teardown
/// - `rendering_device_resources.rs`: textures, buffers, samplers, arrays
/// - `rendering_device_pipelines.rs`: shaders, uniform sets, pipelines,
///   framebuffer and vertex formats, framebuffers
/// - `rendering_device_lists.rs`: draw/compute lists, labels, barriers

use std::time::Instant;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_debug, engine_error, engine_info, engine_warn};
use crate::device::{
    Backend, BarrierMask, CapturedTimestamp, CommandList, DeviceCapabilities, DeviceConfig,
    FramebufferFormatKey, FramebufferFormatRecord, FramebufferRecord, Handle, HandleRegistry,
    IndexArrayRecord, Interner, Limit, ListKind, MemoryType, NativeHandle, PipelineRecord,
    ResourceKind, ResourcePayload, ResourceRecord, ShaderRecord, SubmissionController,
    TextureRecord, BufferRecord, UniformSetRecord, VertexArrayRecord, VertexAttribute,
    VertexFormatRecord, WorkItem, MAX_FRAME_DELAY,
};

#[path = "rendering_device_resources.rs"]
mod resources;
#[path = "rendering_device_pipelines.rs"]
mod pipelines;
#[path = "rendering_device_lists.rs"]
mod lists;

/// Largest number of timestamps captured in one frame
pub const MAX_TIMESTAMP_QUERIES: u32 = 256;

/// Counters accumulated over the device lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Completed frames (`swap_buffers` or `sync` calls)
    pub frames: u64,
    /// Batches handed to the backend
    pub submissions: u64,
    /// Command lists contained in those batches
    pub submitted_lists: u64,
    /// Draw calls recorded into closed draw lists
    pub draw_calls: u64,
    /// Dispatches recorded into closed compute lists
    pub dispatches: u64,
}

/// Backend-agnostic rendering device
///
/// Every mutation takes `&mut self`: a device is driven by one thread at a
/// time. Local devices created with [`create_local_device`](Self::create_local_device)
/// are independent values and may live on other threads.
pub struct RenderingDevice {
    config: DeviceConfig,
    backend: Box<dyn Backend>,
    capabilities: DeviceCapabilities,
    registry: HandleRegistry,
    /// Resource -> resources that must be freed with it
    dependents: FxHashMap<Handle, Vec<Handle>>,
    framebuffer_formats: Interner<FramebufferFormatKey>,
    vertex_formats: Interner<Vec<VertexAttribute>>,
    draw_list: Option<CommandList>,
    compute_list: Option<CommandList>,
    next_list_id: u64,
    submission: SubmissionController,
    is_local: bool,
    /// Local devices: a batch was submitted and not yet synced
    submit_pending: bool,
    /// Debug labels opened in the frame stream (outside any list)
    frame_label_depth: u32,
    captured_timestamps: Vec<CapturedTimestamp>,
    captured_frame: u64,
    epoch: Instant,
    stats: DeviceStats,
}

impl RenderingDevice {
    /// Create a primary rendering device
    ///
    /// # Arguments
    ///
    /// * `backend` - Native backend, owned by the device from now on
    /// * `config` - Device configuration (`frame_delay` in `1..=MAX_FRAME_DELAY`)
    pub fn new(backend: Box<dyn Backend>, config: DeviceConfig) -> Result<Self> {
        if config.frame_delay == 0 || config.frame_delay > MAX_FRAME_DELAY {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Frame delay {} out of range 1..={}", config.frame_delay, MAX_FRAME_DELAY);
        }

        let capabilities = backend.capabilities();
        engine_info!("galaxy3d::RenderingDevice",
            "Rendering device created for '{}' on {} ({}, frame delay {})",
            config.app_name, capabilities.info.name, capabilities.info.api_name, config.frame_delay);

        Ok(Self {
            submission: SubmissionController::new(config.frame_delay),
            config,
            backend,
            capabilities,
            registry: HandleRegistry::new(),
            dependents: FxHashMap::default(),
            framebuffer_formats: Interner::new(),
            vertex_formats: Interner::new(),
            draw_list: None,
            compute_list: None,
            next_list_id: 1,
            is_local: false,
            submit_pending: false,
            frame_label_depth: 0,
            captured_timestamps: Vec::new(),
            captured_frame: 0,
            epoch: Instant::now(),
            stats: DeviceStats::default(),
        })
    }

    /// Create a local (offline) device driven by `submit()` / `sync()`
    pub fn new_local(backend: Box<dyn Backend>) -> Result<Self> {
        let mut device = Self::new(backend, DeviceConfig::local())?;
        device.is_local = true;
        Ok(device)
    }

    /// Spawn an independent local device on the same physical device
    ///
    /// The new device has its own registry, lists and frame ring (frame delay 1).
    pub fn create_local_device(&self) -> Result<RenderingDevice> {
        let backend = self.backend.create_local()?;
        let config = DeviceConfig {
            frame_delay: 1,
            ..self.config.clone()
        };
        let mut device = Self::new(backend, config)?;
        device.is_local = true;
        Ok(device)
    }

    // ===== QUERIES =====

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn get_device_name(&self) -> &str {
        &self.capabilities.info.name
    }

    pub fn get_device_vendor_name(&self) -> &str {
        &self.capabilities.info.vendor
    }

    /// Backend API version (major, minor, patch)
    pub fn get_device_api_version(&self) -> (u32, u32, u32) {
        self.capabilities.info.api_version
    }

    pub fn get_device_pipeline_cache_uuid(&self) -> &str {
        &self.capabilities.info.pipeline_cache_uuid
    }

    /// Value of a device limit
    pub fn limit_get(&self, limit: Limit) -> u64 {
        self.capabilities.limit(limit)
    }

    /// Number of frames in flight
    pub fn frame_delay(&self) -> u32 {
        self.submission.frame_delay()
    }

    /// Number of the frame being recorded
    pub fn frame(&self) -> u64 {
        self.submission.frame()
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Bytes allocated by the backend
    pub fn memory_usage(&self, memory: MemoryType) -> u64 {
        self.backend.memory_usage(memory)
    }

    /// Number of live resources (interned formats included)
    pub fn resource_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live resources of one kind
    pub fn resource_count_of(&self, kind: ResourceKind) -> usize {
        self.registry.count(kind)
    }

    /// True if `handle` currently resolves on this device
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.registry.is_valid(handle)
    }

    /// Kind of the list currently recording (`Draw` wins if both are)
    pub fn recording_list(&self) -> Option<ListKind> {
        if self.draw_list.is_some() {
            Some(ListKind::Draw)
        } else if self.compute_list.is_some() {
            Some(ListKind::Compute)
        } else {
            None
        }
    }

    // ===== NAMES =====

    /// Attach a debug name to a resource
    ///
    /// The name is forwarded to the backend only when debug labels are enabled.
    pub fn set_resource_name(&mut self, handle: Handle, name: &str) -> Result<()> {
        if let Err(err) = self.registry.set_name(handle, name) {
            engine_error!("galaxy3d::RenderingDevice",
                "Cannot name {}: handle does not resolve", handle);
            return Err(err);
        }
        if self.config.enable_debug_labels {
            if let Some(native) = self.registry.resolve(handle)?.native() {
                self.backend.set_name(handle.kind(), native, name);
            }
        }
        Ok(())
    }

    /// Debug name of a resource (empty if never named)
    pub fn get_resource_name(&self, handle: Handle) -> Result<String> {
        let record = self.registry.resolve(handle)?;
        Ok(record.name().unwrap_or_default().to_string())
    }

    // ===== LIFETIME =====

    /// Free a resource and everything that depends on it
    ///
    /// Aliases, framebuffers, uniform sets, vertex/index arrays and pipelines
    /// built on the resource are freed first. Native objects are destroyed
    /// once the frame that may still use them has completed. Freeing a stale
    /// handle is a no-op reported as a warning.
    pub fn free(&mut self, handle: Handle) -> Result<()> {
        if !self.registry.is_valid(handle) {
            engine_warn!("galaxy3d::RenderingDevice",
                "Ignoring free of {}: handle is stale or already freed", handle);
            return Ok(());
        }

        if matches!(handle.kind(), ResourceKind::FramebufferFormat | ResourceKind::VertexFormat) {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "{} is interned and lives as long as the device", handle);
        }

        let doomed = self.collect_cascade(handle);
        self.ensure_not_touched(&doomed, "free")?;

        if doomed.len() > 1 {
            engine_debug!("galaxy3d::RenderingDevice",
                "Freeing {} cascades to {} dependent resource(s)", handle, doomed.len() - 1);
        }
        for doomed_handle in doomed {
            self.release(doomed_handle);
        }
        Ok(())
    }

    /// Post-order walk of the dependents graph: dependents first, `root` last
    fn collect_cascade(&self, root: Handle) -> Vec<Handle> {
        let mut order = Vec::new();
        let mut visited = FxHashSet::default();
        let mut stack = vec![(root, false)];

        while let Some((handle, expanded)) = stack.pop() {
            if expanded {
                order.push(handle);
                continue;
            }
            if !visited.insert(handle) || !self.registry.is_valid(handle) {
                continue;
            }
            stack.push((handle, true));
            if let Some(children) = self.dependents.get(&handle) {
                for child in children {
                    if !visited.contains(child) {
                        stack.push((*child, false));
                    }
                }
            }
        }
        order
    }

    /// Unregister one resource and defer the destruction of its native object
    fn release(&mut self, handle: Handle) {
        let Some(record) = self.registry.free(handle) else {
            return;
        };

        self.dependents.remove(&handle);
        for dependency in record.dependencies() {
            if let Some(list) = self.dependents.get_mut(dependency) {
                list.retain(|h| *h != handle);
            }
        }

        if let Some(native) = record.native() {
            self.submission.defer_destroy(handle.kind(), native);
        }
        engine_debug!("galaxy3d::RenderingDevice", "Freed {}", handle);
    }

    // ===== REGISTRY HELPERS =====

    /// Reserve a handle, create the backend object, then commit
    ///
    /// A failing `create` rolls the reservation back; nothing stays registered.
    fn create_resource<F>(&mut self, kind: ResourceKind, dependencies: Vec<Handle>, create: F) -> Result<Handle>
    where
        F: FnOnce(&mut dyn Backend) -> Result<(Option<NativeHandle>, ResourcePayload)>,
    {
        let handle = self.registry.reserve(kind);
        let (native, payload) = match create(self.backend.as_mut()) {
            Ok(created) => created,
            Err(err) => {
                self.registry.rollback(handle);
                engine_error!("galaxy3d::RenderingDevice", "Failed to create {}: {}", kind, err);
                return Err(err);
            }
        };

        let record = ResourceRecord::new(native, payload).with_dependencies(dependencies.clone());
        if let Err(err) = self.registry.commit(handle, record) {
            if let Some(native) = native {
                self.backend.destroy(kind, native);
            }
            return Err(err);
        }

        self.link_dependencies(handle, &dependencies);
        engine_debug!("galaxy3d::RenderingDevice", "Created {}", handle);
        Ok(handle)
    }

    /// Register a record with no backend object
    fn insert_cpu_resource(&mut self, payload: ResourcePayload, dependencies: Vec<Handle>) -> Handle {
        let record = ResourceRecord::new(None, payload).with_dependencies(dependencies.clone());
        let handle = self.registry.allocate(record);
        self.link_dependencies(handle, &dependencies);
        engine_debug!("galaxy3d::RenderingDevice", "Created {}", handle);
        handle
    }

    fn link_dependencies(&mut self, handle: Handle, dependencies: &[Handle]) {
        for dependency in dependencies {
            let list = self.dependents.entry(*dependency).or_default();
            if !list.contains(&handle) {
                list.push(handle);
            }
        }
    }

    /// Resolve a handle that must be of `kind`
    fn record(&self, handle: Handle, kind: ResourceKind) -> Result<&ResourceRecord> {
        match self.registry.resolve(handle) {
            Ok(record) if handle.kind() == kind => Ok(record),
            _ => {
                engine_error!("galaxy3d::RenderingDevice", "Invalid {} handle: {}", kind, handle);
                Err(Error::InvalidHandle(handle))
            }
        }
    }

    /// Native object of a resource that must have one
    fn native(&self, handle: Handle, kind: ResourceKind) -> Result<NativeHandle> {
        match self.record(handle, kind)?.native() {
            Some(native) => Ok(native),
            None => {
                engine_error!("galaxy3d::RenderingDevice", "{} has no native object", handle);
                Err(Error::InvalidHandle(handle))
            }
        }
    }

    fn texture_record(&self, handle: Handle) -> Result<&TextureRecord> {
        self.record(handle, ResourceKind::Texture)?
            .as_texture()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn buffer_record(&self, handle: Handle) -> Result<&BufferRecord> {
        self.record(handle, ResourceKind::Buffer)?
            .as_buffer()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn shader_record(&self, handle: Handle) -> Result<&ShaderRecord> {
        self.record(handle, ResourceKind::Shader)?
            .as_shader()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn pipeline_record(&self, handle: Handle) -> Result<&PipelineRecord> {
        self.record(handle, ResourceKind::Pipeline)?
            .as_pipeline()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn framebuffer_record(&self, handle: Handle) -> Result<&FramebufferRecord> {
        self.record(handle, ResourceKind::Framebuffer)?
            .as_framebuffer()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn uniform_set_record(&self, handle: Handle) -> Result<&UniformSetRecord> {
        self.record(handle, ResourceKind::UniformSet)?
            .as_uniform_set()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn vertex_format_record(&self, handle: Handle) -> Result<&VertexFormatRecord> {
        self.record(handle, ResourceKind::VertexFormat)?
            .as_vertex_format()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn framebuffer_format_record(&self, handle: Handle) -> Result<&FramebufferFormatRecord> {
        self.record(handle, ResourceKind::FramebufferFormat)?
            .as_framebuffer_format()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn index_array_record(&self, handle: Handle) -> Result<&IndexArrayRecord> {
        self.record(handle, ResourceKind::IndexArray)?
            .as_index_array()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn vertex_array_record(&self, handle: Handle) -> Result<&VertexArrayRecord> {
        self.record(handle, ResourceKind::VertexArray)?
            .as_vertex_array()
            .ok_or(Error::InvalidHandle(handle))
    }

    /// Texture owning the memory of `handle` (itself unless it is an alias)
    fn texture_root(&self, handle: Handle) -> Handle {
        match self.registry.resolve(handle).ok().and_then(|r| r.as_texture()) {
            Some(TextureRecord { shared: Some(slice), .. }) => slice.source,
            _ => handle,
        }
    }

    // ===== RECORDING GUARDS =====

    /// Transfers and frame-level commands are rejected while a list records
    fn ensure_not_recording(&self, operation: &str) -> Result<()> {
        if let Some(kind) = self.recording_list() {
            engine_error!("galaxy3d::RenderingDevice",
                "{} is not allowed while a {:?} list is recording", operation, kind);
            return Err(Error::ListAlreadyOpen(kind));
        }
        Ok(())
    }

    /// Reject the operation if an open list uses one of `handles` (or their root texture)
    fn ensure_not_touched(&self, handles: &[Handle], operation: &str) -> Result<()> {
        for list in self.draw_list.iter().chain(self.compute_list.iter()) {
            let touched = handles
                .iter()
                .find(|h| list.touches(**h) || list.touches(self.texture_root(**h)));
            if let Some(handle) = touched {
                engine_error!("galaxy3d::RenderingDevice",
                    "{} of {} is not allowed: the open {:?} list uses it", operation, handle, list.kind());
                return Err(Error::ListAlreadyOpen(list.kind()));
            }
        }
        Ok(())
    }

    // ===== FRAME-LEVEL COMMANDS =====

    /// Record an explicit barrier between pipeline stages into the frame stream
    pub fn barrier(&mut self, from: BarrierMask, to: BarrierMask) -> Result<()> {
        self.ensure_not_recording("barrier")?;
        self.submission.push_work(WorkItem::Barrier { from, to });
        Ok(())
    }

    /// Barrier between every stage
    pub fn full_barrier(&mut self) -> Result<()> {
        self.barrier(BarrierMask::ALL_BARRIERS, BarrierMask::ALL_BARRIERS)
    }

    // ===== SUBMISSION =====

    /// Submit the work recorded so far (local devices only)
    pub fn submit(&mut self) -> Result<()> {
        if !self.is_local {
            engine_bail!("galaxy3d::RenderingDevice", Unsupported,
                "submit() is only available on local devices, use swap_buffers()");
        }
        self.ensure_not_recording("submit")?;
        if self.submit_pending {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Previous submission was not synced, call sync() first");
        }

        self.submit_current()?;
        self.submit_pending = true;
        Ok(())
    }

    /// Wait for the last `submit()` to complete (local devices only)
    pub fn sync(&mut self) -> Result<()> {
        if !self.is_local {
            engine_bail!("galaxy3d::RenderingDevice", Unsupported,
                "sync() is only available on local devices");
        }
        if !self.submit_pending {
            engine_error!("galaxy3d::RenderingDevice", "sync() called without a prior submit()");
            return Err(Error::NoPendingSubmission);
        }
        let Some(fence) = self.submission.current_fence() else {
            self.submit_pending = false;
            return Err(Error::NoPendingSubmission);
        };

        self.backend.wait(fence)?;
        self.submit_pending = false;
        self.complete_current_slot(fence)?;
        self.submission.next_frame();
        self.stats.frames += 1;
        Ok(())
    }

    /// End the frame on the primary device
    ///
    /// Submits the frame, moves to the next slot of the ring and, if that slot
    /// still has work in flight, waits for it and recycles it.
    pub fn swap_buffers(&mut self) -> Result<()> {
        if self.is_local {
            engine_bail!("galaxy3d::RenderingDevice", Unsupported,
                "swap_buffers() is not available on local devices, use submit()/sync()");
        }
        self.ensure_not_recording("swap_buffers")?;

        self.submit_current()?;
        if let Some(busy) = self.submission.advance() {
            self.backend.wait(busy)?;
            self.complete_current_slot(busy)?;
        }
        self.stats.frames += 1;
        Ok(())
    }

    /// Hand the current slot's work to the backend
    fn submit_current(&mut self) -> Result<()> {
        if self.frame_label_depth > 0 {
            engine_warn!("galaxy3d::RenderingDevice",
                "{} debug label(s) left open at end of frame, closing them", self.frame_label_depth);
            if self.config.enable_debug_labels {
                for _ in 0..self.frame_label_depth {
                    self.submission.push_work(WorkItem::EndLabel);
                }
            }
            self.frame_label_depth = 0;
        }

        let batch = self.submission.take_batch();
        let lists = batch.lists().count() as u64;
        let fence = self.backend.submit(batch)?;
        self.submission.mark_in_flight(fence);

        self.stats.submissions += 1;
        self.stats.submitted_lists += lists;
        Ok(())
    }

    /// Release the current slot after its fence completed
    fn complete_current_slot(&mut self, fence: crate::device::FenceId) -> Result<()> {
        let recycled = self.submission.recycle_current();
        for (kind, native) in recycled.destroy {
            self.backend.destroy(kind, native);
        }

        let gpu_times = if recycled.timestamps.is_empty() {
            Vec::new()
        } else {
            self.backend.read_timestamps(fence)?
        };
        self.captured_timestamps = recycled
            .timestamps
            .into_iter()
            .enumerate()
            .map(|(index, pending)| CapturedTimestamp {
                name: pending.name,
                cpu_time_usec: pending.cpu_time_usec,
                gpu_time: gpu_times.get(index).copied().unwrap_or(0),
            })
            .collect();
        self.captured_frame = recycled.frame;
        Ok(())
    }

    // ===== TIMESTAMPS =====

    /// Capture a named timestamp in the frame stream
    ///
    /// Its values become readable once the frame has completed.
    pub fn capture_timestamp(&mut self, name: &str) -> Result<()> {
        self.ensure_not_recording("capture_timestamp")?;
        if self.submission.timestamp_count() >= MAX_TIMESTAMP_QUERIES {
            engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                "Too many timestamps in one frame (max {})", MAX_TIMESTAMP_QUERIES);
        }
        let cpu_time_usec = self.epoch.elapsed().as_micros() as u64;
        self.submission.push_timestamp(name.to_string(), cpu_time_usec);
        Ok(())
    }

    pub fn get_captured_timestamps_count(&self) -> u32 {
        self.captured_timestamps.len() as u32
    }

    /// Frame the captured timestamps belong to
    pub fn get_captured_timestamps_frame(&self) -> u64 {
        self.captured_frame
    }

    fn captured(&self, index: u32) -> Result<&CapturedTimestamp> {
        match self.captured_timestamps.get(index as usize) {
            Some(timestamp) => Ok(timestamp),
            None => {
                engine_bail!("galaxy3d::RenderingDevice", InvalidParameter,
                    "Timestamp index {} out of range ({} captured)", index, self.captured_timestamps.len());
            }
        }
    }

    pub fn get_captured_timestamp_name(&self, index: u32) -> Result<&str> {
        Ok(&self.captured(index)?.name)
    }

    /// CPU time in microseconds since device creation
    pub fn get_captured_timestamp_cpu_time(&self, index: u32) -> Result<u64> {
        Ok(self.captured(index)?.cpu_time_usec)
    }

    /// GPU time as reported by the backend
    pub fn get_captured_timestamp_gpu_time(&self, index: u32) -> Result<u64> {
        Ok(self.captured(index)?.gpu_time)
    }
}

/// Teardown order: dependents before what they depend on
fn teardown_rank(kind: ResourceKind, record: &ResourceRecord) -> u8 {
    match kind {
        ResourceKind::UniformSet => 0,
        ResourceKind::Pipeline => 1,
        ResourceKind::Framebuffer => 2,
        ResourceKind::IndexArray | ResourceKind::VertexArray => 3,
        ResourceKind::Texture if record.as_texture().is_some_and(|t| t.is_shared()) => 4,
        ResourceKind::Shader => 6,
        _ => 5,
    }
}

impl Drop for RenderingDevice {
    fn drop(&mut self) {
        if let Some(kind) = self.recording_list() {
            engine_warn!("galaxy3d::RenderingDevice",
                "Device dropped while a {:?} list was recording", kind);
        }

        for fence in self.submission.in_flight() {
            if let Err(err) = self.backend.wait(fence) {
                engine_error!("galaxy3d::RenderingDevice",
                    "Failed to wait for {:?} during teardown: {}", fence, err);
            }
        }
        for slot in self.submission.drain() {
            for (kind, native) in slot.destroy {
                self.backend.destroy(kind, native);
            }
        }

        let mut live = self.registry.drain();
        let leaked = live
            .iter()
            .filter(|(h, _)| !matches!(h.kind(), ResourceKind::FramebufferFormat | ResourceKind::VertexFormat))
            .count();
        if leaked > 0 {
            engine_warn!("galaxy3d::RenderingDevice",
                "{} resource(s) still alive at device teardown, destroying them", leaked);
        }

        live.sort_by_key(|(handle, record)| teardown_rank(handle.kind(), record));
        for (handle, record) in live {
            if let Some(native) = record.native() {
                self.backend.destroy(handle.kind(), native);
            }
        }
        self.dependents.clear();
        self.framebuffer_formats.clear();
        self.vertex_formats.clear();

        engine_info!("galaxy3d::RenderingDevice",
            "Rendering device destroyed after {} frame(s)", self.stats.frames);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "rendering_device_tests.rs"]
mod tests;
