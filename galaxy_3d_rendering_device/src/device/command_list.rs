/// Command lists: recorded commands and the recording-time shadow state
///
/// A `CommandList` is created by `draw_list_begin` / `compute_list_begin`,
/// collects backend-agnostic `ListCommand`s while it records, and becomes a
/// `RecordedList` handed to the current frame slot at `*_list_end`.

use std::fmt;
use bitflags::bitflags;
use glam::Vec4;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::device::{Handle, IndexFormat, NativeHandle};

/// Kind of command list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Draw,
    Compute,
}

/// Identifier returned by `*_list_begin`
///
/// Every later call on the list must pass it back; ids are never reused by a
/// device, so an id kept past `*_list_end` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(pub(crate) u64);

impl ListId {
    /// Rebuild an id from its raw value (backends replaying recorded lists)
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list#{}", self.0)
    }
}

/// What happens to attachment contents when a draw list begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitialAction {
    /// Keep previous contents
    Load,
    /// Clear with the values passed to `draw_list_begin`
    Clear,
    /// Previous contents are undefined
    Discard,
}

/// What happens to attachment contents when a draw list ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalAction {
    Store,
    Discard,
}

/// Integer rectangle in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect2D {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// True if the rectangle lies inside a `width x height` area
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

bitflags! {
    /// Pipeline stages synchronised by a device barrier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarrierMask: u32 {
        const VERTEX   = 1 << 0;
        const COMPUTE  = 1 << 1;
        const TRANSFER = 1 << 2;
        const FRAGMENT = 1 << 3;
        const RASTER   = Self::VERTEX.bits() | Self::FRAGMENT.bits();
        const ALL_BARRIERS = 0x7FFF;
    }
}

// ===== COMMANDS =====

/// Clear parameters recorded at the start of a draw list
#[derive(Debug, Clone, PartialEq)]
pub struct PassBegin {
    pub framebuffer: NativeHandle,
    pub region: Rect2D,
    pub initial_color: InitialAction,
    pub initial_depth: InitialAction,
    /// One color per color attachment when `initial_color` is `Clear`
    pub clear_colors: Vec<Vec4>,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

/// Backend-agnostic recorded command
#[derive(Debug, Clone, PartialEq)]
pub enum ListCommand {
    BeginPass(PassBegin),
    NextSubpass,
    EndPass { final_color: FinalAction, final_depth: FinalAction },
    BindRenderPipeline(NativeHandle),
    BindComputePipeline(NativeHandle),
    BindUniformSet { set: NativeHandle, index: u32 },
    BindVertexArray { buffers: Vec<NativeHandle>, offsets: Vec<u64> },
    BindIndexArray { buffer: NativeHandle, format: IndexFormat, offset: u32, count: u32 },
    SetPushConstant(Vec<u8>),
    SetBlendConstants(Vec4),
    SetScissor(Option<Rect2D>),
    Draw { indexed: bool, vertex_count: u32, instances: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    DispatchIndirect { buffer: NativeHandle, offset: u64 },
    Barrier,
    BeginLabel { name: String, color: Vec4 },
    InsertLabel { name: String, color: Vec4 },
    EndLabel,
}

/// A closed command list, ready for submission
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedList {
    pub kind: ListKind,
    pub id: ListId,
    pub commands: Vec<ListCommand>,
}

// ===== SHADOW STATE =====

/// Framebuffer-related state of a draw list
#[derive(Debug, Clone)]
pub struct DrawTarget {
    pub framebuffer: Handle,
    pub framebuffer_format: Handle,
    pub current_pass: u32,
    pub pass_count: u32,
    pub region: Rect2D,
    pub final_color: FinalAction,
    pub final_depth: FinalAction,
}

/// Bindings currently in effect, used to validate draws and dispatches
#[derive(Debug, Clone, Default)]
pub struct BoundState {
    pub pipeline: Option<Handle>,
    /// Set index -> uniform set
    pub uniform_sets: FxHashMap<u32, Handle>,
    pub vertex_array: Option<Handle>,
    pub index_array: Option<Handle>,
    /// Size of the last push constant block
    pub push_constant_size: Option<u32>,
    pub scissor: Option<Rect2D>,
    pub blend_constants: Option<Vec4>,
}

/// A recording command list
#[derive(Debug)]
pub struct CommandList {
    kind: ListKind,
    id: ListId,
    target: Option<DrawTarget>,
    bound: BoundState,
    commands: Vec<ListCommand>,
    touched: FxHashSet<Handle>,
    label_depth: u32,
    draw_calls: u32,
    dispatches: u32,
}

impl CommandList {
    /// Open a draw list rendering into `target`
    pub fn new_draw(id: ListId, target: DrawTarget) -> Self {
        let mut list = Self::new(ListKind::Draw, id);
        list.touch(target.framebuffer);
        list.target = Some(target);
        list
    }

    /// Open a compute list
    pub fn new_compute(id: ListId) -> Self {
        Self::new(ListKind::Compute, id)
    }

    fn new(kind: ListKind, id: ListId) -> Self {
        Self {
            kind,
            id,
            target: None,
            bound: BoundState::default(),
            commands: Vec::new(),
            touched: FxHashSet::default(),
            label_depth: 0,
            draw_calls: 0,
            dispatches: 0,
        }
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    /// Framebuffer state (draw lists only)
    pub fn target(&self) -> Option<&DrawTarget> {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> Option<&mut DrawTarget> {
        self.target.as_mut()
    }

    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    pub fn bound_mut(&mut self) -> &mut BoundState {
        &mut self.bound
    }

    /// Append a command
    pub fn record(&mut self, command: ListCommand) {
        match &command {
            ListCommand::Draw { .. } => self.draw_calls += 1,
            ListCommand::Dispatch { .. } | ListCommand::DispatchIndirect { .. } => self.dispatches += 1,
            _ => {}
        }
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[ListCommand] {
        &self.commands
    }

    /// Mark `handle` as used by this list
    pub fn touch(&mut self, handle: Handle) {
        self.touched.insert(handle);
    }

    pub fn touches(&self, handle: Handle) -> bool {
        self.touched.contains(&handle)
    }

    pub fn touched(&self) -> &FxHashSet<Handle> {
        &self.touched
    }

    // ===== DEBUG LABELS =====

    pub fn push_label(&mut self) {
        self.label_depth += 1;
    }

    /// Returns false if no label is open
    pub fn pop_label(&mut self) -> bool {
        if self.label_depth == 0 {
            return false;
        }
        self.label_depth -= 1;
        true
    }

    pub fn label_depth(&self) -> u32 {
        self.label_depth
    }

    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }

    /// Close the list, closing any label left open
    pub fn finish(mut self) -> RecordedList {
        while self.pop_label() {
            self.commands.push(ListCommand::EndLabel);
        }
        RecordedList {
            kind: self.kind,
            id: self.id,
            commands: self.commands,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "command_list_tests.rs"]
mod tests;
