/// Frame slots and the submission ring
///
/// The controller owns `frame_delay` slots. The current slot accumulates
/// closed command lists and frame-level commands (barriers, labels,
/// timestamps). Submitting hands that work to the backend and stores the
/// returned fence in the slot; the slot is recycled once the fence has been
/// waited on, which is also when native objects freed during that frame are
/// actually destroyed.

use glam::Vec4;
use crate::device::{BarrierMask, NativeHandle, RecordedList, ResourceKind};

/// Backend fence identifying one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceId(pub u64);

/// One unit of work inside a submission, in execution order
#[derive(Debug, Clone, PartialEq)]
pub enum WorkItem {
    /// A closed draw or compute list
    List(RecordedList),
    /// Device-wide barrier between stages
    Barrier { from: BarrierMask, to: BarrierMask },
    /// Frame-level debug label
    BeginLabel { name: String, color: Vec4 },
    InsertLabel { name: String, color: Vec4 },
    EndLabel,
    /// Write a GPU timestamp (the n-th of the frame)
    Timestamp { index: u32 },
}

/// Work handed to `Backend::submit`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmitBatch {
    /// Frame number the work was recorded in
    pub frame: u64,
    pub items: Vec<WorkItem>,
}

impl SubmitBatch {
    /// Closed lists contained in the batch
    pub fn lists(&self) -> impl Iterator<Item = &RecordedList> {
        self.items.iter().filter_map(|item| match item {
            WorkItem::List(list) => Some(list),
            _ => None,
        })
    }

    pub fn timestamp_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, WorkItem::Timestamp { .. }))
            .count()
    }
}

/// Timestamp captured on the CPU side, waiting for its GPU value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimestamp {
    pub name: String,
    pub cpu_time_usec: u64,
}

/// Timestamp whose frame completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedTimestamp {
    pub name: String,
    pub cpu_time_usec: u64,
    pub gpu_time: u64,
}

/// Work submitted from a slot, released when its fence completes
#[derive(Debug, Default)]
struct Submitted {
    fence: Option<FenceId>,
    frame: u64,
    destroy: Vec<(ResourceKind, NativeHandle)>,
    timestamps: Vec<PendingTimestamp>,
}

/// Per-frame bookkeeping
///
/// Objects freed and timestamps captured while the slot records belong to
/// the next batch taken from it, not to work already in flight.
#[derive(Debug, Default)]
struct FrameSlot {
    work: Vec<WorkItem>,
    pending_destroy: Vec<(ResourceKind, NativeHandle)>,
    timestamps: Vec<PendingTimestamp>,
    submitted: Submitted,
}

/// Everything released when a slot is recycled
#[derive(Debug, Default)]
pub struct RecycledSlot {
    pub frame: u64,
    pub destroy: Vec<(ResourceKind, NativeHandle)>,
    pub timestamps: Vec<PendingTimestamp>,
}

/// Ring of frame slots
#[derive(Debug)]
pub struct SubmissionController {
    slots: Vec<FrameSlot>,
    current: usize,
    frame: u64,
}

impl SubmissionController {
    /// Create a ring of `frame_delay` slots (at least one)
    pub fn new(frame_delay: u32) -> Self {
        let count = frame_delay.max(1) as usize;
        Self {
            slots: (0..count).map(|_| FrameSlot::default()).collect(),
            current: 0,
            frame: 0,
        }
    }

    pub fn frame_delay(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of the frame currently being recorded
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    // ===== RECORDING =====

    /// Append work to the current slot
    pub fn push_work(&mut self, item: WorkItem) {
        self.slots[self.current].work.push(item);
    }

    /// Items recorded into the current slot so far
    pub fn pending_work(&self) -> &[WorkItem] {
        &self.slots[self.current].work
    }

    /// Queue a native object for destruction once the next batch of the
    /// current slot completes
    pub fn defer_destroy(&mut self, kind: ResourceKind, native: NativeHandle) {
        self.slots[self.current].pending_destroy.push((kind, native));
    }

    /// Number of timestamps captured for the next batch
    pub fn timestamp_count(&self) -> u32 {
        self.slots[self.current].timestamps.len() as u32
    }

    /// Capture a timestamp in the current frame
    pub fn push_timestamp(&mut self, name: String, cpu_time_usec: u64) {
        let index = self.timestamp_count();
        let slot = &mut self.slots[self.current];
        slot.timestamps.push(PendingTimestamp { name, cpu_time_usec });
        slot.work.push(WorkItem::Timestamp { index });
    }

    // ===== SUBMISSION =====

    /// Take the current slot's work for submission
    ///
    /// Deferred destructions and timestamps move along with the work and are
    /// released by [`recycle_current`](Self::recycle_current).
    pub fn take_batch(&mut self) -> SubmitBatch {
        let frame = self.frame;
        let slot = &mut self.slots[self.current];
        slot.submitted.frame = frame;
        slot.submitted.destroy.append(&mut slot.pending_destroy);
        slot.submitted.timestamps.append(&mut slot.timestamps);
        SubmitBatch {
            frame,
            items: std::mem::take(&mut slot.work),
        }
    }

    /// Record the fence of the batch just taken from the current slot
    pub fn mark_in_flight(&mut self, fence: FenceId) {
        self.slots[self.current].submitted.fence = Some(fence);
    }

    /// Fence of the current slot, if its work is in flight
    pub fn current_fence(&self) -> Option<FenceId> {
        self.slots[self.current].submitted.fence
    }

    /// Move to the next slot and start a new frame
    ///
    /// Returns the fence the new current slot is still waiting on, if any.
    pub fn advance(&mut self) -> Option<FenceId> {
        self.current = (self.current + 1) % self.slots.len();
        self.frame += 1;
        self.slots[self.current].submitted.fence
    }

    /// Start a new frame without moving (single-slot local devices)
    pub fn next_frame(&mut self) {
        self.frame += 1;
    }

    /// Release the submitted work of the current slot after its fence completed
    pub fn recycle_current(&mut self) -> RecycledSlot {
        let submitted = std::mem::take(&mut self.slots[self.current].submitted);
        RecycledSlot {
            frame: submitted.frame,
            destroy: submitted.destroy,
            timestamps: submitted.timestamps,
        }
    }

    /// Fences of every slot still in flight
    pub fn in_flight(&self) -> Vec<FenceId> {
        self.slots.iter().filter_map(|slot| slot.submitted.fence).collect()
    }

    /// Release everything, submitted or not (teardown, after all fences were waited on)
    pub fn drain(&mut self) -> Vec<RecycledSlot> {
        self.slots
            .iter_mut()
            .map(|slot| {
                let mut submitted = std::mem::take(&mut slot.submitted);
                submitted.destroy.append(&mut slot.pending_destroy);
                submitted.timestamps.append(&mut slot.timestamps);
                slot.work.clear();
                RecycledSlot {
                    frame: submitted.frame,
                    destroy: submitted.destroy,
                    timestamps: submitted.timestamps,
                }
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "submission_tests.rs"]
mod tests;
