/// Handle registry: the single owner of every resource record
///
/// Backed by a generational `SlotMap`. A slot goes through
/// `reserve -> commit` (or `reserve -> rollback`) so that a factory can hold
/// a handle while the backend creates the native object, without ever
/// exposing a half-built record through `resolve`.

use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::device::{DeviceId, Handle, ResourceKey, ResourceKind, ResourceRecord};

/// Slot state
#[derive(Debug)]
enum Entry {
    /// Handle issued, record not yet committed
    Reserved(ResourceKind),
    /// Resolvable resource
    Live(ResourceRecord),
}

/// Generational arena of resource records
pub struct HandleRegistry {
    device: DeviceId,
    slots: SlotMap<ResourceKey, Entry>,
    live_counts: [usize; ResourceKind::ALL.len()],
}

impl HandleRegistry {
    /// Create a registry with a fresh device id
    pub fn new() -> Self {
        Self::with_device(DeviceId::next())
    }

    /// Create a registry issuing handles for `device`
    pub fn with_device(device: DeviceId) -> Self {
        Self {
            device,
            slots: SlotMap::with_key(),
            live_counts: [0; ResourceKind::ALL.len()],
        }
    }

    /// Device id stamped into every issued handle
    pub fn device(&self) -> DeviceId {
        self.device
    }

    // ===== ALLOCATION =====

    /// Reserve a slot for a resource of `kind`
    ///
    /// The returned handle does not resolve until [`commit`](Self::commit).
    pub fn reserve(&mut self, kind: ResourceKind) -> Handle {
        let key = self.slots.insert(Entry::Reserved(kind));
        Handle::new(kind, key, self.device)
    }

    /// Store the record of a reserved handle
    ///
    /// # Arguments
    ///
    /// * `handle` - Handle returned by [`reserve`](Self::reserve)
    /// * `record` - Record whose kind must match the handle kind
    pub fn commit(&mut self, handle: Handle, record: ResourceRecord) -> Result<()> {
        if handle.device() != self.device || record.kind() != handle.kind() {
            return Err(Error::InvalidHandle(handle));
        }
        let Some(entry) = self.slots.get_mut(handle.key()) else {
            return Err(Error::InvalidHandle(handle));
        };
        match entry {
            Entry::Reserved(kind) if *kind == handle.kind() => {}
            _ => return Err(Error::InvalidHandle(handle)),
        }
        *entry = Entry::Live(record);
        self.live_counts[handle.kind().index()] += 1;
        Ok(())
    }

    /// Release a reserved (uncommitted) slot
    ///
    /// Returns false if the handle was not in the reserved state.
    pub fn rollback(&mut self, handle: Handle) -> bool {
        if handle.device() != self.device {
            return false;
        }
        match self.slots.get(handle.key()) {
            Some(Entry::Reserved(kind)) if *kind == handle.kind() => {
                self.slots.remove(handle.key());
                true
            }
            _ => false,
        }
    }

    /// Reserve and commit in one step (kind taken from the record)
    pub fn allocate(&mut self, record: ResourceRecord) -> Handle {
        let kind = record.kind();
        let key = self.slots.insert(Entry::Live(record));
        self.live_counts[kind.index()] += 1;
        Handle::new(kind, key, self.device)
    }

    // ===== LOOKUP =====

    /// Resolve a handle to its record
    ///
    /// Fails with `InvalidHandle` if the handle was issued by another device,
    /// its generation is stale, its slot is only reserved or its kind tag does
    /// not match the stored record.
    pub fn resolve(&self, handle: Handle) -> Result<&ResourceRecord> {
        if handle.device() != self.device {
            return Err(Error::InvalidHandle(handle));
        }
        match self.slots.get(handle.key()) {
            Some(Entry::Live(record)) if record.kind() == handle.kind() => Ok(record),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    /// Mutable variant of [`resolve`](Self::resolve)
    pub fn resolve_mut(&mut self, handle: Handle) -> Result<&mut ResourceRecord> {
        if handle.device() != self.device {
            return Err(Error::InvalidHandle(handle));
        }
        match self.slots.get_mut(handle.key()) {
            Some(Entry::Live(record)) if record.kind() == handle.kind() => Ok(record),
            _ => Err(Error::InvalidHandle(handle)),
        }
    }

    /// Returns true if `handle` currently resolves
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    // ===== RELEASE =====

    /// Free a live handle, returning its record
    ///
    /// Returns `None` for stale, foreign or reserved handles (double free).
    /// The slot is reused later with a bumped generation.
    pub fn free(&mut self, handle: Handle) -> Option<ResourceRecord> {
        self.resolve(handle).ok()?;
        match self.slots.remove(handle.key()) {
            Some(Entry::Live(record)) => {
                self.live_counts[handle.kind().index()] -= 1;
                Some(record)
            }
            _ => None,
        }
    }

    /// Remove every live record (device teardown)
    pub fn drain(&mut self) -> Vec<(Handle, ResourceRecord)> {
        let device = self.device;
        let drained = self
            .slots
            .drain()
            .filter_map(|(key, entry)| match entry {
                Entry::Live(record) => Some((Handle::new(record.kind(), key, device), record)),
                Entry::Reserved(_) => None,
            })
            .collect();
        self.live_counts = [0; ResourceKind::ALL.len()];
        drained
    }

    // ===== DEBUG NAMES =====

    /// Attach a debug name to a live resource
    pub fn set_name(&mut self, handle: Handle, name: &str) -> Result<()> {
        self.resolve_mut(handle)?.set_name(name.to_string());
        Ok(())
    }

    /// Debug name of a live resource
    pub fn name(&self, handle: Handle) -> Option<&str> {
        self.resolve(handle).ok()?.name()
    }

    // ===== STATISTICS =====

    /// Number of live (committed) resources
    pub fn len(&self) -> usize {
        self.live_counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live resources of `kind`
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.live_counts[kind.index()]
    }

    /// Handles of every live resource
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        let device = self.device;
        self.slots.iter().filter_map(move |(key, entry)| match entry {
            Entry::Live(record) => Some(Handle::new(record.kind(), key, device)),
            Entry::Reserved(_) => None,
        })
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "handle_registry_tests.rs"]
mod tests;
