/// Opaque, type-tagged resource handles
///
/// A `Handle` is the only way client code refers to a GPU resource. It packs
/// the resource kind, the registry key (slot index + generation) and the id of
/// the device that issued it.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use slotmap::{new_key_type, Key, KeyData};

new_key_type! {
    /// Generational key into the handle registry
    pub struct ResourceKey;
}

// ===== DEVICE ID =====

/// Identifies the device (and therefore the registry) that issued a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Allocate a process-unique device id
    pub(crate) fn next() -> Self {
        static NEXT_DEVICE_ID: AtomicU32 = AtomicU32::new(1);
        Self(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

// ===== RESOURCE KIND =====

/// Kind tag carried by every handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Buffer,
    Sampler,
    Shader,
    Pipeline,
    Framebuffer,
    UniformSet,
    VertexFormat,
    FramebufferFormat,
    IndexArray,
    VertexArray,
}

impl ResourceKind {
    /// Every kind, in declaration order
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Texture,
        ResourceKind::Buffer,
        ResourceKind::Sampler,
        ResourceKind::Shader,
        ResourceKind::Pipeline,
        ResourceKind::Framebuffer,
        ResourceKind::UniformSet,
        ResourceKind::VertexFormat,
        ResourceKind::FramebufferFormat,
        ResourceKind::IndexArray,
        ResourceKind::VertexArray,
    ];

    /// Human readable name (used in logs and error messages)
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Texture => "Texture",
            ResourceKind::Buffer => "Buffer",
            ResourceKind::Sampler => "Sampler",
            ResourceKind::Shader => "Shader",
            ResourceKind::Pipeline => "Pipeline",
            ResourceKind::Framebuffer => "Framebuffer",
            ResourceKind::UniformSet => "UniformSet",
            ResourceKind::VertexFormat => "VertexFormat",
            ResourceKind::FramebufferFormat => "FramebufferFormat",
            ResourceKind::IndexArray => "IndexArray",
            ResourceKind::VertexArray => "VertexArray",
        }
    }

    /// Position in [`ResourceKind::ALL`]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ===== HANDLE =====

/// Opaque resource identifier
///
/// Valid as long as the registry slot it points to still stores the same
/// generation. Freeing the resource bumps the generation, so every copy of
/// the handle held by client code becomes stale at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    kind: ResourceKind,
    key: ResourceKey,
    device: DeviceId,
}

impl Handle {
    pub(crate) fn new(kind: ResourceKind, key: ResourceKey, device: DeviceId) -> Self {
        Self { kind, key, device }
    }

    /// Rebuild a handle from a previously exported [`Handle::id`]
    ///
    /// The result is only meaningful to the device that issued the id; any
    /// other combination fails to resolve.
    ///
    /// # Arguments
    ///
    /// * `kind` - Expected resource kind
    /// * `device` - Issuing device
    /// * `id` - Value returned by [`Handle::id`]
    pub fn from_raw(kind: ResourceKind, device: DeviceId, id: u64) -> Self {
        Self {
            kind,
            key: KeyData::from_ffi(id).into(),
            device,
        }
    }

    /// Resource kind tag
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Device that issued this handle
    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub(crate) fn key(&self) -> ResourceKey {
        self.key
    }

    /// Registry slot index
    pub fn slot(&self) -> u32 {
        (self.key.data().as_ffi() & 0xffff_ffff) as u32
    }

    /// Slot generation at allocation time
    pub fn generation(&self) -> u32 {
        (self.key.data().as_ffi() >> 32) as u32
    }

    /// Stable 64-bit id (slot + generation), comparable across calls
    pub fn id(&self) -> u64 {
        self.key.data().as_ffi()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(slot={}, gen={}, device={})",
            self.kind,
            self.slot(),
            self.generation(),
            self.device.raw()
        )
    }
}
