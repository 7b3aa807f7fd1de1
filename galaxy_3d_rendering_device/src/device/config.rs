/// Rendering device configuration

/// Largest accepted frame delay
pub const MAX_FRAME_DELAY: u32 = 4;

/// Rendering device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Application name (forwarded to logs and backend debug names)
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Number of frames in flight (1..=MAX_FRAME_DELAY)
    pub frame_delay: u32,
    /// Forward resource names and debug labels to the backend
    pub enable_debug_labels: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            app_name: "Galaxy3D Application".to_string(),
            app_version: (1, 0, 0),
            frame_delay: 3,
            enable_debug_labels: cfg!(debug_assertions),
        }
    }
}

impl DeviceConfig {
    /// Configuration of an offline (local) device: one frame in flight
    pub fn local() -> Self {
        Self {
            frame_delay: 1,
            ..Default::default()
        }
    }
}
