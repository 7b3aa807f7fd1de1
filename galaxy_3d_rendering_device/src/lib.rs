/*!
# Galaxy 3D Rendering Device

Backend-agnostic rendering device for the Galaxy 3D engine.

The crate exposes one facade, [`RenderingDevice`](device::RenderingDevice),
through which an application creates GPU resources, records draw and compute
command lists and submits them frame by frame. A concrete graphics API is
plugged in through the [`Backend`](device::Backend) trait.

## Architecture

- **RenderingDevice**: validation, resource ownership, frame pacing
- **HandleRegistry**: generation-checked handles for every resource kind
- **CommandList**: draw/compute recording with bound-state tracking
- **SubmissionController**: ring of frames in flight and deferred destruction
- **Backend**: the native API seam (see the software backend crate)
*/

// Internal modules
pub mod error;
pub mod log;
pub mod device;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Device facade
    pub use crate::device::{Backend, DeviceConfig, RenderingDevice};

    // Logging sub-module (types and logger installation, NOT macros)
    pub mod log {
        pub use crate::log::{
            reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }

    // Device sub-module with all descriptor and handle types
    pub mod device {
        pub use crate::device::*;
    }
}

// Re-export math library at crate root
pub use glam;
