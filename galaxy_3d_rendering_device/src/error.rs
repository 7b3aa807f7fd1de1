//! Error types for the Galaxy3D rendering device
//!
//! Every public operation of the rendering device reports its outcome through
//! [`Result`]. Validation failures never panic and never leave partial state
//! behind: the attempted operation simply has no effect.

use std::fmt;
use crate::device::{Handle, ListKind};

/// Result type for rendering device operations
pub type Result<T> = std::result::Result<T, Error>;

/// Rendering device errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A descriptor or argument failed validation
    InvalidParameter(String),

    /// The handle is stale, was freed, belongs to another device or has the wrong kind
    InvalidHandle(Handle),

    /// A command list of this kind is currently recording
    ListAlreadyOpen(ListKind),

    /// `sync()` was called without a prior `submit()`
    NoPendingSubmission,

    /// Format, usage or feature not supported by this device or backend
    Unsupported(String),

    /// Backend allocation failure
    OutOfMemory,

    /// The backend device was lost (driver reset, crash)
    DeviceLost(String),

    /// Any other backend failure
    BackendError(String),
}

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Recoverable: the caller passed something the device rejects
    Validation,
    /// Recoverable: the backend ran out of memory
    ResourceExhaustion,
    /// Not recoverable by the device; the host must recreate it
    Fatal,
}

impl Error {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidParameter(_)
            | Error::InvalidHandle(_)
            | Error::ListAlreadyOpen(_)
            | Error::NoPendingSubmission
            | Error::Unsupported(_) => ErrorCategory::Validation,
            Error::OutOfMemory => ErrorCategory::ResourceExhaustion,
            Error::DeviceLost(_) | Error::BackendError(_) => ErrorCategory::Fatal,
        }
    }

    /// Returns true if the device should be considered unusable
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Fatal
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::InvalidHandle(handle) => write!(f, "Invalid handle: {}", handle),
            Error::ListAlreadyOpen(kind) => write!(f, "A {:?} list is already recording", kind),
            Error::NoPendingSubmission => write!(f, "No pending submission to sync"),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
