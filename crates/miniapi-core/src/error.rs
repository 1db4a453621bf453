//! Error types for miniapi operations.
//!
//! This module defines the canonical error taxonomy for the compatibility
//! layer:
//! - [`MiniapiError`] - the single error type returned by every adapter
//! - [`ErrorKind`] - coarse classification for programmatic handling
//!
//! ## Design Principles
//!
//! - **Structured**: errors carry typed context (operation, native code),
//!   not just messages
//! - **Normalized**: adapters translate native failures into these variants;
//!   platform quirks never leak as raw `io::Error` values
//! - **Explicit**: no operation substitutes a default value on failure;
//!   callers must inspect the result

use std::io;
use thiserror::Error;

/// Canonical error type for all miniapi operations.
///
/// Adapters never terminate the process on failure; every fallible call
/// returns `MiniapiResult<T>` carrying one of these variants. The dispatch
/// core forwards adapter errors verbatim, or replaces them with
/// [`MiniapiError::Unsupported`] when the capability registry says the
/// operation has no implementation and no fallback on this platform.
#[derive(Debug, Error)]
pub enum MiniapiError {
    /// Operation is not available on this platform and no fallback applies.
    #[error("Operation '{operation}' not supported on {platform}")]
    Unsupported {
        /// The abstract operation name (e.g., "fs.remove_recursive").
        operation: String,
        /// The platform family where it is unavailable.
        platform: String,
    },

    /// Contention on a shared OS resource (file locked by another process,
    /// sharing violation, busy mount).
    #[error("Resource busy: {what}")]
    ResourceBusy {
        /// Description of the contended resource.
        what: String,
    },

    /// Path, handle, or process does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of what was missing.
        what: String,
    },

    /// The operating system refused the operation.
    #[error("Permission denied for '{operation}'")]
    PermissionDenied {
        /// The operation that was denied.
        operation: String,
    },

    /// Operation did not complete within the caller-supplied deadline.
    #[error("Operation timed out")]
    Timeout,

    /// Caller-supplied value violates the abstract contract
    /// (malformed path, empty command, port 0, ...).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of what was invalid.
        message: String,
    },

    /// Unexpected native failure that could not be classified.
    ///
    /// Carries the native error code (errno on Unix, GetLastError/WSA code
    /// on Windows) for diagnostics.
    #[error("Platform error: {message} (code: {code})")]
    Platform {
        /// Description of the failure.
        message: String,
        /// The native error code.
        code: i32,
    },
}

/// Coarse error classification.
///
/// Mirrors the variants of [`MiniapiError`] without their payloads so
/// callers can branch without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    ResourceBusy,
    NotFound,
    PermissionDenied,
    Timeout,
    InvalidArgument,
    Platform,
}

impl MiniapiError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MiniapiError::Unsupported { .. } => ErrorKind::Unsupported,
            MiniapiError::ResourceBusy { .. } => ErrorKind::ResourceBusy,
            MiniapiError::NotFound { .. } => ErrorKind::NotFound,
            MiniapiError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            MiniapiError::Timeout => ErrorKind::Timeout,
            MiniapiError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            MiniapiError::Platform { .. } => ErrorKind::Platform,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl MiniapiError {
    /// Create an `Unsupported` error.
    pub fn unsupported(operation: impl Into<String>, platform: impl Into<String>) -> Self {
        MiniapiError::Unsupported {
            operation: operation.into(),
            platform: platform.into(),
        }
    }

    /// Create a `ResourceBusy` error.
    pub fn resource_busy(what: impl Into<String>) -> Self {
        MiniapiError::ResourceBusy { what: what.into() }
    }

    /// Create a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        MiniapiError::NotFound { what: what.into() }
    }

    /// Create a `PermissionDenied` error.
    pub fn permission_denied(operation: impl Into<String>) -> Self {
        MiniapiError::PermissionDenied {
            operation: operation.into(),
        }
    }

    /// Create an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MiniapiError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a `Platform` error.
    pub fn platform(message: impl Into<String>, code: i32) -> Self {
        MiniapiError::Platform {
            message: message.into(),
            code,
        }
    }

    /// Normalize an IO error observed while performing `operation` on `what`.
    ///
    /// Maps the portable `io::ErrorKind` values to the taxonomy; anything
    /// unclassifiable becomes `Platform` with the raw OS code preserved.
    pub fn from_io(err: io::Error, operation: &str, what: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => MiniapiError::not_found(what),
            io::ErrorKind::PermissionDenied => MiniapiError::permission_denied(operation),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => MiniapiError::Timeout,
            io::ErrorKind::InvalidInput => MiniapiError::invalid_argument(err.to_string()),
            _ => MiniapiError::platform(
                format!("{operation} on {what}: {err}"),
                err.raw_os_error().unwrap_or(0),
            ),
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for miniapi operations.
///
/// This is the layer's `OperationResult`: success value or a normalized
/// error, never both.
pub type MiniapiResult<T> = Result<T, MiniapiError>;

// ============================================================================
// Tests
// ============================================================================
