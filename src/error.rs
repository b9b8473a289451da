//! Error types for the her2k performance harness.
//!
//! Every fallible step of a benchmark instance (validation, device
//! allocation, transfers, kernel enqueue) reports one of these errors. The
//! orchestrator records the error in the report instead of panicking.

use thiserror::Error;

/// Errors that can occur while staging or timing a benchmark instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// A device buffer could not be allocated.
    #[error("Device allocation failed: {message} (requested {requested_size} bytes, limit {limit} bytes)")]
    Allocation {
        /// The size that was requested, in bytes.
        requested_size: u64,
        /// The limit that was exceeded, in bytes.
        limit: u64,
        /// Human-readable error message.
        message: String,
    },
    /// Problem parameters are inconsistent.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },
    /// A transfer, enqueue or wait on the device failed.
    #[error("Device error (status {status}): {message}")]
    Device {
        /// Non-zero status reported by the device or kernel.
        status: i32,
        /// Human-readable error message.
        message: String,
    },
    /// Row-major problems are disabled for the reference path.
    #[error("Row major order is not allowed")]
    RowMajorDisallowed,
    /// The crate was built without a reference backend.
    #[error("Reference backend is not available in this build")]
    ReferenceUnavailable,
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Creates an allocation error.
pub fn allocation_error(requested_size: u64, limit: u64, message: impl Into<String>) -> HarnessError {
    HarnessError::Allocation {
        requested_size,
        limit,
        message: message.into(),
    }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> HarnessError {
    HarnessError::Validation {
        message: message.into(),
    }
}

/// Creates a device error carrying a status code.
pub fn device_error(status: i32, message: impl Into<String>) -> HarnessError {
    HarnessError::Device {
        status,
        message: message.into(),
    }
}
