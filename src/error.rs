//! Custom error types for the bus access layer.
//!
//! This module defines the primary error type, `BusError`, shared by the
//! GPIO and SPI drivers. Using the `thiserror` crate, it provides a single
//! taxonomy for every failure the layer can surface:
//!
//! - **`InvalidArgument`**: caller-supplied parameters are structurally
//!   invalid (length mismatch, out-of-range bits, unknown line). Always
//!   detected before any kernel call, so no resource is left half-acquired.
//! - **`ResourceUnavailable`**: the requested device or line cannot be
//!   acquired (missing node, permission denied, line already claimed).
//!   Raised by open operations only.
//! - **`InvalidHandle`**: use of a handle or descriptor after it was
//!   closed. A caller bug, never retried.
//! - **`Io`**: a kernel read/write/transfer failed after the resource was
//!   validly open. May be transient or permanent; this layer does not
//!   distinguish or retry.
//!
//! Every failure propagates synchronously to the caller of the failing
//! operation; nothing is swallowed or logged in place of an error, and no
//! operation returns success after a partial result.

use thiserror::Error;

/// Convenience alias for results using the bus layer error type.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors surfaced by the GPIO and SPI drivers.
#[derive(Error, Debug)]
pub enum BusError {
    /// Caller-supplied parameters are structurally invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested device or line cannot be opened or claimed.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The handle or descriptor was already closed.
    #[error("handle is closed")]
    InvalidHandle,

    /// A kernel-level read, write, or transfer failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl BusError {
    pub(crate) fn unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        BusError::ResourceUnavailable(format!("{context}: {err}"))
    }

    pub(crate) fn io(context: &str, err: impl std::fmt::Display) -> Self {
        BusError::Io(format!("{context}: {err}"))
    }
}
