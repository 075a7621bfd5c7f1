//! Error types for decode operations.

use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Decode error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Input stream is corrupted or structurally invalid.
    ///
    /// Fatal: the decoder instance that raised it must be discarded
    /// or reset before reuse.
    #[error("corrupted stream: {message}")]
    Corrupted { message: String },

    /// Invalid codec properties supplied at construction.
    #[error("invalid properties: {message}")]
    InvalidProperties { message: String },

    /// Output buffer too small for the requested operation.
    #[error("buffer too small: need {required} bytes, got {provided}")]
    BufferTooSmall { required: usize, provided: usize },

    /// Memory allocation refused or failed.
    #[error("allocation failed: could not allocate {requested_bytes} bytes")]
    AllocationFailed { requested_bytes: usize },
}

impl Error {
    /// Create a corrupted stream error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Error::Corrupted {
            message: message.into(),
        }
    }

    /// Create an invalid properties error.
    pub fn invalid_properties(message: impl Into<String>) -> Self {
        Error::InvalidProperties {
            message: message.into(),
        }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(required: usize, provided: usize) -> Self {
        Error::BufferTooSmall { required, provided }
    }

    /// Create an allocation failure error.
    pub fn allocation_failed(requested_bytes: usize) -> Self {
        Error::AllocationFailed { requested_bytes }
    }

    /// Check if the operation can be retried with different resources.
    ///
    /// `Corrupted` and `InvalidProperties` are final verdicts on the input;
    /// buffer and allocation failures can be retried with more memory.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::BufferTooSmall { .. } | Error::AllocationFailed { .. }
        )
    }
}
