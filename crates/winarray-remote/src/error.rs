//! Error types for remote arrays
//!
//! Fetch failures never surface here: they are recorded on the array and
//! read back through [`RemoteArray::error`](crate::RemoteArray::error).

use winarray_slice::WindowError;

/// Errors raised synchronously by [`RemoteArray`](crate::RemoteArray) operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteArrayError {
    /// Array was created outside of a Tokio runtime
    #[error("remote array requires a running Tokio runtime")]
    NoRuntime,

    /// Window parameters or in-window edit rejected
    #[error("window error: {0}")]
    Window(#[from] WindowError),
}
