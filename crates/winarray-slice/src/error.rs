//! Error types for window manipulation

/// Errors raised by window setters and in-window edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Requested window has its start after its end
    #[error("invalid window: start index {start} is past end index {end}")]
    InvalidWindow {
        /// Requested start index
        start: usize,
        /// Requested end index
        end: usize,
    },

    /// Window-local index lies outside the materialized view
    #[error("index {index} is outside the window (length {len})")]
    OutOfWindow {
        /// Offending window-local index
        index: usize,
        /// Current window length
        len: usize,
    },
}
