//! winarray Slice
//!
//! Index-translated windows over ordered backing stores.
//!
//! # Core Concepts
//!
//! - [`BackingStore`]: Ordered, mutable sequence the window is laid over
//! - [`WindowConfig`]: Caller-controlled `start_index`, `end_index` and `index_margin`
//! - [`Bounds`]: Materialized store range derived from a window
//! - [`ArraySlice`]: Observable view of `store[bounds.start..bounds.end]`
//! - [`ArrayChange`]: `(offset, removed, added)` notification triple
//!
//! # Example
//!
//! ```rust
//! use winarray_slice::{ArraySlice, WindowConfig};
//!
//! let store: Vec<u32> = (0..100).collect();
//! let mut slice = ArraySlice::new(store, WindowConfig::new(50, 70).with_margin(10))?;
//! assert_eq!(slice.len(), 40);
//! assert_eq!(slice.get(0), Some(&40));
//!
//! slice.set_window(30, 35)?;
//! assert_eq!(slice.first(), Some(&20));
//! # Ok::<(), winarray_slice::WindowError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod change;
mod error;
mod slice;
mod store;
mod window;

// Re-exports
pub use change::{clamp_source_change, ArrayChange};
pub use error::WindowError;
pub use slice::{ArraySlice, CHANGE_CHANNEL_CAPACITY};
pub use store::BackingStore;
pub use window::{Bounds, WindowConfig};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
