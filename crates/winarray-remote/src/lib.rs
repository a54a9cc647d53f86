//! winarray Remote
//!
//! Windowed views that fetch their backing store lazily, chunk by chunk,
//! from a paginated remote collection.
//!
//! # Core Concepts
//!
//! - [`Keyed`]: Items with a stable identity key (ordering, dedup, anchoring)
//! - [`ChunkSource`]: Async collaborator answering `fetch(anchor, size, offset)`
//! - [`RemoteArray`]: Window plus prefetch trigger, edge fetches and reload
//! - [`ArrayStatus`]: Edge, lock and error flags for UI binding
//! - [`FetchError`]: The one failure kind, recorded rather than returned
//!
//! # Example
//!
//! ```rust,ignore
//! use winarray_remote::{RemoteArray, WindowConfig};
//!
//! let array = RemoteArray::new(source, WindowConfig::new(0, 10))?;
//! array.initial_load().await;
//!
//! // Scrolling down prefetches the next chunk in the background
//! array.set_window(7, 17)?;
//! array.settled().await;
//! assert_eq!(array.len(), 10);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod merge;
mod remote;
mod source;
mod status;

// Re-exports
pub use error::RemoteArrayError;
pub use remote::{ReloadOptions, RemoteArray};
pub use source::{ChunkSource, FetchError, FnSource, Keyed};
pub use status::ArrayStatus;

pub use winarray_slice::{ArrayChange, Bounds, WindowConfig, WindowError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
