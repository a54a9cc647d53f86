//! Fetch state and the status surface exposed for binding

use crate::source::FetchError;
use serde::{Serialize, Serializer};

/// Edge and lock flags of a remote array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FetchFlags {
    /// Head of the remote collection is in the store
    pub(crate) start_reached: bool,
    /// Tail of the remote collection is in the store
    pub(crate) end_reached: bool,
    /// A `fetch_prev` is in flight
    pub(crate) fetching_prev: bool,
    /// A `fetch_next` is in flight
    pub(crate) fetching_next: bool,
    /// A reload is in flight
    pub(crate) reloading: bool,
}

/// Point-in-time status of a [`RemoteArray`](crate::RemoteArray)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayStatus {
    /// No more items exist before the first stored item
    pub start_reached: bool,
    /// No more items exist after the last stored item
    pub end_reached: bool,
    /// Items before the head are being fetched
    pub fetching_prev: bool,
    /// Items after the tail are being fetched
    pub fetching_next: bool,
    /// The whole store is being reloaded
    pub reloading: bool,
    /// Last fetch failure, cleared by the next successful fetch
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FetchError>,
}

impl ArrayStatus {
    pub(crate) fn new(flags: FetchFlags, error: Option<FetchError>) -> Self {
        Self {
            start_reached: flags.start_reached,
            end_reached: flags.end_reached,
            fetching_prev: flags.fetching_prev,
            fetching_next: flags.fetching_next,
            reloading: flags.reloading,
            error,
        }
    }

    /// Any fetch in flight
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fetching_prev || self.fetching_next || self.reloading
    }
}

fn serialize_error<S: Serializer>(error: &Option<FetchError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Side of the backing store a chunk is fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edge {
    /// Before the first stored item
    Prev,
    /// After the last stored item
    Next,
}

impl Edge {
    /// Whether a fetch on this edge is in flight
    pub(crate) fn locked(self, flags: &FetchFlags) -> bool {
        match self {
            Self::Prev => flags.fetching_prev,
            Self::Next => flags.fetching_next,
        }
    }

    pub(crate) fn set_locked(self, flags: &mut FetchFlags, locked: bool) {
        match self {
            Self::Prev => flags.fetching_prev = locked,
            Self::Next => flags.fetching_next = locked,
        }
    }

    /// Whether the remote collection has no more items on this edge
    pub(crate) fn reached(self, flags: &FetchFlags) -> bool {
        match self {
            Self::Prev => flags.start_reached,
            Self::Next => flags.end_reached,
        }
    }

    pub(crate) fn mark_reached(self, flags: &mut FetchFlags) {
        match self {
            Self::Prev => flags.start_reached = true,
            Self::Next => flags.end_reached = true,
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prev => write!(f, "previous"),
            Self::Next => write!(f, "next"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_flags_are_independent() {
        let mut flags = FetchFlags::default();
        Edge::Next.set_locked(&mut flags, true);
        Edge::Prev.mark_reached(&mut flags);

        assert!(Edge::Next.locked(&flags));
        assert!(!Edge::Prev.locked(&flags));
        assert!(Edge::Prev.reached(&flags));
        assert!(!Edge::Next.reached(&flags));
    }

    #[test]
    fn status_reports_loading() {
        let flags = FetchFlags {
            reloading: true,
            ..FetchFlags::default()
        };
        let status = ArrayStatus::new(flags, None);
        assert!(status.is_loading());
        assert!(!ArrayStatus::new(FetchFlags::default(), None).is_loading());
    }
}
