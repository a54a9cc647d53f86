//! Change notifications
//!
//! Observers receive `(offset, removed, added)` triples in window-local
//! coordinates. Replaying them in order as splices on a replica keeps the
//! replica equal to the view.

use crate::window::Bounds;
use serde::{Deserialize, Serialize};

/// "Array changed at `offset`: removed `removed`, added `added`"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayChange {
    /// Window-local index where the change starts
    pub offset: usize,
    /// Number of items removed at `offset`
    pub removed: usize,
    /// Number of items inserted at `offset`
    pub added: usize,
}

impl ArrayChange {
    /// Create change triple
    #[inline]
    #[must_use]
    pub const fn new(offset: usize, removed: usize, added: usize) -> Self {
        Self {
            offset,
            removed,
            added,
        }
    }

    /// Whole-view replacement
    #[inline]
    #[must_use]
    pub const fn reset(old_len: usize, new_len: usize) -> Self {
        Self::new(0, old_len, new_len)
    }

    /// Whether this change touches nothing
    #[inline]
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.removed == 0 && self.added == 0
    }
}

/// Clamp a raw store mutation to the window it happened under
///
/// `before` are the bounds prior to the mutation and `end_after` the
/// materialized end once it has been applied (the window itself did not
/// move). Mutations starting outside `[before.start, before.end]` are
/// suppressed.
#[must_use]
pub fn clamp_source_change(
    before: Bounds,
    end_after: usize,
    source_index: usize,
    removed: usize,
    added: usize,
) -> Option<ArrayChange> {
    if source_index < before.start || source_index > before.end {
        return None;
    }

    let offset = source_index - before.start;
    let old_room = before.end - source_index;
    let new_room = end_after.saturating_sub(source_index);

    let removed_in_view = removed.min(old_room);
    let added_in_view = added.min(new_room);

    let old_survivors = old_room - removed_in_view;
    let new_survivors = new_room - added_in_view;

    let change = if old_survivors == new_survivors {
        ArrayChange::new(offset, removed_in_view, added_in_view)
    } else {
        // Items slid across the window end; replace the whole suffix
        ArrayChange::new(offset, old_room, new_room)
    };

    (!change.is_noop()).then_some(change)
}
