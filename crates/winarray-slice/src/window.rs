//! Window bounds
//!
//! A window is the caller's range of interest `[start_index, end_index)`
//! widened by `index_margin` on both sides and clamped to the store.

use crate::change::ArrayChange;
use crate::error::WindowError;
use serde::{Deserialize, Serialize};

/// Caller-controlled window parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// First index of interest (inclusive)
    pub start_index: usize,
    /// End of the range of interest (exclusive)
    pub end_index: usize,
    /// Over-fetch applied on each side of the range
    pub index_margin: usize,
}

impl WindowConfig {
    /// Create a window without margin
    #[inline]
    #[must_use]
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
            index_margin: 0,
        }
    }

    /// With symmetric margin
    #[inline]
    #[must_use]
    pub fn with_margin(mut self, index_margin: usize) -> Self {
        self.index_margin = index_margin;
        self
    }

    /// Reject windows whose start lies past their end
    pub fn validate(&self) -> Result<(), WindowError> {
        if self.start_index > self.end_index {
            return Err(WindowError::InvalidWindow {
                start: self.start_index,
                end: self.end_index,
            });
        }
        Ok(())
    }

    /// Largest number of items this window can materialize
    #[inline]
    #[must_use]
    pub fn span(&self) -> usize {
        self.end_index
            .saturating_add(self.index_margin)
            .saturating_sub(self.start_index.saturating_sub(self.index_margin))
    }

    /// Materialized bounds over a store of `store_len` items
    #[inline]
    #[must_use]
    pub fn bounds(&self, store_len: usize) -> Bounds {
        Bounds {
            start: self.start_index.saturating_sub(self.index_margin),
            end: store_len.min(self.end_index.saturating_add(self.index_margin)),
        }
    }
}

/// Materialized sub-range `[start, end)` of the backing store
///
/// `start` may exceed `end` when the store is shorter than the window's
/// start; the view is then empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Raw store index of the first materialized item
    pub start: usize,
    /// Raw store index one past the last materialized item
    pub end: usize,
}

impl Bounds {
    /// Number of materialized items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether nothing is materialized
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translate a window-local index to a store index
    #[inline]
    #[must_use]
    pub fn translate(&self, index: usize) -> Option<usize> {
        let source = self.start.checked_add(index)?;
        (source < self.end).then_some(source)
    }

    /// Changes turning the view over `self` into the view over `next`
    ///
    /// Both bounds must describe the same store. The head is adjusted first,
    /// then the tail; disjoint views are reported as one full replacement.
    #[must_use]
    pub fn diff(&self, next: &Bounds) -> Vec<ArrayChange> {
        let (old_len, new_len) = (self.len(), next.len());
        if self == next || (old_len == 0 && new_len == 0) {
            return Vec::new();
        }

        let overlaps = old_len > 0
            && new_len > 0
            && next.start < self.end
            && self.start < next.end;
        if !overlaps {
            return vec![ArrayChange::reset(old_len, new_len)];
        }

        let mut changes = Vec::with_capacity(2);

        // Head: [self.start, ..) -> [next.start, ..)
        if next.start < self.start {
            changes.push(ArrayChange::new(0, 0, self.start - next.start));
        } else if next.start > self.start {
            changes.push(ArrayChange::new(0, next.start - self.start, 0));
        }

        // Tail, relative to next.start after the head adjustment
        if next.end > self.end {
            changes.push(ArrayChange::new(self.end - next.start, 0, next.end - self.end));
        } else if next.end < self.end {
            changes.push(ArrayChange::new(next.end - next.start, self.end - next.end, 0));
        }

        changes
    }
}
