//! Array slice
//!
//! An index-translated, observable view of `store[start..end]`.

use crate::change::{clamp_source_change, ArrayChange};
use crate::error::WindowError;
use crate::store::BackingStore;
use crate::window::{Bounds, WindowConfig};
use tokio::sync::broadcast;

/// Buffered notifications per subscriber before it starts lagging
pub const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Windowed view over an exclusively owned backing store
///
/// The view is always exactly `store[bounds.start..bounds.end]` where the
/// bounds follow from the [`WindowConfig`]. Every change to the window or to
/// the store inside it is published to subscribers as [`ArrayChange`]
/// triples in window-local coordinates.
#[derive(Debug)]
pub struct ArraySlice<S: BackingStore> {
    store: S,
    window: WindowConfig,
    bounds: Bounds,
    notifier: broadcast::Sender<ArrayChange>,
}

impl<S: BackingStore> ArraySlice<S> {
    /// Create slice over `store`
    ///
    /// # Errors
    /// - `WindowError::InvalidWindow` if the window start lies past its end
    pub fn new(store: S, window: WindowConfig) -> Result<Self, WindowError> {
        window.validate()?;
        let bounds = window.bounds(store.len());
        let (notifier, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            store,
            window,
            bounds,
            notifier,
        })
    }

    /// Slice over `store` with a zero window; nothing is materialized yet
    #[must_use]
    pub fn from_store(store: S) -> Self {
        let (notifier, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            store,
            window: WindowConfig::default(),
            bounds: Bounds::default(),
            notifier,
        }
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current window parameters
    #[inline]
    #[must_use]
    pub fn window(&self) -> WindowConfig {
        self.window
    }

    /// Materialized store range
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of materialized items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether the view is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Item at window-local `index`, `None` outside the view
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&S::Item> {
        self.bounds.translate(index).and_then(|i| self.store.get(i))
    }

    /// First materialized item
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&S::Item> {
        self.get(0)
    }

    /// Last materialized item
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&S::Item> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate over the view
    pub fn iter(&self) -> impl Iterator<Item = &S::Item> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Copy the view out
    #[must_use]
    pub fn to_vec(&self) -> Vec<S::Item>
    where
        S::Item: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Subscribe to change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ArrayChange> {
        self.notifier.subscribe()
    }

    /// Move both ends of the range of interest
    ///
    /// # Errors
    /// - `WindowError::InvalidWindow` if `start_index > end_index`
    pub fn set_window(&mut self, start_index: usize, end_index: usize) -> Result<(), WindowError> {
        self.apply_window(WindowConfig {
            start_index,
            end_index,
            ..self.window
        })
    }

    /// Move the start of the range of interest
    ///
    /// # Errors
    /// - `WindowError::InvalidWindow` if it would pass the end index
    pub fn set_start_index(&mut self, start_index: usize) -> Result<(), WindowError> {
        self.apply_window(WindowConfig {
            start_index,
            ..self.window
        })
    }

    /// Move the end of the range of interest
    ///
    /// # Errors
    /// - `WindowError::InvalidWindow` if it would fall before the start index
    pub fn set_end_index(&mut self, end_index: usize) -> Result<(), WindowError> {
        self.apply_window(WindowConfig {
            end_index,
            ..self.window
        })
    }

    /// Change the symmetric margin
    pub fn set_index_margin(&mut self, index_margin: usize) {
        // A margin never invalidates a valid window
        let _ = self.apply_window(WindowConfig {
            index_margin,
            ..self.window
        });
    }

    /// Splice at window-local `index`
    ///
    /// Returns the removed items.
    ///
    /// # Errors
    /// - `WindowError::OutOfWindow` if `index` is past the end of the view
    pub fn replace(
        &mut self,
        index: usize,
        remove: usize,
        items: Vec<S::Item>,
    ) -> Result<Vec<S::Item>, WindowError> {
        let len = self.len();
        let out_of_window = WindowError::OutOfWindow { index, len };
        if index > len {
            return Err(out_of_window);
        }
        let source_index = self.bounds.start.checked_add(index).ok_or(out_of_window)?;
        if source_index > self.store.len() {
            return Err(out_of_window);
        }
        Ok(self.splice_source(source_index, remove, items))
    }

    /// Splice at a raw store index
    ///
    /// Observers only hear about the part of the mutation that lands inside
    /// the view.
    pub fn splice_source(&mut self, source_index: usize, remove: usize, items: Vec<S::Item>) -> Vec<S::Item> {
        let before = self.bounds;
        let source_index = source_index.min(self.store.len());
        let added = items.len();

        let removed = self.store.splice(source_index, remove, items);
        self.bounds = self.window.bounds(self.store.len());

        match clamp_source_change(before, self.bounds.end, source_index, removed.len(), added) {
            Some(change) => self.emit(change),
            None => tracing::trace!(
                "Suppressed out-of-window mutation at {} (window {:?})",
                source_index,
                before
            ),
        }

        removed
    }

    /// Rewrite store and window together, publishing one full reset
    ///
    /// A window left inverted by `f` is repaired by pulling its end up to
    /// its start.
    pub fn rebuild<R>(&mut self, f: impl FnOnce(&mut S, &mut WindowConfig) -> R) -> R {
        let old_len = self.len();

        let result = f(&mut self.store, &mut self.window);
        if self.window.validate().is_err() {
            self.window.end_index = self.window.start_index;
        }
        self.bounds = self.window.bounds(self.store.len());

        let change = ArrayChange::reset(old_len, self.len());
        if !change.is_noop() {
            self.emit(change);
        }

        result
    }

    fn apply_window(&mut self, window: WindowConfig) -> Result<(), WindowError> {
        window.validate()?;
        if window == self.window {
            return Ok(());
        }

        let next = window.bounds(self.store.len());
        let changes = self.bounds.diff(&next);
        self.window = window;
        self.bounds = next;

        for change in changes {
            self.emit(change);
        }
        Ok(())
    }

    fn emit(&self, change: ArrayChange) {
        // No subscribers is fine
        let _ = self.notifier.send(change);
    }
}

impl<S: BackingStore + Default> Default for ArraySlice<S> {
    fn default() -> Self {
        Self::from_store(S::default())
    }
}
