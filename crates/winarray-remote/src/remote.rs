//! Remote array
//!
//! A windowed view whose backing store grows on demand from a
//! [`ChunkSource`]. Moving the window close to either end of the store
//! fetches another chunk on that side; `reload` refetches the whole window.
//!
//! # Concurrency
//!
//! State lives behind a mutex that is never held across an `.await`. Fetches
//! triggered by window changes run as Tokio tasks on the runtime the array
//! was created on. At most one fetch per edge is in flight: a second request
//! for a busy edge is dropped, not queued. Each reload bumps a generation
//! counter and results of fetches started under an older generation are
//! discarded.

use crate::error::RemoteArrayError;
use crate::merge;
use crate::source::{ChunkSource, FetchError, Keyed};
use crate::status::{ArrayStatus, Edge, FetchFlags};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use winarray_slice::{ArrayChange, ArraySlice, Bounds, WindowConfig};

/// Options for [`RemoteArray::reload_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOptions<K> {
    /// Load from the head of the remote collection
    pub head: bool,
    /// Lower bound on the number of items requested
    pub min_size: usize,
    /// Load starting at this key instead of the first item in view
    pub anchor: Option<K>,
}

impl<K> ReloadOptions<K> {
    /// Reload from the head of the remote collection
    #[inline]
    #[must_use]
    pub fn head() -> Self {
        Self {
            head: true,
            ..Self::default()
        }
    }

    /// Reload starting at `anchor`
    #[inline]
    #[must_use]
    pub fn anchored_at(anchor: K) -> Self {
        Self {
            anchor: Some(anchor),
            ..Self::default()
        }
    }

    /// With minimum request size
    #[inline]
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }
}

impl<K> Default for ReloadOptions<K> {
    fn default() -> Self {
        Self {
            head: false,
            min_size: 0,
            anchor: None,
        }
    }
}

/// Self-extending window over a paginated remote collection
///
/// Cloning yields another handle to the same array.
pub struct RemoteArray<T: Keyed> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Keyed> {
    source: Arc<dyn ChunkSource<T>>,
    runtime: Handle,
    state: Mutex<State<T>>,
    /// Flips to `true` once the first reload has settled
    initial_load: watch::Sender<bool>,
}

struct State<T> {
    slice: ArraySlice<Vec<T>>,
    flags: FetchFlags,
    error: Option<FetchError>,
    disposed: bool,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

/// Everything the prefetch trigger depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TriggerInputs {
    bounds: Bounds,
    store_len: usize,
    start_reached: bool,
    end_reached: bool,
}

impl<T> State<T> {
    fn trigger_inputs(&self) -> TriggerInputs {
        TriggerInputs {
            bounds: self.slice.bounds(),
            store_len: self.slice.store().len(),
            start_reached: self.flags.start_reached,
            end_reached: self.flags.end_reached,
        }
    }
}

struct EdgeRequest<K> {
    edge: Edge,
    anchor: K,
    size: usize,
    generation: u64,
}

enum EdgeStart<K> {
    Fetch(EdgeRequest<K>),
    Reload,
    Skip(&'static str),
}

struct ReloadRequest<K> {
    anchor: Option<K>,
    size: usize,
    generation: u64,
    /// Store index of the anchor before the reload
    rebase: usize,
    /// Whether the result starts at the head of the remote collection
    at_head: bool,
}

impl<T: Keyed> Clone for RemoteArray<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Keyed> fmt::Debug for RemoteArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("RemoteArray")
            .field("window", &state.slice.window())
            .field("bounds", &state.slice.bounds())
            .field("store_len", &state.slice.store().len())
            .field("flags", &state.flags)
            .field("disposed", &state.disposed)
            .finish_non_exhaustive()
    }
}

impl<T: Keyed> RemoteArray<T> {
    /// Create array over `source` and start the initial load
    ///
    /// Must be called from within a Tokio runtime; fetch tasks are spawned on
    /// it. Await [`initial_load`](Self::initial_load) to wait for the first
    /// chunk.
    ///
    /// # Errors
    /// - `RemoteArrayError::NoRuntime` outside of a Tokio runtime
    /// - `RemoteArrayError::Window` if the window start lies past its end
    pub fn new<S>(source: S, window: WindowConfig) -> Result<Self, RemoteArrayError>
    where
        S: ChunkSource<T> + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| RemoteArrayError::NoRuntime)?;
        let slice = ArraySlice::new(Vec::new(), window)?;
        let (initial_load, _) = watch::channel(false);

        let array = Self {
            inner: Arc::new(Inner {
                source: Arc::new(source),
                runtime,
                state: Mutex::new(State {
                    slice,
                    flags: FetchFlags::default(),
                    error: None,
                    disposed: false,
                    generation: 0,
                    tasks: Vec::new(),
                }),
                initial_load,
            }),
        };

        let this = array.clone();
        let task = array.inner.runtime.spawn(async move { this.reload().await });
        array.state().tasks.push(task);

        Ok(array)
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.inner.state.lock()
    }

    /// Resolves once the initial load has settled, successfully or not
    pub async fn initial_load(&self) {
        let mut loaded = self.inner.initial_load.subscribe();
        // The sender lives as long as the array, so this cannot fail
        let _ = loaded.wait_for(|done| *done).await;
    }

    /// Resolves once no spawned fetch is left, including fetches spawned by
    /// completing ones
    pub async fn settled(&self) {
        loop {
            let tasks = std::mem::take(&mut self.state().tasks);
            if tasks.is_empty() {
                break;
            }
            for result in futures::future::join_all(tasks).await {
                if let Err(e) = result {
                    tracing::warn!("Fetch task ended abnormally: {}", e);
                }
            }
        }
    }

    /// Stop all further fetching and mutation
    ///
    /// In-flight fetches are left to finish; their results are dropped.
    pub fn dispose(&self) {
        self.state().disposed = true;
        self.inner.initial_load.send_replace(true);
        tracing::debug!("Remote array disposed");
    }

    /// Whether [`dispose`](Self::dispose) was called
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    // ---------------------------------------------------------------------
    // Read surface
    // ---------------------------------------------------------------------

    /// Number of materialized items
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().slice.len()
    }

    /// Whether nothing is materialized
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().slice.is_empty()
    }

    /// Item at window-local `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.state().slice.get(index).cloned()
    }

    /// First materialized item
    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.state().slice.first().cloned()
    }

    /// Last materialized item
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.state().slice.last().cloned()
    }

    /// Copy of the materialized view
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.state().slice.to_vec()
    }

    /// Copy of the whole backing store
    #[must_use]
    pub fn store_snapshot(&self) -> Vec<T> {
        self.state().slice.store().clone()
    }

    /// Number of fetched items, in view or not
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.state().slice.store().len()
    }

    /// Current window parameters
    #[must_use]
    pub fn window(&self) -> WindowConfig {
        self.state().slice.window()
    }

    /// Materialized store range
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.state().slice.bounds()
    }

    /// Items requested per edge fetch
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.state().slice.window().span()
    }

    /// Distance from a store edge at which the next chunk is requested
    #[must_use]
    pub fn load_more_threshold(&self) -> usize {
        self.chunk_size() / 2
    }

    /// Subscribe to change notifications in window-local coordinates
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ArrayChange> {
        self.state().slice.subscribe()
    }

    /// Last fetch failure, cleared by the next successful fetch
    #[must_use]
    pub fn error(&self) -> Option<FetchError> {
        self.state().error.clone()
    }

    /// Edge, lock and error state
    #[must_use]
    pub fn status(&self) -> ArrayStatus {
        let state = self.state();
        ArrayStatus::new(state.flags, state.error.clone())
    }

    /// Any fetch in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    /// Reload in flight
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.state().flags.reloading
    }

    // ---------------------------------------------------------------------
    // Window and in-window edits
    // ---------------------------------------------------------------------

    /// Move both ends of the range of interest
    ///
    /// # Errors
    /// - `RemoteArrayError::Window` if `start_index > end_index`
    pub fn set_window(&self, start_index: usize, end_index: usize) -> Result<(), RemoteArrayError> {
        let mut state = self.state();
        state.slice.set_window(start_index, end_index)?;
        self.schedule_edge_fetches(&mut state);
        Ok(())
    }

    /// Move the start of the range of interest
    ///
    /// # Errors
    /// - `RemoteArrayError::Window` if it would pass the end index
    pub fn set_start_index(&self, start_index: usize) -> Result<(), RemoteArrayError> {
        let mut state = self.state();
        state.slice.set_start_index(start_index)?;
        self.schedule_edge_fetches(&mut state);
        Ok(())
    }

    /// Move the end of the range of interest
    ///
    /// # Errors
    /// - `RemoteArrayError::Window` if it would fall before the start index
    pub fn set_end_index(&self, end_index: usize) -> Result<(), RemoteArrayError> {
        let mut state = self.state();
        state.slice.set_end_index(end_index)?;
        self.schedule_edge_fetches(&mut state);
        Ok(())
    }

    /// Change the symmetric prefetch margin
    pub fn set_index_margin(&self, index_margin: usize) {
        let mut state = self.state();
        state.slice.set_index_margin(index_margin);
        self.schedule_edge_fetches(&mut state);
    }

    /// Splice at window-local `index`, returning the removed items
    ///
    /// The caller keeps the store sorted by key.
    ///
    /// # Errors
    /// - `RemoteArrayError::Window` if `index` is past the end of the view
    pub fn replace(&self, index: usize, remove: usize, items: Vec<T>) -> Result<Vec<T>, RemoteArrayError> {
        let mut state = self.state();
        let before = state.trigger_inputs();
        let removed = state.slice.replace(index, remove, items)?;
        if state.trigger_inputs() != before {
            self.schedule_edge_fetches(&mut state);
        }
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Fetching
    // ---------------------------------------------------------------------

    /// Extend the store after its last item
    ///
    /// No-op while a previous call is in flight, while reloading, or once the
    /// end of the remote collection was reached. An empty store is reloaded
    /// instead. Failures are recorded in [`error`](Self::error).
    pub async fn fetch_next(&self) {
        self.fetch_edge(Edge::Next).await;
    }

    /// Extend the store before its first item
    ///
    /// Mirror image of [`fetch_next`](Self::fetch_next). The window is shifted
    /// by the number of prepended items so it keeps showing the same items.
    pub async fn fetch_prev(&self) {
        self.fetch_edge(Edge::Prev).await;
    }

    /// Replace the store with a fresh load of the current window
    pub async fn reload(&self) {
        self.reload_with(ReloadOptions::default()).await;
    }

    /// Replace the store with a fresh load
    ///
    /// By default requests `max(min_size, max(end, end_index + margin))` items starting
    /// at the first stored item, so the window keeps its indices and is
    /// refilled in one call. With `head` the load starts at the collection
    /// head. With an explicit `anchor`, `max(end, end_index) - min(start,
    /// start_index)` items are requested from the anchor and the window is
    /// re-based so the anchor becomes the first item in view.
    pub async fn reload_with(&self, options: ReloadOptions<T::Key>) {
        let request = {
            let mut state = self.state();
            if state.disposed {
                None
            } else {
                Some(Self::begin_reload(&mut state, options))
            }
        };
        let Some(request) = request else {
            self.inner.initial_load.send_replace(true);
            return;
        };

        tracing::debug!("Reloading {} items from {:?}", request.size, request.anchor);
        let result = self.inner.source.fetch(request.anchor.clone(), request.size, 0).await;

        {
            let mut state = self.state();
            if state.disposed {
                tracing::trace!("Dropping reload result of disposed array");
            } else if state.generation != request.generation {
                tracing::trace!("Dropping superseded reload result");
            } else {
                state.flags.reloading = false;
                match result {
                    Ok(mut items) => {
                        merge::normalize(&mut items);
                        tracing::debug!("Reload returned {} items", items.len());

                        let rebase = request.rebase;
                        state.slice.rebuild(move |store, window| {
                            *store = items;
                            window.start_index = window.start_index.saturating_sub(rebase);
                            window.end_index = window.end_index.saturating_sub(rebase);
                        });
                        state.flags.start_reached = request.at_head;
                        state.flags.end_reached = false;
                        state.error = None;
                    }
                    Err(error) => {
                        tracing::warn!("Reload failed: {}", error);
                        state.error = Some(error);
                    }
                }
                self.schedule_edge_fetches(&mut state);
            }
        }

        self.inner.initial_load.send_replace(true);
    }

    fn begin_reload(state: &mut State<T>, options: ReloadOptions<T::Key>) -> ReloadRequest<T::Key> {
        let window = state.slice.window();
        let bounds = state.slice.bounds();
        let store_head = state.slice.store().first().map(T::key);

        let (anchor, size, rebase, at_head) = if let Some(anchor) = options.anchor {
            let covered = bounds
                .end
                .max(window.end_index)
                .saturating_sub(bounds.start.min(window.start_index));
            (Some(anchor), covered, bounds.start, false)
        } else {
            // Refill the store from its head far enough to cover the window
            let covered = bounds.end.max(window.end_index.saturating_add(window.index_margin));
            match store_head {
                Some(head) if !options.head => (Some(head), covered, 0, state.flags.start_reached),
                _ => (None, covered, 0, true),
            }
        };
        let size = options.min_size.max(size);

        state.generation += 1;
        state.flags.reloading = true;

        ReloadRequest {
            anchor,
            size,
            generation: state.generation,
            rebase,
            at_head,
        }
    }

    async fn fetch_edge(&self, edge: Edge) {
        let start = {
            let mut state = self.state();
            Self::begin_edge(&mut state, edge)
        };

        match start {
            EdgeStart::Fetch(request) => self.run_edge(request).await,
            EdgeStart::Reload => self.reload().await,
            EdgeStart::Skip(reason) => tracing::trace!("Skipping {} fetch: {}", edge, reason),
        }
    }

    /// Take the edge lock and describe the fetch, if one should happen
    fn begin_edge(state: &mut State<T>, edge: Edge) -> EdgeStart<T::Key> {
        if state.disposed {
            return EdgeStart::Skip("disposed");
        }
        if state.flags.reloading {
            return EdgeStart::Skip("reload in flight");
        }
        if edge.locked(&state.flags) {
            return EdgeStart::Skip("fetch in flight");
        }
        if edge.reached(&state.flags) {
            return EdgeStart::Skip("edge reached");
        }

        let store = state.slice.store();
        let anchor = match edge {
            Edge::Prev => store.first(),
            Edge::Next => store.last(),
        };
        let Some(anchor) = anchor.map(T::key) else {
            return EdgeStart::Reload;
        };

        let size = state.slice.window().span();
        if size == 0 {
            return EdgeStart::Skip("empty window");
        }

        edge.set_locked(&mut state.flags, true);
        EdgeStart::Fetch(EdgeRequest {
            edge,
            anchor,
            size,
            generation: state.generation,
        })
    }

    async fn run_edge(&self, request: EdgeRequest<T::Key>) {
        let EdgeRequest {
            edge,
            anchor,
            size,
            generation,
        } = request;
        let offset = match edge {
            Edge::Prev => isize::try_from(size).map_or(isize::MIN, |size| -size),
            Edge::Next => 0,
        };

        tracing::debug!("Fetching {} chunk: {} items from {:?} (offset {})", edge, size, anchor, offset);
        let result = self.inner.source.fetch(Some(anchor), size, offset).await;

        let mut state = self.state();
        edge.set_locked(&mut state.flags, false);

        if state.disposed {
            tracing::trace!("Dropping {} chunk of disposed array", edge);
            return;
        }
        if state.generation != generation {
            tracing::trace!("Dropping {} chunk fetched before a reload", edge);
            // The lock may have blocked a fetch the reload wanted
            self.schedule_edge_fetches(&mut state);
            return;
        }

        let before = state.trigger_inputs();
        match result {
            Ok(items) => {
                let short = items.len() < size;
                let fetched = items.len();

                let shifted = state.slice.rebuild(move |store, window| {
                    let shift = merge::merge_chunk(store, items);
                    window.start_index += shift;
                    window.end_index += shift;
                    shift
                });
                tracing::debug!(
                    "Merged {} chunk: {} fetched, window shifted by {}, store now {}",
                    edge,
                    fetched,
                    shifted,
                    state.slice.store().len()
                );

                if short {
                    edge.mark_reached(&mut state.flags);
                }
                state.error = None;
            }
            Err(error) => {
                tracing::warn!("Fetching {} chunk failed: {}", edge, error);
                state.error = Some(error);
            }
        }

        if state.trigger_inputs() != before {
            self.schedule_edge_fetches(&mut state);
        }
    }

    /// Prefetch trigger: start an edge fetch once the view comes within half
    /// a chunk of that edge of the store
    fn schedule_edge_fetches(&self, state: &mut State<T>) {
        state.tasks.retain(|task| !task.is_finished());

        if state.disposed || state.flags.reloading {
            return;
        }

        let chunk = state.slice.window().span();
        let store_len = state.slice.store().len();
        if chunk == 0 || store_len == 0 {
            return;
        }

        let threshold = chunk / 2;
        let bounds = state.slice.bounds();

        if !state.flags.start_reached && bounds.start < threshold {
            self.spawn_edge(state, Edge::Prev);
        }
        if !state.flags.end_reached && bounds.end + threshold >= store_len {
            self.spawn_edge(state, Edge::Next);
        }
    }

    fn spawn_edge(&self, state: &mut State<T>, edge: Edge) {
        match Self::begin_edge(state, edge) {
            EdgeStart::Fetch(request) => {
                let this = self.clone();
                let task = self.inner.runtime.spawn(async move { this.run_edge(request).await });
                state.tasks.push(task);
            }
            EdgeStart::Reload => {}
            EdgeStart::Skip(reason) => tracing::trace!("Not prefetching {} chunk: {}", edge, reason),
        }
    }
}
