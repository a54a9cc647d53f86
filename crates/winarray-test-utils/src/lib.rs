//! Testing utilities for winarray workspace
//!
//! Shared fixtures: a virtual remote collection and a replica that replays
//! change notifications.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use winarray_remote::{ChunkSource, FetchError, Keyed};
use winarray_slice::ArrayChange;

/// Item of the virtual collection, keyed by its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: u64,
    pub label: String,
}

impl Record {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            label: format!("record-{index}"),
        }
    }
}

impl Keyed for Record {
    type Key = u64;

    fn key(&self) -> u64 {
        self.index
    }
}

pub fn records(range: Range<u64>) -> Vec<Record> {
    range.map(Record::new).collect()
}

pub fn indices(items: &[Record]) -> Vec<u64> {
    items.iter().map(|record| record.index).collect()
}

/// Arguments of one `fetch` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCall {
    pub anchor: Option<u64>,
    pub size: usize,
    pub offset: isize,
}

#[derive(Debug)]
struct CollectionState {
    total: u64,
    latency: Duration,
    fail_next: usize,
    calls: Vec<FetchCall>,
}

/// Records `0..total` served through the fetch contract
///
/// `anchor = None` reads from the head; otherwise reading starts at
/// `anchor + offset` (clamped at zero) and a negative offset never reads
/// past the anchor itself. Clones share state.
#[derive(Debug, Clone)]
pub struct VirtualCollection {
    state: Arc<Mutex<CollectionState>>,
    gate: Arc<watch::Sender<bool>>,
}

impl VirtualCollection {
    pub fn new(total: u64) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Arc::new(Mutex::new(CollectionState {
                total,
                latency: Duration::ZERO,
                fail_next: 0,
                calls: Vec::new(),
            })),
            gate: Arc::new(gate),
        }
    }

    /// Delay every response by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = latency;
        self
    }

    /// Fail the next `count` fetches
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Grow or shrink the remote collection
    pub fn set_total(&self, total: u64) {
        self.state.lock().total = total;
    }

    pub fn total(&self) -> u64 {
        self.state.lock().total
    }

    /// Park every fetch until [`open_gate`](Self::open_gate)
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Records the collection would return right now
    pub fn slice(&self, anchor: Option<u64>, size: usize, offset: isize) -> Vec<Record> {
        let total = self.total();
        let base = anchor.unwrap_or(0);
        let from = i128::from(base) + offset as i128;
        let from = u64::try_from(from.max(0)).unwrap_or(u64::MAX);
        let mut to = from.saturating_add(size as u64).min(total);
        if offset < 0 && anchor.is_some() {
            to = to.min(base);
        }
        if from >= to {
            return Vec::new();
        }
        records(from..to)
    }
}

#[async_trait]
impl ChunkSource<Record> for VirtualCollection {
    async fn fetch(&self, anchor: Option<u64>, size: usize, offset: isize) -> Result<Vec<Record>, FetchError> {
        let (latency, fail) = {
            let mut state = self.state.lock();
            state.calls.push(FetchCall { anchor, size, offset });
            let fail = state.fail_next > 0;
            if fail {
                state.fail_next -= 1;
            }
            (state.latency, fail)
        };

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fail {
            return Err(FetchError::msg("injected failure"));
        }
        Ok(self.slice(anchor, size, offset))
    }
}

/// Replica of a view rebuilt purely from change notifications
#[derive(Debug)]
pub struct ChangeMirror<T> {
    replica: Vec<T>,
    changes: broadcast::Receiver<ArrayChange>,
    applied: usize,
}

impl<T: Clone> ChangeMirror<T> {
    /// Start mirroring; `initial` must be the view at subscription time
    pub fn new(initial: Vec<T>, changes: broadcast::Receiver<ArrayChange>) -> Self {
        Self {
            replica: initial,
            changes,
            applied: 0,
        }
    }

    /// Apply pending notifications, taking inserted values from `view`
    ///
    /// Returns the number of notifications applied.
    pub fn sync(&mut self, view: &[T]) -> usize {
        let mut count = 0;
        let mut lagged = false;
        loop {
            match self.changes.try_recv() {
                Ok(_) if lagged => {}
                Ok(change) => {
                    let end = (change.offset + change.removed).min(self.replica.len());
                    let offset = change.offset.min(end);
                    let added_end = (change.offset + change.added).min(view.len());
                    let inserted = view[change.offset.min(added_end)..added_end].to_vec();
                    self.replica.splice(offset..end, inserted);
                    count += 1;
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => lagged = true,
                Err(_) => break,
            }
        }
        // Missed notifications: the backlog can't be replayed
        if lagged {
            self.replica = view.to_vec();
        }
        self.applied += count;
        count
    }

    pub fn replica(&self) -> &[T] {
        &self.replica
    }

    pub fn applied(&self) -> usize {
        self.applied
    }
}
