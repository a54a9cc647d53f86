//! Window Property Tests
//!
//! Slicing, length, translation and change clamping over random windows
//! and random store mutations.

use proptest::prelude::*;
use tokio::sync::broadcast;
use winarray_slice::{ArrayChange, ArraySlice, WindowConfig};

/// Replay notifications onto a replica, pulling inserted values from the view
fn replay(replica: &mut Vec<u32>, view: &[u32], rx: &mut broadcast::Receiver<ArrayChange>) {
    while let Ok(change) = rx.try_recv() {
        let inserted = view[change.offset..change.offset + change.added].to_vec();
        replica.splice(change.offset..change.offset + change.removed, inserted);
    }
}

fn expected_view(store: &[u32], window: WindowConfig) -> Vec<u32> {
    let start = window.start_index.saturating_sub(window.index_margin);
    let end = store.len().min(window.end_index + window.index_margin);
    if start >= end {
        Vec::new()
    } else {
        store[start..end].to_vec()
    }
}

fn window_strategy() -> impl Strategy<Value = WindowConfig> {
    (0usize..150, 0usize..60, 0usize..20).prop_map(|(start, len, margin)| {
        WindowConfig::new(start, start + len).with_margin(margin)
    })
}

#[derive(Debug, Clone)]
enum Op {
    Move(WindowConfig),
    Margin(usize),
    Replace { index: usize, remove: usize, add: usize },
    Splice { index: usize, remove: usize, add: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        window_strategy().prop_map(Op::Move),
        (0usize..20).prop_map(Op::Margin),
        (0usize..40, 0usize..5, 0usize..5).prop_map(|(index, remove, add)| Op::Replace { index, remove, add }),
        (0usize..160, 0usize..5, 0usize..5).prop_map(|(index, remove, add)| Op::Splice { index, remove, add }),
    ]
}

proptest! {
    #[test]
    fn prop_view_is_store_slice(len in 0usize..200, window in window_strategy()) {
        let store: Vec<u32> = (0..len as u32).collect();
        let slice = ArraySlice::new(store.clone(), window).unwrap();

        let expected = expected_view(&store, window);
        prop_assert_eq!(slice.to_vec(), expected.clone());
        prop_assert_eq!(slice.len(), expected.len());

        for i in 0..slice.len() {
            prop_assert_eq!(slice.get(i), store.get(slice.bounds().start + i));
        }
        prop_assert_eq!(slice.get(slice.len()), None);
    }

    #[test]
    fn prop_in_window_notifications_track_view(
        initial in window_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let mut slice = ArraySlice::new((0..120u32).collect::<Vec<_>>(), initial).unwrap();
        let mut rx = slice.subscribe();
        let mut replica = slice.to_vec();
        let mut next_value = 1_000u32;

        for op in ops {
            let mut fresh = |count: usize| {
                let items: Vec<u32> = (next_value..next_value + count as u32).collect();
                next_value += count as u32;
                items
            };

            match op {
                Op::Move(window) => slice.set_window(window.start_index, window.end_index).unwrap(),
                Op::Margin(margin) => slice.set_index_margin(margin),
                Op::Replace { index, remove, add } => {
                    let _ = slice.replace(index, remove, fresh(add));
                }
                Op::Splice { index, remove, add } => {
                    // Only mutations that begin inside the view keep the replica exact
                    let bounds = slice.bounds();
                    if index >= bounds.start && index <= bounds.end {
                        slice.splice_source(index, remove, fresh(add));
                    }
                }
            }

            let view = slice.to_vec();
            replay(&mut replica, &view, &mut rx);
            prop_assert_eq!(&replica, &view);
            prop_assert_eq!(view, expected_view(slice.store(), slice.window()));
        }
    }

    #[test]
    fn prop_notifications_stay_in_range(
        window in window_strategy(),
        index in 0usize..160,
        remove in 0usize..10,
        add in 0usize..10,
    ) {
        let mut slice = ArraySlice::new((0..120u32).collect::<Vec<_>>(), window).unwrap();
        let mut rx = slice.subscribe();
        let before = slice.len();

        slice.splice_source(index, remove, vec![0; add]);
        let after = slice.len();

        while let Ok(change) = rx.try_recv() {
            prop_assert!(change.offset + change.removed <= before);
            prop_assert!(change.offset + change.added <= after);
        }
    }
}

#[test]
fn mutation_entirely_outside_is_not_published() {
    let mut slice = ArraySlice::new((0..100u32).collect::<Vec<_>>(), WindowConfig::new(40, 60)).unwrap();
    let mut rx = slice.subscribe();

    slice.splice_source(0, 10, vec![]);
    slice.splice_source(95, 0, vec![1, 2, 3]);

    assert!(rx.try_recv().is_err());
}

#[test]
fn straddling_mutation_is_clamped() {
    let mut slice = ArraySlice::new((0..100u32).collect::<Vec<_>>(), WindowConfig::new(40, 60)).unwrap();
    let mut rx = slice.subscribe();

    slice.splice_source(55, 10, vec![7; 10]);

    assert_eq!(rx.try_recv().unwrap(), ArrayChange::new(15, 5, 5));
    assert!(rx.try_recv().is_err());
}
