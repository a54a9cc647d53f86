//! Merging fetched chunks into the backing store
//!
//! The store stays sorted by key and holds every key at most once.

use crate::source::Keyed;

/// Sort by key and drop repeated keys, keeping the first occurrence
pub(crate) fn normalize<T: Keyed>(items: &mut Vec<T>) {
    items.sort_by_key(T::key);
    items.dedup_by(|a, b| a.key() == b.key());
}

/// Merge `fetched` into the sorted, unique `store`
///
/// Items whose key is already stored are dropped. Returns how many new items
/// ended up before the previous head of the store.
pub(crate) fn merge_chunk<T: Keyed>(store: &mut Vec<T>, mut fetched: Vec<T>) -> usize {
    normalize(&mut fetched);
    fetched.retain(|item| store.binary_search_by_key(&item.key(), T::key).is_err());

    let head = store.first().map(T::key);
    let before_head = match head {
        Some(head) => fetched.iter().take_while(|item| item.key() < head).count(),
        None => 0,
    };

    store.append(&mut fetched);
    store.sort_by_key(T::key);
    before_head
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u32);

    impl Keyed for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }
    }

    fn rows(keys: impl IntoIterator<Item = u32>) -> Vec<Row> {
        keys.into_iter().map(Row).collect()
    }

    #[test]
    fn merge_appends_and_drops_duplicates() {
        let mut store = rows(0..10);
        let before = merge_chunk(&mut store, rows(9..15));
        assert_eq!(before, 0);
        assert_eq!(store, rows(0..15));
    }

    #[test]
    fn merge_prepends_and_counts_head_shift() {
        let mut store = rows(10..20);
        let before = merge_chunk(&mut store, rows([5, 7, 6, 10, 11]));
        assert_eq!(before, 3);
        assert_eq!(store, rows([5, 6, 7].into_iter().chain(10..20)));
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let mut items = rows([3, 1, 3, 2, 1]);
        normalize(&mut items);
        assert_eq!(items, rows([1, 2, 3]));
    }

    proptest! {
        #[test]
        fn prop_merge_keeps_store_sorted_and_unique(
            initial in prop::collection::btree_set(0u32..200, 0..50),
            fetched in prop::collection::vec(0u32..200, 0..50),
        ) {
            let mut store = rows(initial.iter().copied());
            merge_chunk(&mut store, rows(fetched.iter().copied()));

            prop_assert!(store.windows(2).all(|w| w[0].0 < w[1].0));

            let mut expected: Vec<u32> = initial.iter().copied().chain(fetched).collect();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(store, rows(expected));
        }
    }
}
