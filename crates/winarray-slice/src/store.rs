//! Backing stores
//!
//! The ordered, mutable sequence a window is laid over. The window never
//! copies items out of the store; it only translates indices into it.

use std::collections::VecDeque;

/// Ordered, growable/shrinkable container underneath an [`ArraySlice`](crate::ArraySlice)
pub trait BackingStore {
    /// Element type
    type Item;

    /// Number of stored items
    fn len(&self) -> usize;

    /// Whether the store holds no items
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at a raw store index
    fn get(&self, index: usize) -> Option<&Self::Item>;

    /// Remove `remove` items at `index` and insert `items` in their place
    ///
    /// `index` is clamped to `len()` and `remove` to what is available
    /// after it. Returns the removed items in order.
    fn splice(&mut self, index: usize, remove: usize, items: Vec<Self::Item>) -> Vec<Self::Item>;
}

impl<T> BackingStore for Vec<T> {
    type Item = T;

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn splice(&mut self, index: usize, remove: usize, items: Vec<T>) -> Vec<T> {
        let index = index.min(Vec::len(self));
        let end = index + remove.min(Vec::len(self) - index);
        Vec::splice(self, index..end, items).collect()
    }
}

impl<T> BackingStore for VecDeque<T> {
    type Item = T;

    #[inline]
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        VecDeque::get(self, index)
    }

    fn splice(&mut self, index: usize, remove: usize, items: Vec<T>) -> Vec<T> {
        let index = index.min(VecDeque::len(self));
        let end = index + remove.min(VecDeque::len(self) - index);
        let removed: Vec<T> = self.drain(index..end).collect();

        // Prepends are the common case for deques; keep them O(k)
        if index == 0 {
            for item in items.into_iter().rev() {
                self.push_front(item);
            }
        } else {
            let tail = self.split_off(index);
            self.extend(items);
            self.extend(tail);
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_splice_clamps_range() {
        let mut store = vec![1, 2, 3];
        let removed = BackingStore::splice(&mut store, 2, 10, vec![9]);
        assert_eq!(removed, vec![3]);
        assert_eq!(store, vec![1, 2, 9]);

        let removed = BackingStore::splice(&mut store, 7, 1, vec![4]);
        assert!(removed.is_empty());
        assert_eq!(store, vec![1, 2, 9, 4]);
    }

    #[test]
    fn deque_splice_matches_vec() {
        let mut deque: VecDeque<u32> = (0..6).collect();
        let mut vec: Vec<u32> = (0..6).collect();

        for (index, remove, items) in [(0, 0, vec![100, 101]), (3, 2, vec![7]), (8, 1, vec![])] {
            let a = BackingStore::splice(&mut deque, index, remove, items.clone());
            let b = BackingStore::splice(&mut vec, index, remove, items);
            assert_eq!(a, b);
            assert_eq!(deque.iter().copied().collect::<Vec<_>>(), vec);
        }
    }

    #[test]
    fn get_out_of_range_is_none() {
        let store: Vec<u8> = vec![];
        assert!(BackingStore::get(&store, 0).is_none());
        assert!(BackingStore::is_empty(&store));
    }
}
