//! Remote chunk sources
//!
//! The data layer a [`RemoteArray`](crate::RemoteArray) pulls from. A source
//! answers "give me `size` items starting `offset` items away from the item
//! keyed `anchor`".

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Item with a stable identity key
///
/// The key orders the backing store, de-duplicates merged chunks and
/// anchors the next fetch.
pub trait Keyed: Clone + Send + Sync + 'static {
    /// Identity key type
    type Key: Ord + Clone + fmt::Debug + Send + Sync + 'static;

    /// Identity key of this item
    fn key(&self) -> Self::Key;
}

/// The single failure kind of this layer: the fetch did not succeed
///
/// Wraps the caller's reason verbatim. Cloning is cheap so the same failure
/// can be handed to every observer of [`RemoteArray::error`](crate::RemoteArray::error).
#[derive(Clone)]
pub struct FetchError(Arc<anyhow::Error>);

impl FetchError {
    /// Wrap any error as a fetch failure
    #[inline]
    pub fn new(reason: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(reason.into()))
    }

    /// Fetch failure from a plain message
    #[inline]
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// Underlying reason
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch failed: {}", self.0)
    }
}

impl fmt::Debug for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FetchError").field(&self.0).finish()
    }
}

impl std::error::Error for FetchError {}

impl PartialEq for FetchError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

/// Asynchronous, paginated collection
///
/// Contract relied upon by the array:
/// - results are ordered ascending by key,
/// - fewer than `size` items means there is no more data in that direction,
/// - `anchor = None` with `offset = 0` means "from the head of the collection",
/// - a negative `offset` reads items before the anchor, zero reads at and
///   after it.
#[async_trait]
pub trait ChunkSource<T: Keyed>: Send + Sync {
    /// Fetch up to `size` items relative to `anchor`
    async fn fetch(&self, anchor: Option<T::Key>, size: usize, offset: isize) -> Result<Vec<T>, FetchError>;
}

#[async_trait]
impl<T: Keyed, S: ChunkSource<T> + ?Sized> ChunkSource<T> for Arc<S> {
    async fn fetch(&self, anchor: Option<T::Key>, size: usize, offset: isize) -> Result<Vec<T>, FetchError> {
        (**self).fetch(anchor, size, offset).await
    }
}

/// [`ChunkSource`] backed by a closure
///
/// ```rust
/// use winarray_remote::{FetchError, FnSource, Keyed};
///
/// #[derive(Debug, Clone)]
/// struct Row(u64);
///
/// impl Keyed for Row {
///     type Key = u64;
///     fn key(&self) -> u64 {
///         self.0
///     }
/// }
///
/// let source: FnSource<Row, _> = FnSource::new(|anchor: Option<u64>, size: usize, offset: isize| async move {
///     let from = (anchor.unwrap_or(0) as i64 + offset as i64).max(0) as u64;
///     Ok::<_, FetchError>((from..(from + size as u64).min(100)).map(Row).collect::<Vec<_>>())
/// });
/// # let _ = source;
/// ```
pub struct FnSource<T, F> {
    f: F,
    _items: PhantomData<fn() -> T>,
}

impl<T, F> FnSource<T, F> {
    /// Wrap closure
    #[inline]
    #[must_use]
    pub fn new(f: F) -> Self {
        Self {
            f,
            _items: PhantomData,
        }
    }
}

impl<T, F> fmt::Debug for FnSource<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl<T, F, Fut> ChunkSource<T> for FnSource<T, F>
where
    T: Keyed,
    F: Fn(Option<T::Key>, usize, isize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, FetchError>> + Send,
{
    async fn fetch(&self, anchor: Option<T::Key>, size: usize, offset: isize) -> Result<Vec<T>, FetchError> {
        (self.f)(anchor, size, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u64);

    impl Keyed for Row {
        type Key = u64;

        fn key(&self) -> u64 {
            self.0
        }
    }

    #[tokio::test]
    async fn fn_source_forwards_arguments() {
        let source: FnSource<Row, _> = FnSource::new(|anchor: Option<u64>, size: usize, offset: isize| async move {
            assert_eq!(anchor, Some(7));
            assert_eq!(offset, -3);
            Ok::<_, FetchError>((0..size as u64).map(Row).collect())
        });

        let rows = source.fetch(Some(7), 2, -3).await.unwrap();
        assert_eq!(rows, vec![Row(0), Row(1)]);
    }

    #[tokio::test]
    async fn arc_source_delegates() {
        let source: Arc<dyn ChunkSource<Row>> = Arc::new(FnSource::<Row, _>::new(
            |_: Option<u64>, _: usize, _: isize| async { Err::<Vec<Row>, _>(FetchError::msg("backend down")) },
        ));

        let err = source.fetch(None, 1, 0).await.unwrap_err();
        assert_eq!(err.to_string(), "fetch failed: backend down");
    }

    #[test]
    fn fetch_error_keeps_reason() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let err = FetchError::new(io);
        assert!(err.reason().downcast_ref::<std::io::Error>().is_some());
        assert_eq!(err.clone(), err);
    }
}
