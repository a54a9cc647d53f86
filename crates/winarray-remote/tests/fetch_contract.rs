//! Exact `fetch` arguments issued by a remote array

use async_trait::async_trait;
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use pretty_assertions::assert_eq;
use winarray_remote::{ChunkSource, FetchError, ReloadOptions, RemoteArray, WindowConfig};
use winarray_test_utils::{indices, records, Record};

mock! {
    pub Source {}

    #[async_trait]
    impl ChunkSource<Record> for Source {
        async fn fetch(&self, anchor: Option<u64>, size: usize, offset: isize) -> Result<Vec<Record>, FetchError>;
    }
}

#[tokio::test]
async fn initial_load_and_reload_arguments() {
    let mut source = MockSource::new();
    let mut seq = Sequence::new();

    source
        .expect_fetch()
        .with(eq(None), eq(10), eq(0))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(records(0..10)));
    source
        .expect_fetch()
        .with(eq(Some(9)), eq(10), eq(0))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(records(9..19)));
    source
        .expect_fetch()
        .with(eq(Some(0)), eq(10), eq(0))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(records(0..10)));
    source
        .expect_fetch()
        .with(eq(Some(9)), eq(10), eq(0))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(records(9..19)));

    let array = RemoteArray::new(source, WindowConfig::new(0, 10)).unwrap();
    array.initial_load().await;
    array.settled().await;

    // Head already reached: no call
    array.fetch_prev().await;

    array.reload().await;
    array.settled().await;

    assert_eq!(indices(&array.to_vec()), (0..10).collect::<Vec<_>>());
    assert_eq!(array.source_len(), 19);
}

#[tokio::test]
async fn prev_fetch_uses_negative_offset() {
    let mut source = MockSource::new();

    // Remote collection holds 100..104 only
    source
        .expect_fetch()
        .with(eq(None), eq(4), eq(0))
        .times(1)
        .returning(|_, _, _| Ok(records(100..104)));
    source
        .expect_fetch()
        .with(eq(Some(103)), eq(4), eq(0))
        .times(2)
        .returning(|_, _, _| Ok(Vec::new()));
    source
        .expect_fetch()
        .with(eq(Some(100)), eq(4), eq(0))
        .times(1)
        .returning(|_, _, _| Ok(records(100..104)));
    source
        .expect_fetch()
        .with(eq(Some(100)), eq(4), eq(-4))
        .times(1)
        .returning(|_, _, _| Ok(Vec::new()));

    let array = RemoteArray::new(source, WindowConfig::new(0, 4)).unwrap();
    array.initial_load().await;
    array.settled().await;
    assert!(array.status().start_reached);
    assert!(array.status().end_reached);

    // An anchored reload forgets both edges
    array.reload_with(ReloadOptions::anchored_at(100)).await;
    array.settled().await;

    let status = array.status();
    assert!(status.start_reached && status.end_reached);
    assert_eq!(indices(&array.to_vec()), vec![100, 101, 102, 103]);
}

#[tokio::test]
async fn failure_is_recorded_not_returned() {
    let mut source = MockSource::new();
    source
        .expect_fetch()
        .times(1)
        .returning(|_, _, _| Err(FetchError::msg("backend down")));

    let array = RemoteArray::new(source, WindowConfig::new(0, 10)).unwrap();
    array.initial_load().await;

    assert_eq!(
        array.error().map(|e| e.to_string()),
        Some("fetch failed: backend down".to_string())
    );
    assert!(array.is_empty());
}
