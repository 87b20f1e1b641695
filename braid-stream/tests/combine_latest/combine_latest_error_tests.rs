// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{BraidError, StreamItem};
use braid_stream::{combine_latest_many, CombineLatestExt};
use braid_test_utils::{
    assert_stream_ended, test_channel, test_channel_with_errors, unwrap_stream, unwrap_value,
    ErrorInjectingStream,
};
use futures::{stream, Stream, StreamExt};
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn failing_after(delay_ms: u64, message: &'static str) -> impl Stream<Item = StreamItem<u32>> {
    stream::once(async move {
        sleep(Duration::from_millis(delay_ms)).await;
        StreamItem::Error(BraidError::stream_error(message))
    })
}

#[tokio::test]
async fn combine_latest_propagates_upstream_error() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel_with_errors::<u32>();
    let (tx_b, b) = test_channel_with_errors::<u32>();
    let mut combined = a.combine_latest(vec![b]);

    tx_a.send(StreamItem::Value(1))?;
    tx_b.send(StreamItem::Value(2))?;
    let state = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    assert_eq!(state.values(), &[1, 2]);

    // Act
    tx_b.send(StreamItem::Error(BraidError::stream_error("upstream b failed")))?;

    // Assert
    match unwrap_stream(&mut combined, 500).await {
        StreamItem::Error(error) => {
            assert_eq!(error.to_string(), "Stream processing error: upstream b failed");
        }
        StreamItem::Value(state) => panic!("Expected an error, got {:?}", state.values()),
    }
    assert_stream_ended(&mut combined, 500).await;
    Ok(())
}

#[tokio::test]
async fn combine_latest_reports_only_the_first_error() {
    // Arrange
    let failing = |message: &'static str| {
        stream::iter(vec![StreamItem::<u32>::Error(BraidError::stream_error(message))])
    };
    let mut combined = combine_latest_many(vec![failing("a"), failing("b"), failing("c")]);

    // Act
    let items: Vec<_> = (&mut combined).collect().await;

    // Assert
    assert_eq!(items.len(), 1);
    assert!(items[0].is_error());
    assert!(combined.is_finished());
}

#[tokio::test]
async fn combine_latest_error_before_first_snapshot() -> anyhow::Result<()> {
    // Arrange
    let (tx, a) = test_channel::<u32>();
    let b = ErrorInjectingStream::new(stream::pending::<u32>(), 0);
    let mut combined = a.combine_latest(vec![b]);

    // Act
    tx.send(1)?;

    // Assert
    assert!(unwrap_stream(&mut combined, 500).await.is_error());
    assert_stream_ended(&mut combined, 500).await;
    Ok(())
}

#[tokio::test]
async fn combine_latest_error_after_snapshot_terminates() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel_with_errors::<u32>();
    let (tx_b, b) = test_channel_with_errors::<u32>();
    let mut combined = a.combine_latest(vec![b]);

    tx_a.send(StreamItem::Value(1))?;
    tx_b.send(StreamItem::Value(1))?;
    let _ = unwrap_stream(&mut combined, 500).await;

    // Act
    tx_a.send(StreamItem::Error(BraidError::stream_error("late failure")))?;

    // Assert
    assert!(unwrap_stream(&mut combined, 500).await.is_error());
    assert_stream_ended(&mut combined, 500).await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn combine_latest_delivers_one_error_when_upstreams_fail_concurrently() {
    for _ in 0..100 {
        // Arrange
        let mut combined =
            combine_latest_many(vec![failing_after(1, "left"), failing_after(1, "right")]);

        // Act
        let items = timeout(Duration::from_millis(500), (&mut combined).collect::<Vec<_>>())
            .await
            .expect("combine_latest did not terminate");

        // Assert
        assert_eq!(items.len(), 1);
        assert!(items[0].is_error());
        assert_stream_ended(&mut combined, 500).await;
    }
}
