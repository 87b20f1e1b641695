// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::StreamItem;
use braid_stream::BroadcastExt;
use braid_test_utils::{
    assert_no_element_emitted, assert_stream_ended, test_channel, unwrap_stream, unwrap_value,
    CountingStream,
};
use futures::{stream, StreamExt};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn dropping_the_lagging_side_releases_the_others() {
    // Arrange
    let broadcast = stream::iter(0..).map(StreamItem::Value).broadcast();
    let mut fast = broadcast.subscribe();
    let slow = broadcast.subscribe();

    assert_eq!(unwrap_value(Some(unwrap_stream(&mut fast, 500).await)), 0);
    assert_no_element_emitted(&mut fast, 50).await;

    // Act
    drop(slow);

    // Assert
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut fast, 500).await)), 1);
    assert_eq!(broadcast.side_count(), 1);
}

#[tokio::test]
async fn dropping_every_side_stops_pulling_the_upstream() {
    // Arrange
    let (counted, counter) = CountingStream::new(stream::iter(0..).map(StreamItem::Value));
    let broadcast = counted.broadcast();
    let mut side = broadcast.subscribe();

    assert_eq!(unwrap_value(Some(unwrap_stream(&mut side, 500).await)), 0);
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut side, 500).await)), 1);

    // Act
    drop(side);
    sleep(Duration::from_millis(50)).await;

    // Assert
    assert_eq!(counter.get(), 2);
    assert!(broadcast.is_finished());
}

#[tokio::test]
async fn dropping_a_side_with_a_pending_request_is_clean() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = test_channel::<u32>();
    let broadcast = rx.broadcast();
    let mut parked = broadcast.subscribe();
    let mut other = broadcast.subscribe();

    assert_no_element_emitted(&mut parked, 20).await;

    // Act
    drop(parked);
    tx.send(7)?;

    // Assert
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut other, 500).await)), 7);
    Ok(())
}

#[tokio::test]
async fn side_attached_after_completion_ends_immediately() {
    // Arrange
    let broadcast = stream::iter(vec![1]).map(StreamItem::Value).broadcast();
    let mut first = broadcast.subscribe();
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut first, 500).await)), 1);
    assert_stream_ended(&mut first, 500).await;

    // Act
    let mut late = broadcast.subscribe();

    // Assert
    assert_stream_ended(&mut late, 500).await;
}

#[tokio::test]
async fn subscribing_after_every_side_left_yields_a_terminal_side() {
    // Arrange
    let (_tx, rx) = test_channel::<u32>();
    let broadcast = rx.broadcast();
    let mut first = broadcast.subscribe();
    assert_no_element_emitted(&mut first, 20).await;
    drop(first);

    // Act
    let mut late = broadcast.subscribe();

    // Assert
    assert!(broadcast.is_finished());
    assert_stream_ended(&mut late, 500).await;
}

#[tokio::test]
async fn unused_broadcast_can_be_dropped_with_live_sides() {
    // Arrange
    let broadcast = stream::iter(vec![1, 2]).map(StreamItem::Value).broadcast();
    let mut side = broadcast.subscribe();

    // Act
    drop(broadcast);

    // Assert
    let values: Vec<_> = (&mut side).map(StreamItem::unwrap).collect().await;
    assert_eq!(values, vec![1, 2]);
}
