// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::StreamItem;
use braid_stream::{combine_latest2, combine_latest_many, CombineLatest, CombineLatestExt};
use braid_test_utils::{
    assert_no_element_emitted, assert_stream_ended, test_channel, unwrap_stream, unwrap_value,
    CountingStream,
};
use futures::{stream, StreamExt};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn combine_latest_emits_latest_of_every_upstream() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel::<u32>();
    let (tx_b, b) = test_channel::<u32>();
    let mut combined = a.combine_latest(vec![b]);

    // Act
    tx_a.send(10)?;
    tx_b.send(20)?;
    let first = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    tx_b.send(30)?;
    let second = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));

    // Assert
    assert_eq!(first.values(), &[10, 20]);
    assert_eq!(second.values(), &[10, 30]);
    Ok(())
}

#[tokio::test]
async fn combine_latest_waits_for_every_upstream() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel::<u32>();
    let (tx_b, b) = test_channel::<u32>();
    let (tx_c, c) = test_channel::<u32>();
    let mut combined = combine_latest_many(vec![a, b, c]);

    // Act
    tx_a.send(1)?;
    tx_c.send(3)?;

    // Assert - no snapshot with a missing position
    assert_no_element_emitted(&mut combined, 50).await;

    tx_b.send(2)?;
    let state = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    assert_eq!(state.len(), 3);
    assert_eq!((state[0], state[1], state[2]), (1, 2, 3));
    Ok(())
}

#[tokio::test]
async fn combine_latest_orders_by_upstream_not_by_arrival() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel::<&str>();
    let (tx_b, b) = test_channel::<&str>();
    let mut combined = a.combine_latest(vec![b]);

    // Act - the second upstream produces first
    tx_b.send("b")?;
    assert_no_element_emitted(&mut combined, 20).await;
    tx_a.send("a")?;

    // Assert
    let state = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    assert_eq!(state.into_values(), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn combine_latest_pulls_one_element_per_demand() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel::<u32>();
    let (tx_b, b) = test_channel::<u32>();
    let mut combined = a.combine_latest(vec![b]);

    // Act - the first upstream races ahead of the second one
    tx_a.send(1)?;
    tx_a.send(2)?;
    assert_no_element_emitted(&mut combined, 20).await;
    tx_b.send(9)?;

    // Assert - earlier elements are not skipped
    let first = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    assert_eq!(first.values(), &[1, 9]);
    let second = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    assert_eq!(second.values(), &[2, 9]);
    Ok(())
}

#[tokio::test]
async fn combine_latest_ends_when_an_upstream_ends_empty() {
    // Arrange
    let empty = stream::empty::<StreamItem<u32>>().boxed();
    let busy = stream::iter(vec![1, 2, 3]).map(StreamItem::Value).boxed();
    let mut combined = CombineLatest::new(vec![empty, busy]);

    // Act & Assert
    assert_stream_ended(&mut combined, 500).await;
    assert_stream_ended(&mut combined, 500).await;
}

#[tokio::test]
async fn combine_latest_ends_after_every_upstream_ended() {
    // Arrange
    let a = stream::iter(vec![1]).map(StreamItem::Value);
    let b = stream::iter(vec![2]).map(StreamItem::Value);
    let mut combined = a.combine_latest(vec![b]);

    // Act
    let state = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));

    // Assert
    assert_eq!(state.values(), &[1, 2]);
    assert_stream_ended(&mut combined, 500).await;
    assert!(combined.is_finished());
}

#[tokio::test]
async fn combine_latest_keeps_going_with_remaining_upstreams() -> anyhow::Result<()> {
    // Arrange
    let finite = stream::iter(vec![1]).map(StreamItem::Value);
    let (tx, live) = test_channel::<u32>();
    let mut combined = finite.combine_latest(vec![live]);

    // Act
    tx.send(10)?;
    let first = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    tx.send(20)?;
    let second = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    drop(tx);

    // Assert
    assert_eq!(first.values(), &[1, 10]);
    assert_eq!(second.values(), &[1, 20]);
    assert_stream_ended(&mut combined, 500).await;
    Ok(())
}

#[tokio::test]
async fn combine_latest_of_nothing_ends_immediately() {
    // Arrange
    let mut combined = combine_latest_many(Vec::<stream::Empty<StreamItem<u32>>>::new());

    // Act & Assert
    assert_stream_ended(&mut combined, 500).await;
}

#[tokio::test]
async fn dropping_combine_latest_stops_pulling_upstreams() {
    // Arrange
    let (a, pulled_a) = CountingStream::new(stream::iter(0..).map(StreamItem::Value));
    let (b, pulled_b) = CountingStream::new(stream::iter(0..).map(StreamItem::Value));
    let mut combined = a.combine_latest(vec![b]);

    let state = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    assert_eq!(state.values(), &[0, 0]);

    // Act
    drop(combined);
    sleep(Duration::from_millis(20)).await;
    let after_drop = (pulled_a.get(), pulled_b.get());
    sleep(Duration::from_millis(50)).await;

    // Assert
    assert_eq!(after_drop, (1, 1));
    assert_eq!((pulled_a.get(), pulled_b.get()), after_drop);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn combine_latest_over_broadcast_sides() -> anyhow::Result<()> {
    use braid_stream::BroadcastExt;

    // Arrange
    let (tx, rx) = test_channel::<u32>();
    let broadcast = rx.broadcast();
    let doubled = broadcast.subscribe().map(|item| item.map(|v| v * 2));
    let mut combined = broadcast.subscribe().combine_latest(vec![doubled.boxed()]);

    // Act
    tx.send(1)?;
    let state = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));

    // Assert
    assert_eq!(state.values(), &[1, 2]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn combine_latest_advances_a_busy_upstream_while_the_other_idles() {
    for _ in 0..300 {
        // Arrange
        let a = stream::iter(vec![10]).chain(stream::pending()).map(StreamItem::Value);
        let b = stream::iter(vec![20, 30]).chain(stream::pending()).map(StreamItem::Value);
        let mut combined = combine_latest2(a, b);

        // Act
        let first = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
        let second = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));

        // Assert
        assert_eq!(first, (10, 20));
        assert_eq!(second, (10, 30));
    }
}
