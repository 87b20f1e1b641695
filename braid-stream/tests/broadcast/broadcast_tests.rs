// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::StreamItem;
use braid_stream::BroadcastExt;
use braid_test_utils::fixtures::{person_alice, person_bob, person_charlie};
use braid_test_utils::{
    assert_no_element_emitted, assert_stream_ended, test_channel, unwrap_stream, unwrap_value,
    CountingStream,
};
use futures::{stream, StreamExt};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn broadcast_delivers_every_element_to_every_side() {
    // Arrange
    let broadcast = stream::iter(vec![1, 2, 3])
        .map(StreamItem::Value)
        .broadcast();
    let left = broadcast.subscribe();
    let right = broadcast.subscribe();

    // Act
    let (left, right) = futures::join!(
        left.map(StreamItem::unwrap).collect::<Vec<_>>(),
        right.map(StreamItem::unwrap).collect::<Vec<_>>()
    );

    // Assert
    assert_eq!(left, vec![1, 2, 3]);
    assert_eq!(right, vec![1, 2, 3]);
}

#[tokio::test]
async fn broadcast_end_of_stream_is_repeated() {
    // Arrange
    let broadcast = stream::iter(vec![1]).map(StreamItem::Value).broadcast();
    let mut side = broadcast.subscribe();

    // Act
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut side, 500).await)), 1);

    // Assert
    assert_stream_ended(&mut side, 500).await;
    assert_stream_ended(&mut side, 500).await;
    assert!(broadcast.is_finished());
}

#[tokio::test]
async fn broadcast_pulls_nothing_before_first_demand() {
    // Arrange
    let (counted, counter) = CountingStream::new(stream::iter(0..).map(StreamItem::Value));
    let broadcast = counted.broadcast();
    let _side = broadcast.subscribe();

    // Act
    sleep(Duration::from_millis(20)).await;

    // Assert
    assert_eq!(counter.get(), 0);
}

#[tokio::test]
async fn broadcast_waits_for_the_slowest_side() {
    // Arrange
    let (counted, counter) = CountingStream::new(stream::iter(0..).map(StreamItem::Value));
    let broadcast = counted.broadcast();
    let mut fast = broadcast.subscribe();
    let mut slow = broadcast.subscribe();

    // Act
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut fast, 500).await)), 0);

    // Assert - the next cycle cannot start while `slow` still holds 0
    assert_no_element_emitted(&mut fast, 50).await;
    assert_eq!(counter.get(), 1);

    assert_eq!(unwrap_value(Some(unwrap_stream(&mut slow, 500).await)), 0);
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut fast, 500).await)), 1);
    assert_eq!(unwrap_value(Some(unwrap_stream(&mut slow, 500).await)), 1);
}

#[tokio::test]
async fn broadcast_side_attached_mid_stream_sees_next_cycle() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = test_channel();
    let broadcast = rx.broadcast();
    let mut first = broadcast.subscribe();

    tx.send(person_alice())?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut first, 500).await)),
        person_alice()
    );

    // Act
    let mut late = broadcast.subscribe();
    tx.send(person_bob())?;

    // Assert
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut first, 500).await)),
        person_bob()
    );
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut late, 500).await)),
        person_bob()
    );
    Ok(())
}

#[tokio::test]
async fn broadcast_clones_share_the_engine() -> anyhow::Result<()> {
    // Arrange
    let (tx, rx) = test_channel();
    let broadcast = rx.broadcast();
    let handle = broadcast.clone();

    let mut left = broadcast.subscribe();
    let mut right = handle.subscribe();
    assert_eq!(broadcast.side_count(), 2);

    // Act
    tx.send(person_charlie())?;

    // Assert
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut left, 500).await)),
        person_charlie()
    );
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut right, 500).await)),
        person_charlie()
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn broadcast_sides_on_separate_tasks_see_identical_sequences() -> anyhow::Result<()> {
    // Arrange
    let broadcast = stream::iter(0..500u32).map(StreamItem::Value).broadcast();
    let sides: Vec<_> = (0..4).map(|_| broadcast.subscribe()).collect();

    // Act
    let handles: Vec<_> = sides
        .into_iter()
        .map(|side| tokio::spawn(side.map(StreamItem::unwrap).collect::<Vec<_>>()))
        .collect();

    // Assert
    let expected: Vec<u32> = (0..500).collect();
    for handle in handles {
        assert_eq!(handle.await?, expected);
    }
    Ok(())
}
