// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_core::{BraidError, StreamItem};
use braid_stream::{combine_latest2, combine_latest3, CombineLatestExt};
use braid_test_utils::fixtures::{animal_bird, animal_dog, person_alice, Animal, Person};
use braid_test_utils::{
    assert_no_element_emitted, assert_stream_ended, test_channel, test_channel_with_errors,
    unwrap_stream, unwrap_value,
};
use futures::{stream, StreamExt};

#[tokio::test]
async fn combine_latest2_yields_typed_pairs() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel::<u32>();
    let (tx_b, b) = test_channel::<u32>();
    let mut combined = combine_latest2(a, b);

    // Act
    tx_a.send(10)?;
    tx_b.send(20)?;
    let first = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    tx_b.send(30)?;
    let second = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));

    // Assert
    assert_eq!(first, (10, 20));
    assert_eq!(second, (10, 30));
    Ok(())
}

#[tokio::test]
async fn combine_latest2_ends_when_first_upstream_is_empty() {
    // Arrange
    let a = stream::empty::<StreamItem<Person>>();
    let b = stream::iter(vec![1, 2, 3]).map(StreamItem::Value);
    let mut combined = combine_latest2(a, b);

    // Act & Assert
    assert_stream_ended(&mut combined, 500).await;
}

#[tokio::test]
async fn combine_latest3_mixes_element_types() -> anyhow::Result<()> {
    // Arrange
    let (tx_person, people) = test_channel::<Person>();
    let (tx_animal, animals) = test_channel::<Animal>();
    let (tx_count, counts) = test_channel::<usize>();
    let mut combined = combine_latest3(people, animals, counts);

    // Act
    tx_person.send(person_alice())?;
    tx_animal.send(animal_dog())?;
    assert_no_element_emitted(&mut combined, 20).await;
    tx_count.send(1)?;
    let first = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    tx_animal.send(animal_bird())?;
    let second = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));

    // Assert
    assert_eq!(first, (person_alice(), animal_dog(), 1));
    assert_eq!(second, (person_alice(), animal_bird(), 1));
    Ok(())
}

#[tokio::test]
async fn combine_latest_with_pairs_two_element_types() -> anyhow::Result<()> {
    // Arrange
    let (tx_a, a) = test_channel::<Person>();
    let (tx_b, b) = test_channel_with_errors::<Animal>();
    let mut combined = a.combine_latest_with(b);

    // Act
    tx_a.send(person_alice())?;
    tx_b.send(StreamItem::Value(animal_dog()))?;
    let pair = unwrap_value(Some(unwrap_stream(&mut combined, 500).await));
    tx_b.send(StreamItem::Error(BraidError::stream_error("no more animals")))?;

    // Assert
    assert_eq!(pair, (person_alice(), animal_dog()));
    assert!(unwrap_stream(&mut combined, 500).await.is_error());
    assert_stream_ended(&mut combined, 500).await;
    Ok(())
}
