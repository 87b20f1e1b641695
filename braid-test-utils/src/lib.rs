// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the braid stream engines.
//!
//! Meant for tests and benchmarks only.
//!
//! # Architecture
//!
//! Engines consume streams, while tests need to push values imperatively.
//! [`test_channel`] bridges the two: the sender stays with the test, the
//! stream side goes into the engine.
//!
//! # Key Types
//!
//! - [`CountingStream`] counts how often an upstream is polled for an element,
//!   to observe backpressure and cancellation from the outside.
//! - [`ErrorInjectingStream`] turns a plain stream into a `StreamItem` stream
//!   that fails at a chosen position.
//! - [`fixtures`] provides small domain values (`Person`, `Animal`).
//!
//! ## Using Assertion Helpers
//!
//! ```rust
//! use braid_test_utils::assert_no_element_emitted;
//! use futures::stream;
//!
//! # async fn example() {
//! let mut pending = stream::pending::<i32>();
//! assert_no_element_emitted(&mut pending, 10).await;
//! # }
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod counting;
pub mod error_injection;
pub mod fixtures;
pub mod helpers;

use braid_core::StreamItem;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub use counting::{CountingStream, PollCounter};
pub use error_injection::ErrorInjectingStream;
pub use helpers::{assert_no_element_emitted, assert_stream_ended, unwrap_stream, unwrap_value};

/// Creates a test channel that wraps every sent value in `StreamItem::Value`.
///
/// Dropping the sender ends the stream.
///
/// # Example
///
/// ```rust
/// use braid_test_utils::test_channel;
/// use futures::StreamExt;
///
/// # async fn example() {
/// let (tx, mut stream) = test_channel();
///
/// tx.send(42).unwrap();
///
/// let item = stream.next().await.unwrap().unwrap(); // Option -> StreamItem -> Value
/// assert_eq!(item, 42);
/// # }
/// ```
pub fn test_channel<T: Send + 'static>() -> (
    mpsc::UnboundedSender<T>,
    impl Stream<Item = StreamItem<T>> + Send,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx).map(StreamItem::Value);
    (tx, stream)
}

/// Creates a test channel that carries `StreamItem<T>`, so tests can make the
/// upstream fail.
///
/// # Example
///
/// ```rust
/// use braid_test_utils::test_channel_with_errors;
/// use braid_core::{BraidError, StreamItem};
/// use futures::StreamExt;
///
/// # async fn example() {
/// let (tx, mut stream) = test_channel_with_errors();
///
/// tx.send(StreamItem::Value(42)).unwrap();
/// tx.send(StreamItem::Error(BraidError::stream_error("test error"))).unwrap();
///
/// assert!(stream.next().await.unwrap().is_value());
/// assert!(stream.next().await.unwrap().is_error());
/// # }
/// ```
pub fn test_channel_with_errors<T: Send + 'static>() -> (
    mpsc::UnboundedSender<StreamItem<T>>,
    impl Stream<Item = StreamItem<T>> + Send,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    (tx, stream)
}
