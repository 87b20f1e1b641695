// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Combine the latest element of several upstreams into one snapshot.
//!
//! # Behavior
//!
//! - Nothing is emitted until every upstream has produced at least once.
//! - Afterwards a snapshot is emitted whenever an upstream produces a new
//!   element. A snapshot is never re-delivered; snapshots produced faster
//!   than the consumer asks are queued.
//! - Positions in the snapshot follow upstream order, never arrival order.
//! - Each upstream is pulled only when the consumer has demand, one element
//!   at a time.
//! - An upstream that ends without ever producing ends the whole stream.
//!   Otherwise the stream ends once every upstream has ended and the queued
//!   snapshots are drained.
//! - The first upstream error is yielded once, after which the stream ends.
//!   Later errors are discarded.
//! - Dropping the stream cancels the task driving the upstreams.
//!
//! # Example
//!
//! ```rust
//! use braid_stream::CombineLatestExt;
//! use braid_test_utils::test_channel;
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (tx1, stream1) = test_channel::<i32>();
//! let (tx2, stream2) = test_channel::<i32>();
//!
//! let mut combined = stream1.combine_latest(vec![stream2]);
//!
//! tx1.send(1).unwrap();
//! tx2.send(2).unwrap();
//!
//! let state = combined.next().await.unwrap().unwrap();
//! assert_eq!(state.values(), &[1, 2]);
//! # }
//! ```

mod combine_latest_stream;
mod fixed_arity;
mod state_machine;
mod storage;

pub use combine_latest_stream::{CombineLatest, CombinedState};
pub use fixed_arity::{combine_latest2, combine_latest3, CombineLatest2, CombineLatest3};

use braid_core::StreamItem;
use futures::Stream;

/// Combine any number of upstreams sharing one element type.
///
/// Equivalent to [`CombineLatest::new`].
pub fn combine_latest_many<S, T>(upstreams: Vec<S>) -> CombineLatest<T>
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Clone + Send + 'static,
{
    CombineLatest::new(upstreams)
}

/// Extension trait providing the combine-latest operators.
pub trait CombineLatestExt<T>: Stream<Item = StreamItem<T>> + Sized
where
    T: Clone + Send + 'static,
{
    /// Combine this stream with `others`. This stream takes position `0` in
    /// every snapshot, `others[i]` position `i + 1`.
    fn combine_latest<IS>(self, others: Vec<IS>) -> CombineLatest<T>
    where
        Self: Send + 'static,
        IS: Stream<Item = StreamItem<T>> + Send + 'static;

    /// Combine this stream with one stream of another element type.
    fn combine_latest_with<S2, U>(self, other: S2) -> CombineLatest2<T, U>
    where
        Self: Send + 'static,
        S2: Stream<Item = StreamItem<U>> + Send + 'static,
        U: Clone + Send + 'static;
}

impl<S, T> CombineLatestExt<T> for S
where
    S: Stream<Item = StreamItem<T>>,
    T: Clone + Send + 'static,
{
    fn combine_latest<IS>(self, others: Vec<IS>) -> CombineLatest<T>
    where
        Self: Send + 'static,
        IS: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        let mut upstreams: Vec<crate::BoxedUpstream<T>> = Vec::with_capacity(others.len() + 1);
        upstreams.push(Box::pin(self));
        upstreams.extend(
            others
                .into_iter()
                .map(|other| Box::pin(other) as crate::BoxedUpstream<T>),
        );
        CombineLatest::from_boxed(upstreams)
    }

    fn combine_latest_with<S2, U>(self, other: S2) -> CombineLatest2<T, U>
    where
        Self: Send + 'static,
        S2: Stream<Item = StreamItem<U>> + Send + 'static,
        U: Clone + Send + 'static,
    {
        combine_latest2(self, other)
    }
}
