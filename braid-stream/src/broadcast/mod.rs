// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Lock-step fan-out of one upstream to many sides.
//!
//! A [`Broadcast`] consumes its upstream at most once and hands every element
//! to every attached [`BroadcastStream`]. The upstream is driven by a single
//! producer task, spawned on the first demand from any side.
//!
//! ## Characteristics
//!
//! - **Lazy**: nothing is pulled from the upstream before a side asks.
//! - **Lock-step**: a new element is requested only when every side has
//!   consumed the previous one and at least one side is waiting. The slowest
//!   side paces the engine; memory stays bounded at one element per side.
//! - **Hot**: a side attached mid-broadcast receives elements from the next
//!   cycle on. Attached after the upstream terminated, it ends immediately.
//! - **Shared termination**: end-of-stream and upstream errors reach every
//!   side. An error is yielded once as [`StreamItem::Error`](braid_core::StreamItem),
//!   after which the side ends.
//! - **Owned lifecycle**: dropping a side detaches it and releases the gate
//!   if it was the one holding it shut. When the last side of a running
//!   engine goes away, the producer task is cancelled.
//!
//! ## Example
//!
//! ```rust
//! use braid_stream::BroadcastExt;
//! use braid_test_utils::test_channel;
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (tx, upstream) = test_channel::<u32>();
//! let broadcast = upstream.broadcast();
//!
//! let mut left = broadcast.subscribe();
//! let mut right = broadcast.subscribe();
//!
//! tx.send(1).unwrap();
//! drop(tx);
//!
//! let (l, r) = futures::join!(left.next(), right.next());
//! assert_eq!(l.unwrap().unwrap(), 1);
//! assert_eq!(r.unwrap().unwrap(), 1);
//!
//! assert!(left.next().await.is_none());
//! assert!(right.next().await.is_none());
//! # }
//! ```

mod broadcast_stream;
mod state_machine;
mod storage;

pub use broadcast_stream::{Broadcast, BroadcastStream};

use braid_core::StreamItem;
use futures::Stream;

/// Extension trait providing [`broadcast`](BroadcastExt::broadcast) on any
/// stream of [`StreamItem`]s.
pub trait BroadcastExt<T>: Stream<Item = StreamItem<T>>
where
    T: Clone + Send + 'static,
{
    /// Shares this stream among any number of sides.
    ///
    /// See the [module-level documentation](crate::broadcast) for semantics.
    fn broadcast(self) -> Broadcast<T>
    where
        Self: Sized + Send + 'static;
}

impl<S, T> BroadcastExt<T> for S
where
    S: Stream<Item = StreamItem<T>>,
    T: Clone + Send + 'static,
{
    fn broadcast(self) -> Broadcast<T>
    where
        Self: Sized + Send + 'static,
    {
        Broadcast::new(self)
    }
}
