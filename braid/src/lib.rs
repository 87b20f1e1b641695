// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Braid
//!
//! Lock-step broadcast and combine-latest for async streams.
//!
//! ## Overview
//!
//! Braid splits one upstream into many consumers and joins many upstreams
//! into one, without buffering beyond a single element per stream:
//!
//! - [`Broadcast`] pulls one element at a time from a shared upstream and only
//!   pulls the next one once every side has taken the current one.
//! - [`CombineLatest`] emits the latest value of every upstream, in upstream
//!   order, each time the consumer asks for one.
//!
//! Errors travel in-band as [`StreamItem::Error`] and terminate the engine
//! that sees them.
//!
//! ## Quick Start
//!
//! ```rust
//! use braid::prelude::*;
//! use futures::{stream, StreamExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = stream::iter(vec![1, 2, 3]).map(StreamItem::Value);
//!     let broadcast = source.broadcast();
//!
//!     let plain = broadcast.subscribe();
//!     let squared = broadcast.subscribe().map(|item| item.map(|v| v * v));
//!
//!     let mut combined = plain.combine_latest_with(squared);
//!     let first = combined.next().await.unwrap().unwrap();
//!     assert_eq!(first, (1, 1));
//! }
//! ```
//!
//! ## Runtime
//!
//! The engines spawn one background task each. The runtime is chosen with the
//! `runtime-tokio` (default), `runtime-smol` or `runtime-async-std` feature.

pub use braid_core::{BraidError, Result, StreamItem};

pub use braid_stream::{
    combine_latest2, combine_latest3, combine_latest_many, Broadcast, BroadcastExt,
    BroadcastStream, CombineLatest, CombineLatest2, CombineLatest3, CombineLatestExt,
    CombinedState,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use braid_stream::prelude::*;
}
