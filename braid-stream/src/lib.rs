// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fan-out and fan-in stream engines driven by lock-protected state machines.
//!
//! # Architecture
//!
//! Every engine in this crate has the same three layers:
//!
//! - **Coordinator**: a pure, synchronous state machine. Each method performs
//!   one transition and returns the side effects to carry out (continuations
//!   to resume, a task to start or cancel).
//! - **Storage**: the coordinator behind a single mutex, plus the task that
//!   drives the upstream(s). The lock is held only for a transition; polling
//!   an upstream and resuming a continuation always happen after release.
//! - **Stream adapter**: the public [`Stream`](futures::Stream) that parks a
//!   [`Suspension`](braid_core::Suspension) per `poll_next` and detaches from
//!   the engine when dropped.
//!
//! ## Engines
//!
//! - **[`broadcast`](BroadcastExt::broadcast)**: one upstream, any number of
//!   sides, lock-step cycles paced by the slowest side.
//! - **[`combine_latest`](CombineLatestExt::combine_latest)**: any number of
//!   upstreams, one consumer, a snapshot of the latest element of each.
//! - **[`combine_latest2`] / [`combine_latest3`]**: heterogeneous fixed-arity
//!   variants yielding tuples.
//!
//! # Errors
//!
//! Upstreams yield [`StreamItem`](braid_core::StreamItem)s. A
//! `StreamItem::Error` from an upstream is forwarded once and terminates the
//! engine; broadcast mirrors it to every side. Cancellation (dropping a
//! stream) ends cleanly with `None`.
//!
//! # Runtime Requirements
//!
//! Engines spawn their driving task through [`BraidTask`](braid_core::BraidTask),
//! which needs one of the `runtime-tokio` (default), `runtime-smol` or
//! `runtime-async-std` features.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

pub mod broadcast;
pub mod combine_latest;
pub mod prelude;
pub mod unicast_channel;

pub use broadcast::{Broadcast, BroadcastExt, BroadcastStream};
pub use combine_latest::{
    combine_latest2, combine_latest3, combine_latest_many, CombineLatest, CombineLatest2,
    CombineLatest3, CombineLatestExt, CombinedState,
};
pub use unicast_channel::{NextAction, Outcome, Resumption, UnicastChannel};

use braid_core::StreamItem;
use core::pin::Pin;
use futures::Stream;

/// Type-erased upstream owned by an engine.
pub type BoxedUpstream<T> = Pin<Box<dyn Stream<Item = StreamItem<T>> + Send>>;
