// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Core building blocks shared by the braid stream engines.
//!
//! - [`StreamItem`] carries values and errors in-band through a stream.
//! - [`BraidError`] is the single failure type of every engine.
//! - [`Continuation`] / [`Suspension`] form the one-shot resumption primitive
//!   the engines park producers and consumers on.
//! - [`BraidTask`] spawns the background task that drives upstreams, with
//!   cooperative cancellation through a [`CancellationToken`].

pub mod braid_mutex;
pub mod braid_task;
pub mod cancellation_token;
pub mod continuation;
pub mod error;
pub mod logging;
pub mod stream_item;

pub use self::braid_task::BraidTask;
pub use self::cancellation_token::{CancellationToken, Cancelled};
pub use self::continuation::{continuation, Continuation, Suspension};
pub use self::error::{BraidError, Result};
pub use self::stream_item::StreamItem;
