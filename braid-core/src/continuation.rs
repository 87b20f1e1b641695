// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One-shot continuations.
//!
//! A suspended party (a consumer waiting for its next element, or a producer
//! waiting for permission to poll its upstream) awaits a [`Suspension`]; the
//! matching [`Continuation`] is stored in an engine's state and handed out,
//! under the engine lock, to whichever code path must wake it.
//!
//! [`Continuation::resume`] consumes the continuation, so resuming twice does
//! not type-check. Dropping a continuation without resuming it completes the
//! suspension with `None`; engines use that to release parked tasks when they
//! shut down.
//!
//! # Example
//!
//! ```
//! use braid_core::continuation;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (continuation, suspension) = continuation::<u32>();
//!
//! tokio::spawn(async move { continuation.resume(7) });
//!
//! assert_eq!(suspension.await, Some(7));
//! # }
//! ```

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::channel::oneshot;

/// Creates a linked continuation / suspension pair.
pub fn continuation<T>() -> (Continuation<T>, Suspension<T>) {
    let (sender, receiver) = oneshot::channel();
    (Continuation { sender }, Suspension { receiver })
}

/// The resuming half of a one-shot suspension.
pub struct Continuation<T> {
    sender: oneshot::Sender<T>,
}

impl<T> Continuation<T> {
    /// Resume the suspended party with `value`.
    ///
    /// If the suspended party has gone away in the meantime the value is
    /// dropped.
    pub fn resume(self, value: T) {
        let _ = self.sender.send(value);
    }

    /// Returns `true` if the matching [`Suspension`] has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_canceled()
    }
}

impl<T> fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

/// The awaiting half of a one-shot suspension.
///
/// Resolves to `Some(value)` once resumed, or to `None` if the continuation
/// was dropped without being resumed.
#[must_use = "a suspension does nothing unless awaited"]
pub struct Suspension<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Future for Suspension<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(Some(value)),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for Suspension<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspension").finish_non_exhaustive()
    }
}
