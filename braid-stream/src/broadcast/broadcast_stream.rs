// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::storage::BroadcastStorage;
use crate::unicast_channel::Outcome;
use braid_core::{StreamItem, Suspension};
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::stream::FusedStream;
use futures::Stream;
use std::sync::Arc;

/// A single upstream shared by any number of [`BroadcastStream`] sides.
///
/// Cloning a `Broadcast` yields another handle to the same engine.
///
/// See the [module documentation](crate::broadcast) for semantics.
pub struct Broadcast<T> {
    storage: Arc<BroadcastStorage<T>>,
}

impl<T> Broadcast<T>
where
    T: Clone + Send + 'static,
{
    /// Wraps `upstream`. Nothing is pulled from it until the first side asks
    /// for an element.
    ///
    /// Prefer [`BroadcastExt::broadcast()`](super::BroadcastExt::broadcast).
    pub fn new<S>(upstream: S) -> Self
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        Self {
            storage: Arc::new(BroadcastStorage::new(Box::pin(upstream))),
        }
    }

    /// Attach a new side.
    ///
    /// The side receives every element produced from the next cycle on.
    /// Attached after the upstream terminated, it ends immediately.
    pub fn subscribe(&self) -> BroadcastStream<T> {
        BroadcastStream {
            id: self.storage.side_attached(),
            storage: Arc::clone(&self.storage),
            pending: None,
            is_terminated: false,
        }
    }

    /// Number of sides currently attached.
    pub fn side_count(&self) -> usize {
        self.storage.side_count()
    }

    /// `true` once the upstream terminated or every side of a started engine
    /// went away.
    pub fn is_finished(&self) -> bool {
        self.storage.is_finished()
    }
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<T> fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast").finish_non_exhaustive()
    }
}

/// One side of a [`Broadcast`].
///
/// Yields every upstream element in order, then `None`. An upstream error is
/// yielded once as [`StreamItem::Error`], after which the stream ends.
/// Dropping the side detaches it.
pub struct BroadcastStream<T>
where
    T: Clone + Send + 'static,
{
    storage: Arc<BroadcastStorage<T>>,
    id: u64,
    pending: Option<Suspension<Outcome<T>>>,
    is_terminated: bool,
}

impl<T> BroadcastStream<T>
where
    T: Clone + Send + 'static,
{
    /// The side's identifier, unique within its engine.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Stream for BroadcastStream<T>
where
    T: Clone + Send + 'static,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.is_terminated {
            return Poll::Ready(None);
        }

        let suspension = match this.pending.as_mut() {
            Some(suspension) => suspension,
            None => this.pending.insert(this.storage.next(this.id)),
        };

        let outcome = match Pin::new(suspension).poll(cx) {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => return Poll::Pending,
        };
        this.pending = None;

        match outcome {
            Some(Ok(Some(element))) => Poll::Ready(Some(StreamItem::Value(element))),
            Some(Err(error)) => {
                this.is_terminated = true;
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            Some(Ok(None)) | None => {
                this.is_terminated = true;
                Poll::Ready(None)
            }
        }
    }
}

impl<T> FusedStream for BroadcastStream<T>
where
    T: Clone + Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.is_terminated
    }
}

impl<T> Drop for BroadcastStream<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        self.storage.side_cancelled(self.id);
    }
}

impl<T> fmt::Debug for BroadcastStream<T>
where
    T: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastStream")
            .field("id", &self.id)
            .field("is_terminated", &self.is_terminated)
            .finish_non_exhaustive()
    }
}
