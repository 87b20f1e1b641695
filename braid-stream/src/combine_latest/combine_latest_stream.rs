// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::storage::CombineLatestStorage;
use crate::unicast_channel::Outcome;
use crate::BoxedUpstream;
use braid_core::{StreamItem, Suspension};
use core::fmt;
use core::future::Future;
use core::ops::Index;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::stream::FusedStream;
use futures::Stream;
use std::sync::Arc;

/// The latest value of every upstream, in upstream order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CombinedState<T> {
    values: Vec<T>,
}

impl<T> CombinedState<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Index<usize> for CombinedState<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<T> From<CombinedState<T>> for Vec<T> {
    fn from(state: CombinedState<T>) -> Self {
        state.values
    }
}

/// Stream of [`CombinedState`] snapshots over any number of upstreams of the
/// same element type.
///
/// See the [module documentation](crate::combine_latest) for semantics.
pub struct CombineLatest<T>
where
    T: Clone + Send + 'static,
{
    storage: Arc<CombineLatestStorage<T>>,
    pending: Option<Suspension<Outcome<Vec<T>>>>,
    is_terminated: bool,
}

impl<T> CombineLatest<T>
where
    T: Clone + Send + 'static,
{
    /// Combine `upstreams`. Snapshot positions follow the order of the
    /// vector. With no upstreams the stream ends immediately.
    pub fn new<S>(upstreams: Vec<S>) -> Self
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        Self::from_boxed(
            upstreams
                .into_iter()
                .map(|upstream| Box::pin(upstream) as BoxedUpstream<T>)
                .collect(),
        )
    }

    pub(crate) fn from_boxed(upstreams: Vec<BoxedUpstream<T>>) -> Self {
        Self {
            storage: Arc::new(CombineLatestStorage::new(upstreams)),
            pending: None,
            is_terminated: false,
        }
    }

    /// `true` once the engine reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.storage.is_finished()
    }
}

impl<T> Stream for CombineLatest<T>
where
    T: Clone + Send + 'static,
{
    type Item = StreamItem<CombinedState<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.is_terminated {
            return Poll::Ready(None);
        }

        let suspension = match this.pending.as_mut() {
            Some(suspension) => suspension,
            None => this.pending.insert(this.storage.next()),
        };

        let outcome = match Pin::new(suspension).poll(cx) {
            Poll::Ready(outcome) => outcome,
            Poll::Pending => return Poll::Pending,
        };
        this.pending = None;

        match outcome {
            Some(Ok(Some(values))) => {
                Poll::Ready(Some(StreamItem::Value(CombinedState::new(values))))
            }
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

impl<T> FusedStream for CombineLatest<T>
where
    T: Clone + Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.is_terminated
    }
}

impl<T> Drop for CombineLatest<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        self.storage.cancelled();
    }
}

impl<T> fmt::Debug for CombineLatest<T>
where
    T: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombineLatest")
            .field("is_terminated", &self.is_terminated)
            .finish_non_exhaustive()
    }
}
