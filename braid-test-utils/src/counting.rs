// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Stream wrapper that counts the elements pulled out of it.
//!
//! The counter is shared, so a test keeps observing it after the stream has
//! been moved into an engine.

use core::pin::Pin;
use core::task::{Context, Poll};
use futures::Stream;
use pin_project::pin_project;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared handle to the number of elements a [`CountingStream`] yielded.
#[derive(Clone, Debug, Default)]
pub struct PollCounter {
    pulled: Arc<AtomicUsize>,
}

impl PollCounter {
    pub fn get(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

/// Wraps a stream and counts every element it yields.
///
/// # Example
///
/// ```rust
/// use braid_test_utils::CountingStream;
/// use futures::{stream, StreamExt};
///
/// # async fn example() {
/// let (mut counted, counter) = CountingStream::new(stream::iter(vec![1, 2, 3]));
///
/// counted.next().await;
/// counted.next().await;
///
/// assert_eq!(counter.get(), 2);
/// # }
/// ```
#[pin_project]
#[derive(Debug)]
pub struct CountingStream<S> {
    #[pin]
    inner: S,
    counter: PollCounter,
}

impl<S> CountingStream<S> {
    pub fn new(inner: S) -> (Self, PollCounter) {
        let counter = PollCounter::default();
        (
            Self {
                inner,
                counter: counter.clone(),
            },
            counter,
        )
    }
}

impl<S: Stream> Stream for CountingStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let polled = this.inner.poll_next(cx);
        if let Poll::Ready(Some(_)) = &polled {
            this.counter.pulled.fetch_add(1, Ordering::SeqCst);
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
