// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities for error injection in streams.
//!
//! [`ErrorInjectingStream`] lifts a plain stream into a `StreamItem` stream and
//! inserts one `StreamItem::Error` at a chosen position, to exercise error
//! propagation through the engines.

use braid_core::{BraidError, StreamItem};
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::Stream;
use pin_project::pin_project;

/// A stream wrapper that injects an error at a given position.
///
/// # Examples
///
/// ```rust
/// use braid_test_utils::ErrorInjectingStream;
/// use braid_core::StreamItem;
/// use futures::{stream, StreamExt};
///
/// # async fn example() {
/// let mut error_stream = ErrorInjectingStream::new(stream::iter(vec![1, 2]), 1);
///
/// assert!(matches!(error_stream.next().await, Some(StreamItem::Value(1))));
/// assert!(matches!(error_stream.next().await, Some(StreamItem::Error(_))));
/// assert!(matches!(error_stream.next().await, Some(StreamItem::Value(2))));
/// # }
/// ```
#[pin_project]
#[derive(Debug)]
pub struct ErrorInjectingStream<S> {
    #[pin]
    inner: S,
    inject_error_at: Option<usize>,
    count: usize,
}

impl<S> ErrorInjectingStream<S> {
    /// Wrap `inner`, injecting an error at the 0-indexed position
    /// `inject_error_at`.
    pub fn new(inner: S, inject_error_at: usize) -> Self {
        Self {
            inner,
            inject_error_at: Some(inject_error_at),
            count: 0,
        }
    }
}

impl<S: Stream> Stream for ErrorInjectingStream<S> {
    type Item = StreamItem<S::Item>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.inject_error_at == Some(*this.count) {
            *this.inject_error_at = None;
            *this.count += 1;
            return Poll::Ready(Some(StreamItem::Error(BraidError::stream_error(
                "Injected test error",
            ))));
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(item)) => {
                *this.count += 1;
                Poll::Ready(Some(StreamItem::Value(item)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
