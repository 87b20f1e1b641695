// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Heterogeneous 2- and 3-ary combine-latest.
//!
//! Each upstream is tagged with its position, the tagged streams run through
//! the N-ary engine, and every snapshot is destructured back into a tuple.

use super::{CombineLatest, CombinedState};
use crate::BoxedUpstream;
use braid_core::StreamItem;
use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::stream::FusedStream;
use futures::{Stream, StreamExt};

#[derive(Clone)]
enum Tagged2<A, B> {
    First(A),
    Second(B),
}

#[derive(Clone)]
enum Tagged3<A, B, C> {
    First(A),
    Second(B),
    Third(C),
}

fn tag<S, T, U>(upstream: S, position: fn(T) -> U) -> BoxedUpstream<U>
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: 'static,
    U: 'static,
{
    Box::pin(upstream.map(move |item| item.map(position)))
}

fn untag2<A, B>(state: CombinedState<Tagged2<A, B>>) -> (A, B) {
    let mut values = state.into_values().into_iter();
    match (values.next(), values.next()) {
        (Some(Tagged2::First(a)), Some(Tagged2::Second(b))) => (a, b),
        _ => unreachable!("combine_latest2: snapshot out of upstream order"),
    }
}

fn untag3<A, B, C>(state: CombinedState<Tagged3<A, B, C>>) -> (A, B, C) {
    let mut values = state.into_values().into_iter();
    match (values.next(), values.next(), values.next()) {
        (Some(Tagged3::First(a)), Some(Tagged3::Second(b)), Some(Tagged3::Third(c))) => (a, b, c),
        _ => unreachable!("combine_latest3: snapshot out of upstream order"),
    }
}

/// Latest values of two upstreams of different types, as `(A, B)`.
pub struct CombineLatest2<A, B>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    inner: CombineLatest<Tagged2<A, B>>,
}

/// Latest values of three upstreams of different types, as `(A, B, C)`.
pub struct CombineLatest3<A, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    inner: CombineLatest<Tagged3<A, B, C>>,
}

/// Combine two upstreams of possibly different element types.
///
/// ```rust
/// use braid_stream::combine_latest2;
/// use braid_test_utils::test_channel;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (tx_a, a) = test_channel::<u32>();
/// let (tx_b, b) = test_channel::<&str>();
/// let mut combined = combine_latest2(a, b);
///
/// tx_a.send(10).unwrap();
/// tx_b.send("x").unwrap();
///
/// assert_eq!(combined.next().await.unwrap().unwrap(), (10, "x"));
/// # }
/// ```
pub fn combine_latest2<SA, SB, A, B>(a: SA, b: SB) -> CombineLatest2<A, B>
where
    SA: Stream<Item = StreamItem<A>> + Send + 'static,
    SB: Stream<Item = StreamItem<B>> + Send + 'static,
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    CombineLatest2 {
        inner: CombineLatest::from_boxed(vec![tag(a, Tagged2::First), tag(b, Tagged2::Second)]),
    }
}

/// Combine three upstreams of possibly different element types.
pub fn combine_latest3<SA, SB, SC, A, B, C>(a: SA, b: SB, c: SC) -> CombineLatest3<A, B, C>
where
    SA: Stream<Item = StreamItem<A>> + Send + 'static,
    SB: Stream<Item = StreamItem<B>> + Send + 'static,
    SC: Stream<Item = StreamItem<C>> + Send + 'static,
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    CombineLatest3 {
        inner: CombineLatest::from_boxed(vec![
            tag(a, Tagged3::First),
            tag(b, Tagged3::Second),
            tag(c, Tagged3::Third),
        ]),
    }
}

impl<A, B> Stream for CombineLatest2<A, B>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    type Item = StreamItem<(A, B)>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner
            .poll_next_unpin(cx)
            .map(|item| item.map(|item| item.map(untag2)))
    }
}

impl<A, B, C> Stream for CombineLatest3<A, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    type Item = StreamItem<(A, B, C)>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner
            .poll_next_unpin(cx)
            .map(|item| item.map(|item| item.map(untag3)))
    }
}

impl<A, B> FusedStream for CombineLatest2<A, B>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

impl<A, B, C> FusedStream for CombineLatest3<A, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

impl<A, B> fmt::Debug for CombineLatest2<A, B>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombineLatest2").field("inner", &self.inner).finish()
    }
}

impl<A, B, C> fmt::Debug for CombineLatest3<A, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombineLatest3").field("inner", &self.inner).finish()
    }
}
