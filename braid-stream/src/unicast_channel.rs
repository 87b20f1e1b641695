// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Single-consumer hand-off buffer.
//!
//! A [`UnicastChannel`] moves an ordered sequence of outcomes (element,
//! end-of-stream or failure) from one producer to one consumer. When the
//! consumer is already waiting the outcome is handed straight to its
//! continuation; otherwise it is queued.
//!
//! The channel performs no locking. Every method is meant to be called while
//! the owning engine's lock is held, and every continuation it hands back is
//! resumed by the caller after that lock has been released.

use braid_core::{BraidError, Continuation, Result};
use std::collections::VecDeque;

/// What a consumer receives: `Ok(Some(_))` for an element, `Ok(None)` for
/// end-of-stream and `Err(_)` for a failure.
pub type Outcome<T> = Result<Option<T>>;

/// Decision returned by [`UnicastChannel::next`].
#[derive(Debug)]
pub enum NextAction<T> {
    /// An outcome is ready and can be returned without suspending.
    DeliverImmediately(Outcome<T>),
    /// Nothing is ready; the consumer has to park a continuation.
    Suspend,
}

/// A parked consumer paired with the outcome it has to be resumed with.
#[must_use = "a resumption must be resumed or the consumer is woken with nothing"]
#[derive(Debug)]
pub struct Resumption<T> {
    continuation: Continuation<Outcome<T>>,
    outcome: Outcome<T>,
}

impl<T> Resumption<T> {
    pub(crate) fn new(continuation: Continuation<Outcome<T>>, outcome: Outcome<T>) -> Self {
        Self {
            continuation,
            outcome,
        }
    }

    /// Wake the consumer. Call this outside the engine lock.
    pub fn resume(self) {
        self.continuation.resume(self.outcome);
    }
}

/// FIFO of pending outcomes plus at most one parked consumer.
///
/// Invariant: the queue is only non-empty while no consumer is parked.
#[derive(Debug)]
pub struct UnicastChannel<T> {
    buffer: VecDeque<Outcome<T>>,
    suspended: Option<Continuation<Outcome<T>>>,
    is_finished: bool,
}

impl<T> Default for UnicastChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UnicastChannel<T> {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            suspended: None,
            is_finished: false,
        }
    }

    /// Deliver an element. Ignored once the channel is finished.
    pub fn send(&mut self, element: T) -> Option<Resumption<T>> {
        if self.is_finished {
            return None;
        }
        self.dispatch(Ok(Some(element)))
    }

    /// Deliver the terminal outcome: end-of-stream when `error` is `None`,
    /// the failure otherwise. Only the first call has any effect.
    pub fn finish(&mut self, error: Option<BraidError>) -> Option<Resumption<T>> {
        if self.is_finished {
            return None;
        }
        self.is_finished = true;

        match error {
            Some(error) => self.dispatch(Err(error)),
            None => self.dispatch(Ok(None)),
        }
    }

    /// Check whether an outcome is available without parking anything.
    pub fn next(&mut self) -> NextAction<T> {
        if let Some(outcome) = self.buffer.pop_front() {
            NextAction::DeliverImmediately(outcome)
        } else if self.is_finished {
            NextAction::DeliverImmediately(Ok(None))
        } else {
            NextAction::Suspend
        }
    }

    /// Same decision as [`next`](Self::next), but parks `continuation` when
    /// nothing is ready. Returns the resumption to perform when something is.
    ///
    /// # Panics
    ///
    /// Panics if a consumer is already parked: a single consumer must never
    /// have two `next` calls in flight.
    pub fn next_is_suspended(
        &mut self,
        continuation: Continuation<Outcome<T>>,
    ) -> Option<Resumption<T>> {
        assert!(
            self.suspended.is_none(),
            "UnicastChannel: next() called while a previous call is still suspended"
        );

        match self.next() {
            NextAction::DeliverImmediately(outcome) => {
                Some(Resumption::new(continuation, outcome))
            }
            NextAction::Suspend => {
                self.suspended = Some(continuation);
                None
            }
        }
    }

    /// The consumer went away. The channel becomes finished and drops its
    /// queue; the parked continuation, if any, is returned so the caller can
    /// resume it with end-of-stream.
    pub fn next_is_cancelled(&mut self) -> Option<Continuation<Outcome<T>>> {
        self.is_finished = true;
        self.buffer.clear();
        self.suspended.take()
    }

    /// `true` when every delivered outcome has been consumed.
    pub fn is_drained(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn dispatch(&mut self, outcome: Outcome<T>) -> Option<Resumption<T>> {
        match self.suspended.take() {
            Some(continuation) => {
                debug_assert!(self.buffer.is_empty());
                Some(Resumption::new(continuation, outcome))
            }
            None => {
                self.buffer.push_back(outcome);
                None
            }
        }
    }
}
