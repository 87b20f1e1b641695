// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::state_machine::BroadcastStateMachine;
use crate::unicast_channel::{Outcome, Resumption};
use crate::BoxedUpstream;
use braid_core::braid_mutex::Mutex;
use braid_core::{continuation, debug, trace, BraidTask, CancellationToken, StreamItem, Suspension};
use futures::future::{select, Either};
use futures::StreamExt;
use std::sync::Arc;

/// Shared engine object: the coordinator behind its lock, plus the producer
/// task that drives the upstream.
pub(crate) struct BroadcastStorage<T> {
    state: Mutex<BroadcastStateMachine<T>>,
}

impl<T> BroadcastStorage<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(upstream: BoxedUpstream<T>) -> Self {
        Self {
            state: Mutex::new(BroadcastStateMachine::new(upstream)),
        }
    }

    pub fn side_attached(&self) -> u64 {
        let id = self.state.lock().side_attached();
        trace!(side = id, "broadcast: side attached");
        id
    }

    pub fn side_count(&self) -> usize {
        self.state.lock().side_count()
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().is_finished()
    }

    /// Ask for side `id`'s next outcome. The returned suspension resolves
    /// once the outcome is available.
    pub fn next(self: &Arc<Self>, id: u64) -> Suspension<Outcome<T>> {
        let (continuation, suspension) = continuation();

        let effects = {
            let mut state = self.state.lock();
            let mut effects = state.next(id, continuation);
            if let Some(upstream) = effects.start_task.take() {
                debug!(side = id, "broadcast: first demand, starting producer");
                state.task_started(self.spawn_producer(upstream));
            }
            effects
        };

        if let Some(resumption) = effects.resumption {
            resumption.resume();
        }
        if let Some(producer) = effects.producer {
            producer.resume(());
        }
        suspension
    }

    pub fn side_cancelled(&self, id: u64) {
        let effects = self.state.lock().side_cancelled(id);
        trace!(side = id, "broadcast: side detached");

        if let Some(continuation) = effects.continuation {
            continuation.resume(Ok(None));
        }
        if let Some(producer) = effects.producer {
            producer.resume(());
        }
        if let Some(task) = effects.cancel_task {
            debug!("broadcast: last side detached, cancelling producer");
            task.cancel();
        }
    }

    fn spawn_producer(self: &Arc<Self>, upstream: BoxedUpstream<T>) -> BraidTask {
        let storage = Arc::clone(self);
        BraidTask::spawn(move |cancel| storage.produce(upstream, cancel))
    }

    /// Producer loop: wait at the gate, pull one element outside the lock,
    /// hand it to every side, repeat.
    async fn produce(self: Arc<Self>, mut upstream: BoxedUpstream<T>, cancel: CancellationToken) {
        loop {
            let (gate, permission) = continuation();
            let opened = self.state.lock().producer_suspended(gate);
            if let Some(gate) = opened {
                gate.resume(());
            }

            match select(permission, cancel.cancelled()).await {
                Either::Left((Some(()), _)) => {}
                Either::Left((None, _)) | Either::Right(_) => {
                    trace!("broadcast: producer released");
                    return;
                }
            }

            let item = match select(upstream.next(), cancel.cancelled()).await {
                Either::Left((item, _)) => item,
                Either::Right(_) => {
                    trace!("broadcast: producer cancelled during upstream poll");
                    return;
                }
            };

            match item {
                Some(StreamItem::Value(element)) => {
                    let resumptions = self.state.lock().element_produced(element);
                    resume_all(resumptions);
                }
                Some(StreamItem::Error(error)) => {
                    debug!(%error, "broadcast: upstream failed");
                    let resumptions = self.state.lock().upstream_terminated(Some(error));
                    resume_all(resumptions);
                    return;
                }
                None => {
                    debug!("broadcast: upstream finished");
                    let resumptions = self.state.lock().upstream_terminated(None);
                    resume_all(resumptions);
                    return;
                }
            }
        }
    }
}

fn resume_all<T>(resumptions: Vec<Resumption<T>>) {
    for resumption in resumptions {
        resumption.resume();
    }
}
