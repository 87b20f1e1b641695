// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::state_machine::{CombineEffects, CombineLatestStateMachine};
use crate::unicast_channel::Outcome;
use crate::BoxedUpstream;
use braid_core::braid_mutex::Mutex;
use braid_core::{continuation, debug, trace, BraidTask, StreamItem, Suspension};
use futures::future::{select, Either};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;

pub(crate) struct CombineLatestStorage<T> {
    state: Mutex<CombineLatestStateMachine<T>>,
}

impl<T> CombineLatestStorage<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(upstreams: Vec<BoxedUpstream<T>>) -> Self {
        Self {
            state: Mutex::new(CombineLatestStateMachine::new(upstreams)),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().is_finished()
    }

    /// Ask for the next snapshot.
    pub fn next(self: &Arc<Self>) -> Suspension<Outcome<Vec<T>>> {
        let (continuation, suspension) = continuation();

        let effects = {
            let mut state = self.state.lock();
            let mut effects = state.next(continuation);
            if let Some(upstreams) = effects.start_task.take() {
                debug!(
                    upstreams = upstreams.len(),
                    "combine_latest: first demand, starting upstream tasks"
                );
                state.task_started(self.spawn_upstreams(upstreams));
            }
            effects
        };

        apply(effects);
        suspension
    }

    pub fn cancelled(&self) {
        let effects = self.state.lock().cancelled();
        trace!("combine_latest: downstream dropped");
        apply(effects);
    }

    /// One task for the whole engine, fanning out into a group of child
    /// futures, one per upstream, polled concurrently. Cancelling the task
    /// drops every in-flight upstream poll.
    fn spawn_upstreams(self: &Arc<Self>, upstreams: Vec<BoxedUpstream<T>>) -> BraidTask {
        let storage = Arc::clone(self);
        BraidTask::spawn(move |cancel| async move {
            let mut children: FuturesUnordered<_> = upstreams
                .into_iter()
                .enumerate()
                .map(|(index, upstream)| Arc::clone(&storage).drive(index, upstream))
                .collect();
            let drained = async move { while children.next().await.is_some() {} };

            if let Either::Right(_) = select(Box::pin(drained), cancel.cancelled()).await {
                trace!("combine_latest: upstream tasks cancelled");
            }
        })
    }

    /// Child loop for upstream `index`: wait for permission, pull one element
    /// outside the lock, report it.
    async fn drive(self: Arc<Self>, index: usize, mut upstream: BoxedUpstream<T>) {
        loop {
            let (permission, granted) = continuation();
            let resumed = self.state.lock().child_task_suspended(index, permission);
            if let Some(permission) = resumed {
                permission.resume(());
            }

            if granted.await.is_none() {
                trace!(upstream = index, "combine_latest: upstream released");
                return;
            }

            match upstream.next().await {
                Some(StreamItem::Value(element)) => {
                    let effects = self.state.lock().element_produced(index, element);
                    apply(effects);
                }
                Some(StreamItem::Error(error)) => {
                    debug!(upstream = index, %error, "combine_latest: upstream failed");
                    let effects = self.state.lock().upstream_threw(error);
                    apply(effects);
                    return;
                }
                None => {
                    debug!(upstream = index, "combine_latest: upstream finished");
                    let effects = self.state.lock().upstream_finished(index);
                    apply(effects);
                    return;
                }
            }
        }
    }
}

/// Carry out a transition's effects. Must be called without the lock held.
fn apply<T>(effects: CombineEffects<T>) {
    if let Some(downstream) = effects.downstream {
        downstream.resume();
    }
    for permission in effects.permissions {
        permission.resume(());
    }
    if let Some(task) = effects.cancel_task {
        task.cancel();
    }
}
