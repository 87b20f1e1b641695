// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Coordinator of the combine-latest engine.
//!
//! Keeps the latest element of every upstream and decides when a complete
//! snapshot can be handed to the single downstream consumer. Like the
//! broadcast coordinator it never suspends: each transition returns the
//! effects the storage performs once the lock is released.

use crate::unicast_channel::{Outcome, Resumption};
use crate::BoxedUpstream;
use braid_core::{warn, BraidError, BraidTask, Continuation};
use std::collections::VecDeque;
use std::mem;

/// Latest-value record of one upstream.
struct UpstreamSlot<T> {
    /// Parked permission to pull the next element from this upstream.
    permission: Option<Continuation<()>>,
    /// Last element produced. Overwritten in place, never cleared.
    element: Option<T>,
    /// Pulled or produced since the current demand started.
    pulled_this_demand: bool,
    is_finished: bool,
}

impl<T> UpstreamSlot<T> {
    fn new() -> Self {
        Self {
            permission: None,
            element: None,
            pulled_this_demand: false,
            is_finished: false,
        }
    }
}

type Snapshot<T> = Vec<T>;

enum State<T> {
    Initial {
        upstreams: Vec<BoxedUpstream<T>>,
    },
    /// Upstreams idle (or finishing an in-flight pull); no consumer parked.
    WaitingForDemand {
        task: Option<BraidTask>,
        slots: Vec<UpstreamSlot<T>>,
        buffer: VecDeque<Snapshot<T>>,
    },
    /// The consumer is parked until the next complete snapshot.
    Combining {
        task: Option<BraidTask>,
        slots: Vec<UpstreamSlot<T>>,
        downstream: Continuation<Outcome<Snapshot<T>>>,
    },
    /// Every upstream ended with snapshots still buffered.
    UpstreamsFinished {
        buffer: VecDeque<Snapshot<T>>,
    },
    /// An upstream failed before the consumer asked again.
    UpstreamThrew {
        error: BraidError,
    },
    Finished,
    Modifying,
}

/// Side effects of a transition, carried out after the lock is released.
#[must_use]
pub(crate) struct CombineEffects<T> {
    /// Upstreams to hand to a freshly spawned task.
    pub start_task: Option<Vec<BoxedUpstream<T>>>,
    pub downstream: Option<Resumption<Snapshot<T>>>,
    /// Upstream permissions granted by this transition.
    pub permissions: Vec<Continuation<()>>,
    pub cancel_task: Option<BraidTask>,
}

impl<T> CombineEffects<T> {
    fn none() -> Self {
        Self {
            start_task: None,
            downstream: None,
            permissions: Vec::new(),
            cancel_task: None,
        }
    }

    fn deliver(
        continuation: Continuation<Outcome<Snapshot<T>>>,
        outcome: Outcome<Snapshot<T>>,
    ) -> Self {
        Self {
            downstream: Some(Resumption::new(continuation, outcome)),
            ..Self::none()
        }
    }
}

pub(crate) struct CombineLatestStateMachine<T> {
    state: State<T>,
}

impl<T: Clone> CombineLatestStateMachine<T> {
    pub fn new(upstreams: Vec<BoxedUpstream<T>>) -> Self {
        Self {
            state: State::Initial { upstreams },
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// The consumer asks for the next snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the previous request has not been answered yet.
    pub fn next(&mut self, continuation: Continuation<Outcome<Snapshot<T>>>) -> CombineEffects<T> {
        match mem::replace(&mut self.state, State::Modifying) {
            State::Initial { upstreams } => {
                if upstreams.is_empty() {
                    self.state = State::Finished;
                    return CombineEffects::deliver(continuation, Ok(None));
                }

                let slots = upstreams.iter().map(|_| UpstreamSlot::new()).collect();
                self.state = State::Combining {
                    task: None,
                    slots,
                    downstream: continuation,
                };
                CombineEffects {
                    start_task: Some(upstreams),
                    ..CombineEffects::none()
                }
            }
            State::WaitingForDemand {
                task,
                mut slots,
                mut buffer,
            } => {
                if let Some(snapshot) = buffer.pop_front() {
                    self.state = State::WaitingForDemand {
                        task,
                        slots,
                        buffer,
                    };
                    return CombineEffects::deliver(continuation, Ok(Some(snapshot)));
                }

                let mut permissions = Vec::new();
                for slot in &mut slots {
                    slot.pulled_this_demand = false;
                    if let Some(permission) = slot.permission.take() {
                        slot.pulled_this_demand = true;
                        permissions.push(permission);
                    }
                }
                self.state = State::Combining {
                    task,
                    slots,
                    downstream: continuation,
                };
                CombineEffects {
                    permissions,
                    ..CombineEffects::none()
                }
            }
            State::Combining { .. } => {
                panic!("combine_latest: next() called while a previous call is still suspended")
            }
            State::UpstreamsFinished { mut buffer } => match buffer.pop_front() {
                Some(snapshot) => {
                    self.state = if buffer.is_empty() {
                        State::Finished
                    } else {
                        State::UpstreamsFinished { buffer }
                    };
                    CombineEffects::deliver(continuation, Ok(Some(snapshot)))
                }
                None => {
                    self.state = State::Finished;
                    CombineEffects::deliver(continuation, Ok(None))
                }
            },
            State::UpstreamThrew { error } => {
                self.state = State::Finished;
                CombineEffects::deliver(continuation, Err(error))
            }
            State::Finished => {
                self.state = State::Finished;
                CombineEffects::deliver(continuation, Ok(None))
            }
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// The task spawned for the upstreams handed out by [`next`](Self::next).
    pub fn task_started(&mut self, started: BraidTask) {
        match &mut self.state {
            State::WaitingForDemand { task, .. } | State::Combining { task, .. } => {
                *task = Some(started)
            }
            // Terminated before the task got registered
            State::UpstreamsFinished { .. } | State::UpstreamThrew { .. } | State::Finished => {
                started.cancel()
            }
            State::Initial { .. } => unreachable!("task started before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// Upstream `index` is ready to pull again. Returns the permission when it
    /// may do so right away.
    ///
    /// While combining, an upstream may pull once per demand; after that it
    /// waits for the next demand. A child that reports late, after the demand
    /// that followed its element already started, still gets its pull. On a
    /// terminated engine the permission is dropped, which tells the
    /// upstream's child task to stop.
    pub fn child_task_suspended(
        &mut self,
        index: usize,
        permission: Continuation<()>,
    ) -> Option<Continuation<()>> {
        let is_combining = matches!(self.state, State::Combining { .. });
        match &mut self.state {
            State::Combining { slots, .. } | State::WaitingForDemand { slots, .. } => {
                let slot = &mut slots[index];
                assert!(
                    slot.permission.is_none(),
                    "combine_latest: upstream {index} suspended twice without being resumed"
                );
                if is_combining && !slot.pulled_this_demand {
                    slot.pulled_this_demand = true;
                    return Some(permission);
                }
                slot.permission = Some(permission);
                None
            }
            State::UpstreamsFinished { .. } | State::UpstreamThrew { .. } | State::Finished => None,
            State::Initial { .. } => unreachable!("upstream running before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// Upstream `index` produced `element`.
    pub fn element_produced(&mut self, index: usize, element: T) -> CombineEffects<T> {
        match mem::replace(&mut self.state, State::Modifying) {
            State::Combining {
                task,
                mut slots,
                downstream,
            } => {
                slots[index].element = Some(element);
                slots[index].pulled_this_demand = true;
                match snapshot(&slots) {
                    Some(snapshot) => {
                        self.state = State::WaitingForDemand {
                            task,
                            slots,
                            buffer: VecDeque::new(),
                        };
                        CombineEffects::deliver(downstream, Ok(Some(snapshot)))
                    }
                    None => {
                        self.state = State::Combining {
                            task,
                            slots,
                            downstream,
                        };
                        CombineEffects::none()
                    }
                }
            }
            State::WaitingForDemand {
                task,
                mut slots,
                mut buffer,
            } => {
                slots[index].element = Some(element);
                if let Some(snapshot) = snapshot(&slots) {
                    buffer.push_back(snapshot);
                }
                self.state = State::WaitingForDemand {
                    task,
                    slots,
                    buffer,
                };
                CombineEffects::none()
            }
            terminal @ (State::UpstreamsFinished { .. }
            | State::UpstreamThrew { .. }
            | State::Finished) => {
                self.state = terminal;
                CombineEffects::none()
            }
            State::Initial { .. } => unreachable!("element produced before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// Upstream `index` reached its end.
    ///
    /// An upstream that ends without ever producing makes a complete snapshot
    /// impossible, so the engine terminates right away.
    pub fn upstream_finished(&mut self, index: usize) -> CombineEffects<T> {
        match mem::replace(&mut self.state, State::Modifying) {
            State::Combining {
                task,
                mut slots,
                downstream,
            } => {
                slots[index].is_finished = true;
                if slots[index].element.is_none() || slots.iter().all(|slot| slot.is_finished) {
                    self.state = State::Finished;
                    CombineEffects {
                        cancel_task: task,
                        ..CombineEffects::deliver(downstream, Ok(None))
                    }
                } else {
                    self.state = State::Combining {
                        task,
                        slots,
                        downstream,
                    };
                    CombineEffects::none()
                }
            }
            State::WaitingForDemand {
                task,
                mut slots,
                buffer,
            } => {
                slots[index].is_finished = true;
                if slots[index].element.is_none() || slots.iter().all(|slot| slot.is_finished) {
                    self.state = if buffer.is_empty() {
                        State::Finished
                    } else {
                        State::UpstreamsFinished { buffer }
                    };
                    CombineEffects {
                        cancel_task: task,
                        ..CombineEffects::none()
                    }
                } else {
                    self.state = State::WaitingForDemand {
                        task,
                        slots,
                        buffer,
                    };
                    CombineEffects::none()
                }
            }
            terminal @ (State::UpstreamsFinished { .. }
            | State::UpstreamThrew { .. }
            | State::Finished) => {
                self.state = terminal;
                CombineEffects::none()
            }
            State::Initial { .. } => unreachable!("upstream finished before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// An upstream failed. Only the first failure is ever delivered.
    pub fn upstream_threw(&mut self, error: BraidError) -> CombineEffects<T> {
        match mem::replace(&mut self.state, State::Modifying) {
            State::Combining {
                task, downstream, ..
            } => {
                self.state = State::Finished;
                CombineEffects {
                    cancel_task: task,
                    ..CombineEffects::deliver(downstream, Err(error))
                }
            }
            State::WaitingForDemand { task, .. } => {
                self.state = State::UpstreamThrew { error };
                CombineEffects {
                    cancel_task: task,
                    ..CombineEffects::none()
                }
            }
            terminal @ (State::UpstreamsFinished { .. }
            | State::UpstreamThrew { .. }
            | State::Finished) => {
                warn!(%error, "combine_latest: discarding error from an already terminated engine");
                self.state = terminal;
                CombineEffects::none()
            }
            State::Initial { .. } => unreachable!("upstream threw before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// The consumer went away.
    pub fn cancelled(&mut self) -> CombineEffects<T> {
        match mem::replace(&mut self.state, State::Finished) {
            State::Combining {
                task, downstream, ..
            } => CombineEffects {
                cancel_task: task,
                ..CombineEffects::deliver(downstream, Ok(None))
            },
            State::WaitingForDemand { task, .. } => CombineEffects {
                cancel_task: task,
                ..CombineEffects::none()
            },
            State::Modifying => unreachable!("state left in Modifying"),
            _ => CombineEffects::none(),
        }
    }
}

/// A complete snapshot in upstream order, or `None` while some upstream has
/// not produced yet.
fn snapshot<T: Clone>(slots: &[UpstreamSlot<T>]) -> Option<Snapshot<T>> {
    slots.iter().map(|slot| slot.element.clone()).collect()
}
