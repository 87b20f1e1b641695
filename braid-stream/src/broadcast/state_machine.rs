// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Coordinator of the broadcast engine.
//!
//! Pure and synchronous: every method performs one state transition and
//! returns the side effects (continuations to resume, a task to start or
//! cancel) that the storage carries out once the lock is released.

use crate::unicast_channel::{Outcome, Resumption, UnicastChannel};
use crate::BoxedUpstream;
use braid_core::{BraidError, BraidTask, Continuation};
use std::collections::{BTreeMap, BTreeSet};
use std::mem;

type Sides<T> = BTreeMap<u64, UnicastChannel<T>>;

enum State<T> {
    /// No side has asked for an element yet; the upstream is untouched.
    Initial {
        upstream: BoxedUpstream<T>,
        sides: Sides<T>,
    },
    /// The producer task is alive.
    Broadcasting {
        task: Option<BraidTask>,
        producer: Option<Continuation<()>>,
        sides: Sides<T>,
        is_busy: bool,
        pending_demand_ids: BTreeSet<u64>,
    },
    /// The upstream is done (or the engine was abandoned); sides drain what
    /// is left in their own channels.
    Finished { sides: Sides<T> },
    Modifying,
}

/// Effects of a side asking for its next element.
#[must_use]
pub(crate) struct SideNextEffects<T> {
    /// The upstream to hand to a freshly spawned producer task.
    pub start_task: Option<BoxedUpstream<T>>,
    /// The requesting side, when it can be answered right away.
    pub resumption: Option<Resumption<T>>,
    /// The producer gate, when this request opened it.
    pub producer: Option<Continuation<()>>,
}

/// Effects of a side going away.
#[must_use]
pub(crate) struct SideCancelledEffects<T> {
    pub continuation: Option<Continuation<Outcome<T>>>,
    pub producer: Option<Continuation<()>>,
    pub cancel_task: Option<BraidTask>,
}

pub(crate) struct BroadcastStateMachine<T> {
    state: State<T>,
    next_side_id: u64,
}

impl<T: Clone> BroadcastStateMachine<T> {
    pub fn new(upstream: BoxedUpstream<T>) -> Self {
        Self {
            state: State::Initial {
                upstream,
                sides: Sides::new(),
            },
            next_side_id: 0,
        }
    }

    /// Register a new side and return its id.
    ///
    /// A side attached after the engine finished is not registered: it has
    /// nothing left to receive, and [`next`](Self::next) answers it with
    /// end-of-stream.
    pub fn side_attached(&mut self) -> u64 {
        let id = self.next_side_id;
        self.next_side_id += 1;

        match &mut self.state {
            State::Initial { sides, .. } | State::Broadcasting { sides, .. } => {
                sides.insert(id, UnicastChannel::new());
            }
            State::Finished { .. } => {}
            State::Modifying => unreachable!("state left in Modifying"),
        }
        id
    }

    pub fn side_count(&self) -> usize {
        match &self.state {
            State::Initial { sides, .. }
            | State::Broadcasting { sides, .. }
            | State::Finished { sides } => sides.len(),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished { .. })
    }

    /// A side asks for its next element, parking `continuation` if nothing is
    /// ready for it.
    pub fn next(&mut self, id: u64, continuation: Continuation<Outcome<T>>) -> SideNextEffects<T> {
        let mut effects = SideNextEffects {
            start_task: None,
            resumption: None,
            producer: None,
        };

        match mem::replace(&mut self.state, State::Modifying) {
            State::Initial {
                upstream,
                mut sides,
            } => {
                let mut pending_demand_ids = BTreeSet::new();
                match sides.get_mut(&id) {
                    Some(side) => {
                        effects.resumption = side.next_is_suspended(continuation);
                        if effects.resumption.is_none() {
                            pending_demand_ids.insert(id);
                        }
                    }
                    None => effects.resumption = Some(Resumption::new(continuation, Ok(None))),
                }

                effects.start_task = Some(upstream);
                self.state = State::Broadcasting {
                    task: None,
                    producer: None,
                    sides,
                    is_busy: false,
                    pending_demand_ids,
                };
            }
            State::Broadcasting {
                task,
                mut producer,
                mut sides,
                mut is_busy,
                mut pending_demand_ids,
            } => {
                match sides.get_mut(&id) {
                    Some(side) => {
                        effects.resumption = side.next_is_suspended(continuation);
                        if effects.resumption.is_none() {
                            pending_demand_ids.insert(id);
                        }
                    }
                    None => effects.resumption = Some(Resumption::new(continuation, Ok(None))),
                }

                effects.producer =
                    open_gate(&mut producer, &sides, &mut is_busy, &pending_demand_ids);
                self.state = State::Broadcasting {
                    task,
                    producer,
                    sides,
                    is_busy,
                    pending_demand_ids,
                };
            }
            State::Finished { mut sides } => {
                effects.resumption = match sides.get_mut(&id) {
                    Some(side) => side.next_is_suspended(continuation),
                    None => Some(Resumption::new(continuation, Ok(None))),
                };
                self.state = State::Finished { sides };
            }
            State::Modifying => unreachable!("state left in Modifying"),
        }

        effects
    }

    /// The producer task was spawned for the upstream handed out by
    /// [`next`](Self::next).
    pub fn task_started(&mut self, started: BraidTask) {
        match &mut self.state {
            State::Broadcasting { task, .. } => *task = Some(started),
            // Every side left before the task got registered
            State::Finished { .. } => started.cancel(),
            State::Initial { .. } => unreachable!("task started before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// The producer waits at the gate for the next cycle. Returns the gate
    /// continuation when the cycle may start right away.
    ///
    /// Once the engine has finished the continuation is dropped, which tells
    /// the producer to stop.
    pub fn producer_suspended(&mut self, gate: Continuation<()>) -> Option<Continuation<()>> {
        match &mut self.state {
            State::Broadcasting {
                producer,
                sides,
                is_busy,
                pending_demand_ids,
                ..
            } => {
                assert!(
                    producer.is_none(),
                    "broadcast: producer suspended twice without being resumed"
                );
                *producer = Some(gate);
                open_gate(producer, sides, is_busy, pending_demand_ids)
            }
            State::Finished { .. } => None,
            State::Initial { .. } => unreachable!("producer running before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// The upstream produced `element`: feed it to every side.
    pub fn element_produced(&mut self, element: T) -> Vec<Resumption<T>> {
        match &mut self.state {
            State::Broadcasting {
                sides,
                is_busy,
                pending_demand_ids,
                ..
            } => {
                *is_busy = false;
                sides
                    .iter_mut()
                    .filter_map(|(id, side)| {
                        let resumption = side.send(element.clone());
                        if resumption.is_some() {
                            pending_demand_ids.remove(id);
                        }
                        resumption
                    })
                    .collect()
            }
            State::Finished { .. } => Vec::new(),
            State::Initial { .. } => unreachable!("element produced before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// The upstream ended (`error` is `None`) or failed: every side receives
    /// the same terminal outcome.
    pub fn upstream_terminated(&mut self, error: Option<BraidError>) -> Vec<Resumption<T>> {
        match mem::replace(&mut self.state, State::Modifying) {
            State::Broadcasting { mut sides, .. } => {
                let resumptions = sides
                    .values_mut()
                    .filter_map(|side| side.finish(error.clone()))
                    .collect();
                self.state = State::Finished { sides };
                resumptions
            }
            finished @ State::Finished { .. } => {
                self.state = finished;
                Vec::new()
            }
            State::Initial { .. } => unreachable!("upstream terminated before any demand"),
            State::Modifying => unreachable!("state left in Modifying"),
        }
    }

    /// A side went away.
    pub fn side_cancelled(&mut self, id: u64) -> SideCancelledEffects<T> {
        let mut effects = SideCancelledEffects {
            continuation: None,
            producer: None,
            cancel_task: None,
        };

        match mem::replace(&mut self.state, State::Modifying) {
            State::Initial {
                upstream,
                mut sides,
            } => {
                sides.remove(&id);
                self.state = State::Initial { upstream, sides };
            }
            State::Broadcasting {
                task,
                mut producer,
                mut sides,
                mut is_busy,
                mut pending_demand_ids,
            } => {
                effects.continuation = sides
                    .remove(&id)
                    .and_then(|mut side| side.next_is_cancelled());
                pending_demand_ids.remove(&id);

                if sides.is_empty() {
                    // Nobody is left to consume; dropping the gate
                    // continuation releases a parked producer.
                    effects.cancel_task = task;
                    self.state = State::Finished { sides };
                } else {
                    effects.producer =
                        open_gate(&mut producer, &sides, &mut is_busy, &pending_demand_ids);
                    self.state = State::Broadcasting {
                        task,
                        producer,
                        sides,
                        is_busy,
                        pending_demand_ids,
                    };
                }
            }
            State::Finished { mut sides } => {
                effects.continuation = sides
                    .remove(&id)
                    .and_then(|mut side| side.next_is_cancelled());
                self.state = State::Finished { sides };
            }
            State::Modifying => unreachable!("state left in Modifying"),
        }

        effects
    }
}

/// Lock-step gate: a new cycle starts only when none is in flight, every side
/// consumed the previous element, and somebody is waiting for the next one.
fn open_gate<T>(
    producer: &mut Option<Continuation<()>>,
    sides: &Sides<T>,
    is_busy: &mut bool,
    pending_demand_ids: &BTreeSet<u64>,
) -> Option<Continuation<()>> {
    if *is_busy || pending_demand_ids.is_empty() || !sides.values().all(UnicastChannel::is_drained)
    {
        return None;
    }

    let gate = producer.take()?;
    *is_busy = true;
    Some(gate)
}
