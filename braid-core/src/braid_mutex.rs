// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The lock guarding every engine's coordinator state.
//!
//! `parking_lot::Mutex` never poisons, so a panic raised by a protocol
//! violation inside one critical section does not wedge the other handles.

pub use parking_lot::{Mutex, MutexGuard};
