// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Prelude module re-exporting the extension traits and common types.
//!
//! ```ignore
//! use braid_stream::prelude::*;
//!
//! let broadcast = stream.broadcast();
//! let combined = broadcast.subscribe().combine_latest(vec![other]);
//! ```

pub use crate::broadcast::{Broadcast, BroadcastExt, BroadcastStream};
pub use crate::combine_latest::{
    combine_latest2, combine_latest3, combine_latest_many, CombineLatest, CombineLatestExt,
    CombinedState,
};
pub use braid_core::{BraidError, StreamItem};
