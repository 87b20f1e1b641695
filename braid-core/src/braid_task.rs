// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Runtime-agnostic task spawning with cooperative cancellation.

use crate::CancellationToken;
use core::future::Future;

/// Runtime-agnostic task handle with automatic cancellation on drop.
///
/// `BraidTask` spawns a background task on the configured runtime and hands it
/// a [`CancellationToken`]. Dropping the handle, or calling [`cancel`], signals
/// the token; the task is expected to observe it at its next suspension point.
///
/// # Runtime Support
///
/// - **Tokio**: `tokio::spawn` (default, `runtime-tokio`)
/// - **smol**: `smol::spawn` (`runtime-smol`)
/// - **async-std**: `async_std::task::spawn` (`runtime-async-std`)
///
/// # Example
///
/// ```rust
/// use braid_core::BraidTask;
///
/// # #[tokio::main]
/// # async fn main() {
/// let task = BraidTask::spawn(|cancel| async move {
///     cancel.cancelled().await;
/// });
///
/// // Task cancels on drop
/// drop(task);
/// # }
/// ```
///
/// [`cancel`]: BraidTask::cancel
#[derive(Debug)]
pub struct BraidTask {
    cancel: CancellationToken,
}

impl BraidTask {
    /// Spawn a background task with cancellation support.
    ///
    /// The closure receives the task's `CancellationToken` and returns the
    /// future to run.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let future = f(cancel.clone());

        #[cfg(feature = "runtime-tokio")]
        {
            tokio::spawn(future);
        }

        #[cfg(all(feature = "runtime-smol", not(feature = "runtime-tokio")))]
        {
            smol::spawn(future).detach();
        }

        #[cfg(all(
            feature = "runtime-async-std",
            not(feature = "runtime-tokio"),
            not(feature = "runtime-smol")
        ))]
        {
            async_std::task::spawn(future);
        }

        #[cfg(not(any(
            feature = "runtime-tokio",
            feature = "runtime-smol",
            feature = "runtime-async-std"
        )))]
        {
            compile_error!(
                "braid-core needs one of runtime-tokio, runtime-smol or runtime-async-std"
            );
        }

        Self { cancel }
    }

    /// Signal the task to stop.
    ///
    /// Does not wait for it to complete; the task stops at its next
    /// cancellation checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for BraidTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
