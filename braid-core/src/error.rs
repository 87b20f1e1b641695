// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the braid stream engines.
//!
//! Every engine has a single declared failure type, [`BraidError`]. Upstream
//! failures travel in-band as [`StreamItem::Error`](crate::StreamItem::Error)
//! and are delivered to consumers exactly once before the stream terminates.
//! Cancellation is never represented as an error: a cancelled consumer simply
//! observes the end of the stream.
//!
//! # Examples
//!
//! ```
//! use braid_core::{BraidError, Result};
//!
//! fn process_data() -> Result<()> {
//!     Err(BraidError::stream_error("Stream not ready"))
//! }
//! ```

/// Root error type for all braid operations.
#[derive(Debug, thiserror::Error)]
pub enum BraidError {
    /// Stream processing encountered an error
    ///
    /// This is the general error for upstream failures that don't carry a
    /// more specific source.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong during stream processing
        context: String,
    },

    /// Custom error from user code
    ///
    /// This wraps errors produced by user-provided upstreams so they can be
    /// propagated through the engines.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BraidError {
    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }
}

/// Specialized Result type for braid operations
pub type Result<T> = std::result::Result<T, BraidError>;

// Broadcast mirrors one upstream failure to every side, so the error has to be
// duplicable. A boxed user error cannot be cloned and is flattened to its text.
impl Clone for BraidError {
    fn clone(&self) -> Self {
        match self {
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
        }
    }
}
