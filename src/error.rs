//! Error types for the decomposition-dispatch-aggregation pipeline.
//!
//! The taxonomy mirrors the propagation policy of the pipeline: only
//! [`Error::InputUnreadable`] ever escapes [`crate::process`]. Every other
//! kind is constructed internally and folded into an
//! [`AggregatedReply`](crate::AggregatedReply)'s `errors` list or a
//! per-chunk [`DispatchResult`](crate::DispatchResult)'s `error` field —
//! see the module docs on [`crate::dispatch`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::StrategyTag;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error kinds surfaced by the pipeline.
///
/// Only [`Error::InputUnreadable`] is ever returned from
/// [`crate::process`]; the rest are recoverable and are encoded into the
/// reply instead of propagated, so callers never see them directly. They
/// still implement [`std::error::Error`] so a host can format, log, or
/// match on them once extracted from a reply.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Descriptor construction failed: the input could not be read.
    #[error("input unreadable: {reason}")]
    InputUnreadable {
        /// File path, when the input originated from one.
        path: Option<PathBuf>,
        /// Human-readable reason (stat failure, permission denied, ...).
        reason: String,
    },

    /// A strategy's `decompose` produced zero chunks for non-empty input.
    ///
    /// Recoverable: the pipeline falls back to `passthrough` and records
    /// this as a warning rather than failing the call.
    #[error("strategy {tag} failed to decompose input: {reason}")]
    StrategyFailure {
        /// The strategy that failed to decompose the input.
        tag: StrategyTag,
        /// Reason decomposition could not proceed.
        reason: String,
    },

    /// A per-task deadline expired before the LM worker replied.
    #[error("task for chunk {chunk_id} timed out after {after:?}")]
    TaskTimeout {
        /// Chunk id of the task that timed out.
        chunk_id: usize,
        /// Configured per-task timeout.
        after: Duration,
    },

    /// The LM worker raised, or returned an invalid value, for a chunk.
    #[error("task for chunk {chunk_id} failed: {reason}")]
    TaskFailure {
        /// Chunk id of the task that failed.
        chunk_id: usize,
        /// Reason reported by the worker or the dispatch boundary.
        reason: String,
    },

    /// Outer cancellation aborted the dispatch before it completed.
    #[error("dispatch cancelled")]
    Cancelled,
}

impl Error {
    /// Chunk id this error is attached to, if any.
    ///
    /// `InputUnreadable`, `StrategyFailure`, and `Cancelled` are
    /// call-level errors with no single associated chunk.
    #[must_use]
    pub const fn chunk_id(&self) -> Option<usize> {
        match self {
            Self::TaskTimeout { chunk_id, .. } | Self::TaskFailure { chunk_id, .. } => {
                Some(*chunk_id)
            }
            Self::InputUnreadable { .. } | Self::StrategyFailure { .. } | Self::Cancelled => None,
        }
    }
}
