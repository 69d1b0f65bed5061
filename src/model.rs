//! Core data types shared across the pipeline: descriptors, chunks, tasks,
//! per-chunk results, and the final aggregated reply.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StrategyTag;

/// Where an input's bytes came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// A single file on disk.
    FilePath(PathBuf),
    /// An in-memory blob supplied directly by the caller.
    InMemory,
}

/// Coarse classification of an input's content, used by the router and by
/// `structural-decomp` to pick a sub-strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataKind {
    /// JSON document (array- or object-rooted).
    Json,
    /// Comma-separated values with a header row.
    Csv,
    /// Line-oriented log output with timestamp-prefixed lines.
    Log,
    /// Source code in a recognised language.
    Code,
    /// Plain text with no recognised structure.
    Text,
    /// Content that does not decode as UTF-8 or looks binary.
    Binary,
    /// No sniffing was possible (degenerate/empty input).
    Unknown,
}

/// Size/shape metadata summarising an input, built once per call and
/// discarded after routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDescriptor {
    /// Where the bytes came from.
    pub origin: Origin,
    /// Total size of the input in bytes.
    pub total_bytes: u64,
    /// Estimated token count (see [`crate::estimator`]).
    pub estimated_tokens: u64,
    /// Coarse content classification.
    pub data_kind: DataKind,
    /// Number of files, when the input is a multi-file bundle (>= 1).
    pub files_count: usize,
    /// True iff the payload parses as a structured form matching `data_kind`.
    pub has_structure: bool,
}

/// A self-describing, bounded sub-input produced by a strategy.
///
/// Chunks are immutable once emitted: a strategy never mutates a `Chunk`
/// after handing it to the agent manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// 0-based dense index within the input. `ids` always form `0..N-1`.
    pub id: usize,
    /// Tag mirroring the producing strategy, consulted by the aggregator.
    pub kind: StrategyTag,
    /// The bytes or structured fragment the LM worker will see.
    pub payload: String,
    /// Optional locator (file path, JSON pointer) carried into aggregation.
    pub parent_path: Option<String>,
    /// Size of `payload` in bytes. Telemetry only.
    pub size_bytes: usize,
    /// Estimated token count of `payload`. Telemetry only.
    pub estimated_tokens: u64,
    /// Set when a single logical record could not be split further and
    /// exceeds the configured `chunkSize`.
    pub oversize: bool,
}

impl Chunk {
    /// Builds a chunk, computing `size_bytes` and `estimated_tokens` from
    /// `payload`.
    #[must_use]
    pub fn new(id: usize, kind: StrategyTag, payload: String) -> Self {
        let size_bytes = payload.len();
        let estimated_tokens = crate::estimator::estimate_tokens(&payload);
        Self {
            id,
            kind,
            payload,
            parent_path: None,
            size_bytes,
            estimated_tokens,
            oversize: false,
        }
    }

    /// Attaches a parent locator (file path, JSON pointer) to the chunk.
    #[must_use]
    pub fn with_parent_path(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = Some(parent_path.into());
        self
    }

    /// Marks the chunk as an oversize single logical record.
    #[must_use]
    pub const fn with_oversize(mut self, oversize: bool) -> Self {
        self.oversize = oversize;
        self
    }
}

/// What kind of work a [`ChunkTask`] represents, controlling model
/// selection in the agent manager (see `crate::dispatch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Extract information from a chunk without a specific user question.
    Extract,
    /// Answer a user-supplied query against a chunk.
    Query,
    /// Analyse a chunk in depth. Reserved for future strategies.
    Analyse,
    /// Synthesise across chunks. Reserved for future strategies.
    Synthesise,
}

/// A dispatchable unit wrapping a [`Chunk`] with an optional user query and
/// a [`TaskKind`] controlling model selection.
#[derive(Debug, Clone)]
pub struct ChunkTask {
    /// The chunk this task processes.
    pub chunk: Chunk,
    /// The user's query, if any was supplied to `process`.
    pub query: Option<String>,
    /// What kind of work this task represents.
    pub task_kind: TaskKind,
}

/// Output of dispatching one [`ChunkTask`] to the LM worker.
///
/// Exactly one `DispatchResult` is produced per dispatched task, even on
/// failure: the error path yields a result with `error.is_some()` and
/// `content` left at its default (`Value::Null`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    /// Matches the dispatched [`Chunk::id`].
    pub chunk_id: usize,
    /// Structured or textual reply from the LM worker. May be `Null` on
    /// failure.
    pub content: Value,
    /// Wall-clock time spent on this task.
    pub processing: Duration,
    /// Opaque model tag selected for this task.
    pub model_used: String,
    /// Populated error descriptor on failure.
    pub error: Option<ErrorDescriptor>,
}

/// A serialisable, non-propagating view of an [`crate::Error`], suitable
/// for embedding in an [`AggregatedReply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// Stable error kind name (e.g. `"timeout"`, `"task-failure"`).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

impl From<&crate::Error> for ErrorDescriptor {
    fn from(err: &crate::Error) -> Self {
        let kind = match err {
            crate::Error::InputUnreadable { .. } => "input-unreadable",
            crate::Error::StrategyFailure { .. } => "strategy-failure",
            crate::Error::TaskTimeout { .. } => "timeout",
            crate::Error::TaskFailure { .. } => "task-failure",
            crate::Error::Cancelled => "cancelled",
        };
        Self {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

/// One entry in [`AggregatedReply::errors`]: the chunk a failure applied to
/// and its descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkError {
    /// Chunk id the error applies to.
    pub chunk_id: usize,
    /// The error descriptor.
    pub error: ErrorDescriptor,
}

/// Final output of a call to [`crate::process`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedReply {
    /// The reduced content: text, a mapping, or an ordered sequence,
    /// depending on which strategy produced it (see `crate::aggregate`).
    pub aggregated: Value,
    /// Number of chunks that completed without error.
    pub chunks_processed: usize,
    /// Number of chunks that failed (timeout, task failure, or a
    /// strategy-failure fallback warning).
    pub chunks_failed: usize,
    /// Sum of per-task durations across all chunks.
    pub total_processing_millis: u128,
    /// Failures observed, each tied to the chunk it occurred on.
    pub errors: Vec<ChunkError>,
}

/// Input variants accepted by [`crate::process`].
#[derive(Debug, Clone)]
pub enum Input {
    /// Read content from a single file path.
    FilePath(PathBuf),
    /// Process an in-memory string directly.
    Content(String),
    /// Process a bundle of files, routed independently of their individual
    /// sizes (see the `file-parallel` strategy).
    Files(Vec<PathBuf>),
}

/// Per-call options, layered over [`crate::RouterConfig`] (see
/// `crate::router` for the resolution order against environment defaults).
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// User query passed through to the LM worker's prompt.
    pub query: Option<String>,
    /// Overrides the router's strategy selection.
    pub strategy: Option<StrategyTag>,
    /// Per-task timeout. Defaults to 60 seconds when unset.
    pub timeout: Option<Duration>,
    /// Router configuration overrides for this call only.
    pub router: crate::router::RouterConfig,
}
