//! The strategy family: a closed set of decomposition/aggregation
//! strategies selected by the activation router.
//!
//! Deliberately *not* a string-keyed factory (`create_chunker(name: &str)`
//! in the donor chunking module): [`StrategyTag`] is a closed enum and
//! dispatch happens through an exhaustive `match`, so an unrecognised tag
//! from user input is a type error at the config layer, not a runtime
//! lookup miss.

pub mod file_chunking;
pub mod file_parallel;
pub mod passthrough;
pub mod structural;
pub mod token_chunking;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{Chunk, ContextDescriptor, DispatchResult};

/// Closed set of strategies. `Passthrough` is the sentinel used when the
/// router declines activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyTag {
    /// One chunk, carrying the full input.
    Passthrough,
    /// Contiguous fixed-size windows over the raw byte stream.
    TokenChunking,
    /// Line-aligned windows over a single file.
    FileChunking,
    /// Data-kind-aware decomposition (json/csv/log/code).
    StructuralDecomp,
    /// One chunk per file in a multi-file bundle.
    FileParallel,
}

impl StrategyTag {
    /// Stable, kebab-case wire name, matching the closed set named in the
    /// data model (`{passthrough, token-chunking, file-chunking,
    /// structural-decomp, file-parallel}`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::TokenChunking => "token-chunking",
            Self::FileChunking => "file-chunking",
            Self::StructuralDecomp => "structural-decomp",
            Self::FileParallel => "file-parallel",
        }
    }

    /// Parses a tag from its wire name. Unlike the donor's
    /// `create_chunker`, an unrecognised name does not fail here — callers
    /// that need "unknown tag falls back to a documented default" (the
    /// router's own rule) should use [`StrategyTag::or_default_on_unknown`]
    /// instead of surfacing a parse error.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "passthrough" => Some(Self::Passthrough),
            "token-chunking" => Some(Self::TokenChunking),
            "file-chunking" => Some(Self::FileChunking),
            "structural-decomp" => Some(Self::StructuralDecomp),
            "file-parallel" => Some(Self::FileParallel),
            _ => None,
        }
    }

    /// Parses a tag, falling back to `token-chunking` (the documented
    /// default strategy) for any unrecognised name. This preserves
    /// availability per the router's config contract (§4.3): a bad
    /// override from user input never fails the call.
    #[must_use]
    pub fn or_default_on_unknown(name: &str) -> Self {
        Self::parse(name).unwrap_or(Self::TokenChunking)
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tag configuration, resolved by the router from [`crate::RouterConfig`]
/// and any per-call override.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Target chunk size in characters (token-chunking) or bytes (the
    /// other size-bounded strategies). Default 50 000 per §4.4.
    pub chunk_size: usize,
    /// Overlap, in characters, between consecutive token-chunking windows.
    /// Default 0 (the source's own default, preserved — see
    /// `DESIGN.md`'s Open Question (c)).
    pub overlap: usize,
    /// Upper bound on concurrent LM-worker calls for this dispatch.
    pub max_concurrent_agents: usize,
    /// Context window budget, informational for strategies that size
    /// chunks relative to it.
    pub context_window_tokens: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50_000,
            overlap: 0,
            max_concurrent_agents: 8,
            context_window_tokens: 200_000,
        }
    }
}

/// Dispatches to the `decompose` operation of the strategy named by `tag`.
///
/// Total and deterministic per §4.4: a strategy that cannot structurally
/// decompose its input returns zero chunks rather than panicking or
/// raising; an empty result is the caller's (`crate::process`) signal to
/// fall back to `passthrough` with a recorded [`Error::StrategyFailure`].
pub fn decompose(
    tag: StrategyTag,
    descriptor: &ContextDescriptor,
    input: &DecomposeInput<'_>,
    config: &StrategyConfig,
) -> Vec<Chunk> {
    match tag {
        StrategyTag::Passthrough => passthrough::decompose(input),
        StrategyTag::TokenChunking => token_chunking::decompose(input, config),
        StrategyTag::FileChunking => file_chunking::decompose(input, config),
        StrategyTag::StructuralDecomp => {
            structural::decompose(descriptor.data_kind, input, config)
        }
        StrategyTag::FileParallel => file_parallel::decompose(input),
    }
}

/// Dispatches to the `aggregate` operation of the strategy named by `tag`.
#[must_use]
pub fn aggregate(
    tag: StrategyTag,
    results: &[DispatchResult],
    chunks: &[Chunk],
) -> serde_json::Value {
    match tag {
        StrategyTag::Passthrough => passthrough::aggregate(results),
        StrategyTag::TokenChunking => token_chunking::aggregate(results),
        StrategyTag::FileChunking => file_chunking::aggregate(results),
        StrategyTag::StructuralDecomp => structural::aggregate(results, chunks),
        StrategyTag::FileParallel => file_parallel::aggregate(results, chunks),
    }
}

/// The raw material a strategy decomposes. Strategies never read from
/// disk themselves beyond what this carries; `crate::process` is
/// responsible for resolving [`crate::Input`] into one of these.
pub enum DecomposeInput<'a> {
    /// A single blob of text (from a file or supplied directly).
    Text(&'a str),
    /// A multi-file bundle: (path, content) pairs, in input order.
    Files(&'a [(String, String)]),
}

impl<'a> DecomposeInput<'a> {
    /// Borrows the input as a single text blob when it is one. Structural
    /// and token/file-chunking strategies only operate on `Text`; called
    /// with `Files`, they treat the input as having produced zero chunks
    /// (a `StrategyFailure`), since those strategies do not define a
    /// multi-file decomposition.
    #[must_use]
    pub const fn as_text(&self) -> Option<&'a str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Files(_) => None,
        }
    }
}

/// Converts an internal pipeline [`Error`] into the recorded-warning shape
/// used when a strategy produces zero chunks: a [`Error::StrategyFailure`]
/// describing why, so `crate::process` can fall back to `passthrough`.
#[must_use]
pub fn strategy_failure(tag: StrategyTag, reason: impl Into<String>) -> Error {
    Error::StrategyFailure {
        tag,
        reason: reason.into(),
    }
}
