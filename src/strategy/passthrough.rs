//! The sentinel strategy used when the router declines activation: one
//! chunk, one LM call, direct reply.

use serde_json::Value;

use crate::model::{Chunk, DispatchResult};
use crate::strategy::{DecomposeInput, StrategyTag};

/// Emits a single chunk carrying the full input.
///
/// `Files` input has no single-blob representation; passthrough is never
/// selected by the router for multi-file bundles (rule 2 of §4.3 fires
/// first), but if asked to anyway it degrades to zero chunks rather than
/// guessing which file to carry.
#[must_use]
pub fn decompose(input: &DecomposeInput<'_>) -> Vec<Chunk> {
    match input.as_text() {
        Some(text) => vec![Chunk::new(0, StrategyTag::Passthrough, text.to_string())],
        None => Vec::new(),
    }
}

/// Unwraps the single chunk's result. An empty or failed dispatch
/// produces an empty string, consistent with scenario 1 of §8 (empty
/// input -> `aggregated = ""`).
#[must_use]
pub fn aggregate(results: &[DispatchResult]) -> Value {
    results
        .iter()
        .find(|r| r.chunk_id == 0 && r.error.is_none())
        .map_or_else(|| Value::String(String::new()), |r| r.content.clone())
}
