//! Splits the raw byte stream into contiguous character windows, the
//! default decomposition for large unstructured text.
//!
//! Grounded on the donor's `FixedChunker::chunk` boundary-retraction loop
//! (`chunking/fixed.rs`), simplified to this spec's literal rule: windows
//! of `chunkSize` characters with `overlap` characters of overlap, and no
//! line-aware boundary search (that heuristic belongs to `file-chunking`
//! instead).

use serde_json::Value;

use crate::io::{find_char_boundary, find_char_boundary_forward};
use crate::model::Chunk;
use crate::strategy::{DecomposeInput, StrategyConfig, StrategyTag};

/// Splits `input` into fixed-size, codepoint-boundary-safe windows.
///
/// Total and deterministic: a single window is returned for empty text
/// (one zero-length chunk is never emitted — empty input yields one chunk
/// whose payload is the empty string, matching passthrough's scenario 1
/// shape, since `token-chunking` never fires for `estimatedTokens == 0`
/// per the router's rule 1 anyway).
#[must_use]
pub fn decompose(input: &DecomposeInput<'_>, config: &StrategyConfig) -> Vec<Chunk> {
    let Some(text) = input.as_text() else {
        return Vec::new();
    };
    if text.is_empty() {
        return vec![Chunk::new(0, StrategyTag::TokenChunking, String::new())];
    }

    let chunk_size = config.chunk_size.max(1);
    let overlap = config.overlap.min(chunk_size.saturating_sub(1));

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut id = 0usize;

    while start < text.len() {
        let target_end = (start + chunk_size).min(text.len());
        let backward = find_char_boundary(text, target_end);
        // `start` is itself a boundary, so retracting to or past it means the
        // codepoint beginning at `start` is wider than `chunk_size` alone.
        // Advance forward instead of slicing mid-codepoint, and let this one
        // chunk run oversize rather than panicking on a non-boundary index.
        let (end, oversize) = if backward > start {
            (backward, false)
        } else {
            (find_char_boundary_forward(text, target_end), true)
        };

        let payload = text[start..end].to_string();
        chunks.push(Chunk::new(id, StrategyTag::TokenChunking, payload).with_oversize(oversize));
        id += 1;

        if end >= text.len() {
            break;
        }
        let next_start = end.saturating_sub(overlap);
        // Guard against a zero-overlap boundary retraction stalling progress.
        start = if next_start > start { next_start } else { end };
    }

    chunks
}

/// Concatenates successful results in `id` order.
#[must_use]
pub fn aggregate(results: &[crate::model::DispatchResult]) -> Value {
    crate::aggregate::reduce(results)
}
