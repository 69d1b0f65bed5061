//! Line-aligned windows over a single file, chosen by the router for
//! large unstructured single-file input that still has line boundaries
//! worth respecting (as opposed to `token-chunking`'s raw character
//! windows).
//!
//! Grounded on `crate::io::unicode::lines_with_offsets` for line
//! boundary/offset tracking, generalizing the donor's `line_aware` mode
//! in `chunking/fixed.rs::FixedChunker`.

use serde_json::Value;

use crate::io::lines_with_offsets;
use crate::model::Chunk;
use crate::strategy::{DecomposeInput, StrategyConfig, StrategyTag};

/// Emits windows of whole lines whose combined byte length is at most
/// `chunk_size`. A line that alone exceeds `chunk_size` is emitted as its
/// own oversize chunk rather than split mid-line.
#[must_use]
pub fn decompose(input: &DecomposeInput<'_>, config: &StrategyConfig) -> Vec<Chunk> {
    let Some(text) = input.as_text() else {
        return Vec::new();
    };
    if text.is_empty() {
        return vec![Chunk::new(0, StrategyTag::FileChunking, String::new())];
    }

    let chunk_size = config.chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut id = 0usize;

    for (_, line) in lines_with_offsets(text) {
        let line_len = line.len() + 1; // account for the newline this strategy re-adds

        if line_len > chunk_size {
            if !current.is_empty() {
                chunks.push(Chunk::new(id, StrategyTag::FileChunking, std::mem::take(&mut current)));
                id += 1;
            }
            chunks.push(
                Chunk::new(id, StrategyTag::FileChunking, line.to_string()).with_oversize(true),
            );
            id += 1;
            continue;
        }

        if current.len() + line_len > chunk_size && !current.is_empty() {
            chunks.push(Chunk::new(id, StrategyTag::FileChunking, std::mem::take(&mut current)));
            id += 1;
        }

        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        chunks.push(Chunk::new(id, StrategyTag::FileChunking, current));
    }

    if chunks.is_empty() {
        chunks.push(Chunk::new(0, StrategyTag::FileChunking, text.to_string()));
    }

    chunks
}

/// Concatenates successful results in `id` order.
#[must_use]
pub fn aggregate(results: &[crate::model::DispatchResult]) -> Value {
    crate::aggregate::reduce(results)
}
