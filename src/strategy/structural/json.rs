//! JSON structural decomposition: one chunk per array element (small
//! consecutive elements grouped together), or one chunk per top-level
//! object key, recursing into oversize array-valued keys.
//!
//! "Small" is defined relative to `chunkSize` (1% of it) rather than an
//! absolute constant, so the grouping threshold scales with the caller's
//! configured chunk size — see `DESIGN.md`'s Open Question decisions for
//! why this particular cutoff was chosen (it is what makes the 1000-chunk
//! structural JSON scenario produce exactly one chunk per element).

use rayon::prelude::*;
use serde_json::Value;

use crate::model::{Chunk, DispatchResult};
use crate::strategy::{StrategyConfig, StrategyTag};

/// Fraction of `chunkSize` below which an array element is considered
/// "small" enough to be grouped with its neighbours.
const SMALL_ELEMENT_FRACTION: usize = 100;

/// Parses `text` as JSON and decomposes it per the root's shape. Returns
/// zero chunks (triggering the caller's `StrategyFailure` fallback) if
/// `text` does not parse as JSON, or its root is neither an array nor an
/// object.
#[must_use]
pub fn decompose(text: &str, config: &StrategyConfig) -> Vec<Chunk> {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => decompose_array(&items, config, "").0,
        Value::Object(map) => decompose_object(&map, config),
        _ => Vec::new(),
    }
}

/// Decomposes an array of JSON values, returning the produced chunks and
/// the next free chunk id (so callers composing multiple arrays, e.g. one
/// per object key, can keep ids dense across the whole document).
fn decompose_array(items: &[Value], config: &StrategyConfig, base_pointer: &str) -> (Vec<Chunk>, usize) {
    let chunk_size = config.chunk_size.max(1);
    let small_threshold = (chunk_size / SMALL_ELEMENT_FRACTION).max(1);

    let mut chunks = Vec::new();
    let mut pending: Vec<(usize, String)> = Vec::new();
    let mut pending_size = 0usize;
    let mut id = 0usize;

    let mut flush = |pending: &mut Vec<(usize, String)>, pending_size: &mut usize, chunks: &mut Vec<Chunk>, id: &mut usize| {
        if pending.is_empty() {
            return;
        }
        let first_idx = pending[0].0;
        let last_idx = pending.last().map_or(first_idx, |(i, _)| *i);
        let payload = format!("[{}]", pending.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join(","));
        let pointer = if first_idx == last_idx {
            format!("{base_pointer}/{first_idx}")
        } else {
            format!("{base_pointer}/{first_idx}-{last_idx}")
        };
        chunks.push(Chunk::new(*id, StrategyTag::StructuralDecomp, payload).with_parent_path(pointer));
        *id += 1;
        pending.clear();
        *pending_size = 0;
    };

    for (idx, item) in items.iter().enumerate() {
        let serialized = serde_json::to_string(item).unwrap_or_default();
        let size = serialized.len();

        if size >= small_threshold {
            flush(&mut pending, &mut pending_size, &mut chunks, &mut id);
            let oversize = size > chunk_size;
            chunks.push(
                Chunk::new(id, StrategyTag::StructuralDecomp, serialized)
                    .with_parent_path(format!("{base_pointer}/{idx}"))
                    .with_oversize(oversize),
            );
            id += 1;
            continue;
        }

        if pending_size + size > chunk_size && !pending.is_empty() {
            flush(&mut pending, &mut pending_size, &mut chunks, &mut id);
        }
        pending_size += size;
        pending.push((idx, serialized));
    }
    flush(&mut pending, &mut pending_size, &mut chunks, &mut id);

    (chunks, id)
}

/// One top-level key's decomposition, before chunk ids are assigned.
/// Keys are independent of one another, so their serialization and any
/// array recursion runs in parallel via rayon; ids are reassigned
/// afterwards in a sequential pass to keep output order deterministic
/// regardless of which key's worker finishes first.
enum KeyChunks {
    Single(Chunk),
    Recursed(Vec<Chunk>),
}

fn decompose_object(map: &serde_json::Map<String, Value>, config: &StrategyConfig) -> Vec<Chunk> {
    let chunk_size = config.chunk_size.max(1);
    let entries: Vec<(&String, &Value)> = map.iter().collect();

    let per_key: Vec<KeyChunks> = entries
        .par_iter()
        .map(|(key, value)| {
            let serialized = serde_json::to_string(value).unwrap_or_default();
            if let Value::Array(items) = value {
                if serialized.len() > chunk_size {
                    let base_pointer = format!("/{key}");
                    let (sub_chunks, _) = decompose_array(items, config, &base_pointer);
                    return KeyChunks::Recursed(sub_chunks);
                }
            }
            KeyChunks::Single(
                Chunk::new(0, StrategyTag::StructuralDecomp, serialized).with_parent_path(format!("/{key}")),
            )
        })
        .collect();

    let mut chunks = Vec::new();
    let mut next_id = 0usize;
    for key_chunks in per_key {
        match key_chunks {
            KeyChunks::Single(mut chunk) => {
                chunk.id = next_id;
                next_id += 1;
                chunks.push(chunk);
            }
            KeyChunks::Recursed(mut sub_chunks) => {
                for chunk in &mut sub_chunks {
                    chunk.id = next_id;
                    next_id += 1;
                }
                chunks.extend(sub_chunks);
            }
        }
    }

    chunks
}

/// Top-level key a chunk's `parentPath` belongs to, e.g. `/tags/0-3` ->
/// `tags`.
fn top_level_key(parent_path: &str) -> Option<&str> {
    parent_path.strip_prefix('/')?.split('/').next()
}

/// True iff `parent_path`'s top-level segment is a bare array index or
/// index range (`0`, `5-9`) rather than an object key name — the shape
/// [`decompose_array`] assigns at the document root, as opposed to the
/// key name [`decompose_object`] assigns.
#[must_use]
pub fn top_level_segment_is_array_index(parent_path: &str) -> bool {
    let Some(segment) = top_level_key(parent_path) else {
        return false;
    };
    let mut parts = segment.splitn(2, '-');
    let first_is_digits = parts.next().is_some_and(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    let rest_is_digits_or_absent = parts.next().is_none_or(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    first_is_digits && rest_is_digits_or_absent
}

/// Merges object-rooted results per top-level key: a key that produced a
/// single chunk contributes its content directly; a key recursed into
/// multiple array sub-chunks contributes an array of their contents in
/// ascending `chunkId` order.
#[must_use]
pub fn aggregate_object_rooted(results: &[DispatchResult], chunks: &[Chunk]) -> Value {
    use std::collections::BTreeMap;

    let mut by_id: std::collections::HashMap<usize, &Chunk> = chunks.iter().map(|c| (c.id, c)).collect();
    let mut per_key: BTreeMap<String, Vec<(usize, Value)>> = BTreeMap::new();

    let mut ordered: Vec<&DispatchResult> = results.iter().filter(|r| r.error.is_none()).collect();
    ordered.sort_by_key(|r| r.chunk_id);

    for result in ordered {
        let Some(chunk) = by_id.remove(&result.chunk_id) else {
            continue;
        };
        let Some(parent_path) = &chunk.parent_path else {
            continue;
        };
        let Some(key) = top_level_key(parent_path) else {
            continue;
        };
        per_key
            .entry(key.to_string())
            .or_default()
            .push((result.chunk_id, result.content.clone()));
    }

    let mut merged = serde_json::Map::new();
    for (key, mut entries) in per_key {
        entries.sort_by_key(|(id, _)| *id);
        let value = if entries.len() == 1 {
            entries.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null)
        } else {
            Value::Array(entries.into_iter().map(|(_, v)| v).collect())
        };
        merged.insert(key, value);
    }
    Value::Object(merged)
}
