//! Generic typed reduction rules shared by strategies whose aggregate step
//! reduces an ordered sequence of per-chunk content values (as opposed to
//! strategies that key their reduction by `parentPath`, such as
//! `file-parallel` and object-rooted JSON — those build their own mapping
//! directly in `crate::strategy::structural::json` / `file_parallel`).
//!
//! Grounded directly on the original system's `aggregate_results`: a
//! type-dispatch on the shape of the successful contents, concatenating
//! strings with `"[Chunk <id>]:\n"` headers, merging disjoint-key
//! mappings, resolving colliding keys last-writer-wins in ascending
//! `chunkId` order, and otherwise falling back to an ordered list.

use serde_json::{Map, Value};

use crate::model::DispatchResult;

/// Reduces successful results (in ascending `chunkId` order) using the
/// four typed rules from §4.6. Failed results (`error.is_some()`) are
/// skipped; their absence is still reflected in the caller's
/// `AggregatedReply` counters, not here.
#[must_use]
pub fn reduce(results: &[DispatchResult]) -> Value {
    let mut ordered: Vec<&DispatchResult> = results.iter().filter(|r| r.error.is_none()).collect();
    ordered.sort_by_key(|r| r.chunk_id);

    if ordered.is_empty() {
        return Value::String(String::new());
    }

    if ordered.iter().all(|r| r.content.is_string()) {
        return Value::String(concat_with_headers(&ordered));
    }

    if ordered.iter().all(|r| r.content.is_object()) {
        return Value::Object(merge_objects(&ordered));
    }

    Value::Array(ordered.iter().map(|r| r.content.clone()).collect())
}

fn concat_with_headers(ordered: &[&DispatchResult]) -> String {
    ordered
        .iter()
        .map(|r| {
            let text = r.content.as_str().unwrap_or_default();
            format!("[Chunk {}]:\n{text}", r.chunk_id)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn merge_objects(ordered: &[&DispatchResult]) -> Map<String, Value> {
    // Disjoint-key and colliding-key merges collapse to the same
    // operation here: a plain `Map` insert is last-writer-wins by
    // construction, and iterating in ascending `chunkId` order (already
    // guaranteed by `ordered`) makes "last writer" mean "highest chunkId"
    // exactly as the colliding-key rule requires. When keys are in fact
    // disjoint this is simply an ordinary merge.
    let mut merged = Map::new();
    for result in ordered {
        if let Some(obj) = result.content.as_object() {
            for (k, v) in obj {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    merged
}
