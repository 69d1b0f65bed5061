//! Property tests for the universal claims of the specification: chunk
//! density, structural identity, and aggregate associativity. These
//! quantify over arbitrary inputs, so `proptest` backs them rather than
//! hand-picked examples.

#![allow(clippy::expect_used, clippy::panic)]

use proptest::prelude::*;
use serde_json::Value;

use ctxfanout::model::DispatchResult;
use ctxfanout::strategy::structural::json as json_strategy;
use ctxfanout::strategy::{token_chunking, DecomposeInput, StrategyConfig};

fn ok_result(chunk_id: usize, content: Value) -> DispatchResult {
    DispatchResult {
        chunk_id,
        content,
        processing: std::time::Duration::from_millis(1),
        model_used: "haiku".to_string(),
        error: None,
    }
}

fn dense_no_gaps(ids: &[usize]) -> bool {
    let mut sorted: Vec<usize> = ids.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, id)| i == *id)
}

proptest! {
    /// For any text and any chunk size, token-chunking's ids form
    /// `0..N-1` with no gaps or duplicates.
    #[test]
    fn token_chunking_ids_are_dense(
        text in ".{0,5000}",
        chunk_size in 1usize..=2000,
    ) {
        let config = StrategyConfig { chunk_size, ..StrategyConfig::default() };
        let chunks = token_chunking::decompose(&DecomposeInput::Text(&text), &config);
        let ids: Vec<usize> = chunks.iter().map(|c| c.id).collect();
        prop_assert!(dense_no_gaps(&ids));
    }

    /// token-chunking never loses or duplicates bytes: rejoining every
    /// chunk's payload in `id` order reproduces the input exactly (overlap
    /// disabled here so rejoining is a plain concatenation).
    #[test]
    fn token_chunking_round_trips_full_content(
        text in ".{0,5000}",
        chunk_size in 1usize..=2000,
    ) {
        let config = StrategyConfig { chunk_size, overlap: 0, ..StrategyConfig::default() };
        let mut chunks = token_chunking::decompose(&DecomposeInput::Text(&text), &config);
        chunks.sort_by_key(|c| c.id);
        let rejoined: String = chunks.iter().map(|c| c.payload.clone()).collect();
        prop_assert_eq!(rejoined, text);
    }

    /// Every chunk's `sizeBytes` stays within `chunkSize` unless flagged
    /// `oversize` — token-chunking sets it only when a single codepoint at
    /// the window boundary is itself wider than `chunkSize`.
    #[test]
    fn token_chunking_respects_size_bound(
        text in ".{0,5000}",
        chunk_size in 1usize..=2000,
    ) {
        let config = StrategyConfig { chunk_size, ..StrategyConfig::default() };
        let chunks = token_chunking::decompose(&DecomposeInput::Text(&text), &config);
        for chunk in &chunks {
            if !chunk.oversize {
                prop_assert!(chunk.size_bytes <= chunk_size);
            }
        }
    }

    /// For an array-rooted JSON document, the multiset of elements
    /// emitted across all chunks equals the multiset of elements in the
    /// input (structural identity, §8).
    #[test]
    fn json_array_decompose_preserves_element_multiset(
        values in prop::collection::vec(0i64..1_000_000, 0..200),
    ) {
        let text = format!("[{}]", values.iter().map(ToString::to_string).collect::<Vec<_>>().join(","));
        let config = StrategyConfig { chunk_size: 40, ..StrategyConfig::default() };
        let chunks = json_strategy::decompose(&text, &config);

        let mut emitted: Vec<i64> = Vec::new();
        for chunk in &chunks {
            let parsed: Value = serde_json::from_str(&chunk.payload).expect("chunk payload is valid json");
            match parsed {
                Value::Array(items) => {
                    for item in items {
                        emitted.push(item.as_i64().expect("element is an integer"));
                    }
                }
                Value::Number(n) => emitted.push(n.as_i64().expect("element is an integer")),
                other => panic!("unexpected chunk payload shape: {other:?}"),
            }
        }
        emitted.sort_unstable();
        let mut expected = values.clone();
        expected.sort_unstable();
        prop_assert_eq!(emitted, expected);
    }

    /// `aggregate(reduce(A ++ B)) == aggregate(reduce(A), reduce(B))`
    /// for the string-concatenation rule: splitting an ordered result
    /// sequence into two disjoint partitions and reducing each half
    /// independently, then concatenating with the same header/separator
    /// convention, reproduces reducing the whole sequence at once.
    #[test]
    fn reduce_is_associative_over_string_partitions(
        parts in prop::collection::vec("[a-z ]{0,20}", 2..12),
        split_at in 1usize..11,
    ) {
        let results: Vec<DispatchResult> = parts
            .iter()
            .enumerate()
            .map(|(id, text)| ok_result(id, Value::String(text.clone())))
            .collect();
        let split = split_at.min(results.len().saturating_sub(1)).max(1);
        prop_assume!(split < results.len());

        let whole = ctxfanout::aggregate::reduce(&results);

        let (left, right) = results.split_at(split);
        // Both halves are non-empty by construction (`split` is clamped to
        // `1..len-1`), so each reduces to a real `"[Chunk n]:\n..."` block
        // rather than the empty-input shorthand — joining them with the
        // same `"\n\n"` separator the whole-sequence reduction uses must
        // reproduce it exactly.
        let left_reduced = ctxfanout::aggregate::reduce(left);
        let right_reduced = ctxfanout::aggregate::reduce(right);
        let left_text = left_reduced.as_str().unwrap_or_default();
        let right_text = right_reduced.as_str().unwrap_or_default();
        let recombined = format!("{left_text}\n\n{right_text}");

        prop_assert_eq!(whole.as_str().unwrap_or_default(), recombined);
    }
}
