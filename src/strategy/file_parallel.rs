//! Treats each file in a multi-file bundle as one chunk, dispatched with
//! concurrency `min(filesCount, maxConcurrentAgents)` (selected by the
//! router, not this module — see `crate::router`).

use serde_json::{Map, Value};

use crate::model::{Chunk, DispatchResult};
use crate::strategy::{DecomposeInput, StrategyTag};

/// Emits one chunk per file, `parentPath` set to the file's identifier
/// (its path as supplied in the input) so aggregation can key results by
/// file.
#[must_use]
pub fn decompose(input: &DecomposeInput<'_>) -> Vec<Chunk> {
    let DecomposeInput::Files(files) = input else {
        return Vec::new();
    };
    files
        .iter()
        .enumerate()
        .map(|(id, (path, content))| {
            Chunk::new(id, StrategyTag::FileParallel, content.clone()).with_parent_path(path.clone())
        })
        .collect()
}

/// Builds a mapping from each file's identifier (`parentPath`) to its
/// result content. Failed chunks are omitted from the mapping; their
/// failure is still recorded in the caller's `errors` list.
#[must_use]
pub fn aggregate(results: &[DispatchResult], chunks: &[Chunk]) -> Value {
    let mut by_id: std::collections::HashMap<usize, &Chunk> =
        chunks.iter().map(|c| (c.id, c)).collect();
    let mut mapping = Map::new();

    let mut ordered: Vec<&DispatchResult> = results.iter().filter(|r| r.error.is_none()).collect();
    ordered.sort_by_key(|r| r.chunk_id);

    for result in ordered {
        if let Some(chunk) = by_id.remove(&result.chunk_id) {
            let key = chunk.parent_path.clone().unwrap_or_else(|| chunk.id.to_string());
            mapping.insert(key, result.content.clone());
        }
    }

    Value::Object(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn files() -> Vec<(String, String)> {
        vec![
            ("a.txt".to_string(), "content a".to_string()),
            ("b.txt".to_string(), "content b".to_string()),
        ]
    }

    #[test]
    fn one_chunk_per_file_with_parent_path_set() {
        let f = files();
        let chunks = decompose(&DecomposeInput::Files(&f));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].parent_path.as_deref(), Some("a.txt"));
        assert_eq!(chunks[1].parent_path.as_deref(), Some("b.txt"));
    }

    #[test]
    fn text_input_yields_no_chunks() {
        let chunks = decompose(&DecomposeInput::Text("ignored"));
        assert!(chunks.is_empty());
    }

    #[test]
    fn aggregate_maps_file_path_to_content() {
        let f = files();
        let chunks = decompose(&DecomposeInput::Files(&f));
        let results = vec![
            DispatchResult {
                chunk_id: 0,
                content: Value::String("summary a".to_string()),
                processing: Duration::from_millis(1),
                model_used: "haiku".to_string(),
                error: None,
            },
            DispatchResult {
                chunk_id: 1,
                content: Value::String("summary b".to_string()),
                processing: Duration::from_millis(1),
                model_used: "haiku".to_string(),
                error: None,
            },
        ];
        let aggregated = aggregate(&results, &chunks);
        let obj = aggregated.as_object().expect("object");
        assert_eq!(obj.get("a.txt"), Some(&Value::String("summary a".to_string())));
        assert_eq!(obj.get("b.txt"), Some(&Value::String("summary b".to_string())));
    }

    #[test]
    fn failed_file_is_omitted_from_mapping() {
        let f = files();
        let chunks = decompose(&DecomposeInput::Files(&f));
        let results = vec![DispatchResult {
            chunk_id: 0,
            content: Value::String("summary a".to_string()),
            processing: Duration::from_millis(1),
            model_used: "haiku".to_string(),
            error: None,
        }];
        let aggregated = aggregate(&results, &chunks);
        let obj = aggregated.as_object().expect("object");
        assert_eq!(obj.len(), 1);
        assert!(!obj.contains_key("b.txt"));
    }
}
