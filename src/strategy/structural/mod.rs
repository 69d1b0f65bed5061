//! `structural-decomp`: data-kind-aware decomposition that splits an
//! input along its *logical* records (JSON elements/keys, CSV rows, log
//! lines, code declarations) instead of raw byte windows.

pub mod code;
pub mod csv;
pub mod json;
pub mod log;

use serde_json::Value;

use crate::model::{Chunk, DataKind, DispatchResult};
use crate::strategy::{DecomposeInput, StrategyConfig};

/// Dispatches decomposition to the sub-strategy matching `data_kind`.
/// Data kinds with no structural sub-strategy (text, binary, unknown)
/// yield zero chunks, signalling a `StrategyFailure` fallback to the
/// caller — the router never selects `structural-decomp` for those kinds
/// (rule 3 of §4.3 requires `dataKind ∈ {json, csv, log, code}`), so this
/// only matters for a direct strategy override.
#[must_use]
pub fn decompose(
    data_kind: DataKind,
    input: &DecomposeInput<'_>,
    config: &StrategyConfig,
) -> Vec<Chunk> {
    let Some(text) = input.as_text() else {
        return Vec::new();
    };
    match data_kind {
        DataKind::Json => json::decompose(text, config),
        DataKind::Csv => csv::decompose(text, config),
        DataKind::Log => log::decompose(text, config),
        DataKind::Code => code::decompose(text, config),
        DataKind::Text | DataKind::Binary | DataKind::Unknown => Vec::new(),
    }
}

/// Dispatches aggregation: object-rooted JSON merges per-key results into
/// one mapping (keyed by `parentPath`, the JSON pointer); everything else
/// (array-rooted JSON, CSV, log, code) concatenates/merges via the
/// generic typed rules in `crate::aggregate`.
///
/// Array-rooted JSON also carries a `parentPath` per chunk (`/0`,
/// `/5-9`, ...), so "has a parent path" alone cannot distinguish the two
/// roots: an object key's top-level pointer segment is the key name
/// itself, while an array element's is a bare index or index range. Only
/// the latter shape is special-cased away from the object merge.
#[must_use]
pub fn aggregate(results: &[DispatchResult], chunks: &[Chunk]) -> Value {
    let object_rooted = chunks.iter().any(|c| {
        c.parent_path
            .as_deref()
            .is_some_and(|p| p.starts_with('/') && !json::top_level_segment_is_array_index(p))
    });
    if object_rooted {
        json::aggregate_object_rooted(results, chunks)
    } else {
        crate::aggregate::reduce(results)
    }
}
