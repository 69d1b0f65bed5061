//! CSV structural decomposition: groups of whole rows bounded by
//! `chunkSize` bytes, with the header row repeated as a prefix in every
//! chunk's payload so each chunk remains independently parseable.

use serde_json::Value;

use crate::model::Chunk;
use crate::strategy::{StrategyConfig, StrategyTag};

/// Splits `text` into row-aligned windows. The first line is treated as
/// the header and prepended to every chunk. A single row that alone (with
/// the header) exceeds `chunk_size` is still emitted as its own oversize
/// chunk rather than split mid-row.
#[must_use]
pub fn decompose(text: &str, config: &StrategyConfig) -> Vec<Chunk> {
    let mut lines = text.lines();
    let Some(header) = lines.next() else {
        return vec![Chunk::new(0, StrategyTag::StructuralDecomp, String::new())];
    };

    let chunk_size = config.chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current_rows: Vec<&str> = Vec::new();
    let mut current_size = header.len() + 1;
    let mut id = 0usize;

    let flush = |rows: &mut Vec<&str>, chunks: &mut Vec<Chunk>, id: &mut usize, oversize: bool| {
        if rows.is_empty() {
            return;
        }
        let mut payload = String::from(header);
        payload.push('\n');
        for row in rows.iter() {
            payload.push_str(row);
            payload.push('\n');
        }
        chunks.push(Chunk::new(*id, StrategyTag::StructuralDecomp, payload).with_oversize(oversize));
        *id += 1;
        rows.clear();
    };

    for row in lines {
        let row_len = row.len() + 1;

        if header.len() + 1 + row_len > chunk_size {
            flush(&mut current_rows, &mut chunks, &mut id, false);
            current_size = header.len() + 1;
            let payload = format!("{header}\n{row}\n");
            chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, payload).with_oversize(true));
            id += 1;
            continue;
        }

        if current_size + row_len > chunk_size && !current_rows.is_empty() {
            flush(&mut current_rows, &mut chunks, &mut id, false);
            current_size = header.len() + 1;
        }

        current_rows.push(row);
        current_size += row_len;
    }
    flush(&mut current_rows, &mut chunks, &mut id, false);

    if chunks.is_empty() {
        chunks.push(Chunk::new(0, StrategyTag::StructuralDecomp, header.to_string()));
    }

    chunks
}

/// Concatenates successful results in `id` order.
#[must_use]
pub fn aggregate(results: &[crate::model::DispatchResult]) -> Value {
    crate::aggregate::reduce(results)
}
