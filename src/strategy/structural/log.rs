//! Log structural decomposition: groups log records (a timestamp-prefixed
//! line plus any continuation lines, e.g. a stack trace) into windows
//! bounded by `chunkSize` bytes, never splitting a record across chunks.

use serde_json::Value;

use crate::model::Chunk;
use crate::strategy::{StrategyConfig, StrategyTag};

/// A line starts a new record iff it opens with a four-digit year
/// followed by a date separator, e.g. `2024-01-02T03:04:05Z` or
/// `2024/01/02 ...`. Matches the sniffing rule in `crate::descriptor`.
fn starts_record(line: &str) -> bool {
    let mut chars = line.chars();
    let year_digits = (&mut chars).take(4).filter(char::is_ascii_digit).count();
    year_digits == 4 && matches!(chars.next(), Some('-' | '/'))
}

/// Groups lines into records (a timestamp-prefixed line followed by its
/// continuation lines), then packs whole records into windows of at most
/// `chunk_size` bytes. A single record larger than `chunk_size` is still
/// emitted as its own oversize chunk.
#[must_use]
pub fn decompose(text: &str, config: &StrategyConfig) -> Vec<Chunk> {
    if text.is_empty() {
        return vec![Chunk::new(0, StrategyTag::StructuralDecomp, String::new())];
    }

    let chunk_size = config.chunk_size.max(1);
    let records = group_into_records(text);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut id = 0usize;

    for record in records {
        let record_len = record.len();

        if record_len > chunk_size {
            if !current.is_empty() {
                chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, std::mem::take(&mut current)));
                id += 1;
            }
            chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, record).with_oversize(true));
            id += 1;
            continue;
        }

        if current.len() + record_len > chunk_size && !current.is_empty() {
            chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, std::mem::take(&mut current)));
            id += 1;
        }
        current.push_str(&record);
    }

    if !current.is_empty() {
        chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, current));
    }
    if chunks.is_empty() {
        chunks.push(Chunk::new(0, StrategyTag::StructuralDecomp, text.to_string()));
    }

    chunks
}

/// Groups `text`'s lines into records: each record starts at a
/// timestamp-prefixed line and absorbs the non-timestamp-prefixed lines
/// that follow it. Lines preceding the first timestamp-prefixed line form
/// their own leading record.
fn group_into_records(text: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if starts_record(line) && !current.is_empty() {
            records.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.is_empty() {
        records.push(current);
    }

    records
}

/// Concatenates successful results in `id` order.
#[must_use]
pub fn aggregate(results: &[crate::model::DispatchResult]) -> Value {
    crate::aggregate::reduce(results)
}
