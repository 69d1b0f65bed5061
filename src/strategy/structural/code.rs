//! Code structural decomposition: splits on top-level declaration
//! boundaries (tracked via a brace-balance scan) and packs consecutive
//! small declarations into windows bounded by `chunkSize` bytes. A single
//! declaration that alone exceeds `chunkSize` falls back to line-aligned
//! windows, the same scheme `file-chunking` uses.

use serde_json::Value;

use crate::model::Chunk;
use crate::strategy::{StrategyConfig, StrategyTag};

/// Splits `text` into top-level declarations by tracking `{`/`}` balance:
/// a declaration ends on the line where depth returns to zero after
/// having gone positive (or immediately, for brace-free top-level lines
/// such as single statements or imports).
fn split_declarations(text: &str) -> Vec<String> {
    let mut declarations = Vec::new();
    let mut current = String::new();
    let mut depth: i64 = 0;

    for line in text.lines() {
        current.push_str(line);
        current.push('\n');

        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }

        if depth <= 0 {
            depth = 0;
            declarations.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        declarations.push(current);
    }

    declarations
}

/// Line-aligned fallback for a single declaration too large to fit in one
/// chunk on its own.
fn window_by_lines(text: &str, chunk_size: usize, id: &mut usize, chunks: &mut Vec<Chunk>) {
    let mut current = String::new();
    for line in text.lines() {
        let line_len = line.len() + 1;
        if line_len > chunk_size {
            if !current.is_empty() {
                chunks.push(Chunk::new(*id, StrategyTag::StructuralDecomp, std::mem::take(&mut current)));
                *id += 1;
            }
            chunks.push(Chunk::new(*id, StrategyTag::StructuralDecomp, line.to_string()).with_oversize(true));
            *id += 1;
            continue;
        }
        if current.len() + line_len > chunk_size && !current.is_empty() {
            chunks.push(Chunk::new(*id, StrategyTag::StructuralDecomp, std::mem::take(&mut current)));
            *id += 1;
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.is_empty() {
        chunks.push(Chunk::new(*id, StrategyTag::StructuralDecomp, current));
        *id += 1;
    }
}

#[must_use]
pub fn decompose(text: &str, config: &StrategyConfig) -> Vec<Chunk> {
    if text.is_empty() {
        return vec![Chunk::new(0, StrategyTag::StructuralDecomp, String::new())];
    }

    let chunk_size = config.chunk_size.max(1);
    let declarations = split_declarations(text);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut id = 0usize;

    for decl in declarations {
        if decl.len() > chunk_size {
            if !current.is_empty() {
                chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, std::mem::take(&mut current)));
                id += 1;
            }
            window_by_lines(&decl, chunk_size, &mut id, &mut chunks);
            continue;
        }

        if current.len() + decl.len() > chunk_size && !current.is_empty() {
            chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, std::mem::take(&mut current)));
            id += 1;
        }
        current.push_str(&decl);
    }
    if !current.is_empty() {
        chunks.push(Chunk::new(id, StrategyTag::StructuralDecomp, current));
    }
    if chunks.is_empty() {
        chunks.push(Chunk::new(0, StrategyTag::StructuralDecomp, text.to_string()));
    }

    chunks
}

/// Concatenates successful results in `id` order.
#[must_use]
pub fn aggregate(results: &[crate::model::DispatchResult]) -> Value {
    crate::aggregate::reduce(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(chunk_size: usize) -> StrategyConfig {
        StrategyConfig {
            chunk_size,
            ..StrategyConfig::default()
        }
    }

    fn module_with_functions(n: usize) -> String {
        let mut text = String::new();
        for i in 0..n {
            text.push_str(&format!("fn f{i}() {{\n    println!(\"{i}\");\n}}\n\n"));
        }
        text
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        let chunks = decompose("", &cfg(1_000));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].payload, "");
    }

    #[test]
    fn small_module_is_one_chunk() {
        let text = module_with_functions(2);
        let chunks = decompose(&text, &cfg(10_000));
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn declarations_are_never_split_when_they_fit() {
        let text = module_with_functions(100);
        let chunks = decompose(&text, &cfg(400));
        for chunk in &chunks {
            if !chunk.oversize {
                assert!(text.contains(&chunk.payload));
            }
        }
    }

    #[test]
    fn size_bound_holds_for_non_oversize_chunks() {
        let text = module_with_functions(100);
        let chunks = decompose(&text, &cfg(400));
        for chunk in &chunks {
            if !chunk.oversize {
                assert!(chunk.size_bytes <= 400);
            }
        }
    }

    #[test]
    fn oversize_declaration_falls_back_to_line_windows() {
        let mut body = String::from("fn huge() {\n");
        for i in 0..2_000 {
            body.push_str(&format!("    let x{i} = {i};\n"));
        }
        body.push_str("}\n");
        let chunks = decompose(&body, &cfg(500));
        assert!(chunks.len() > 1);
    }

    #[test]
    fn ids_are_dense() {
        let text = module_with_functions(100);
        let chunks = decompose(&text, &cfg(400));
        let ids: Vec<usize> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, (0..chunks.len()).collect::<Vec<_>>());
    }
}
