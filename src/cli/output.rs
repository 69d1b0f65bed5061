//! Output formatting for the reference CLI host.
//!
//! Mirrors the donor's `text`/`json` split (`cli/output.rs`), minus the
//! `ndjson` streaming variant this crate has no use for.

use std::fmt::Write;

use crate::model::AggregatedReply;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses a format from string, defaulting to `text` for anything
    /// unrecognised.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Renders an [`AggregatedReply`] in the requested format.
#[must_use]
pub fn format_reply(reply: &AggregatedReply, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_reply_text(reply),
        OutputFormat::Json => {
            serde_json::to_string_pretty(reply).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
        }
    }
}

fn format_reply_text(reply: &AggregatedReply) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "chunks processed: {}", reply.chunks_processed);
    let _ = writeln!(output, "chunks failed:    {}", reply.chunks_failed);
    let _ = writeln!(output, "total processing: {}ms", reply.total_processing_millis);
    if !reply.errors.is_empty() {
        output.push_str("errors:\n");
        for err in &reply.errors {
            let _ = writeln!(output, "  chunk {}: {}", err.chunk_id, err.error.message);
        }
    }
    output.push('\n');
    match &reply.aggregated {
        serde_json::Value::String(text) => output.push_str(text),
        other => output.push_str(&serde_json::to_string_pretty(other).unwrap_or_default()),
    }
    output
}
