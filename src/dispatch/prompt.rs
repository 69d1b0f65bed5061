//! Deterministic prompt construction: a fixed preamble per [`TaskKind`]
//! followed by the chunk payload, capped independent of chunk size.

use crate::model::TaskKind;

/// Prompt payloads are truncated to this many characters so prompt size
/// stays bounded independent of the configured chunk size.
pub const MAX_PAYLOAD_CHARS: usize = 10_000;

fn preamble(task_kind: TaskKind) -> &'static str {
    match task_kind {
        TaskKind::Extract => "Extract the key information from the following content.",
        TaskKind::Query => "Answer the user's question using only the following content.",
        TaskKind::Analyse => "Analyse the following content in depth.",
        TaskKind::Synthesise => "Synthesise a unified summary from the following content.",
    }
}

/// Selects the model tag for a task, per §4.5: `extract → "haiku"`,
/// `analyse/synthesise/query → "sonnet"`, otherwise `"haiku"`.
#[must_use]
pub const fn select_model(task_kind: TaskKind) -> &'static str {
    match task_kind {
        TaskKind::Extract => "haiku",
        TaskKind::Query | TaskKind::Analyse | TaskKind::Synthesise => "sonnet",
    }
}

/// Builds the deterministic prompt for a task: a fixed preamble, the
/// user's query (when present), and the chunk payload truncated to
/// [`MAX_PAYLOAD_CHARS`].
#[must_use]
pub fn build_prompt(task_kind: TaskKind, query: Option<&str>, payload: &str) -> String {
    let truncated = crate::io::find_char_boundary(payload, MAX_PAYLOAD_CHARS).min(payload.len());
    let body = &payload[..truncated];

    let mut prompt = String::with_capacity(body.len() + 256);
    prompt.push_str(preamble(task_kind));
    prompt.push('\n');
    if let Some(q) = query {
        prompt.push_str("Question: ");
        prompt.push_str(q);
        prompt.push('\n');
    }
    prompt.push_str("---\n");
    prompt.push_str(body);
    prompt
}
