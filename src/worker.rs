//! The LM worker seam: the one externally-supplied, re-entrant
//! collaborator the agent manager calls into. No transport, retry, or
//! authentication logic lives here — those are the injected
//! implementation's concern, per the scope carved out in §1.

use async_trait::async_trait;

/// A thread-safe callable taking a prompt and a model tag, returning the
/// worker's textual reply.
///
/// Implementations may raise any error; the agent manager folds it into
/// a [`DispatchResult`](crate::DispatchResult) with a populated `error`
/// field rather than propagating it.
#[async_trait]
pub trait LlmWorker: Send + Sync {
    /// Queries the worker with `prompt`, tagged with `model`.
    ///
    /// # Errors
    ///
    /// Returns any error describing why the query could not be answered.
    async fn query(&self, prompt: &str, model: &str) -> Result<String, String>;
}

/// Identity fallback worker used when no LM worker is injected: keeps the
/// pipeline runnable and testable without a live LM transport. Its reply
/// is a fixed, documented placeholder parameterised by chunk id and
/// payload length, which the caller threads in via `prompt`'s metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoWorker;

#[async_trait]
impl LlmWorker for EchoWorker {
    async fn query(&self, prompt: &str, _model: &str) -> Result<String, String> {
        Ok(format!("[Processed: {} chars]", prompt.len()))
    }
}
