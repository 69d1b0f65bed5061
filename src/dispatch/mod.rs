//! The parallel agent manager: bounded-concurrency dispatch of
//! [`Chunk`]s to an injected [`LlmWorker`], with per-task timeout
//! handling, error isolation, and deterministic `chunkId`-ordered output.
//!
//! Grounded on the donor's `Orchestrator::fan_out`
//! (`agent/orchestrator.rs`): an `Arc<Semaphore>` bounds concurrency,
//! `tokio::spawn` fans tasks out, and `JoinHandle::await` collects them —
//! generalized here to the one-task-per-chunk shape this domain calls for
//! (the donor instead batches several chunks per subagent call) and to a
//! per-task `tokio::time::timeout` the donor's fan-out does not need.

pub mod prompt;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::model::{Chunk, ChunkTask, DispatchResult, ErrorDescriptor, TaskKind};
use crate::strategy::StrategyTag;
use crate::worker::LlmWorker;
use crate::Error;

/// Drives bounded-concurrency dispatch of a chunk list to an injected
/// [`LlmWorker`].
pub struct AgentManager {
    worker: Arc<dyn LlmWorker>,
}

impl AgentManager {
    /// Builds a manager around the given worker.
    #[must_use]
    pub fn new(worker: Arc<dyn LlmWorker>) -> Self {
        Self { worker }
    }

    /// Dispatches `chunks` with at most `max_concurrent_agents` in flight
    /// at once, each under `timeout`. Always returns one [`DispatchResult`]
    /// per chunk, sorted by `chunkId` ascending — never fails.
    #[tracing::instrument(skip(self, chunks, query), fields(chunk_count = chunks.len()))]
    pub async fn dispatch(
        &self,
        chunks: &[Chunk],
        query: Option<&str>,
        strategy: StrategyTag,
        max_concurrent_agents: usize,
        timeout: Duration,
    ) -> Vec<DispatchResult> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent_agents.max(1)));
        let mut handles = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let task = build_task(chunk.clone(), query.map(str::to_string), strategy);
            let sem = Arc::clone(&semaphore);
            let worker = Arc::clone(&self.worker);

            let handle = tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return dispatch_result_for_error(
                        task.chunk.id,
                        Duration::ZERO,
                        &Error::Cancelled,
                    );
                };

                let model = prompt::select_model(task.task_kind);
                let rendered = prompt::build_prompt(task.task_kind, task.query.as_deref(), &task.chunk.payload);
                let chunk_id = task.chunk.id;

                let started = Instant::now();
                match tokio::time::timeout(timeout, worker.query(&rendered, model)).await {
                    Ok(Ok(reply)) => DispatchResult {
                        chunk_id,
                        content: serde_json::Value::String(reply),
                        processing: started.elapsed(),
                        model_used: model.to_string(),
                        error: None,
                    },
                    Ok(Err(reason)) => {
                        tracing::warn!(chunk_id, reason, "task failed");
                        dispatch_result_for_error(
                            chunk_id,
                            started.elapsed(),
                            &Error::TaskFailure { chunk_id, reason },
                        )
                    }
                    Err(_elapsed) => {
                        tracing::warn!(chunk_id, ?timeout, "task timed out");
                        dispatch_result_for_error(
                            chunk_id,
                            started.elapsed(),
                            &Error::TaskTimeout {
                                chunk_id,
                                after: timeout,
                            },
                        )
                    }
                }
            });
            handles.push(handle);
        }

        let mut results = Vec::with_capacity(handles.len());
        for (chunk, handle) in chunks.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => dispatch_result_for_error(
                    chunk.id,
                    Duration::ZERO,
                    &Error::TaskFailure {
                        chunk_id: chunk.id,
                        reason: format!("worker task panicked: {join_error}"),
                    },
                ),
            };
            results.push(result);
        }

        results.sort_by_key(|r| r.chunk_id);
        results
    }
}

fn dispatch_result_for_error(chunk_id: usize, processing: Duration, error: &Error) -> DispatchResult {
    DispatchResult {
        chunk_id,
        content: serde_json::Value::Null,
        processing,
        model_used: String::new(),
        error: Some(ErrorDescriptor::from(error)),
    }
}

/// Selects `taskKind` per §4.5: a user query always yields `Query`;
/// otherwise `Extract` (the strategies in this crate never produce
/// `Analyse`/`Synthesise` chunks — those task kinds are reserved for
/// future strategies, per the data model).
fn select_task_kind(query: Option<&str>) -> TaskKind {
    if query.is_some() {
        TaskKind::Query
    } else {
        TaskKind::Extract
    }
}

fn build_task(chunk: Chunk, query: Option<String>, _strategy: StrategyTag) -> ChunkTask {
    let task_kind = select_task_kind(query.as_deref());
    ChunkTask {
        chunk,
        query,
        task_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWorker {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LlmWorker for CountingWorker {
        async fn query(&self, prompt: &str, _model: &str) -> Result<String, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("reply:{}", prompt.len()))
        }
    }

    struct FailingWorker;

    #[async_trait::async_trait]
    impl LlmWorker for FailingWorker {
        async fn query(&self, _prompt: &str, _model: &str) -> Result<String, String> {
            Err("boom".to_string())
        }
    }

    struct SlowWorker;

    #[async_trait::async_trait]
    impl LlmWorker for SlowWorker {
        async fn query(&self, _prompt: &str, _model: &str) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too slow".to_string())
        }
    }

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk::new(i, StrategyTag::TokenChunking, format!("chunk {i}")))
            .collect()
    }

    #[tokio::test]
    async fn dispatch_produces_one_result_per_chunk_in_order() {
        let manager = AgentManager::new(Arc::new(CountingWorker {
            calls: AtomicUsize::new(0),
        }));
        let chunks = chunks(10);
        let results = manager
            .dispatch(&chunks, None, StrategyTag::TokenChunking, 4, Duration::from_secs(5))
            .await;
        assert_eq!(results.len(), 10);
        let ids: Vec<usize> = results.iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
        assert!(results.iter().all(|r| r.error.is_none()));
    }

    #[tokio::test]
    async fn worker_failure_is_isolated_to_its_chunk() {
        let manager = AgentManager::new(Arc::new(FailingWorker));
        let chunks = chunks(3);
        let results = manager
            .dispatch(&chunks, None, StrategyTag::TokenChunking, 2, Duration::from_secs(5))
            .await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.error.is_some()));
        assert!(results.iter().all(|r| r.error.as_ref().unwrap().kind == "task-failure"));
    }

    #[tokio::test]
    async fn slow_worker_times_out_without_blocking_other_chunks() {
        let manager = AgentManager::new(Arc::new(SlowWorker));
        let chunks = chunks(2);
        let results = manager
            .dispatch(&chunks, None, StrategyTag::TokenChunking, 2, Duration::from_millis(20))
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.error.as_ref().unwrap().kind == "timeout"));
    }

    #[tokio::test]
    async fn query_present_selects_query_task_kind_and_sonnet_model() {
        let manager = AgentManager::new(Arc::new(CountingWorker {
            calls: AtomicUsize::new(0),
        }));
        let chunks = chunks(1);
        let results = manager
            .dispatch(
                &chunks,
                Some("what is this?"),
                StrategyTag::TokenChunking,
                1,
                Duration::from_secs(5),
            )
            .await;
        assert_eq!(results[0].model_used, "sonnet");
    }

    #[tokio::test]
    async fn no_query_selects_extract_task_kind_and_haiku_model() {
        let manager = AgentManager::new(Arc::new(CountingWorker {
            calls: AtomicUsize::new(0),
        }));
        let chunks = chunks(1);
        let results = manager
            .dispatch(&chunks, None, StrategyTag::TokenChunking, 1, Duration::from_secs(5))
            .await;
        assert_eq!(results[0].model_used, "haiku");
    }

    #[tokio::test]
    async fn empty_chunk_list_yields_empty_results() {
        let manager = AgentManager::new(Arc::new(CountingWorker {
            calls: AtomicUsize::new(0),
        }));
        let results = manager
            .dispatch(&[], None, StrategyTag::Passthrough, 4, Duration::from_secs(5))
            .await;
        assert!(results.is_empty());
    }
}
