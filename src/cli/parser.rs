//! Command-line argument parsing for the reference CLI host.
//!
//! A single subcommand-free invocation over the entry operation, matching
//! the donor's derive style (`cli/parser.rs`) pared down to the one
//! `Input`/`Options` shape this crate exposes.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::model::Options;
use crate::router::RouterConfig;
use crate::strategy::StrategyTag;

/// ctxfanout: decomposes oversized inputs, dispatches the pieces to an
/// LM worker with bounded concurrency, and aggregates the replies.
#[derive(Parser, Debug)]
#[command(name = "ctxfanout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a file to process. Mutually exclusive with `--content` and
    /// `--files`.
    #[arg(short, long, conflicts_with_all = ["content", "files"])]
    pub file: Option<PathBuf>,

    /// In-memory content to process directly. Mutually exclusive with
    /// `--file` and `--files`.
    #[arg(short, long, conflicts_with_all = ["file", "files"])]
    pub content: Option<String>,

    /// A multi-file bundle, routed independently of individual file size.
    #[arg(long, conflicts_with_all = ["file", "content"], num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// User query passed through to the LM worker's prompt.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Overrides the router's strategy selection.
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Per-task timeout in milliseconds.
    #[arg(long, env = "RLM_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Enables debug-level tracing output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Router: master activation switch.
    #[arg(long, env = "RLM_ENABLED")]
    pub enabled: Option<bool>,

    /// Router: `estimatedTokens` threshold.
    #[arg(long, env = "RLM_TOKEN_THRESHOLD")]
    pub token_threshold: Option<u64>,

    /// Router: `totalBytes / 1024` threshold.
    #[arg(long, env = "RLM_FILE_SIZE_KB_THRESHOLD")]
    pub file_size_kb_threshold: Option<u64>,

    /// Router: `filesCount` threshold.
    #[arg(long, env = "RLM_FILE_COUNT_THRESHOLD")]
    pub file_count_threshold: Option<usize>,

    /// Router: upper bound on concurrent LM-worker calls.
    #[arg(long, env = "RLM_MAX_CONCURRENT_AGENTS")]
    pub max_concurrent_agents: Option<usize>,

    /// Router: informational context window budget.
    #[arg(long, env = "RLM_CONTEXT_WINDOW_TOKENS")]
    pub context_window_tokens: Option<u64>,
}

impl Cli {
    /// Resolves this invocation's [`RouterConfig`], layering explicit CLI
    /// flags (highest precedence) over `RLM_*` environment variables over
    /// compiled defaults.
    #[must_use]
    pub fn router_config(&self) -> RouterConfig {
        let env = RouterConfig::from_env();
        RouterConfig {
            enabled: self.enabled.unwrap_or(env.enabled),
            token_threshold: self.token_threshold.unwrap_or(env.token_threshold),
            file_size_kb_threshold: self
                .file_size_kb_threshold
                .unwrap_or(env.file_size_kb_threshold),
            file_count_threshold: self
                .file_count_threshold
                .unwrap_or(env.file_count_threshold),
            max_concurrent_agents: self
                .max_concurrent_agents
                .unwrap_or(env.max_concurrent_agents),
            context_window_tokens: self
                .context_window_tokens
                .unwrap_or(env.context_window_tokens),
            timeout: self
                .timeout_ms
                .map(Duration::from_millis)
                .or(env.timeout),
        }
    }

    /// Builds the [`Options`] record for this invocation.
    #[must_use]
    pub fn options(&self) -> Options {
        Options {
            query: self.query.clone(),
            strategy: self.strategy.as_deref().map(StrategyTag::or_default_on_unknown),
            timeout: self.timeout_ms.map(Duration::from_millis),
            router: self.router_config(),
        }
    }
}
