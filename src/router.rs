//! The activation router: a pure, stateless mapping from a
//! [`ContextDescriptor`] to a `(StrategyTag, StrategyConfig)` pair.
//!
//! Grounded on the donor's tiered-scaling config (`agent/scaling.rs`)'s
//! layered resolution and boundary-test style, generalized from a single
//! concurrency knob to the five-rule decision table of this domain.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::ContextDescriptor;
use crate::strategy::{StrategyConfig, StrategyTag};

/// Env var names consulted by [`RouterConfig::from_env`], in the order
/// they're documented.
const ENV_TOKEN_THRESHOLD: &str = "RLM_TOKEN_THRESHOLD";
const ENV_FILE_SIZE_KB_THRESHOLD: &str = "RLM_FILE_SIZE_KB_THRESHOLD";
const ENV_FILE_COUNT_THRESHOLD: &str = "RLM_FILE_COUNT_THRESHOLD";
const ENV_MAX_CONCURRENT_AGENTS: &str = "RLM_MAX_CONCURRENT_AGENTS";
const ENV_CONTEXT_WINDOW_TOKENS: &str = "RLM_CONTEXT_WINDOW_TOKENS";
const ENV_ENABLED: &str = "RLM_ENABLED";
const ENV_TIMEOUT_MS: &str = "RLM_TIMEOUT_MS";

/// Router configuration: all fields optional with documented defaults,
/// resolved at construction time (explicit builder calls override the
/// compiled defaults; [`RouterConfig::from_env`] overrides them again
/// from the process environment).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    /// Master switch; `false` forces `passthrough` unconditionally.
    pub enabled: bool,
    /// Rule 3/4 threshold on `estimatedTokens`.
    pub token_threshold: u64,
    /// Rule 4 threshold on `totalBytes / 1024`.
    pub file_size_kb_threshold: u64,
    /// Rule 2 threshold on `filesCount`.
    pub file_count_threshold: usize,
    /// Upper bound on concurrent agent-manager workers.
    pub max_concurrent_agents: usize,
    /// Informational context window budget passed into `StrategyConfig`.
    pub context_window_tokens: u64,
    /// Per-task timeout. `None` resolves to 60 seconds at dispatch time.
    pub timeout: Option<Duration>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token_threshold: 50_000,
            file_size_kb_threshold: 100,
            file_count_threshold: 5,
            max_concurrent_agents: 8,
            context_window_tokens: 200_000,
            timeout: None,
        }
    }
}

impl RouterConfig {
    /// Starts a fluent builder seeded with the compiled-in defaults.
    #[must_use]
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder(Self::default())
    }

    /// Resolves configuration from the process environment, falling back
    /// to compiled defaults for any variable that is absent or fails to
    /// parse. Unlike `StrategyTag::parse`, a malformed value here never
    /// surfaces an error: the router's own contract is "never fails".
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_bool(ENV_ENABLED).unwrap_or(defaults.enabled),
            token_threshold: env_u64(ENV_TOKEN_THRESHOLD).unwrap_or(defaults.token_threshold),
            file_size_kb_threshold: env_u64(ENV_FILE_SIZE_KB_THRESHOLD)
                .unwrap_or(defaults.file_size_kb_threshold),
            file_count_threshold: env_usize(ENV_FILE_COUNT_THRESHOLD)
                .unwrap_or(defaults.file_count_threshold),
            max_concurrent_agents: env_usize(ENV_MAX_CONCURRENT_AGENTS)
                .unwrap_or(defaults.max_concurrent_agents),
            context_window_tokens: env_u64(ENV_CONTEXT_WINDOW_TOKENS)
                .unwrap_or(defaults.context_window_tokens),
            timeout: env_u64(ENV_TIMEOUT_MS)
                .map(Duration::from_millis)
                .or(defaults.timeout),
        }
    }

    /// Resolves the per-task timeout, defaulting to 60 seconds.
    #[must_use]
    pub fn resolved_timeout(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(60))
    }

    /// Evaluates the five-rule decision procedure of §4.3 over `descriptor`,
    /// in order, returning the first rule that fires. Never fails.
    #[must_use]
    #[tracing::instrument(skip(self, descriptor), fields(data_kind = ?descriptor.data_kind))]
    pub fn route(&self, descriptor: &ContextDescriptor) -> (StrategyTag, StrategyConfig) {
        let config = StrategyConfig {
            max_concurrent_agents: self.max_concurrent_agents,
            context_window_tokens: self.context_window_tokens,
            ..StrategyConfig::default()
        };

        if !self.enabled || descriptor.estimated_tokens == 0 || descriptor.total_bytes == 0 {
            return (StrategyTag::Passthrough, config);
        }

        if descriptor.files_count >= self.file_count_threshold {
            let concurrency = descriptor.files_count.min(self.max_concurrent_agents);
            return (
                StrategyTag::FileParallel,
                StrategyConfig {
                    max_concurrent_agents: concurrency,
                    ..config
                },
            );
        }

        let structural_kind = matches!(
            descriptor.data_kind,
            crate::model::DataKind::Json
                | crate::model::DataKind::Csv
                | crate::model::DataKind::Log
                | crate::model::DataKind::Code
        );
        if descriptor.has_structure
            && structural_kind
            && descriptor.estimated_tokens >= self.token_threshold
        {
            return (StrategyTag::StructuralDecomp, config);
        }

        let size_kb = descriptor.total_bytes / 1024;
        if descriptor.estimated_tokens >= self.token_threshold
            || size_kb >= self.file_size_kb_threshold
        {
            if descriptor.has_structure {
                return (StrategyTag::FileChunking, config);
            }
            return (StrategyTag::TokenChunking, config);
        }

        (StrategyTag::Passthrough, config)
    }
}

/// Fluent, `#[must_use]`-annotated builder mirroring the donor's own
/// config-builder shape.
#[derive(Debug, Clone)]
#[must_use]
pub struct RouterConfigBuilder(RouterConfig);

impl RouterConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.0.enabled = enabled;
        self
    }

    pub fn token_threshold(mut self, threshold: u64) -> Self {
        self.0.token_threshold = threshold;
        self
    }

    pub fn file_size_kb_threshold(mut self, threshold: u64) -> Self {
        self.0.file_size_kb_threshold = threshold;
        self
    }

    pub fn file_count_threshold(mut self, threshold: usize) -> Self {
        self.0.file_count_threshold = threshold;
        self
    }

    pub fn max_concurrent_agents(mut self, n: usize) -> Self {
        self.0.max_concurrent_agents = n;
        self
    }

    pub fn context_window_tokens(mut self, tokens: u64) -> Self {
        self.0.context_window_tokens = tokens;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.0.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> RouterConfig {
        self.0
    }
}

fn env_bool(name: &str) -> Option<bool> {
    match std::env::var(name).ok()?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.parse().ok()
}
