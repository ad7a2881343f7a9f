// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lull collector.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Lull configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LullConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Discord gateway settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Summarization backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Channel tracking settings.
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Conversation windowing parameters.
    #[serde(default)]
    pub window: WindowConfig,

    /// Checkpoint and summary output locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Summary dispatch settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Discord gateway configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordConfig {
    /// Discord bot token. Required by `lull serve`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// OpenAI-compatible summarization backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key. Local inference servers usually need none.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the chat-completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per summary.
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_llm_max_tokens() -> u32 {
    500
}

/// Channel tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrackingConfig {
    /// Only collect channels in the persisted tracked set. When false every
    /// channel is collected and the persisted set is ignored.
    ///
    /// There is no chat command for tracking channels: with this on, list the
    /// channel ids under `tracked_channels` in the checkpoint document, or
    /// nothing is collected.
    #[serde(default = "default_whitelist_mode")]
    pub whitelist_mode: bool,

    /// How far back to backfill a channel with no usable checkpoint.
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            whitelist_mode: default_whitelist_mode(),
            lookback_secs: default_lookback_secs(),
        }
    }
}

impl TrackingConfig {
    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_secs)
    }
}

fn default_whitelist_mode() -> bool {
    true
}

fn default_lookback_secs() -> u64 {
    3 * 60 * 60
}

/// Conversation windowing parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    /// Messages required before any active/idle classification.
    #[serde(default = "default_min_cluster")]
    pub min_cluster: usize,

    /// Maximum spacing between messages that still counts as a conversation start.
    #[serde(default = "default_start_gap_secs")]
    pub start_gap_secs: u64,

    /// Window span after which an active conversation is considered idle.
    #[serde(default = "default_end_gap_secs")]
    pub end_gap_secs: u64,

    /// Interval between idle-reconciliation sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_cluster: default_min_cluster(),
            start_gap_secs: default_start_gap_secs(),
            end_gap_secs: default_end_gap_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl WindowConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_min_cluster() -> usize {
    5
}

fn default_start_gap_secs() -> u64 {
    15 * 60
}

fn default_end_gap_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

/// Checkpoint and summary output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the JSON checkpoint document.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// Directory receiving one `<server>_<channel>.jsonl` log per channel.
    #[serde(default = "default_summaries_dir")]
    pub summaries_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: default_checkpoint_path(),
            summaries_dir: default_summaries_dir(),
        }
    }
}

fn default_checkpoint_path() -> String {
    "lull-checkpoints.json".to_string()
}

fn default_summaries_dir() -> String {
    "summaries".to_string()
}

/// Summary dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizerConfig {
    /// Maximum summarization calls in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// How long shutdown waits for in-flight summaries.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

impl SummarizerConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_drain_timeout_secs() -> u64 {
    30
}
