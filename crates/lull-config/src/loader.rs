// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lull.toml` > `~/.config/lull/lull.toml` > `/etc/lull/lull.toml`
//! with environment variable overrides via `LULL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LullConfig;

/// Config sections addressable from `LULL_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &[
    "agent",
    "discord",
    "llm",
    "tracking",
    "window",
    "storage",
    "summarizer",
];

/// Unprefixed variables kept for deployments that predate the `LULL_` scheme.
const LEGACY_VARS: &[(&str, &str)] = &[
    ("discord_bot_token", "discord.bot_token"),
    ("llm_api_key", "llm.api_key"),
    ("llm_base_url", "llm.base_url"),
    ("llm_model", "llm.model"),
    ("log_level", "agent.log_level"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lull/lull.toml` (system-wide)
/// 3. `~/.config/lull/lull.toml` (user XDG config)
/// 4. `./lull.toml` (local directory)
/// 5. Legacy unprefixed variables (`DISCORD_BOT_TOKEN`, `LLM_API_KEY`, ...)
/// 6. `LULL_*` environment variables
pub fn load_config() -> Result<LullConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LullConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LullConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LullConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LullConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LullConfig::default()))
        .merge(Toml::file("/etc/lull/lull.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lull/lull.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lull.toml"))
        .merge(legacy_env_provider())
        .merge(env_provider())
}

/// Create the `LULL_` provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LULL_WINDOW_START_GAP_SECS` must map to `window.start_gap_secs`.
fn env_provider() -> Env {
    Env::prefixed("LULL_").map(|key| map_env_key(key.as_str()).into())
}

fn legacy_env_provider() -> Env {
    let names: Vec<&str> = LEGACY_VARS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        let lowered = key.as_str().to_ascii_lowercase();
        LEGACY_VARS
            .iter()
            .find(|(name, _)| *name == lowered)
            .map(|(_, path)| path.to_string())
            .unwrap_or(lowered)
            .into()
    })
}

/// Maps a prefix-stripped env key such as `window_start_gap_secs` to its dotted path.
pub fn map_env_key(key: &str) -> String {
    let lowered = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = lowered
            .strip_prefix(*section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_prefix_becomes_dot() {
        assert_eq!(map_env_key("window_start_gap_secs"), "window.start_gap_secs");
        assert_eq!(map_env_key("DISCORD_BOT_TOKEN"), "discord.bot_token");
        assert_eq!(
            map_env_key("summarizer_max_concurrent"),
            "summarizer.max_concurrent"
        );
    }

    #[test]
    fn only_leading_section_is_split() {
        assert_eq!(map_env_key("storage_summaries_dir"), "storage.summaries_dir");
        assert_eq!(map_env_key("llm_max_tokens"), "llm.max_tokens");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("bogus_key"), "bogus_key");
    }
}
