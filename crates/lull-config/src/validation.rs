// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every violation instead of failing on the first one.

use crate::diagnostic::ConfigError;
use crate::model::LullConfig;

/// Placeholder token shipped in sample env files.
const PLACEHOLDER_TOKEN: &str = "CHANGE_ME";

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &LullConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.discord.bot_token.as_deref() == Some(PLACEHOLDER_TOKEN) {
        errors.push(ConfigError::validation(
            "discord.bot_token is still the `CHANGE_ME` placeholder",
        ));
    }

    if config.llm.base_url.trim().is_empty() {
        errors.push(ConfigError::validation("llm.base_url must not be empty"));
    }

    if config.llm.model.trim().is_empty() {
        errors.push(ConfigError::validation("llm.model must not be empty"));
    }

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        errors.push(ConfigError::validation(format!(
            "llm.temperature must be between 0 and 2, got {}",
            config.llm.temperature
        )));
    }

    if config.tracking.lookback_secs == 0 {
        errors.push(ConfigError::validation(
            "tracking.lookback_secs must be greater than 0",
        ));
    }

    let window = &config.window;
    // The anchor comparison needs at least one message before the newest.
    if window.min_cluster < 2 {
        errors.push(ConfigError::validation(format!(
            "window.min_cluster must be at least 2, got {}",
            window.min_cluster
        )));
    }
    if window.start_gap_secs == 0 {
        errors.push(ConfigError::validation(
            "window.start_gap_secs must be greater than 0",
        ));
    }
    if window.end_gap_secs < window.start_gap_secs {
        errors.push(ConfigError::validation(format!(
            "window.end_gap_secs ({}) must not be shorter than window.start_gap_secs ({})",
            window.end_gap_secs, window.start_gap_secs
        )));
    }
    if window.sweep_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "window.sweep_interval_secs must be greater than 0",
        ));
    }

    if config.storage.checkpoint_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.checkpoint_path must not be empty",
        ));
    }
    if config.storage.summaries_dir.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.summaries_dir must not be empty",
        ));
    }

    if config.summarizer.max_concurrent == 0 {
        errors.push(ConfigError::validation(
            "summarizer.max_concurrent must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&LullConfig::default()).is_ok());
    }

    #[test]
    fn placeholder_token_is_rejected() {
        let mut config = LullConfig::default();
        config.discord.bot_token = Some("CHANGE_ME".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "placeholder"));
    }

    #[test]
    fn min_cluster_of_one_is_rejected() {
        let mut config = LullConfig::default();
        config.window.min_cluster = 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "min_cluster"));
    }

    #[test]
    fn end_gap_shorter_than_start_gap_is_rejected() {
        let mut config = LullConfig::default();
        config.window.start_gap_secs = 600;
        config.window.end_gap_secs = 300;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "end_gap_secs"));
    }

    #[test]
    fn all_violations_are_collected() {
        let mut config = LullConfig::default();
        config.window.sweep_interval_secs = 0;
        config.summarizer.max_concurrent = 0;
        config.llm.temperature = 3.5;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
