// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lull serve` command implementation.
//!
//! Wires the checkpoint store, summarizer, collector and Discord feed together
//! and runs until a shutdown signal arrives or the gateway closes.

use std::sync::Arc;

use lull_config::model::LullConfig;
use lull_core::{CheckpointStore, Feed, LullError, Summarizer};
use lull_discord::DiscordFeed;
use lull_store::JsonFileStore;
use lull_summarizer::OpenAiSummarizer;
use lull_window::shutdown::install_signal_handler;
use lull_window::{Collector, CollectorSettings};
use tracing::{info, warn};

/// Run the `lull serve` command.
pub async fn run_serve(config: LullConfig) -> Result<(), LullError> {
    init_tracing(&config.agent.log_level);
    info!("starting lull serve");

    check_credentials(&config)?;

    let store: Arc<dyn CheckpointStore> =
        Arc::new(JsonFileStore::new(&config.storage.checkpoint_path));
    let summarizer: Arc<dyn Summarizer> = Arc::new(OpenAiSummarizer::from_config(&config)?);
    info!(
        checkpoint_path = %config.storage.checkpoint_path,
        summaries_dir = %config.storage.summaries_dir,
        model = %config.llm.model,
        "storage and summarizer initialized"
    );

    let collector =
        Collector::restore(CollectorSettings::from_config(&config), store, summarizer).await;

    let mut feed = DiscordFeed::new(&config.discord)?;
    feed.connect().await?;

    let cancel = install_signal_handler();
    let result = collector.run(&feed, cancel).await;
    feed.shutdown().await;

    info!("lull serve shutdown complete");
    result
}

/// A bot token is mandatory; an API key is not, since local inference
/// servers accept anonymous requests.
fn check_credentials(config: &LullConfig) -> Result<(), LullError> {
    let has_token = config
        .discord
        .bot_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if !has_token {
        return Err(LullError::Config(
            "discord.bot_token is not set. Add it to lull.toml or export \
             LULL_DISCORD_BOT_TOKEN (or DISCORD_BOT_TOKEN)"
                .into(),
        ));
    }

    if config.llm.api_key.is_none() {
        warn!(
            base_url = %config.llm.base_url,
            "llm.api_key is not set, sending unauthenticated summarization requests"
        );
    }
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lull={log_level},warn")));

    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bot_token_is_rejected_with_hint() {
        let config = LullConfig::default();
        let err = check_credentials(&config).unwrap_err();
        assert!(matches!(&err, LullError::Config(msg) if msg.contains("LULL_DISCORD_BOT_TOKEN")));
    }

    #[test]
    fn blank_bot_token_is_rejected() {
        let mut config = LullConfig::default();
        config.discord.bot_token = Some("   ".into());
        assert!(check_credentials(&config).is_err());
    }

    #[test]
    fn missing_api_key_is_only_a_warning() {
        let mut config = LullConfig::default();
        config.discord.bot_token = Some("token".into());
        assert!(check_credentials(&config).is_ok());
    }

    #[tokio::test]
    async fn serve_without_token_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LullConfig::default();
        config.storage.checkpoint_path = dir.path().join("state.json").display().to_string();
        config.storage.summaries_dir = dir.path().join("summaries").display().to_string();

        let err = run_serve(config).await.unwrap_err();
        assert!(matches!(err, LullError::Config(_)));
        assert!(!dir.path().join("state.json").exists());
    }
}
