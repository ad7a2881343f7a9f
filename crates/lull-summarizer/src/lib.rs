// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible summarizer for the Lull collector.
//!
//! [`OpenAiSummarizer`] renders a conversation as a transcript, asks a chat
//! completion endpoint for a summary and appends the result to a per-channel
//! JSON Lines log.

pub mod client;
pub mod log;
pub mod prompt;
pub mod types;

use std::path::PathBuf;

use async_trait::async_trait;
use lull_config::LullConfig;
use lull_core::{Chunk, LullError, Summarizer, sort_canonical};
use tracing::{debug, info, warn};

pub use client::ChatClient;
pub use log::SummaryLog;
pub use types::SummaryRecord;

use crate::types::ChatMessage;

/// Summarizes conversations through an OpenAI-compatible backend.
#[derive(Debug)]
pub struct OpenAiSummarizer {
    client: ChatClient,
    log: SummaryLog,
}

impl OpenAiSummarizer {
    pub fn new(client: ChatClient, log: SummaryLog) -> Self {
        Self { client, log }
    }

    /// Builds the summarizer from the `[llm]` and `[storage]` config sections.
    pub fn from_config(config: &LullConfig) -> Result<Self, LullError> {
        let client = ChatClient::new(&config.llm)?;
        let log = SummaryLog::new(PathBuf::from(&config.storage.summaries_dir));
        Ok(Self::new(client, log))
    }

    pub fn log(&self) -> &SummaryLog {
        &self.log
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, chunk: Chunk) -> Result<(), LullError> {
        let Chunk {
            channel_name,
            server_name,
            mut messages,
        } = chunk;

        if messages.is_empty() {
            warn!(server = %server_name, channel = %channel_name, "refusing to summarize an empty conversation");
            return Ok(());
        }

        sort_canonical(&mut messages);
        let transcript = prompt::render_transcript(&messages);
        debug!(
            server = %server_name,
            channel = %channel_name,
            count = messages.len(),
            model = %self.client.model(),
            "sending summarization request"
        );

        let summary = self
            .client
            .complete(vec![
                ChatMessage::system(prompt::SYSTEM_PROMPT),
                ChatMessage::user(prompt::user_prompt(&channel_name, &server_name, &transcript)),
            ])
            .await?;

        let last = messages.last().map(|m| m.timestamp.to_rfc3339()).unwrap_or_default();
        let record = SummaryRecord {
            summary,
            timestamp: last,
        };
        let path = self.log.append(&server_name, &channel_name, &record).await?;

        info!(
            server = %server_name,
            channel = %channel_name,
            path = %path.display(),
            "summary generated"
        );
        Ok(())
    }
}
