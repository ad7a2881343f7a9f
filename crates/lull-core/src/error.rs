// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lull conversation collector.

use thiserror::Error;

/// The primary error type shared by the feed, summarizer and checkpoint seams.
///
/// Every variant is terminal only for its own unit of work: the collector logs
/// it and moves on to the next channel or event.
#[derive(Debug, Error)]
pub enum LullError {
    /// Configuration errors, including malformed persisted state on load.
    #[error("configuration error: {0}")]
    Config(String),

    /// Backfill or history query failure.
    #[error("history fetch failed for channel {channel_id}: {message}")]
    FeedFetch {
        channel_id: u64,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Live feed failure (gateway error, lost connection).
    #[error("feed error: {message}")]
    Feed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The live feed has shut down and will deliver no more events.
    #[error("feed closed")]
    FeedClosed,

    /// Summarization backend failure. The chunk is dropped.
    #[error("summarization failed: {message}")]
    Summarization {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Checkpoint write or read failure.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LullError {
    /// Wraps any error as a persistence failure.
    pub fn persistence(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence {
            source: Box::new(source),
        }
    }
}
