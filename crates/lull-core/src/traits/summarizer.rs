// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarizer trait for the conversation summarization backend.

use async_trait::async_trait;

use crate::error::LullError;
use crate::types::Chunk;

/// Converts a completed conversation into a persisted summary.
///
/// The collector never consumes a result beyond logging a failure.
#[async_trait]
pub trait Summarizer: Send + Sync + 'static {
    async fn summarize(&self, chunk: Chunk) -> Result<(), LullError>;
}
