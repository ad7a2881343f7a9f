// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for channel checkpoints and the tracked-channel set.

use async_trait::async_trait;

use crate::error::LullError;
use crate::types::CheckpointDocument;

/// Durable key-value persistence keyed by channel id.
///
/// `save` must be durable when it returns. Callers treat a `load` error as
/// "no checkpoint" and start from an empty document.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Reads the full persisted document. A missing backing file is an empty
    /// document, not an error.
    async fn load(&self) -> Result<CheckpointDocument, LullError>;

    /// Replaces the persisted document.
    async fn save(&self, document: &CheckpointDocument) -> Result<(), LullError>;
}
