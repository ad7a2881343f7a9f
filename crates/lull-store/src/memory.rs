// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory checkpoint store.

use std::sync::Arc;

use async_trait::async_trait;
use lull_core::{CheckpointDocument, CheckpointStore, LullError};
use tokio::sync::Mutex;

/// Checkpoint store that lives only as long as the process.
///
/// Clones share the same document, so a test can hand one clone to a
/// collector and inspect what it saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Arc<Mutex<CheckpointDocument>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already persisted document.
    pub fn with_document(document: CheckpointDocument) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
            saves: Arc::default(),
        }
    }

    /// The last saved document.
    pub async fn snapshot(&self) -> CheckpointDocument {
        self.document.lock().await.clone()
    }

    /// Number of completed saves.
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self) -> Result<CheckpointDocument, LullError> {
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &CheckpointDocument) -> Result<(), LullError> {
        *self.document.lock().await = document.clone();
        *self.saves.lock().await += 1;
        Ok(())
    }
}
