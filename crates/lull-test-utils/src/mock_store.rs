// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpoint store with injectable failures.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lull_core::{CheckpointDocument, CheckpointStore, LullError};
use lull_store::MemoryStore;

/// Wraps a [`MemoryStore`], failing loads and/or saves on demand.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_load: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
        }
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl CheckpointStore for FailingStore {
    async fn load(&self) -> Result<CheckpointDocument, LullError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(LullError::Config("scripted malformed document".into()));
        }
        self.inner.load().await
    }

    async fn save(&self, document: &CheckpointDocument) -> Result<(), LullError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(LullError::persistence(std::io::Error::other(
                "scripted disk failure",
            )));
        }
        self.inner.save(document).await
    }
}
