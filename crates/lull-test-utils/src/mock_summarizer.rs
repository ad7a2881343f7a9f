// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarizer that records chunks instead of calling a backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lull_core::{Chunk, LullError, Summarizer};

/// Captures every chunk handed to it. Can be switched to fail so the
/// dispatcher's error path is exercised.
#[derive(Debug, Default)]
pub struct RecordingSummarizer {
    chunks: Mutex<Vec<Chunk>>,
    failing: AtomicBool,
}

impl RecordingSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A summarizer whose every call fails (the chunk is still recorded).
    pub fn failing() -> Self {
        let summarizer = Self::default();
        summarizer.set_failing(true);
        summarizer
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The message ids of every recorded chunk, in arrival order.
    pub fn chunk_ids(&self) -> Vec<Vec<u64>> {
        self.chunks()
            .iter()
            .map(|c| c.messages.iter().map(|m| m.id).collect())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.chunks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, chunk: Chunk) -> Result<(), LullError> {
        self.chunks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(chunk);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LullError::Summarization {
                message: "scripted summarizer failure".into(),
                source: None,
            });
        }
        Ok(())
    }
}
