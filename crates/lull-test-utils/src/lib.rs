// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lull integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic tests
//! without Discord or an LLM backend.
//!
//! # Components
//!
//! - [`MockFeed`] - Feed with injectable events and scripted history
//! - [`RecordingSummarizer`] - Summarizer that captures every chunk
//! - [`FailingStore`] - Checkpoint store with switchable load/save failures
//! - [`CollectorHarness`] - A collector wired to all of the above on a manual clock

pub mod fixtures;
pub mod harness;
pub mod mock_feed;
pub mod mock_store;
pub mod mock_summarizer;

pub use fixtures::{base_time, channel, message, message_at, minutes};
pub use harness::CollectorHarness;
pub use mock_feed::MockFeed;
pub use mock_store::FailingStore;
pub use mock_summarizer::RecordingSummarizer;
