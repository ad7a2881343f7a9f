// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collector harness for integration tests.
//!
//! `CollectorHarness` wires a [`Collector`] to a [`MockFeed`], a
//! [`RecordingSummarizer`] and a shared [`MemoryStore`] on a [`ManualClock`].
//! [`restart`](CollectorHarness::restart) builds a fresh collector over the
//! same store and feed, the way a process restart would.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lull_core::{ChannelRef, CheckpointDocument, Message};
use lull_store::MemoryStore;
use lull_window::{Collector, CollectorSettings, ManualClock};

use crate::fixtures::base_time;
use crate::mock_feed::MockFeed;
use crate::mock_summarizer::RecordingSummarizer;

/// Builder for [`CollectorHarness`].
pub struct CollectorHarnessBuilder {
    settings: CollectorSettings,
    document: CheckpointDocument,
    start: DateTime<Utc>,
    summarizer: Option<RecordingSummarizer>,
}

impl CollectorHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: CollectorSettings {
                whitelist_mode: false,
                ..CollectorSettings::default()
            },
            document: CheckpointDocument::default(),
            start: base_time(),
            summarizer: None,
        }
    }

    pub fn with_settings(mut self, settings: CollectorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Only channels in the tracked set are admitted.
    pub fn whitelist(mut self) -> Self {
        self.settings.whitelist_mode = true;
        self
    }

    /// Starts from a previously persisted document.
    pub fn with_document(mut self, document: CheckpointDocument) -> Self {
        self.document = document;
        self
    }

    /// Sets the manual clock's initial time.
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn with_summarizer(mut self, summarizer: RecordingSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub async fn build(self) -> CollectorHarness {
        let store = MemoryStore::with_document(self.document);
        let clock = Arc::new(ManualClock::new(self.start));
        let summarizer = Arc::new(self.summarizer.unwrap_or_default());
        let feed = Arc::new(MockFeed::new());
        let collector =
            Collector::restore(self.settings.clone(), Arc::new(store.clone()), summarizer.clone())
                .await
                .with_clock(clock.clone());

        CollectorHarness {
            collector: Arc::new(collector),
            feed,
            summarizer,
            store,
            clock,
            settings: self.settings,
        }
    }
}

/// A collector with every collaborator mocked.
pub struct CollectorHarness {
    pub collector: Arc<Collector>,
    pub feed: Arc<MockFeed>,
    pub summarizer: Arc<RecordingSummarizer>,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    settings: CollectorSettings,
}

impl CollectorHarness {
    pub fn builder() -> CollectorHarnessBuilder {
        CollectorHarnessBuilder::new()
    }

    /// Default harness in open mode.
    pub async fn new() -> Self {
        Self::builder().build().await
    }

    /// Delivers a live message.
    pub async fn post(&self, channel: &ChannelRef, message: Message) {
        self.collector.handle_message(channel, message).await;
    }

    /// Delivers several live messages in order.
    pub async fn post_all(&self, channel: &ChannelRef, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.post(channel, message).await;
        }
    }

    /// Waits for every dispatched summary to finish.
    pub async fn settle(&self) {
        self.collector.dispatcher().wait_idle().await;
    }

    /// Builds a new collector over the same store, feed and clock with a fresh
    /// summarizer, as if the process had restarted.
    pub async fn restart(&self) -> CollectorHarness {
        let summarizer = Arc::new(RecordingSummarizer::new());
        let collector = Collector::restore(
            self.settings.clone(),
            Arc::new(self.store.clone()),
            summarizer.clone(),
        )
        .await
        .with_clock(self.clock.clone());

        CollectorHarness {
            collector: Arc::new(collector),
            feed: Arc::clone(&self.feed),
            summarizer,
            store: self.store.clone(),
            clock: Arc::clone(&self.clock),
            settings: self.settings.clone(),
        }
    }
}
