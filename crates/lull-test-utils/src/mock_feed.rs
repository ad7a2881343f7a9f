// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock feed for deterministic testing.
//!
//! `MockFeed` returns injected events from `receive()` and serves scripted
//! per-channel history from `history()`, honouring the `after` bound the way
//! a real platform query does.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lull_core::{ChannelRef, Feed, FeedEvent, HistoryStream, LullError, Message, sort_canonical};
use tokio::sync::{Mutex, Notify};

#[derive(Default)]
struct History {
    messages: HashMap<u64, Vec<Message>>,
    /// Channel id to the number of items served before an error.
    fail_after: HashMap<u64, usize>,
    requests: Vec<(u64, DateTime<Utc>)>,
}

/// A mock chat feed.
pub struct MockFeed {
    inbound: Mutex<VecDeque<FeedEvent>>,
    closed: StdMutex<bool>,
    notify: Notify,
    history: StdMutex<History>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            closed: StdMutex::new(false),
            notify: Notify::new(),
            history: StdMutex::new(History::default()),
        }
    }

    /// Queues a live event for `receive()`.
    pub async fn inject(&self, event: FeedEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Makes `receive()` return [`LullError::FeedClosed`] once the queue drains.
    pub fn close(&self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
        self.notify.notify_one();
    }

    /// Adds messages to a channel's history.
    pub fn add_history(&self, channel_id: u64, messages: impl IntoIterator<Item = Message>) {
        let mut history = self.history_lock();
        let stored = history.messages.entry(channel_id).or_default();
        stored.extend(messages);
        sort_canonical(stored);
    }

    /// Makes the next history queries for `channel_id` fail after `n` items.
    pub fn fail_history_after(&self, channel_id: u64, n: usize) {
        self.history_lock().fail_after.insert(channel_id, n);
    }

    /// Every `(channel_id, after)` pair `history()` was called with.
    pub fn history_requests(&self) -> Vec<(u64, DateTime<Utc>)> {
        self.history_lock().requests.clone()
    }

    fn history_lock(&self) -> std::sync::MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Feed for MockFeed {
    async fn connect(&mut self) -> Result<(), LullError> {
        Ok(())
    }

    async fn receive(&self) -> Result<FeedEvent, LullError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.is_closed() {
                return Err(LullError::FeedClosed);
            }
            self.notify.notified().await;
        }
    }

    fn history<'a>(&'a self, channel: &'a ChannelRef, after: DateTime<Utc>) -> HistoryStream<'a> {
        let channel_id = channel.key.channel_id;
        let mut history = self.history_lock();
        history.requests.push((channel_id, after));

        let mut items: Vec<Result<Message, LullError>> = history
            .messages
            .get(&channel_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| m.timestamp > after)
                    .cloned()
                    .map(Ok)
                    .collect()
            })
            .unwrap_or_default();

        if let Some(&n) = history.fail_after.get(&channel_id) {
            items.truncate(n);
            items.push(Err(LullError::FeedFetch {
                channel_id,
                message: "scripted history failure".into(),
                source: None,
            }));
        }

        Box::pin(futures::stream::iter(items))
    }
}
