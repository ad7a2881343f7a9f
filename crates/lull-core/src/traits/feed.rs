// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feed adapter trait for chat-platform transports (Discord, etc.).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::LullError;
use crate::types::{ChannelRef, FeedEvent, Message};

/// Lazily produced, finite, oldest-first sequence of historical messages.
///
/// An `Err` item ends the useful part of the stream; items yielded before it
/// are still valid.
pub type HistoryStream<'a> = BoxStream<'a, Result<Message, LullError>>;

/// Source of live message events and historical backfill.
///
/// Implementations filter out the bot's own messages before they reach
/// [`receive`](Feed::receive) or [`history`](Feed::history).
#[async_trait]
pub trait Feed: Send + Sync {
    /// Establishes the connection to the platform.
    async fn connect(&mut self) -> Result<(), LullError>;

    /// Waits for the next live event. Returns [`LullError::FeedClosed`] once
    /// the platform connection has shut down for good.
    async fn receive(&self) -> Result<FeedEvent, LullError>;

    /// Returns messages in `channel` strictly newer than `after`, oldest first.
    fn history<'a>(&'a self, channel: &'a ChannelRef, after: DateTime<Utc>) -> HistoryStream<'a>;
}
