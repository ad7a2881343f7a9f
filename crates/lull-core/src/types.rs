// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message, checkpoint and channel identity types.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single collected chat message.
///
/// Messages are immutable once ingested. Ordering is defined only by
/// [`Message::canonical_cmp`]; the remaining fields never participate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Platform message id (a Discord snowflake).
    pub id: u64,
    /// Author id.
    pub author_id: u64,
    /// Creation time reported by the platform.
    pub timestamp: DateTime<Utc>,
    /// Text content.
    pub content: String,
    /// Attachment URLs.
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Message {
    /// Orders by timestamp, then id.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sorts messages into canonical order.
pub fn sort_canonical(messages: &mut [Message]) {
    messages.sort_by(Message::canonical_cmp);
}

/// Identifies a channel within a guild. `guild_id` is `None` for direct messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey {
    pub guild_id: Option<u64>,
    pub channel_id: u64,
}

impl ChannelKey {
    pub fn new(guild_id: Option<u64>, channel_id: u64) -> Self {
        Self {
            guild_id,
            channel_id,
        }
    }

    /// The string form used as the checkpoint document key.
    pub fn checkpoint_id(&self) -> String {
        self.channel_id.to_string()
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.guild_id {
            Some(guild) => write!(f, "{guild}/{}", self.channel_id),
            None => write!(f, "dm/{}", self.channel_id),
        }
    }
}

/// A channel as reported by the feed, with the display names the summarizer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub key: ChannelKey,
    pub channel_name: String,
    pub server_name: String,
}

impl ChannelRef {
    pub fn new(
        key: ChannelKey,
        channel_name: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            key,
            channel_name: channel_name.into(),
            server_name: server_name.into(),
        }
    }
}

/// Persisted per-channel resumption marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Messages at or before this instant are never re-requested on resume.
    pub checked_at: DateTime<Utc>,
    /// Whether the channel is mid-conversation.
    pub active: bool,
}

impl Checkpoint {
    /// An idle checkpoint that resumes from `checked_at`.
    pub fn idle_since(checked_at: DateTime<Utc>) -> Self {
        Self {
            checked_at,
            active: false,
        }
    }

    /// Moves `checked_at` to `candidate` if that is later. Never moves backwards.
    pub fn advance_to(&mut self, candidate: DateTime<Utc>) {
        if candidate > self.checked_at {
            self.checked_at = candidate;
        }
    }
}

/// The whole persisted state: per-channel checkpoints plus the optional whitelist.
///
/// An absent `tracked_channels` means every channel is in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointDocument {
    #[serde(default)]
    pub channels: BTreeMap<String, Checkpoint>,
    #[serde(default)]
    pub tracked_channels: Option<BTreeSet<String>>,
}

/// A completed conversation handed to the summarizer.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub channel_name: String,
    pub server_name: String,
    pub messages: Vec<Message>,
}

/// Events produced by a live feed.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The connection is ready; lists every visible text channel.
    Ready { channels: Vec<ChannelRef> },
    /// A new message was posted.
    Message {
        channel: ChannelRef,
        message: Message,
    },
    /// The bot was added to a guild.
    GuildJoined {
        guild_id: u64,
        channels: Vec<ChannelRef>,
    },
    /// The bot was removed from a guild.
    GuildRemoved { guild_id: u64 },
}
