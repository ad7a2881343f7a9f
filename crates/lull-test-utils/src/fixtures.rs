// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message and channel builders.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use lull_core::{ChannelKey, ChannelRef, Message};

/// Fixed reference instant all fixtures are relative to.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// `base_time()` plus `offset` minutes.
pub fn minutes(offset: i64) -> DateTime<Utc> {
    base_time() + TimeDelta::minutes(offset)
}

/// A message posted `offset` minutes after `base_time()`.
pub fn message(id: u64, offset: i64) -> Message {
    message_at(id, minutes(offset))
}

pub fn message_at(id: u64, timestamp: DateTime<Utc>) -> Message {
    Message {
        id,
        author_id: 100 + id % 3,
        timestamp,
        content: format!("message {id}"),
        attachments: vec![],
    }
}

/// A guild text channel named `channel-<id>` in `guild-<guild>`.
pub fn channel(guild_id: u64, channel_id: u64) -> ChannelRef {
    ChannelRef::new(
        ChannelKey::new(Some(guild_id), channel_id),
        format!("channel-{channel_id}"),
        format!("guild-{guild_id}"),
    )
}
