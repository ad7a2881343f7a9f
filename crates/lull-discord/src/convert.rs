// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between serenity models and Lull types.

use chrono::{DateTime, Utc};
use lull_core::{ChannelKey, ChannelRef, Message};
use serenity::all::{Cache, ChannelType, Guild};

/// Discord's snowflake epoch (2015-01-01T00:00:00Z) in Unix milliseconds.
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Server name used for direct-message channels.
pub const DIRECT_MESSAGES: &str = "direct-messages";

/// Creation time encoded in a snowflake id.
pub fn snowflake_time(id: u64) -> DateTime<Utc> {
    let ms = i64::try_from(id >> 22).unwrap_or(i64::MAX - DISCORD_EPOCH_MS) + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// The largest snowflake created at or before `at`. Querying for messages
/// after it returns only messages strictly newer than `at` (to the
/// millisecond).
pub fn snowflake_at(at: DateTime<Utc>) -> u64 {
    let ms = at.timestamp_millis() - DISCORD_EPOCH_MS;
    if ms < 0 {
        return 0;
    }
    ((ms as u64) << 22) | ((1 << 22) - 1)
}

pub fn to_message(msg: &serenity::all::Message) -> Message {
    let id = msg.id.get();
    Message {
        id,
        author_id: msg.author.id.get(),
        timestamp: snowflake_time(id),
        content: msg.content.clone(),
        attachments: msg.attachments.iter().map(|a| a.url.clone()).collect(),
    }
}

/// Every plain text channel of `guild`.
pub fn text_channels(guild: &Guild) -> Vec<ChannelRef> {
    let mut channels: Vec<ChannelRef> = guild
        .channels
        .values()
        .filter(|c| c.kind == ChannelType::Text)
        .map(|c| {
            ChannelRef::new(
                ChannelKey::new(Some(guild.id.get()), c.id.get()),
                c.name.clone(),
                guild.name.clone(),
            )
        })
        .collect();
    channels.sort_by_key(|c| c.key);
    channels
}

/// Resolves display names for the channel a message was posted in, falling
/// back to ids when the cache does not know the guild or channel.
pub fn channel_of(cache: &Cache, msg: &serenity::all::Message) -> ChannelRef {
    let channel_id = msg.channel_id.get();
    let Some(guild_id) = msg.guild_id else {
        return ChannelRef::new(
            ChannelKey::new(None, channel_id),
            msg.author.name.clone(),
            DIRECT_MESSAGES,
        );
    };

    let key = ChannelKey::new(Some(guild_id.get()), channel_id);
    match cache.guild(guild_id) {
        Some(guild) => {
            let channel_name = guild
                .channels
                .get(&msg.channel_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| channel_id.to_string());
            ChannelRef::new(key, channel_name, guild.name.clone())
        }
        None => ChannelRef::new(key, channel_id.to_string(), guild_id.get().to_string()),
    }
}
