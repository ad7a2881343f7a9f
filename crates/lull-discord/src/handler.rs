// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway event handler that turns serenity events into feed events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lull_core::FeedEvent;
use serenity::all::{Context, EventHandler, Guild, GuildId, Message, Ready, UnavailableGuild};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::convert::{channel_of, text_channels, to_message};

pub(crate) struct Handler {
    pub(crate) tx: mpsc::Sender<FeedEvent>,
    /// The bot's own user id once known, else 0.
    pub(crate) bot_id: Arc<AtomicU64>,
}

impl Handler {
    async fn forward(&self, event: FeedEvent) {
        if self.tx.send(event).await.is_err() {
            warn!("feed receiver dropped, discarding Discord event");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.bot_id.store(ready.user.id.get(), Ordering::Relaxed);
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "connected to Discord gateway"
        );
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        let channels: Vec<_> = guilds
            .iter()
            .filter_map(|id| ctx.cache.guild(*id).map(|guild| text_channels(&guild)))
            .flatten()
            .collect();
        info!(guilds = guilds.len(), channels = channels.len(), "Discord cache ready");
        self.forward(FeedEvent::Ready { channels }).await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }
        let channels = text_channels(&guild);
        info!(guild_id = guild.id.get(), guild = %guild.name, "added to guild");
        self.forward(FeedEvent::GuildJoined {
            guild_id: guild.id.get(),
            channels,
        })
        .await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        if incomplete.unavailable {
            debug!(guild_id = incomplete.id.get(), "guild outage, keeping state");
            return;
        }
        self.forward(FeedEvent::GuildRemoved {
            guild_id: incomplete.id.get(),
        })
        .await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.id.get() == self.bot_id.load(Ordering::Relaxed) {
            return;
        }

        let channel = channel_of(&ctx.cache, &msg);
        self.forward(FeedEvent::Message {
            channel,
            message: to_message(&msg),
        })
        .await;
    }
}
