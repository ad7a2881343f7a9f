// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord feed adapter for the Lull collector.
//!
//! Implements [`Feed`] over the Discord gateway via serenity. Gateway events
//! are forwarded through a bounded queue to [`Feed::receive`]; history is read
//! page by page over the REST API.
//!
//! Message timestamps are taken from the snowflake id, which Discord assigns
//! at creation time.

pub mod convert;
mod handler;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use lull_config::model::DiscordConfig;
use lull_core::{ChannelRef, Feed, FeedEvent, HistoryStream, LullError, Message};
use serenity::all::{ChannelId, Client, GatewayIntents, GetMessages, Http, MessageId, ShardManager};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};

use crate::convert::{snowflake_at, to_message};
use crate::handler::Handler;

/// Discord's maximum page size for message history.
const PAGE_SIZE: u8 = 100;

/// Gateway intents the collector needs.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Discord feed implementing [`Feed`].
pub struct DiscordFeed {
    token: String,
    http: Arc<Http>,
    bot_id: Arc<AtomicU64>,
    events_tx: Option<mpsc::Sender<FeedEvent>>,
    events_rx: Mutex<mpsc::Receiver<FeedEvent>>,
    shard_manager: Option<Arc<ShardManager>>,
    client_handle: Option<tokio::task::JoinHandle<()>>,
}

impl DiscordFeed {
    /// Creates a Discord feed. Requires `config.bot_token` to be set.
    pub fn new(config: &DiscordConfig) -> Result<Self, LullError> {
        let token = config
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                LullError::Config("discord.bot_token is required for the Discord feed".into())
            })?;

        let (events_tx, events_rx) = mpsc::channel(256);
        Ok(Self {
            token: token.to_string(),
            http: Arc::new(Http::new(token)),
            bot_id: Arc::new(AtomicU64::new(0)),
            events_tx: Some(events_tx),
            events_rx: Mutex::new(events_rx),
            shard_manager: None,
            client_handle: None,
        })
    }

    /// Disconnects every shard. `receive` reports [`LullError::FeedClosed`]
    /// once the client task has exited.
    pub async fn shutdown(&self) {
        if let Some(manager) = &self.shard_manager {
            debug!("shutting down Discord shards");
            manager.shutdown_all().await;
        }
    }
}

#[async_trait]
impl Feed for DiscordFeed {
    async fn connect(&mut self) -> Result<(), LullError> {
        let Some(tx) = self.events_tx.take() else {
            return Ok(());
        };

        let handler = Handler {
            tx,
            bot_id: Arc::clone(&self.bot_id),
        };
        let mut client = Client::builder(&self.token, intents())
            .event_handler(handler)
            .await
            .map_err(|e| LullError::Feed {
                message: format!("failed to build Discord client: {e}"),
                source: Some(Box::new(e)),
            })?;
        self.shard_manager = Some(Arc::clone(&client.shard_manager));

        info!("starting Discord gateway connection");
        self.client_handle = Some(tokio::spawn(async move {
            if let Err(e) = client.start().await {
                error!(error = %e, "Discord client stopped");
            }
        }));
        Ok(())
    }

    async fn receive(&self) -> Result<FeedEvent, LullError> {
        self.events_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(LullError::FeedClosed)
    }

    fn history<'a>(&'a self, channel: &'a ChannelRef, after: DateTime<Utc>) -> HistoryStream<'a> {
        let channel_id = channel.key.channel_id;
        let http = Arc::clone(&self.http);
        let bot_id = Arc::clone(&self.bot_id);

        futures::stream::unfold(Some(snowflake_at(after)), move |cursor| {
            let http = Arc::clone(&http);
            let bot_id = Arc::clone(&bot_id);
            async move {
                let cursor = cursor?;
                let request = GetMessages::new()
                    .after(MessageId::new(cursor.max(1)))
                    .limit(PAGE_SIZE);
                match ChannelId::new(channel_id).messages(http.as_ref(), request).await {
                    Err(e) => {
                        let err = LullError::FeedFetch {
                            channel_id,
                            message: e.to_string(),
                            source: Some(Box::new(e)),
                        };
                        Some((vec![Err(err)], None))
                    }
                    Ok(page) if page.is_empty() => None,
                    Ok(mut page) => {
                        page.sort_by_key(|m| m.id);
                        let next = page
                            .last()
                            .map(|m| m.id.get())
                            .filter(|_| page.len() >= usize::from(PAGE_SIZE));
                        let own = bot_id.load(Ordering::Relaxed);
                        let items: Vec<Result<Message, LullError>> = page
                            .iter()
                            .filter(|m| m.author.id.get() != own)
                            .map(|m| Ok(to_message(m)))
                            .collect();
                        debug!(channel_id, fetched = items.len(), "history page received");
                        Some((items, next))
                    }
                }
            }
        })
        .flat_map(futures::stream::iter)
        .boxed()
    }
}

impl Drop for DiscordFeed {
    fn drop(&mut self) {
        if let Some(handle) = self.client_handle.take() {
            handle.abort();
        }
    }
}
