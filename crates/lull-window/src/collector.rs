// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The state-owning coordinator.
//!
//! [`Collector`] wires feed events through the channel tracker into the
//! per-channel state table, runs the engine on every arrival and the sweep on
//! a timer, dispatches completed conversations and keeps the checkpoint store
//! in step.
//!
//! Lock order is tracker, then channel entry, then the checkpoint document.
//! Nothing acquires an earlier lock while holding a later one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::StreamExt;
use lull_config::LullConfig;
use lull_core::{
    ChannelKey, ChannelRef, Checkpoint, CheckpointDocument, CheckpointStore, Feed, FeedEvent,
    LullError, Message, Summarizer,
};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::dispatch::SummaryDispatcher;
use crate::params::{WindowParams, secs};
use crate::state::{ChannelState, SharedState, StateTable, SweepOutcome};
use crate::tracker::{ChannelTracker, TrackChange};

/// Runtime knobs for the collector, usually derived from [`LullConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    pub params: WindowParams,
    /// How far back a channel with no checkpoint is backfilled.
    pub lookback: TimeDelta,
    pub whitelist_mode: bool,
    pub sweep_interval: Duration,
    pub max_concurrent: usize,
    pub drain_timeout: Duration,
}

impl CollectorSettings {
    pub fn from_config(config: &LullConfig) -> Self {
        Self {
            params: WindowParams::from(&config.window),
            lookback: secs(config.tracking.lookback_secs),
            whitelist_mode: config.tracking.whitelist_mode,
            sweep_interval: config.window.sweep_interval(),
            max_concurrent: config.summarizer.max_concurrent,
            drain_timeout: config.summarizer.drain_timeout(),
        }
    }
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self::from_config(&LullConfig::default())
    }
}

/// Counts from one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub swept: usize,
    pub finalized: usize,
    pub activated: usize,
}

/// Owns every channel's windowing state and drives it from feed events and
/// the sweep timer.
pub struct Collector {
    settings: CollectorSettings,
    clock: Arc<dyn Clock>,
    store: Arc<dyn CheckpointStore>,
    dispatcher: SummaryDispatcher,
    tracker: RwLock<ChannelTracker>,
    table: StateTable,
    /// In-memory mirror of the persisted document.
    document: Mutex<CheckpointDocument>,
}

impl Collector {
    /// Loads persisted checkpoints and the tracked set from `store`.
    ///
    /// A store that cannot be read is logged and treated as empty.
    pub async fn restore(
        settings: CollectorSettings,
        store: Arc<dyn CheckpointStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let mut document = match store.load().await {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "failed to load checkpoints, starting from empty state");
                CheckpointDocument::default()
            }
        };

        let tracker =
            ChannelTracker::from_persisted(document.tracked_channels.take(), settings.whitelist_mode);
        document.tracked_channels = tracker.tracked().cloned();

        info!(
            checkpoints = document.channels.len(),
            whitelist = tracker.is_whitelist(),
            tracked = tracker.tracked().map_or(0, |set| set.len()),
            "collector state restored"
        );
        if tracker.tracked().is_some_and(|set| set.is_empty()) {
            warn!(
                "whitelist mode is on but no channels are tracked, nothing will be collected; \
                 add channel ids to `tracked_channels` in the checkpoint document or set \
                 tracking.whitelist_mode = false"
            );
        }

        Self {
            dispatcher: SummaryDispatcher::new(summarizer, settings.max_concurrent),
            settings,
            clock: Arc::new(SystemClock),
            store,
            tracker: RwLock::new(tracker),
            table: StateTable::new(),
            document: Mutex::new(document),
        }
    }

    /// Replaces the wall clock used for sweeps and checkpoint seeding.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &SummaryDispatcher {
        &self.dispatcher
    }

    /// Processes feed events and sweeps on a timer until `cancel` fires or the
    /// feed closes, then shuts down.
    pub async fn run(&self, feed: &dyn Feed, cancel: CancellationToken) -> Result<(), LullError> {
        let period = self.settings.sweep_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(sweep_interval_secs = period.as_secs(), "collector running");
        loop {
            tokio::select! {
                event = feed.receive() => match event {
                    Ok(event) => self.handle_event(feed, event).await,
                    Err(LullError::FeedClosed) => {
                        warn!("feed closed, stopping collector");
                        break;
                    }
                    Err(e) => error!(error = %e, "feed receive failed"),
                },
                _ = ticker.tick() => {
                    let report = self.sweep().await;
                    debug!(
                        swept = report.swept,
                        finalized = report.finalized,
                        activated = report.activated,
                        "sweep complete"
                    );
                }
                _ = cancel.cancelled() => {
                    info!("shutdown requested, stopping collector");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Saves the checkpoint document a final time and waits for in-flight
    /// summaries up to the drain timeout.
    pub async fn shutdown(&self) -> bool {
        self.save_document().await;
        self.dispatcher.drain(self.settings.drain_timeout).await
    }

    pub async fn handle_event(&self, feed: &dyn Feed, event: FeedEvent) {
        match event {
            FeedEvent::Ready { channels } => {
                info!(channels = channels.len(), "feed ready, backfilling tracked channels");
                self.backfill_admitted(feed, &channels).await;
            }
            FeedEvent::GuildJoined { guild_id, channels } => {
                info!(guild_id, channels = channels.len(), "joined guild");
                self.backfill_admitted(feed, &channels).await;
            }
            FeedEvent::Message { channel, message } => {
                self.handle_message(&channel, message).await;
            }
            FeedEvent::GuildRemoved { guild_id } => {
                self.forget_guild(guild_id).await;
            }
        }
    }

    /// Runs a single live message through the engine if its channel is in
    /// scope.
    pub async fn handle_message(&self, channel: &ChannelRef, message: Message) {
        if !self.tracker.read().await.admits(&channel.key) {
            trace!(channel = %channel.key, "ignoring message from untracked channel");
            return;
        }

        let entry = self.entry_for(channel).await;
        let mut state = entry.lock().await;
        if state.is_retired() {
            return;
        }
        if state.channel != *channel {
            state.channel = channel.clone();
        }
        self.ingest(&mut state, vec![message]).await;
    }

    /// Fetches everything newer than the channel's checkpoint and runs it
    /// through the engine. Returns the number of messages fetched.
    ///
    /// The channel stays locked for the whole fetch. A fetch error keeps what
    /// arrived before it.
    pub async fn backfill(&self, feed: &dyn Feed, channel: &ChannelRef) -> usize {
        let entry = self.entry_for(channel).await;
        let mut state = entry.lock().await;
        if state.is_retired() {
            return 0;
        }

        let after = state.checkpoint.checked_at;
        let mut fetched = Vec::new();
        let mut history = feed.history(channel, after);
        while let Some(item) = history.next().await {
            match item {
                Ok(message) => fetched.push(message),
                Err(e) => {
                    warn!(
                        channel = %channel.key,
                        kept = fetched.len(),
                        error = %e,
                        "history fetch failed, keeping partial backfill"
                    );
                    break;
                }
            }
        }
        drop(history);

        let count = fetched.len();
        info!(channel = %channel.key, count, after = %after, "backfilled channel history");
        self.ingest(&mut state, fetched).await;
        count
    }

    /// Adds a channel to the whitelist, seeds or resets its checkpoint to the
    /// lookback floor and backfills it.
    pub async fn track(&self, feed: &dyn Feed, channel: &ChannelRef) -> TrackChange {
        let floor = self.lookback_floor();
        let checkpoint = {
            let mut tracker = self.tracker.write().await;
            let change = tracker.enable(&channel.key);
            if !change.is_changed() {
                return change;
            }

            let mut document = self.document.lock().await;
            document.tracked_channels = tracker.tracked().cloned();
            let checkpoint = *document
                .channels
                .entry(channel.key.checkpoint_id())
                .and_modify(|cp| {
                    if cp.checked_at < floor {
                        *cp = Checkpoint::idle_since(floor);
                    }
                })
                .or_insert_with(|| Checkpoint::idle_since(floor));
            self.save_locked(&document).await;
            checkpoint
        };

        if let Some(entry) = self.table.get(&channel.key).await {
            let mut state = entry.lock().await;
            if state.checkpoint != checkpoint {
                state.checkpoint = checkpoint;
                state.buffer.clear();
            }
        }

        info!(channel = %channel.key, since = %checkpoint.checked_at, "channel tracking enabled");
        self.backfill(feed, channel).await;
        TrackChange::Changed
    }

    /// Removes a channel from the whitelist and discards its buffer and
    /// checkpoint.
    pub async fn untrack(&self, key: &ChannelKey) -> TrackChange {
        let mut tracker = self.tracker.write().await;
        let change = tracker.disable(key);
        if !change.is_changed() {
            return change;
        }

        if let Some(entry) = self.table.remove(key).await {
            entry.lock().await.retire();
        }

        let mut document = self.document.lock().await;
        document.channels.remove(&key.checkpoint_id());
        document.tracked_channels = tracker.tracked().cloned();
        self.save_locked(&document).await;

        info!(channel = %key, "channel tracking disabled");
        TrackChange::Changed
    }

    /// Drops all state for a guild the bot has left. In whitelist mode its
    /// channels also leave the tracked set.
    pub async fn forget_guild(&self, guild_id: u64) {
        let mut tracker = self.tracker.write().await;
        let removed = self.table.remove_guild(guild_id).await;

        let mut untracked = 0;
        for (key, entry) in &removed {
            entry.lock().await.retire();
            if tracker.disable(key).is_changed() {
                untracked += 1;
            }
        }

        if untracked > 0 {
            let mut document = self.document.lock().await;
            document.tracked_channels = tracker.tracked().cloned();
            self.save_locked(&document).await;
        }

        info!(guild_id, channels = removed.len(), untracked, "left guild, dropped channel state");
    }

    /// Runs the idle reconciler over every channel, then persists all
    /// checkpoints in one write.
    pub async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let params = self.settings.params;
        let mut report = SweepReport::default();

        for (key, entry) in self.table.snapshot().await {
            let mut state = entry.lock().await;
            if state.is_retired() {
                continue;
            }

            match state.reconcile(now, &params) {
                SweepOutcome::Finalized(messages) => {
                    info!(channel = %key, count = messages.len(), "conversation went idle, finalizing");
                    let chunk = state.chunk(messages);
                    self.dispatcher.dispatch(chunk);
                    report.finalized += 1;
                }
                SweepOutcome::Activated => {
                    debug!(channel = %key, buffered = state.buffer.len(), "burst detected, marking active");
                    report.activated += 1;
                }
                SweepOutcome::Held => {}
            }

            self.document
                .lock()
                .await
                .channels
                .insert(key.checkpoint_id(), state.checkpoint);
            report.swept += 1;
        }

        if report.swept > 0 {
            self.save_document().await;
        }
        report
    }

    /// The live checkpoint for `key`, falling back to the persisted one.
    pub async fn checkpoint(&self, key: &ChannelKey) -> Option<Checkpoint> {
        if let Some(entry) = self.table.get(key).await {
            return Some(entry.lock().await.checkpoint);
        }
        self.document.lock().await.channels.get(&key.checkpoint_id()).copied()
    }

    /// The unresolved messages currently buffered for `key`.
    pub async fn buffered(&self, key: &ChannelKey) -> Vec<Message> {
        match self.table.get(key).await {
            Some(entry) => {
                let state = entry.lock().await;
                state.buffer.messages().to_vec()
            }
            None => Vec::new(),
        }
    }

    pub async fn is_tracked(&self, key: &ChannelKey) -> bool {
        self.tracker.read().await.admits(key)
    }

    /// A copy of the checkpoint document as it will next be persisted.
    pub async fn document(&self) -> CheckpointDocument {
        self.document.lock().await.clone()
    }

    async fn backfill_admitted(&self, feed: &dyn Feed, channels: &[ChannelRef]) {
        let admitted: Vec<&ChannelRef> = {
            let tracker = self.tracker.read().await;
            channels.iter().filter(|c| tracker.admits(&c.key)).collect()
        };
        debug!(admitted = admitted.len(), offered = channels.len(), "backfilling channels");
        for channel in admitted {
            self.backfill(feed, channel).await;
        }
    }

    /// Runs `incoming` through the engine under the caller's channel lock,
    /// dispatching completed conversations before persisting the checkpoint.
    async fn ingest(&self, state: &mut ChannelState, incoming: Vec<Message>) {
        let ingested = state.ingest(incoming, &self.settings.params);

        for messages in ingested.chunks {
            info!(channel = %state.channel.key, count = messages.len(), "conversation ended");
            let chunk = state.chunk(messages);
            self.dispatcher.dispatch(chunk);
        }

        if ingested.checkpoint_changed {
            debug!(
                channel = %state.channel.key,
                checked_at = %state.checkpoint.checked_at,
                active = state.checkpoint.active,
                "checkpoint advanced"
            );
            let mut document = self.document.lock().await;
            document
                .channels
                .insert(state.channel.key.checkpoint_id(), state.checkpoint);
            self.save_locked(&document).await;
        }
    }

    /// Returns the state entry for `channel`, creating it from the persisted
    /// checkpoint or the lookback floor.
    async fn entry_for(&self, channel: &ChannelRef) -> SharedState {
        if let Some(entry) = self.table.get(&channel.key).await {
            return entry;
        }

        let checkpoint = {
            let floor = self.lookback_floor();
            let mut document = self.document.lock().await;
            *document
                .channels
                .entry(channel.key.checkpoint_id())
                .or_insert_with(|| Checkpoint::idle_since(floor))
        };
        self.table
            .get_or_insert_with(channel.key, || ChannelState::new(channel.clone(), checkpoint))
            .await
    }

    fn lookback_floor(&self) -> DateTime<Utc> {
        self.clock
            .now()
            .checked_sub_signed(self.settings.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    async fn save_document(&self) {
        let document = self.document.lock().await;
        self.save_locked(&document).await;
    }

    async fn save_locked(&self, document: &CheckpointDocument) {
        if let Err(e) = self.store.save(document).await {
            error!(error = %e, "failed to persist checkpoints, continuing with in-memory state");
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("settings", &self.settings)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
