// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel state and the table that owns it.
//!
//! Each channel's buffer and checkpoint live together behind one mutex, so the
//! reactive engine and the sweep mutate them as a unit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lull_core::{ChannelKey, ChannelRef, Checkpoint, Chunk, Message};
use tokio::sync::{Mutex, RwLock};

use crate::buffer::ChannelBuffer;
use crate::engine;
use crate::params::WindowParams;
use crate::reconcile::{self, SweepDecision};

/// Result of feeding new messages through the engine.
#[derive(Debug, Default)]
pub struct Ingested {
    pub chunks: Vec<Vec<Message>>,
    pub checkpoint_changed: bool,
}

/// Result of one sweep over a channel.
#[derive(Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    Finalized(Vec<Message>),
    Activated,
    Held,
}

/// Buffer and checkpoint for one channel.
#[derive(Debug)]
pub struct ChannelState {
    pub channel: ChannelRef,
    pub buffer: ChannelBuffer,
    pub checkpoint: Checkpoint,
    retired: bool,
}

impl ChannelState {
    pub fn new(channel: ChannelRef, checkpoint: Checkpoint) -> Self {
        Self {
            channel,
            buffer: ChannelBuffer::new(),
            checkpoint,
            retired: false,
        }
    }

    /// Appends `incoming` and runs the engine, committing its result.
    pub fn ingest(&mut self, incoming: Vec<Message>, params: &WindowParams) -> Ingested {
        self.buffer.extend(incoming);
        let eval = engine::evaluate(self.buffer.take(), self.checkpoint, params);
        self.buffer.replace(eval.tail);

        let checkpoint_changed = eval.checkpoint != self.checkpoint;
        self.checkpoint = eval.checkpoint;
        Ingested {
            chunks: eval.chunks,
            checkpoint_changed,
        }
    }

    /// Applies the sweep transition for `now` and advances `checked_at` to
    /// `now - start_gap`.
    pub fn reconcile(&mut self, now: DateTime<Utc>, params: &WindowParams) -> SweepOutcome {
        let outcome = match reconcile::decide(&self.buffer, &self.checkpoint, now, params) {
            SweepDecision::Finalize => {
                self.checkpoint.active = false;
                SweepOutcome::Finalized(self.buffer.take())
            }
            SweepDecision::Activate => {
                self.checkpoint.active = true;
                SweepOutcome::Activated
            }
            SweepDecision::Hold => SweepOutcome::Held,
        };
        if let Some(floor) = reconcile::cutoff(now, params.start_gap) {
            self.checkpoint.advance_to(floor);
        }
        outcome
    }

    /// Labels `messages` with this channel's display names.
    pub fn chunk(&self, messages: Vec<Message>) -> Chunk {
        Chunk {
            channel_name: self.channel.channel_name.clone(),
            server_name: self.channel.server_name.clone(),
            messages,
        }
    }

    /// Marks the state as dropped from the table. Callers that still hold
    /// the entry must not commit anything afterwards.
    pub fn retire(&mut self) {
        self.retired = true;
        self.buffer.clear();
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}

pub type SharedState = Arc<Mutex<ChannelState>>;

/// All live channel states, keyed by `(guild, channel)`.
#[derive(Debug, Default)]
pub struct StateTable {
    entries: RwLock<HashMap<ChannelKey, SharedState>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &ChannelKey) -> Option<SharedState> {
        self.entries.read().await.get(key).cloned()
    }

    /// Returns the entry for `key`, creating it with `init` if absent.
    pub async fn get_or_insert_with(
        &self,
        key: ChannelKey,
        init: impl FnOnce() -> ChannelState,
    ) -> SharedState {
        if let Some(entry) = self.get(&key).await {
            return entry;
        }
        let mut entries = self.entries.write().await;
        entries
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(init())))
            .clone()
    }

    pub async fn remove(&self, key: &ChannelKey) -> Option<SharedState> {
        self.entries.write().await.remove(key)
    }

    /// Removes every entry belonging to `guild_id`.
    pub async fn remove_guild(&self, guild_id: u64) -> Vec<(ChannelKey, SharedState)> {
        let mut entries = self.entries.write().await;
        let keys: Vec<ChannelKey> = entries
            .keys()
            .filter(|k| k.guild_id == Some(guild_id))
            .copied()
            .collect();
        keys.into_iter()
            .filter_map(|k| entries.remove(&k).map(|entry| (k, entry)))
            .collect()
    }

    /// Snapshot of the current entries, in key order.
    pub async fn snapshot(&self) -> Vec<(ChannelKey, SharedState)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (*k, Arc::clone(v)))
            .collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn msg(id: u64, minutes: i64) -> Message {
        Message {
            id,
            author_id: 1,
            timestamp: base() + TimeDelta::minutes(minutes),
            content: format!("m{id}"),
            attachments: vec![],
        }
    }

    fn state() -> ChannelState {
        ChannelState::new(
            ChannelRef::new(ChannelKey::new(Some(1), 10), "general", "Guild"),
            Checkpoint::idle_since(base() - TimeDelta::hours(3)),
        )
    }

    #[test]
    fn ingest_reports_checkpoint_changes_only_on_commit() {
        let mut state = state();
        let params = WindowParams::default();

        let first = state.ingest((0..4).map(|i| msg(i, i as i64)).collect(), &params);
        assert!(!first.checkpoint_changed);

        let second = state.ingest(vec![msg(4, 4)], &params);
        assert!(second.checkpoint_changed);
        assert!(state.checkpoint.active);
        assert_eq!(state.buffer.len(), 5);
    }

    #[test]
    fn duplicate_arrivals_do_not_change_anything() {
        let mut state = state();
        let params = WindowParams::default();
        state.ingest((0..5).map(|i| msg(i, i as i64)).collect(), &params);
        let before = state.checkpoint;

        let again = state.ingest(vec![msg(2, 2), msg(4, 4)], &params);

        assert!(again.chunks.is_empty());
        assert!(!again.checkpoint_changed);
        assert_eq!(state.checkpoint, before);
        assert_eq!(state.buffer.len(), 5);
    }

    #[test]
    fn sweep_finalizes_the_entire_buffer() {
        let mut state = state();
        let params = WindowParams::default();
        state.ingest((0..5).map(|i| msg(i, i as i64)).collect(), &params);
        state.ingest(vec![msg(5, 10), msg(6, 20)], &params);
        assert_eq!(state.buffer.len(), 7);

        let now = base() + TimeDelta::minutes(20 + 70);
        let outcome = state.reconcile(now, &params);

        let SweepOutcome::Finalized(messages) = outcome else {
            panic!("expected finalize, got {outcome:?}");
        };
        assert_eq!(messages.len(), 7);
        assert!(state.buffer.is_empty());
        assert!(!state.checkpoint.active);
        assert_eq!(state.checkpoint.checked_at, now - params.start_gap);
    }

    #[test]
    fn sweep_activation_keeps_the_buffer_whole() {
        let mut state = state();
        let params = WindowParams::default();
        // Spread-out history keeps the engine idle.
        state.ingest(
            vec![msg(0, 0), msg(1, 20), msg(2, 40), msg(3, 60), msg(4, 80)],
            &params,
        );
        assert!(!state.checkpoint.active);

        let outcome = state.reconcile(base() + TimeDelta::minutes(5), &params);
        assert_eq!(outcome, SweepOutcome::Activated);
        assert!(state.checkpoint.active);
        assert_eq!(state.buffer.len(), 5);
    }

    #[test]
    fn sweep_never_moves_checked_at_backwards() {
        let mut state = state();
        state.checkpoint.checked_at = base() + TimeDelta::hours(5);
        state.reconcile(base(), &WindowParams::default());
        assert_eq!(state.checkpoint.checked_at, base() + TimeDelta::hours(5));
    }

    #[test]
    fn retire_clears_the_buffer() {
        let mut state = state();
        state.ingest(vec![msg(0, 0)], &WindowParams::default());
        state.retire();
        assert!(state.is_retired());
        assert!(state.buffer.is_empty());
    }

    #[tokio::test]
    async fn table_creates_entries_once() {
        let table = StateTable::new();
        let key = ChannelKey::new(Some(1), 10);

        let a = table.get_or_insert_with(key, state).await;
        let b = table
            .get_or_insert_with(key, || panic!("entry should already exist"))
            .await;

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn remove_guild_only_touches_that_guild() {
        let table = StateTable::new();
        table.get_or_insert_with(ChannelKey::new(Some(1), 10), state).await;
        table.get_or_insert_with(ChannelKey::new(Some(1), 11), state).await;
        table.get_or_insert_with(ChannelKey::new(Some(2), 20), state).await;

        let removed = table.remove_guild(1).await;

        assert_eq!(removed.len(), 2);
        let remaining: Vec<_> = table.snapshot().await.into_iter().map(|(k, _)| k).collect();
        assert_eq!(remaining, vec![ChannelKey::new(Some(2), 20)]);
    }
}
