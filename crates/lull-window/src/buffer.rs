// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel buffer of unresolved messages.

use std::collections::HashSet;

use lull_core::{Message, sort_canonical};

/// Messages not yet consumed into a chunk, kept in canonical order with
/// unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelBuffer {
    messages: Vec<Message>,
}

impl ChannelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a buffer from arbitrary input, normalizing order and ids.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut buffer = Self { messages };
        buffer.normalize();
        buffer
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Appends `incoming`, then re-sorts and drops repeated ids.
    pub fn extend(&mut self, incoming: impl IntoIterator<Item = Message>) {
        self.messages.extend(incoming);
        self.normalize();
    }

    /// The `n`-th message counting back from the newest (`n = 1` is the newest).
    pub fn nth_from_end(&self, n: usize) -> Option<&Message> {
        if n == 0 || n > self.messages.len() {
            return None;
        }
        self.messages.get(self.messages.len() - n)
    }

    /// Replaces the contents with an already-normalized tail.
    pub(crate) fn replace(&mut self, tail: Vec<Message>) {
        self.messages = tail;
    }

    /// Empties the buffer, returning what it held.
    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn normalize(&mut self) {
        sort_canonical(&mut self.messages);
        let mut seen = HashSet::with_capacity(self.messages.len());
        self.messages.retain(|m| seen.insert(m.id));
    }
}
