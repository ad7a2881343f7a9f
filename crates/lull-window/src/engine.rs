// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reactive conversation windowing.
//!
//! [`evaluate`] scans a channel's unresolved messages in canonical order,
//! growing a current chunk. Once the chunk plus the incoming message reaches
//! `min_cluster` messages every arrival is classified against the trailing
//! `min_cluster`-message window ending at it:
//!
//! - idle: a window whose consecutive gaps are all below `start_gap` starts a
//!   conversation. The chunk collapses to that window.
//! - active: a window spanning more than `end_gap` ends the conversation. The
//!   chunk accumulated so far is emitted and the arrival starts a new one.
//!
//! The function is pure. Committing its result is the caller's job.

use chrono::{DateTime, TimeDelta, Utc};
use lull_core::{Checkpoint, Message};

use crate::params::WindowParams;

/// Result of one scan over a channel's unresolved messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Completed conversations, oldest first.
    pub chunks: Vec<Vec<Message>>,
    /// The unresolved tail that replaces the buffer.
    pub tail: Vec<Message>,
    /// The checkpoint to commit. Equal to the prior one unless `classified`.
    pub checkpoint: Checkpoint,
    /// Whether any arrival reached a classification attempt.
    pub classified: bool,
}

/// Runs the windowing scan over `messages`, which must already be in
/// canonical order with unique ids.
pub fn evaluate(messages: Vec<Message>, prior: Checkpoint, params: &WindowParams) -> Evaluation {
    let min_cluster = params.min_cluster.max(2);

    let mut chunks = Vec::new();
    let mut current: Vec<Message> = Vec::with_capacity(messages.len());
    let mut active = prior.active;
    let mut candidate: DateTime<Utc> = prior.checked_at;
    let mut classified = false;

    for m in messages {
        if current.len() + 1 < min_cluster {
            current.push(m);
            continue;
        }
        classified = true;

        if active {
            let anchor = &current[current.len() + 1 - min_cluster];
            if m.timestamp - anchor.timestamp > params.end_gap {
                candidate = m.timestamp;
                chunks.push(std::mem::replace(&mut current, vec![m]));
                active = false;
            } else {
                current.push(m);
            }
        } else {
            current.push(m);
            let start = current.len() - min_cluster;
            if is_clustered(&current[start..], params.start_gap) {
                current.drain(..start);
                candidate = current[0].timestamp;
                active = true;
            }
        }
    }

    let mut checkpoint = prior;
    if classified {
        checkpoint.advance_to(candidate);
        checkpoint.active = active;
    }

    Evaluation {
        chunks,
        tail: current,
        checkpoint,
        classified,
    }
}

/// Every consecutive gap inside `window` is strictly below `start_gap`.
fn is_clustered(window: &[Message], start_gap: TimeDelta) -> bool {
    window
        .windows(2)
        .all(|pair| pair[1].timestamp - pair[0].timestamp < start_gap)
}
