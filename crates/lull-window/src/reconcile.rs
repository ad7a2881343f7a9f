// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock idle reconciliation.
//!
//! The reactive engine only runs when a message arrives, so a conversation
//! that simply stops is never closed by it. The sweep closes those, and marks
//! channels active when a burst has piled up without a classification.

use chrono::{DateTime, TimeDelta, Utc};
use lull_core::Checkpoint;

use crate::buffer::ChannelBuffer;
use crate::params::WindowParams;

/// What a sweep should do to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDecision {
    /// Emit the whole buffer as one conversation and go idle.
    Finalize,
    /// Mark the channel active. The buffer is left as it is.
    Activate,
    /// Nothing to do beyond advancing `checked_at`.
    Hold,
}

/// Decides the sweep transition for a channel at wall-clock `now`.
pub fn decide(
    buffer: &ChannelBuffer,
    checkpoint: &Checkpoint,
    now: DateTime<Utc>,
    params: &WindowParams,
) -> SweepDecision {
    let Some(anchor) = buffer.nth_from_end(params.min_cluster) else {
        return SweepDecision::Hold;
    };

    if checkpoint.active {
        match cutoff(now, params.end_gap) {
            Some(limit) if anchor.timestamp < limit => SweepDecision::Finalize,
            _ => SweepDecision::Hold,
        }
    } else {
        match cutoff(now, params.start_gap) {
            Some(limit) if anchor.timestamp <= limit => SweepDecision::Hold,
            _ => SweepDecision::Activate,
        }
    }
}

/// `now - gap`, or `None` when that falls outside the representable range.
pub(crate) fn cutoff(now: DateTime<Utc>, gap: TimeDelta) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(gap)
}
