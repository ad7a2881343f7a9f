// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation windowing for the Lull collector.
//!
//! Messages arrive per channel, are buffered in canonical order and run
//! through an N-lookback windowing engine that decides where conversations
//! start and end. A periodic sweep closes conversations that stopped without
//! a follow-up message. Completed conversations are handed to a
//! [`Summarizer`](lull_core::Summarizer) through a bounded dispatcher, and
//! per-channel checkpoints let a restarted collector resume without losing
//! or repeating work.

pub mod buffer;
pub mod clock;
pub mod collector;
pub mod dispatch;
pub mod engine;
pub mod params;
pub mod reconcile;
pub mod shutdown;
pub mod state;
pub mod tracker;

pub use buffer::ChannelBuffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use collector::{Collector, CollectorSettings, SweepReport};
pub use dispatch::SummaryDispatcher;
pub use engine::{Evaluation, evaluate};
pub use params::WindowParams;
pub use reconcile::SweepDecision;
pub use state::{ChannelState, StateTable, SweepOutcome};
pub use tracker::{ChannelTracker, TrackChange};
