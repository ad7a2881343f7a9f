// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lull conversation collector.
//!
//! Provides the message and checkpoint model, the shared error type, and the
//! traits behind which the feed, summarizer and checkpoint store live.

pub mod error;
pub mod traits;
pub mod types;

pub use error::LullError;
pub use traits::{CheckpointStore, Feed, HistoryStream, Summarizer};
pub use types::{
    ChannelKey, ChannelRef, Checkpoint, CheckpointDocument, Chunk, FeedEvent, Message,
    sort_canonical,
};
