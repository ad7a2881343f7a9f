// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the windowing core and its external collaborators.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod checkpoint;
pub mod feed;
pub mod summarizer;

pub use checkpoint::CheckpointStore;
pub use feed::{Feed, HistoryStream};
pub use summarizer::Summarizer;
