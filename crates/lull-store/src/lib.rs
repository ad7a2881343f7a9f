// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkpoint persistence backends for the Lull collector.
//!
//! - [`JsonFileStore`] keeps the checkpoint document in one JSON file,
//!   replaced atomically on every save.
//! - [`MemoryStore`] keeps it in memory, for tests and dry runs.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
