// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file checkpoint store.
//!
//! Saves write the whole document to a temp file in the target directory and
//! rename it over the previous one, so a crash mid-write leaves the old
//! document intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lull_core::{CheckpointDocument, CheckpointStore, LullError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Checkpoint store backed by a single JSON document on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes saves so renames never race.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointStore for JsonFileStore {
    async fn load(&self) -> Result<CheckpointDocument, LullError> {
        debug!(path = %self.path.display(), "reading checkpoint document");
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %self.path.display(),
                    "checkpoint document not found, starting with empty state"
                );
                return Ok(CheckpointDocument::default());
            }
            Err(e) => return Err(LullError::persistence(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CheckpointDocument::default());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            LullError::Config(format!(
                "malformed checkpoint document {}: {e}",
                self.path.display()
            ))
        })
    }

    async fn save(&self, document: &CheckpointDocument) -> Result<(), LullError> {
        let bytes = serde_json::to_vec_pretty(document).map_err(LullError::persistence)?;
        let path = self.path.clone();

        let _guard = self.write_lock.lock().await;
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| LullError::Internal(format!("checkpoint writer panicked: {e}")))?
            .map_err(LullError::persistence)?;

        debug!(
            path = %self.path.display(),
            channels = document.channels.len(),
            "checkpoint document saved"
        );
        Ok(())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use lull_core::Checkpoint;

    use super::*;

    fn sample_document() -> CheckpointDocument {
        let mut doc = CheckpointDocument::default();
        doc.channels.insert(
            "1001".into(),
            Checkpoint {
                checked_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
                active: true,
            },
        );
        doc.tracked_channels = Some(BTreeSet::from(["1001".to_string()]));
        doc
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        let doc = store.load().await.unwrap();
        assert_eq!(doc, CheckpointDocument::default());
    }

    #[tokio::test]
    async fn saved_document_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let doc = sample_document();

        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deeper/state.json"));
        store.save(&sample_document()).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn malformed_document_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"channels\": [1, 2, 3]}").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, LullError::Config(_)));
    }

    #[tokio::test]
    async fn empty_file_loads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "\n").unwrap();

        let doc = JsonFileStore::new(&path).load().await.unwrap();
        assert!(doc.channels.is_empty());
    }

    #[tokio::test]
    async fn second_save_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        store.save(&sample_document()).await.unwrap();
        store.save(&CheckpointDocument::default()).await.unwrap();

        let doc = store.load().await.unwrap();
        assert!(doc.channels.is_empty());
        assert!(doc.tracked_channels.is_none());
    }
}
