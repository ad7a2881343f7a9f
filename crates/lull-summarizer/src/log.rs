// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only JSON Lines summary log, one file per (server, channel).

use std::path::{Path, PathBuf};

use lull_core::LullError;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::SummaryRecord;

/// Writes summaries to `<dir>/<server>_<channel>.jsonl`.
#[derive(Debug)]
pub struct SummaryLog {
    dir: PathBuf,
    /// Keeps concurrent appends from interleaving within a line.
    write_lock: Mutex<()>,
}

impl SummaryLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The log file for a server/channel pair.
    pub fn path_for(&self, server_name: &str, channel_name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.jsonl",
            sanitize(server_name),
            sanitize(channel_name)
        ))
    }

    /// Appends `record` as one line, creating the directory and file as needed.
    pub async fn append(
        &self,
        server_name: &str,
        channel_name: &str,
        record: &SummaryRecord,
    ) -> Result<PathBuf, LullError> {
        let mut line = serde_json::to_string(record).map_err(LullError::persistence)?;
        line.push('\n');
        let path = self.path_for(server_name, channel_name);

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(LullError::persistence)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(LullError::persistence)?;
        file.write_all(line.as_bytes())
            .await
            .map_err(LullError::persistence)?;
        file.flush().await.map_err(LullError::persistence)?;

        debug!(path = %path.display(), "summary appended");
        Ok(path)
    }
}

/// Replaces characters that are unsafe in file names with `_`.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ' | '#') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "_".to_string(),
        rest => rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize("a/b\\c"), "a_b_c");
        assert_eq!(sanitize("../etc"), "_etc");
        assert_eq!(sanitize("Rust Café"), "Rust Café");
        assert_eq!(sanitize("   "), "_");
    }

    #[tokio::test]
    async fn append_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = SummaryLog::new(dir.path().join("summaries"));

        for n in 0..2 {
            log.append(
                "Guild",
                "general",
                &SummaryRecord {
                    summary: format!("summary {n}"),
                    timestamp: "2026-03-01T12:00:00+00:00".into(),
                },
            )
            .await
            .unwrap();
        }

        let content = std::fs::read_to_string(log.path_for("Guild", "general")).unwrap();
        let records: Vec<SummaryRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].summary, "summary 1");
        assert!(log.dir().join("Guild_general.jsonl").exists());
    }
}
