// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lull status` command implementation.
//!
//! Reads the persisted checkpoint document and prints each channel's resume
//! point and whether it was mid-conversation, plus the tracked channel set.

use std::io::IsTerminal;

use chrono::{DateTime, SecondsFormat, Utc};
use lull_config::model::LullConfig;
use lull_core::{CheckpointDocument, CheckpointStore, LullError};
use lull_store::JsonFileStore;
use serde::Serialize;

/// One channel row in `--json` output.
#[derive(Debug, Serialize)]
pub struct ChannelStatus {
    pub channel_id: String,
    pub checked_at: DateTime<Utc>,
    pub active: bool,
    pub tracked: bool,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub checkpoint_path: String,
    pub whitelist_mode: bool,
    /// `None` when every channel is in scope.
    pub tracked_channels: Option<Vec<String>>,
    pub channels: Vec<ChannelStatus>,
}

impl StatusResponse {
    fn from_document(config: &LullConfig, document: CheckpointDocument) -> Self {
        let whitelist_mode = config.tracking.whitelist_mode;
        let tracked = if whitelist_mode {
            Some(document.tracked_channels.unwrap_or_default())
        } else {
            None
        };

        let channels = document
            .channels
            .into_iter()
            .map(|(channel_id, checkpoint)| ChannelStatus {
                tracked: tracked.as_ref().is_none_or(|set| set.contains(&channel_id)),
                channel_id,
                checked_at: checkpoint.checked_at,
                active: checkpoint.active,
            })
            .collect();

        Self {
            checkpoint_path: config.storage.checkpoint_path.clone(),
            whitelist_mode,
            tracked_channels: tracked.map(|set| set.into_iter().collect()),
            channels,
        }
    }
}

/// Run the `lull status` command.
pub async fn run_status(config: &LullConfig, json: bool, plain: bool) -> Result<(), LullError> {
    let store = JsonFileStore::new(&config.storage.checkpoint_path);
    let status = StatusResponse::from_document(config, store.load().await?);

    if json {
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|e| LullError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_text(&status, use_color));
    }
    Ok(())
}

fn render_text(status: &StatusResponse, use_color: bool) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  lull status");
    let _ = writeln!(out, "  {}", "-".repeat(35));
    let _ = writeln!(out, "    Checkpoints: {}", status.checkpoint_path);

    match &status.tracked_channels {
        None => {
            let _ = writeln!(out, "    Tracking:    all channels");
        }
        Some(set) => {
            let _ = writeln!(out, "    Tracking:    whitelist ({} channels)", set.len());
        }
    }
    let _ = writeln!(out);

    if status.channels.is_empty() {
        let _ = writeln!(out, "    No channels checkpointed yet.");
    }
    for channel in &status.channels {
        let state = match (channel.active, use_color) {
            (true, true) => {
                use colored::Colorize;
                "active".green().to_string()
            }
            (false, true) => {
                use colored::Colorize;
                "idle".dimmed().to_string()
            }
            (true, false) => "active".to_string(),
            (false, false) => "idle".to_string(),
        };
        let marker = if channel.tracked { "" } else { " (untracked)" };
        let _ = writeln!(
            out,
            "    {:<20} {:<6} since {}{}",
            channel.channel_id,
            state,
            channel.checked_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            marker
        );
    }

    if let Some(set) = &status.tracked_channels {
        let pending: Vec<&String> = set
            .iter()
            .filter(|id| !status.channels.iter().any(|c| &c.channel_id == *id))
            .collect();
        for id in pending {
            let _ = writeln!(out, "    {id:<20} tracked, no checkpoint yet");
        }
    }
    let _ = writeln!(out);
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;
    use lull_core::Checkpoint;

    use super::*;

    fn document() -> CheckpointDocument {
        let mut doc = CheckpointDocument::default();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        doc.channels.insert(
            "1001".into(),
            Checkpoint {
                checked_at: at,
                active: true,
            },
        );
        doc.channels.insert(
            "1002".into(),
            Checkpoint {
                checked_at: at,
                active: false,
            },
        );
        doc.tracked_channels = Some(BTreeSet::from(["1001".to_string(), "1003".to_string()]));
        doc
    }

    #[test]
    fn whitelist_mode_marks_untracked_channels() {
        let status = StatusResponse::from_document(&LullConfig::default(), document());
        assert_eq!(
            status.tracked_channels,
            Some(vec!["1001".to_string(), "1003".to_string()])
        );
        assert!(status.channels[0].tracked);
        assert!(!status.channels[1].tracked);

        let text = render_text(&status, false);
        assert!(text.contains("1001"));
        assert!(text.contains("(untracked)"));
        assert!(text.contains("tracked, no checkpoint yet"));
    }

    #[test]
    fn open_mode_tracks_everything() {
        let mut config = LullConfig::default();
        config.tracking.whitelist_mode = false;
        let status = StatusResponse::from_document(&config, document());
        assert!(status.tracked_channels.is_none());
        assert!(status.channels.iter().all(|c| c.tracked));
        assert!(render_text(&status, false).contains("all channels"));
    }

    #[test]
    fn json_output_is_structured() {
        let status = StatusResponse::from_document(&LullConfig::default(), document());
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["whitelist_mode"], true);
        assert_eq!(value["channels"][0]["channel_id"], "1001");
        assert_eq!(value["channels"][0]["active"], true);
        assert_eq!(value["channels"][0]["checked_at"], "2026-03-01T12:00:00Z");
    }

    #[test]
    fn empty_document_renders_placeholder() {
        let status =
            StatusResponse::from_document(&LullConfig::default(), CheckpointDocument::default());
        assert!(render_text(&status, false).contains("No channels checkpointed yet."));
    }

    #[tokio::test]
    async fn status_reads_missing_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LullConfig::default();
        config.storage.checkpoint_path = dir.path().join("absent.json").display().to_string();
        run_status(&config, true, true).await.unwrap();
    }
}
