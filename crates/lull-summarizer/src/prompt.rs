// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction.

use lull_core::Message;

pub const SYSTEM_PROMPT: &str = "You are a summarization agent responsible for effectively \
summarizing Discord conversations. Each summary must begin with a short, one-sentence \
description of the primary topic, followed by a concise paragraph covering only the most \
significant points. Avoid mentioning specific user names unless their identity is integral \
to the topic. Focus on the content of the discussion.";

/// Renders messages as `[timestamp] author: content` lines.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}: {}", m.timestamp.to_rfc3339(), m.author_id, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn user_prompt(channel_name: &str, server_name: &str, transcript: &str) -> String {
    format!(
        "Summarize the following conversation from the channel {channel_name} on the \
         {server_name} server:\n\n{transcript}"
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn transcript_lines_carry_timestamp_and_author() {
        let messages = vec![
            Message {
                id: 1,
                author_id: 42,
                timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
                content: "hello".into(),
                attachments: vec![],
            },
            Message {
                id: 2,
                author_id: 43,
                timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap(),
                content: "hi there".into(),
                attachments: vec![],
            },
        ];

        assert_eq!(
            render_transcript(&messages),
            "[2026-03-01T12:00:00+00:00] 42: hello\n[2026-03-01T12:01:00+00:00] 43: hi there"
        );
    }

    #[test]
    fn user_prompt_names_channel_and_server() {
        let prompt = user_prompt("general", "Rustaceans", "[t] 1: x");
        assert!(prompt.starts_with(
            "Summarize the following conversation from the channel general on the Rustaceans server:"
        ));
        assert!(prompt.ends_with("\n\n[t] 1: x"));
    }
}
