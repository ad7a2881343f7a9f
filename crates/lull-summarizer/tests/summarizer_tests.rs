// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the summarizer against a mock completion server.

use chrono::{TimeDelta, TimeZone, Utc};
use lull_config::LullConfig;
use lull_core::{Chunk, Message, Summarizer};
use lull_summarizer::{OpenAiSummarizer, SummaryRecord};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message(id: u64, minute: i64, content: &str) -> Message {
    Message {
        id,
        author_id: 500 + id,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + TimeDelta::minutes(minute),
        content: content.into(),
        attachments: vec![],
    }
}

fn summarizer(server: &MockServer, summaries_dir: &std::path::Path) -> OpenAiSummarizer {
    let mut config = LullConfig::default();
    config.llm.base_url = server.uri();
    config.llm.api_key = Some("sk-test".into());
    config.storage.summaries_dir = summaries_dir.display().to_string();
    OpenAiSummarizer::from_config(&config).unwrap()
}

#[tokio::test]
async fn summary_is_appended_with_last_message_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("channel general on the Rustaceans server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Borrow checker talk."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let summarizer = summarizer(&server, dir.path());

    // Deliberately out of order: the summarizer sorts before rendering.
    let chunk = Chunk {
        channel_name: "general".into(),
        server_name: "Rustaceans".into(),
        messages: vec![message(2, 5, "second"), message(1, 0, "first")],
    };
    summarizer.summarize(chunk).await.unwrap();

    let content =
        std::fs::read_to_string(dir.path().join("Rustaceans_general.jsonl")).unwrap();
    let record: SummaryRecord = serde_json::from_str(content.trim_end()).unwrap();
    assert_eq!(record.summary, "Borrow checker talk.");
    assert_eq!(record.timestamp, "2026-03-01T12:05:00+00:00");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    let first = body.find("501: first").unwrap();
    let second = body.find("502: second").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn empty_chunk_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    summarizer(&server, dir.path())
        .summarize(Chunk {
            channel_name: "general".into(),
            server_name: "Rustaceans".into(),
            messages: vec![],
        })
        .await
        .unwrap();

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn backend_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "bad key", "type": "invalid_api_key"}
        })))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let result = summarizer(&server, dir.path())
        .summarize(Chunk {
            channel_name: "general".into(),
            server_name: "Rustaceans".into(),
            messages: vec![message(1, 0, "hello")],
        })
        .await;

    assert!(result.is_err());
    assert!(!dir.path().join("Rustaceans_general.jsonl").exists());
}
