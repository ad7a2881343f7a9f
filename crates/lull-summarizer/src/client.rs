// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completion endpoints.
//!
//! Works against api.openai.com as well as local inference servers (llama.cpp,
//! vLLM, Ollama's OpenAI shim) that accept the same request shape.

use std::time::Duration;

use lull_config::model::LlmConfig;
use lull_core::LullError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse};

/// Chat completion client with a single retry on transient errors.
///
/// Requests carry no timeout; a slow backend is waited on.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    retry_delay: Duration,
}

impl ChatClient {
    /// Builds a client from the `[llm]` config section.
    ///
    /// The API key is optional; without one no `Authorization` header is sent.
    pub fn new(config: &LlmConfig) -> Result<Self, LullError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| LullError::Config(format!("invalid API key header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LullError::Summarization {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Overrides the delay before a retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends one non-streaming completion and returns the trimmed reply text.
    ///
    /// On transient errors (429, 500, 502, 503), retries once.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LullError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| LullError::Summarization {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model = %self.model, "completion response received");

            if status.is_success() {
                let body: ChatResponse =
                    response.json().await.map_err(|e| LullError::Summarization {
                        message: format!("failed to parse completion response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return extract_text(body);
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "completion API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("completion API returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(LullError::Summarization {
                    message,
                    source: None,
                });
                continue;
            }

            return Err(LullError::Summarization {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| LullError::Summarization {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

fn extract_text(response: ChatResponse) -> Result<String, LullError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| LullError::Summarization {
            message: "completion response contained no text".into(),
            source: None,
        })
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            ..LlmConfig::default()
        }
    }

    fn test_client(base_url: &str) -> ChatClient {
        ChatClient::new(&config(base_url, Some("sk-test")))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    fn completion(text: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = ChatClient::new(&config("http://localhost:8080/v1/", None)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn complete_sends_request_shape_and_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-5-mini",
                "temperature": 0.5,
                "max_tokens": 500,
                "stream": false,
                "messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  A summary.\n")))
            .expect(1)
            .mount(&server)
            .await;

        let text = test_client(&server.uri())
            .complete(vec![ChatMessage::system("sys"), ChatMessage::user("hi")])
            .await
            .unwrap();

        assert_eq!(text, "A summary.");
    }

    #[tokio::test]
    async fn slow_backend_is_waited_on() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("eventually"))
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let text = test_client(&server.uri())
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap();

        assert_eq!(text, "eventually");
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn complete_retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "slow down", "type": "rate_limit"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let text = test_client(&server.uri())
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn complete_fails_on_400_with_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "bad model", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("invalid_request_error"), "{rendered}");
        assert!(rendered.contains("bad model"), "{rendered}");
    }

    #[tokio::test]
    async fn complete_gives_up_after_repeated_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LullError::Summarization { .. }));
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no text"));
    }

    #[tokio::test]
    async fn missing_api_key_sends_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("local")))
            .mount(&server)
            .await;

        let client = ChatClient::new(&config(&server.uri(), None)).unwrap();
        let text = client.complete(vec![ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(text, "local");
    }
}
