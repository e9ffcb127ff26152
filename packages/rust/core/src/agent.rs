//! The text-generation boundary.
//!
//! The orchestrator only sees the [`Agent`] trait. The process builds one
//! concrete agent at start-up (normally an [`OpenAiAgent`] wrapped in a
//! [`RetryingAgent`](crate::retry::RetryingAgent)) and passes it in.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use boardroom_shared::{AgentConfig, BoardroomError, Result};

/// A synchronous text-generation capability: instruction + payload in, text out.
pub trait Agent {
    /// Run one generation. Blocks until the result is available.
    fn invoke(&self, instruction: &str, payload: &str) -> Result<String>;
}

impl<A: Agent + ?Sized> Agent for &A {
    fn invoke(&self, instruction: &str, payload: &str) -> Result<String> {
        (**self).invoke(instruction, payload)
    }
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn invoke(&self, instruction: &str, payload: &str) -> Result<String> {
        (**self).invoke(instruction, payload)
    }
}

// ---------------------------------------------------------------------------
// Responses API protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    /// Concatenate every `output_text` part of every message item.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// OpenAiAgent
// ---------------------------------------------------------------------------

/// Agent backed by an OpenAI-compatible Responses API.
#[derive(Debug, Clone)]
pub struct OpenAiAgent {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiAgent {
    /// Build the HTTP client once; the agent is then reused for every stage.
    pub fn new(config: &AgentConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("Boardroom/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| BoardroomError::config(format!("http client build: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/responses", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Agent for OpenAiAgent {
    #[instrument(skip_all, fields(model = %self.model, payload_len = payload.len()))]
    fn invoke(&self, instruction: &str, payload: &str) -> Result<String> {
        let started = Instant::now();
        let request = ResponsesRequest {
            model: &self.model,
            input: [
                InputMessage {
                    role: "system",
                    content: instruction,
                },
                InputMessage {
                    role: "user",
                    content: payload,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let reply: ResponsesReply = response
            .json()
            .map_err(|e| BoardroomError::parse(format!("invalid Responses API payload: {e}")))?;

        let text = reply.output_text();
        if text.is_empty() {
            warn!("response contained no output text");
        }
        debug!(
            output_len = text.len(),
            latency_ms = started.elapsed().as_millis(),
            "agent call complete"
        );
        Ok(text)
    }
}

/// Connection, timeout and body errors are worth retrying; a request that
/// could not even be built is not.
fn transport_error(e: reqwest::Error) -> BoardroomError {
    if e.is_builder() {
        BoardroomError::agent_fatal(format!("request build failed: {e}"))
    } else {
        BoardroomError::agent_transient(format!("request failed: {e}"))
    }
}

fn status_error(status: StatusCode, body: &str) -> BoardroomError {
    let snippet: String = body.chars().take(300).collect();
    let message = format!("HTTP {status}: {snippet}");
    let transient = status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_MANY_REQUESTS
        );
    if transient {
        BoardroomError::agent_transient(message)
    } else {
        BoardroomError::agent_fatal(message)
    }
}

// ---------------------------------------------------------------------------
// EchoAgent
// ---------------------------------------------------------------------------

/// Offline agent for dry runs: describes what it was asked instead of
/// generating anything. Output depends only on its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAgent;

impl Agent for EchoAgent {
    fn invoke(&self, instruction: &str, payload: &str) -> Result<String> {
        let heading = instruction
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("(empty instruction)");
        Ok(format!(
            "# Dry run\n\nInstruction: {heading}\nPayload: {} bytes, {} lines\n",
            payload.len(),
            payload.lines().count()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AgentConfig {
        AgentConfig {
            base_url: format!("{}/v1/", server.uri()),
            timeout_secs: Some(5),
            ..AgentConfig::default()
        }
    }

    /// The blocking client must live and die off the async runtime.
    async fn invoke_blocking(
        config: AgentConfig,
        instruction: &'static str,
        payload: &'static str,
    ) -> Result<String> {
        tokio::task::spawn_blocking(move || {
            OpenAiAgent::new(&config, "sk-test")?.invoke(instruction, payload)
        })
        .await
        .expect("blocking task panicked")
    }

    #[test]
    fn output_text_concatenates_message_parts() {
        let json = r#"{
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Hello, "},
                    {"type": "refusal", "text": "ignored"},
                    {"type": "output_text", "text": "team."}
                ]}
            ]
        }"#;
        let reply: ResponsesReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.output_text(), "Hello, team.");
    }

    #[test]
    fn request_serializes_system_then_user() {
        let request = ResponsesRequest {
            model: "gpt-4.1-mini",
            input: [
                InputMessage {
                    role: "system",
                    content: "be brief",
                },
                InputMessage {
                    role: "user",
                    content: "transcript",
                },
            ],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"model":"gpt-4.1-mini","input":[{"role":"system","content":"be brief"},{"role":"user","content":"transcript"}]}"#
        );
    }

    #[test]
    fn status_classification() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "bad key").is_retryable());
        assert!(!status_error(StatusCode::BAD_REQUEST, "bad input").is_retryable());
        let long = "x".repeat(1_000);
        let msg = status_error(StatusCode::INTERNAL_SERVER_ERROR, &long).to_string();
        assert!(msg.len() < 400);
    }

    #[test]
    fn echo_agent_is_deterministic() {
        let a = EchoAgent.invoke("\n  You are the CFO.\nBe harsh.", "line1\nline2").unwrap();
        let b = EchoAgent.invoke("\n  You are the CFO.\nBe harsh.", "line1\nline2").unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Instruction: You are the CFO."));
        assert!(a.contains("Payload: 11 bytes, 2 lines"));
    }

    #[tokio::test]
    async fn openai_agent_posts_to_responses_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4.1-mini",
                "input": [
                    {"role": "system", "content": "summarize"},
                    {"role": "user", "content": "we agreed to ship"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "resp_1",
                "output": [{
                    "type": "message",
                    "role": "assistant",
                    "content": [{"type": "output_text", "text": "Decision: ship."}]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = invoke_blocking(config_for(&server), "summarize", "we agreed to ship")
            .await
            .unwrap();
        assert_eq!(text, "Decision: ship.");
    }

    #[tokio::test]
    async fn openai_agent_surfaces_auth_failure_as_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = invoke_blocking(config_for(&server), "summarize", "x")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn openai_agent_marks_rate_limit_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = invoke_blocking(config_for(&server), "summarize", "x")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn openai_agent_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = invoke_blocking(config_for(&server), "summarize", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardroomError::Parse { .. }));
    }
}
