//! Gemini Provider Implementation
//!
//! Hosted LLM provider speaking the Gemini `streamGenerateContent` REST
//! protocol with server-sent events.
//!
//! # Wire Protocol
//!
//! One POST per submission. The request carries the session's system
//! instruction, the declared toolset, and the prior turns followed by the
//! new user message. The response is an SSE stream of `data:` lines, each a
//! JSON chunk whose candidate parts are either text deltas or
//! `functionCall` descriptors; `usageMetadata` rides along on late chunks.
//!
//! The hosted API holds no state between calls; the conversation context
//! lives in the [`ProviderSession`] and is resent each time, which is what
//! makes invalidate-and-reopen a safe recovery for every failure class.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::provider::traits::{AgentProvider, Fragment, ProviderError, TokenUsage};
use crate::session::{ModeProfile, ProviderSession, TurnRole};
use crate::tools::ToolInvocation;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini REST client
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider for a model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from environment variables
    ///
    /// Reads `GEMINI_API_KEY` (or `LIAISON_API_KEY`) and optionally
    /// `LIAISON_MODEL`.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("LIAISON_API_KEY"))
            .unwrap_or_default();
        let model = std::env::var("LIAISON_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    /// Override the API base URL (for tests and proxies)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }

    /// Build the request body from the session context plus the new message
    fn build_request(&self, session: &ProviderSession, text: &str) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = session
            .turns()
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Agent => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": turn.text }],
                })
            })
            .collect();
        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{ "text": text }],
        }));

        let declarations: Vec<serde_json::Value> = session
            .profile
            .tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                })
            })
            .collect();

        serde_json::json!({
            "system_instruction": {
                "parts": [{ "text": session.profile.system_instruction }],
            },
            "contents": contents,
            "tools": [{ "function_declarations": declarations }],
        })
    }
}

/// Parse one SSE data chunk into fragments and usage
///
/// A chunk can carry several parts; text and tool calls are forwarded in
/// part order.
fn parse_chunk(data: &serde_json::Value) -> (Vec<Fragment>, Option<TokenUsage>) {
    let mut fragments = Vec::new();

    let parts = data
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    if let Some(parts) = parts {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                fragments.push(Fragment::Text(text.to_string()));
            }
            if let Some(call) = part.get("functionCall") {
                let name = call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or_default()
                    .to_string();
                let mut invocation = ToolInvocation::new(name);
                if let Some(args) = call.get("args").and_then(|a| a.as_object()) {
                    for (key, value) in args {
                        let value = match value.as_str() {
                            Some(s) => s.to_string(),
                            None => value.to_string(),
                        };
                        invocation.args.insert(key.clone(), value);
                    }
                }
                fragments.push(Fragment::ToolCall(invocation));
            }
        }
    }

    let usage = data.get("usageMetadata").map(|meta| TokenUsage {
        input_tokens: meta
            .get("promptTokenCount")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32,
        output_tokens: meta
            .get("candidatesTokenCount")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32,
    });

    (fragments, usage)
}

#[async_trait]
impl AgentProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn open_session(&self, profile: ModeProfile) -> Result<ProviderSession, ProviderError> {
        // No provider-side allocation: the context is resent per call.
        Ok(ProviderSession::new(profile))
    }

    async fn stream_reply(
        &self,
        session: &mut ProviderSession,
        text: &str,
    ) -> Result<mpsc::Receiver<Fragment>, ProviderError> {
        let (tx, rx) = mpsc::channel(100);

        let body = self.build_request(session, text);
        let response = self
            .http_client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(ProviderError::SessionExpired);
            }
            return Err(ProviderError::Protocol(format!("{status}: {detail}")));
        }

        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut usage: Option<TokenUsage> = None;

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim().to_string();
                            buffer = buffer[pos + 1..].to_string();

                            let Some(payload) = line.strip_prefix("data:") else {
                                continue;
                            };
                            let payload = payload.trim();
                            if payload.is_empty() || payload == "[DONE]" {
                                continue;
                            }

                            match serde_json::from_str::<serde_json::Value>(payload) {
                                Ok(data) => {
                                    let (fragments, chunk_usage) = parse_chunk(&data);
                                    if chunk_usage.is_some() {
                                        usage = chunk_usage;
                                    }
                                    for fragment in fragments {
                                        if tx.send(fragment).await.is_err() {
                                            // Receiver dropped, stop streaming
                                            return;
                                        }
                                    }
                                }
                                Err(e) => {
                                    let _ = tx
                                        .send(Fragment::Error(format!("malformed chunk: {e}")))
                                        .await;
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Fragment::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            let _ = tx.send(Fragment::Complete { usage }).await;
        });

        Ok(rx)
    }
}
