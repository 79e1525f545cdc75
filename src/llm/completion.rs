//! Chat completions via an OpenAI-compatible API.
//!
//! Produces the raw response text the dispatcher consumes. Native
//! `tool_calls` from the model are re-encoded as
//! `[{"name": ..., "arguments": ...}]` so there is a single call format
//! downstream.

use crate::tools::ToolDefinition;
use crate::types::*;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Completion client for the language-model collaborator.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    function: FunctionCallPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionCallPayload {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl CompletionClient {
    /// Create a new completion client.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Run one completion. When `tools` is non-empty they are offered to the
    /// model; the returned text is either the model's answer or an encoded
    /// call list.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let tool_payloads: Option<Vec<ToolPayload>> = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| ToolPayload {
                        r#type: "function",
                        function: FunctionPayload {
                            name: &t.name,
                            description: &t.description,
                            parameters: &t.parameters,
                        },
                    })
                    .collect(),
            )
        };

        let request = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| MessagePayload {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            tools: tool_payloads,
            max_tokens,
            temperature: 0.1,
        };

        debug!("Completion request to model: {}", model);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Completion failed ({}): {}", status, body);
        }

        let body: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse completion response")?;

        response_text(body)
    }
}

/// Collapse the first choice into one string.
fn response_text(body: ChatResponse) -> Result<String> {
    let Some(choice) = body.choices.into_iter().next() else {
        bail!("Completion response had no choices");
    };

    if choice.message.tool_calls.is_empty() {
        return Ok(choice.message.content.unwrap_or_default());
    }

    let calls: Vec<Value> = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| {
            json!({
                "name": tc.function.name,
                "arguments": tc.function.arguments,
            })
        })
        .collect();

    Ok(Value::Array(calls).to_string())
}
