//! OpenAI-compatible HTTP client.
//!
//! Speaks `/v1/chat/completions` and serves both as the auxiliary inference
//! backend for the classifier (JSON mode, temperature 0) and as a completion
//! engine with function tools attached.

use super::{
    AuxiliaryInference, AuxiliaryPrompt, CapabilitySchema, Completion, CompletionEngine,
    EngineError, InvocationRequest, Message, Role,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Client for any backend exposing the OpenAI chat completions API.
pub struct OpenAiCompatClient {
    /// Base URL (e.g., "http://localhost:8000")
    base_url: String,
    /// Model name sent with every request
    model: String,
    /// Bearer token, if the backend requires one
    api_key: Option<String>,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
    /// Per-request deadline
    timeout: Duration,
}

impl OpenAiCompatClient {
    pub fn new(base_url: String, model: String, client: Arc<Client>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: None,
            client,
            timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, body: &WireRequest<'_>) -> Result<WireResponse, EngineError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let timeout_ms = self.timeout.as_millis() as u64;

        let mut req = self.client.post(&url).json(body).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| EngineError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::Upstream {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response.json().await.map_err(|e| {
            EngineError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let content = match message.role {
            // Assistant turns that only carry tool calls have no text
            Role::Assistant if message.content.is_empty() && !message.invocations.is_empty() => {
                None
            }
            _ => Some(message.content.clone()),
        };
        Self {
            role: message.role.as_str().to_string(),
            content,
            tool_calls: message.invocations.iter().map(WireToolCall::from).collect(),
            tool_call_id: message.invocation_id.clone(),
        }
    }
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction<'a>,
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Serialize, Deserialize)]
struct WireCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<&InvocationRequest> for WireToolCall {
    fn from(request: &InvocationRequest) -> Self {
        Self {
            id: request.id.clone(),
            call_type: function_type(),
            function: WireCall {
                name: request.name.clone(),
                arguments: request.arguments.to_string(),
            },
        }
    }
}

impl From<WireToolCall> for InvocationRequest {
    fn from(call: WireToolCall) -> Self {
        let arguments = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments)
                .unwrap_or(serde_json::Value::String(call.function.arguments))
        };
        Self {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

impl WireResponse {
    fn into_message(self) -> Result<WireMessage, EngineError> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| EngineError::InvalidResponse("response has no choices".to_string()))
    }
}

#[async_trait]
impl AuxiliaryInference for OpenAiCompatClient {
    async fn infer(&self, prompt: &AuxiliaryPrompt) -> Result<String, EngineError> {
        let body = WireRequest {
            model: &self.model,
            messages: vec![
                WireMessage::from(&Message::system(prompt.system.clone())),
                WireMessage::from(&Message::user(prompt.user.clone())),
            ],
            temperature: Some(0.0),
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
            tools: Vec::new(),
        };

        let message = self.send(&body).await?.into_message()?;
        Ok(message.content.unwrap_or_default())
    }
}

#[async_trait]
impl CompletionEngine for OpenAiCompatClient {
    async fn complete(
        &self,
        messages: &[Message],
        capabilities: Option<&CapabilitySchema>,
    ) -> Result<Completion, EngineError> {
        let tools = capabilities
            .map(|schema| {
                schema
                    .capabilities
                    .iter()
                    .map(|cap| WireTool {
                        tool_type: "function",
                        function: WireFunction {
                            name: &cap.name,
                            description: &cap.description,
                            parameters: &cap.parameters,
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();

        let body = WireRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: None,
            response_format: None,
            tools,
        };

        let message = self.send(&body).await?.into_message()?;
        Ok(Completion {
            text: message.content.unwrap_or_default(),
            invocations: message
                .tool_calls
                .into_iter()
                .map(InvocationRequest::from)
                .collect(),
        })
    }
}
