//! Chat-completions provider implementation for voxcrm
//!
//! This module implements the Provider trait over the OpenAI-compatible
//! chat-completions wire format. The base URL is configurable so tests can
//! point the provider at a mock server.

use crate::config::ProviderConfig;
use crate::error::{Result, VoxcrmError};
use crate::providers::{CompletionResponse, FunctionCall, Message, Provider, TokenUsage, ToolCall};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chat-completions API provider
///
/// Connects to any endpoint speaking the `/chat/completions` format:
/// requests carry the transcript and optional tool schemas, responses hold
/// either a terminal text message or a list of tool-call requests.
pub struct ChatCompletionsProvider {
    client: Client,
    config: ProviderConfig,
}

/// Request structure for the chat-completions API
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

/// Message structure on the wire
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool definition wrapper on the wire
#[derive(Debug, Serialize)]
struct WireTool {
    r#type: String,
    function: serde_json::Value,
}

/// Tool call on the wire
#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(default = "default_tool_type")]
    r#type: String,
    function: WireFunctionCall,
}

/// Function call details on the wire
#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Default type for tool calls (used when the field is missing)
fn default_tool_type() -> String {
    "function".to_string()
}

/// Response structure from the chat-completions API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
    #[serde(default)]
    total_tokens: usize,
}

impl ChatCompletionsProvider {
    /// Creates a new chat-completions provider
    ///
    /// # Arguments
    ///
    /// * `config` - Provider configuration (base URL, key, model, timeout)
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("voxcrm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VoxcrmError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized chat-completions provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Converts transcript messages to the wire format
    fn convert_messages(&self, messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .filter(|m| m.content.is_some() || m.tool_calls.is_some())
            .map(|m| WireMessage {
                role: m.role.clone(),
                content: m.content.clone(),
                tool_calls: m.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|tc| WireToolCall {
                            id: tc.id.clone(),
                            r#type: "function".to_string(),
                            function: WireFunctionCall {
                                name: tc.function.name.clone(),
                                arguments: tc.function.arguments.clone(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Wraps tool schemas in the function envelope the wire format expects
    fn convert_tools(&self, tools: &[serde_json::Value]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                r#type: "function".to_string(),
                function: t.clone(),
            })
            .collect()
    }

    /// Converts a wire message back into the internal representation
    ///
    /// Tool calls without an id get one generated, so tool results can
    /// always be correlated back to their call.
    fn convert_reply(&self, wire: WireMessage) -> Message {
        let tool_calls = wire.tool_calls.map(|calls| {
            calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: if tc.id.is_empty() {
                        format!("call_{}", uuid::Uuid::new_v4().simple())
                    } else {
                        tc.id
                    },
                    function: FunctionCall {
                        name: tc.function.name,
                        arguments: if tc.function.arguments.is_empty() {
                            "{}".to_string()
                        } else {
                            tc.function.arguments
                        },
                    },
                })
                .collect::<Vec<_>>()
        });

        Message {
            role: "assistant".to_string(),
            content: wire.content,
            tool_calls: tool_calls.filter(|calls| !calls.is_empty()),
            tool_call_id: None,
        }
    }
}

#[async_trait]
impl Provider for ChatCompletionsProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
        };

        let url = format!("{}/chat/completions", self.config.api_base);
        tracing::debug!(
            "Requesting completion: model={}, messages={}, tools={}",
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VoxcrmError::Provider(format!("Completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoxcrmError::Provider(format!(
                "Completion request returned {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| VoxcrmError::Provider(format!("Invalid completion response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| VoxcrmError::Provider("Completion response had no choices".into()))?;

        let mut completion = CompletionResponse::new(self.convert_reply(choice.message));
        if let Some(usage) = parsed.usage {
            completion = completion.with_usage(TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            });
        }

        Ok(completion)
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
