//! Chat model client
//!
//! Messages follow the OpenAI chat completions format. [`AzureChatModel`]
//! talks to an Azure OpenAI deployment; tests substitute their own [`ChatModel`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AgentConfig;
use crate::error::{AgentError, ConfigError, Result};

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    /// A plain assistant reply without tool calls
    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

fn function_type() -> String {
    "function".to_string()
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Tool definition offered to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

/// A chat-completion engine able to request tool calls
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the conversation
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionDefinition],
    ) -> Result<ChatMessage>;
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionDefinition,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatErrorResponse {
    error: ChatErrorDetail,
}

#[derive(Deserialize)]
struct ChatErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Azure OpenAI chat completions client
#[derive(Debug, Clone)]
pub struct AzureChatModel {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    temperature: f32,
}

impl AzureChatModel {
    /// Create a client for the configured deployment. No request is made.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let endpoint = reqwest::Url::parse(&config.azure_endpoint).map_err(|e| {
            ConfigError::InvalidConfig {
                message: format!("Invalid AZURE_OPENAI_ENDPOINT '{}': {}", config.azure_endpoint, e),
            }
        })?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.as_str().trim_end_matches('/'),
            urlencoding::encode(&config.azure_deployment),
            urlencoding::encode(&config.azure_api_version),
        );

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            url,
            api_key: config.azure_api_key.clone(),
            temperature: config.temperature,
        })
    }

    /// Full chat completions URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatModel for AzureChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionDefinition],
    ) -> Result<ChatMessage> {
        let body = ChatRequest {
            messages,
            tools: tools
                .iter()
                .map(|function| ToolSpec {
                    kind: "function",
                    function,
                })
                .collect(),
            temperature: self.temperature,
        };

        tracing::debug!(messages = messages.len(), tools = tools.len(), "Sending chat request");

        let response = self
            .http_client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Model {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ChatErrorResponse>(&text) {
                Ok(err) => format!(
                    "API error ({}): {}",
                    err.error.code.unwrap_or_else(|| status.to_string()),
                    err.error.message
                ),
                Err(_) => format!("HTTP {}: {}", status, text),
            };
            return Err(AgentError::Model { message }.into());
        }

        let response: ChatResponse = serde_json::from_str(&text)?;
        let choice = response.choices.into_iter().next().ok_or_else(|| AgentError::Model {
            message: "Response contained no choices".to_string(),
        })?;

        tracing::debug!(finish_reason = ?choice.finish_reason, "Chat response received");
        Ok(choice.message)
    }
}
