//! Agent client
//!
//! Binds the Tool Server's operations to a chat model and drives the
//! model/tool loop for each conversational turn.

pub mod model;
pub mod session;
pub mod tools;

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{AgentError, Result};
use model::{ChatMessage, ChatModel, FunctionDefinition, ToolCall};
use tools::{RemoteTool, ToolInvoker};

pub use session::{ChatSession, SessionState};

/// System prompt given to the model at the start of every session
pub const SYSTEM_PROMPT: &str = "You are a helpful and powerful Weather and Document Agent. \
Your purpose is to use the provided tools to answer user queries. \
You must use the weather tools for data and the document tools for formatting or outputting files.";

/// Agent that executes the model's tool calls until it produces a reply
pub struct Agent<M: ChatModel> {
    model: M,
    tools: Vec<RemoteTool>,
    invoker: Arc<dyn ToolInvoker>,
    max_iterations: usize,
}

impl<M: ChatModel> Agent<M> {
    /// Create an agent over a model, its bound tools and the invoker that runs them
    pub fn new(model: M, tools: Vec<RemoteTool>, invoker: Arc<dyn ToolInvoker>) -> Self {
        Self {
            model,
            tools,
            invoker,
            max_iterations: crate::config::agent::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the maximum number of model round trips per turn
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn tools(&self) -> &[RemoteTool] {
        &self.tools
    }

    /// Run one turn over `messages`, appending every new message.
    ///
    /// Returns the final reply text once the model answers without tool calls.
    pub async fn run_turn(&self, messages: &mut Vec<ChatMessage>) -> Result<String> {
        let definitions: Vec<FunctionDefinition> =
            self.tools.iter().map(|t| t.definition.clone()).collect();

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent iteration {}/{}", iteration + 1, self.max_iterations);

            let reply = self.model.complete(messages, &definitions).await?;
            messages.push(reply.clone());

            let (content, tool_calls) = match reply {
                ChatMessage::Assistant {
                    content,
                    tool_calls,
                } => (content, tool_calls),
                other => {
                    return Err(AgentError::Model {
                        message: format!("Expected an assistant message, got {:?}", other),
                    }
                    .into())
                }
            };

            if tool_calls.is_empty() {
                return Ok(content.unwrap_or_default());
            }

            for call in tool_calls {
                let content = self.execute(&call).await;
                messages.push(ChatMessage::Tool {
                    tool_call_id: call.id,
                    content,
                });
            }
        }

        tracing::warn!("Max iterations ({}) reached in agent loop", self.max_iterations);
        Err(AgentError::MaxIterations {
            max: self.max_iterations,
        }
        .into())
    }

    /// Execute one tool call. Failures are reported back to the model as data.
    async fn execute(&self, call: &ToolCall) -> String {
        let name = &call.function.name;
        tracing::info!("Tool call requested: {}", name);

        let arguments: Value = if call.function.arguments.trim().is_empty() {
            json!({})
        } else {
            match serde_json::from_str(&call.function.arguments) {
                Ok(arguments) => arguments,
                Err(e) => {
                    tracing::warn!("Tool {} called with malformed arguments: {}", name, e);
                    return json!({"error": format!("Invalid arguments JSON: {}", e)}).to_string();
                }
            }
        };

        if !self.tools.iter().any(|t| &t.name == name) {
            tracing::warn!("Model requested unknown tool {}", name);
            return json!({"error": format!("Unknown tool: {}", name)}).to_string();
        }

        match self.invoker.invoke(name, arguments).await {
            Ok(result) => {
                tracing::info!("Tool {} executed successfully", name);
                result
            }
            Err(e) => {
                tracing::warn!("Tool {} execution failed: {}", name, e);
                json!({"error": e.to_string()}).to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model and recording invoker shared by the agent tests

    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::error::WeatherMcpError;
    use crate::mcp::types::Tool;

    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ChatMessage>>>,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<ChatMessage>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[FunctionDefinition],
        ) -> Result<ChatMessage> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(WeatherMcpError::Agent(AgentError::Model {
                    message: "script exhausted".to_string(),
                }))
            })
        }
    }

    #[derive(Default)]
    pub struct RecordingInvoker {
        pub calls: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl ToolInvoker for RecordingInvoker {
        async fn invoke(&self, name: &str, arguments: Value) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            if name == "get_history_weather" {
                return Err(crate::error::ValidationError::HistoryDate {
                    value: arguments["dt"].as_str().unwrap_or_default().to_string(),
                }
                .into());
            }
            Ok(json!({"tool": name}).to_string())
        }
    }

    pub fn remote_tools() -> Vec<RemoteTool> {
        ["get_current_weather", "get_history_weather", "list_tools"]
            .into_iter()
            .map(|name| {
                RemoteTool::from(Tool {
                    name: name.to_string(),
                    description: None,
                    input_schema: json!({"type": "object", "properties": {}}),
                })
            })
            .collect()
    }

    pub fn call(id: &str, name: &str, arguments: &str) -> ChatMessage {
        ChatMessage::Assistant {
            content: None,
            tool_calls: vec![ToolCall::new(id, name, arguments)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::error::WeatherMcpError;

    #[tokio::test]
    async fn test_reply_without_tools() {
        let invoker = Arc::new(RecordingInvoker::default());
        let agent = Agent::new(
            ScriptedModel::new(vec![Ok(ChatMessage::assistant("Hello!"))]),
            remote_tools(),
            invoker.clone(),
        );

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user("hi")];
        let reply = agent.run_turn(&mut messages).await.unwrap();

        assert_eq!(reply, "Hello!");
        assert_eq!(messages.len(), 3);
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let invoker = Arc::new(RecordingInvoker::default());
        let agent = Agent::new(
            ScriptedModel::new(vec![
                Ok(call("c1", "get_current_weather", r#"{"q":"Oslo"}"#)),
                Ok(ChatMessage::assistant("It is cold in Oslo.")),
            ]),
            remote_tools(),
            invoker.clone(),
        );

        let mut messages = vec![ChatMessage::user("Weather in Oslo?")];
        let reply = agent.run_turn(&mut messages).await.unwrap();
        assert_eq!(reply, "It is cold in Oslo.");

        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "get_current_weather");
        assert_eq!(calls[0].1["q"], "Oslo");

        assert!(matches!(
            &messages[2],
            ChatMessage::Tool { tool_call_id, .. } if tool_call_id == "c1"
        ));
    }

    #[tokio::test]
    async fn test_tool_errors_are_fed_back() {
        let invoker = Arc::new(RecordingInvoker::default());
        let agent = Agent::new(
            ScriptedModel::new(vec![
                Ok(call("c1", "get_history_weather", r#"{"q":"Oslo","dt":"bad"}"#)),
                Ok(call("c2", "send_email", "{}")),
                Ok(call("c3", "get_current_weather", "{not json")),
                Ok(ChatMessage::assistant("Sorry.")),
            ]),
            remote_tools(),
            invoker.clone(),
        );

        let mut messages = vec![ChatMessage::user("history")];
        assert_eq!(agent.run_turn(&mut messages).await.unwrap(), "Sorry.");

        let tool_outputs: Vec<String> = messages
            .iter()
            .filter_map(|m| match m {
                ChatMessage::Tool { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(tool_outputs.len(), 3);
        assert!(tool_outputs[0].contains("Invalid date format"));
        assert!(tool_outputs[1].contains("Unknown tool: send_email"));
        assert!(tool_outputs[2].contains("Invalid arguments JSON"));

        assert_eq!(invoker.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let invoker = Arc::new(RecordingInvoker::default());
        let agent = Agent::new(
            ScriptedModel::new(vec![
                Ok(call("c1", "list_tools", "")),
                Ok(call("c2", "list_tools", "")),
            ]),
            remote_tools(),
            invoker,
        )
        .with_max_iterations(2);

        let err = agent
            .run_turn(&mut vec![ChatMessage::user("loop")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WeatherMcpError::Agent(AgentError::MaxIterations { max: 2 })
        ));
    }
}
