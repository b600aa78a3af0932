//! Line-oriented chat session
//!
//! Reads user lines, runs one agent turn per line and writes the reply.
//! Input is only read while the session is idle, so turns never overlap.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::model::{ChatMessage, ChatModel};
use crate::agent::tools::load_tools;
use crate::agent::{Agent, SYSTEM_PROMPT};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::mcp::client::McpHttpClient;

/// Lifecycle of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    ToolsLoaded,
    Idle,
    Thinking,
    Terminated,
}

/// An interactive conversation with the agent
pub struct ChatSession<M: ChatModel> {
    agent: Agent<M>,
    history: Vec<ChatMessage>,
    state: SessionState,
}

impl<M: ChatModel> ChatSession<M> {
    /// Wrap an agent whose tools are already bound
    pub fn new(agent: Agent<M>) -> Self {
        Self {
            agent,
            history: vec![ChatMessage::system(SYSTEM_PROMPT)],
            state: SessionState::ToolsLoaded,
        }
    }

    /// Connect to the Tool Server, discover its tools and bind them to `model`
    pub async fn connect(config: &AgentConfig, model: M) -> Result<Self> {
        tracing::info!(state = ?SessionState::Connecting, url = %config.server_url, "Connecting to tool server");

        let client = McpHttpClient::connect(&config.server_url, config.request_timeout).await?;
        let tools = load_tools(&client).await?;
        tracing::info!(count = tools.len(), "Tools loaded");

        let agent = Agent::new(model, tools, Arc::new(client))
            .with_max_iterations(config.max_iterations);
        Ok(Self::new(agent))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Messages exchanged so far, starting with the system prompt
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Run the conversation until "quit", "exit" or end of input.
    ///
    /// Only I/O failures on `reader` or `writer` end the session early.
    pub async fn run<R, W>(&mut self, reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        for tool in self.agent.tools() {
            let line = format!(
                "Tool: {} | Description: {}\n",
                tool.name,
                tool.description.as_deref().unwrap_or("")
            );
            writer.write_all(line.as_bytes()).await?;
        }
        writer
            .write_all(b"--- Agent Ready. Start chatting... ---\n")
            .await?;

        self.state = SessionState::Idle;
        let mut lines = reader.lines();

        while self.state == SessionState::Idle {
            writer.write_all(b"\nUser: ").await?;
            writer.flush().await?;

            let input = match lines.next_line().await? {
                Some(line) => line,
                None => {
                    self.terminate(writer).await?;
                    break;
                }
            };

            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
                self.terminate(writer).await?;
                break;
            }

            self.state = SessionState::Thinking;
            let output = self.turn(input).await;
            self.state = SessionState::Idle;

            writer.write_all(output.as_bytes()).await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Run one turn. History only grows when the turn completes.
    async fn turn(&mut self, input: &str) -> String {
        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(input));

        match self.agent.run_turn(&mut messages).await {
            Ok(reply) => {
                self.history = messages;
                format!("Agent: {}\n", reply)
            }
            Err(e) => {
                tracing::error!(error = ?e, kind = %e.kind(), "Agent execution failed");
                format!("Agent execution failed: {}\n", e)
            }
        }
    }

    async fn terminate<W: AsyncWrite + Unpin>(&mut self, writer: &mut W) -> Result<()> {
        self.state = SessionState::Terminated;
        writer.write_all(b"Exiting agent.\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::*;
    use crate::error::{AgentError, WeatherMcpError};

    async fn run_script(
        replies: Vec<Result<ChatMessage>>,
        input: &str,
    ) -> (ChatSession<ScriptedModel>, Arc<RecordingInvoker>, String) {
        let invoker = Arc::new(RecordingInvoker::default());
        let agent = Agent::new(ScriptedModel::new(replies), remote_tools(), invoker.clone());
        let mut session = ChatSession::new(agent);
        assert_eq!(session.state(), SessionState::ToolsLoaded);

        let mut output = Vec::new();
        session.run(input.as_bytes(), &mut output).await.unwrap();
        (session, invoker, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_quit_invokes_nothing() {
        let (session, invoker, output) = run_script(Vec::new(), "  QUIT \n").await;

        assert_eq!(session.state(), SessionState::Terminated);
        assert!(invoker.calls.lock().unwrap().is_empty());
        assert!(output.contains("Tool: get_current_weather | Description: "));
        assert!(output.ends_with("Exiting agent.\n"));
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_end_of_input_terminates() {
        let (session, _, output) = run_script(Vec::new(), "\n\n").await;
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(output.contains("Exiting agent."));
    }

    #[tokio::test]
    async fn test_turn_with_tool_call() {
        let (session, invoker, output) = run_script(
            vec![
                Ok(call("c1", "get_current_weather", r#"{"q":"Paris"}"#)),
                Ok(ChatMessage::assistant("Sunny in Paris.")),
            ],
            "What's the weather in Paris?\nexit\n",
        )
        .await;

        assert!(output.contains("Agent: Sunny in Paris."));
        assert_eq!(invoker.calls.lock().unwrap()[0].1["q"], "Paris");
        // system, user, assistant call, tool result, assistant reply
        assert_eq!(session.history().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_session_alive() {
        let (session, _, output) = run_script(
            vec![
                Err(WeatherMcpError::Agent(AgentError::Model {
                    message: "deployment not found".to_string(),
                })),
                Ok(ChatMessage::assistant("Recovered.")),
            ],
            "first\nsecond\nquit\n",
        )
        .await;

        assert!(output.contains("Agent execution failed: Agent error: Model request failed: deployment not found"));
        assert!(output.contains("Agent: Recovered."));
        assert_eq!(session.state(), SessionState::Terminated);

        // the failed turn left nothing behind
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history()[1], ChatMessage::user("second"));
    }

    #[tokio::test]
    async fn test_history_is_sent_to_model() {
        let invoker = Arc::new(RecordingInvoker::default());
        let model = ScriptedModel::new(vec![
            Ok(ChatMessage::assistant("one")),
            Ok(ChatMessage::assistant("two")),
        ]);
        let mut session = ChatSession::new(Agent::new(model, remote_tools(), invoker));

        let mut output = Vec::new();
        session
            .run("hello\nagain\n".as_bytes(), &mut output)
            .await
            .unwrap();

        let seen = session.agent.model.seen.lock().unwrap();
        assert_eq!(seen[1].len(), 4);
        assert_eq!(seen[1][0], ChatMessage::system(SYSTEM_PROMPT));
    }
}
