//! Remote tool binding
//!
//! Turns the Tool Server's catalog into function definitions for the model
//! and routes the model's calls back to the server.

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::model::FunctionDefinition;
use crate::error::{AgentError, McpError, Result};
use crate::mcp::client::McpHttpClient;
use crate::mcp::types::Tool;

/// Something that can execute a named tool and return its text result
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, name: &str, arguments: Value) -> Result<String>;
}

#[async_trait]
impl ToolInvoker for McpHttpClient {
    async fn invoke(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self.call_tool(name, arguments).await?;
        let text = result.joined_text();

        if result.is_error {
            return Err(McpError::ToolFailed {
                name: name.to_string(),
                message: text,
            }
            .into());
        }

        Ok(text)
    }
}

/// A discovered tool bound to the model-facing function definition
#[derive(Debug, Clone)]
pub struct RemoteTool {
    pub name: String,
    pub description: Option<String>,
    pub definition: FunctionDefinition,
}

impl From<Tool> for RemoteTool {
    fn from(tool: Tool) -> Self {
        let definition = FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema,
        };

        Self {
            name: tool.name,
            description: tool.description,
            definition,
        }
    }
}

/// Discover the server's tools and bind them
pub async fn load_tools(client: &McpHttpClient) -> Result<Vec<RemoteTool>> {
    let tools = client.list_tools().await.map_err(|e| AgentError::ToolLoading {
        message: e.to_string(),
    })?;

    Ok(tools.into_iter().map(RemoteTool::from).collect())
}
