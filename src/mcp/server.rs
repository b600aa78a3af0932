//! MCP Server implementation
//!
//! Transport-agnostic JSON-RPC handling, plus the stdio transport.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server info
pub const SERVER_NAME: &str = "Weather and Document Generator";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const SERVER_INSTRUCTIONS: &str = "A powerful server for fetching current, forecast, and historical weather data, and generating professional reports in PDF, DOCX, PNG, and Markdown formats.";

/// MCP Server for weather lookups and document generation
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,

    /// Whether a client sent the initialized notification
    initialized: AtomicBool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self {
            tool_handler,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    /// Run the server on stdio, one JSON-RPC message per line
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let mut response_str = serde_json::to_string(&response)?;
                    response_str.push('\n');
                    stdout.write_all(response_str.as_bytes()).await?;
                    stdout.flush().await?;
                }
                Ok(None) => {
                    // Notification, no response needed
                }
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Handle a raw JSON-RPC message
    pub async fn handle_message(&self, message: &str) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    RequestId::Number(0),
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a parsed JSON-RPC request or notification
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let Some(id) = request.id.clone() else {
            if request.method == methods::INITIALIZED {
                self.initialized.store(true, Ordering::Relaxed);
            }
            tracing::debug!(method = %request.method, "Received notification");
            return Ok(None);
        };

        tracing::debug!(method = %request.method, "Received request");

        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = self.handle_initialize(&request)?;
                Ok(Some(JsonRpcResponse::success(id, result)))
            }
            methods::PING => Ok(Some(JsonRpcResponse::success(id, serde_json::json!({})))),
            methods::LIST_TOOLS => {
                let result = self.handle_list_tools()?;
                Ok(Some(JsonRpcResponse::success(id, result)))
            }
            methods::CALL_TOOL => match self.handle_call_tool(&request).await {
                Ok(result) => Ok(Some(JsonRpcResponse::success(id, result))),
                Err(error) => Ok(Some(JsonRpcResponse::error(id, error))),
            },
            _ => Ok(Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&request.method),
            ))),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: &JsonRpcRequest) -> Result<Value> {
        let requested = request
            .params
            .clone()
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok());

        let protocol_version = match &requested {
            Some(params) if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) => {
                params.protocol_version.clone()
            }
            _ => MCP_VERSION.to_string(),
        };

        if let Some(params) = &requested {
            tracing::info!(
                client = %params.client_info.name,
                version = %params.client_info.version,
                %protocol_version,
                "Client initializing"
            );
        }

        let result = InitializeResult {
            protocol_version,
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle list tools request
    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle call tool request.
    ///
    /// Malformed params are a protocol error; tool failures are an error result.
    async fn handle_call_tool(&self, request: &JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => serde_json::from_value(p.clone()).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e))
            })?,
            None => return Err(JsonRpcError::invalid_params("Missing tool parameters")),
        };

        tracing::info!(tool = %params.name, "Calling tool");
        let result = self.tool_handler.call_tool(&params.name, params.arguments).await;

        serde_json::to_value(result).map_err(|e| JsonRpcError {
            code: -32603,
            message: e.to_string(),
            data: None,
        })
    }
}
