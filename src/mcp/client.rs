//! MCP client for the streamable HTTP transport
//!
//! Used by the agent to discover and invoke the Tool Server's operations.
//! Responses may arrive as a plain JSON body or as a server-sent event stream.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::error::{McpError, Result};
use crate::mcp::types::*;

const CLIENT_NAME: &str = "weather-agent";

/// MCP client speaking JSON-RPC over HTTP POST
#[derive(Debug)]
pub struct McpHttpClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// MCP endpoint URL
    url: String,

    /// Session id issued by the server, echoed on every request
    session_id: Mutex<Option<String>>,

    /// Next JSON-RPC request id
    next_id: AtomicI64,

    /// Server's answer to initialize
    server_info: Option<InitializeResult>,
}

impl McpHttpClient {
    /// Connect to a server and complete the initialize handshake
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        let mut client = Self {
            http_client,
            url: url.to_string(),
            session_id: Mutex::new(None),
            next_id: AtomicI64::new(1),
            server_info: None,
        };

        let params = json!({
            "protocolVersion": MCP_VERSION,
            "clientInfo": {"name": CLIENT_NAME, "version": env!("CARGO_PKG_VERSION")},
            "capabilities": {}
        });
        let result = client.request(methods::INITIALIZE, Some(params)).await?;
        let info: InitializeResult = serde_json::from_value(result)?;
        tracing::info!(
            server = %info.server_info.name,
            protocol = %info.protocol_version,
            "Connected to MCP server"
        );
        client.server_info = Some(info);

        client
            .send(&JsonRpcRequest::notification(methods::INITIALIZED))
            .await?;

        Ok(client)
    }

    /// Server info from the handshake
    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server_info.as_ref()
    }

    /// Discover the server's tools
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result = self.request(methods::LIST_TOOLS, None).await?;
        let list: ListToolsResult = serde_json::from_value(result)?;
        Ok(list.tools)
    }

    /// Invoke a tool. Tool-level failures come back as a result with `is_error` set.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = json!({"name": name, "arguments": arguments});
        let result = self.request(methods::CALL_TOOL, Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Send a request and return its result, mapping JSON-RPC errors
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let response = self.send(&request).await?.ok_or_else(|| McpError::ProtocolError {
            message: format!("No response to {}", method),
        })?;

        if let Some(error) = response.error {
            return Err(McpError::ProtocolError {
                message: format!("{} failed ({}): {}", method, error.code, error.message),
            }
            .into());
        }

        response.result.ok_or_else(|| {
            McpError::ProtocolError {
                message: format!("Empty result for {}", method),
            }
            .into()
        })
    }

    /// POST one message; notifications yield `None`
    async fn send(&self, request: &JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let mut builder = self
            .http_client
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(request);

        if let Some(session_id) = self.current_session() {
            builder = builder.header(SESSION_HEADER, session_id);
        }

        let response = builder.send().await.map_err(|e| McpError::TransportError {
            message: e.to_string(),
        })?;

        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.set_session(session_id.to_string());
        }

        let status = response.status();
        if request.is_notification() {
            if !status.is_success() {
                tracing::warn!(method = %request.method, %status, "Notification rejected");
            }
            return Ok(None);
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/event-stream"))
            .unwrap_or(false);

        let body = response.text().await?;

        if !status.is_success() && !body.trim_start().starts_with('{') {
            return Err(McpError::TransportError {
                message: format!("HTTP {}: {}", status, body),
            }
            .into());
        }

        if is_event_stream {
            find_sse_response(&body, request.id.as_ref())
                .map(Some)
                .ok_or_else(|| {
                    McpError::ProtocolError {
                        message: format!("No response to {} in event stream", request.method),
                    }
                    .into()
                })
        } else {
            Ok(Some(serde_json::from_str(&body)?))
        }
    }

    fn current_session(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|s| s.clone())
    }

    fn set_session(&self, session_id: String) {
        if let Ok(mut current) = self.session_id.lock() {
            *current = Some(session_id);
        }
    }
}

/// Find the response matching `id` among the `data:` events of an SSE body
fn find_sse_response(body: &str, id: Option<&RequestId>) -> Option<JsonRpcResponse> {
    let mut events = Vec::new();
    let mut data = String::new();

    for line in body.lines() {
        if let Some(chunk) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(chunk.strip_prefix(' ').unwrap_or(chunk));
        } else if line.is_empty() && !data.is_empty() {
            events.push(std::mem::take(&mut data));
        }
    }
    if !data.is_empty() {
        events.push(data);
    }

    events
        .iter()
        .filter_map(|event| serde_json::from_str::<JsonRpcResponse>(event).ok())
        .find(|response| id.map_or(true, |id| &response.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_response_matching_id() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n\
                    event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"tools\":[]}}\n\n";
        let response = find_sse_response(body, Some(&RequestId::Number(2))).unwrap();
        assert_eq!(response.id, RequestId::Number(2));
        assert!(response.result.unwrap()["tools"].is_array());
    }

    #[test]
    fn test_sse_without_match() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n\n";
        assert!(find_sse_response(body, Some(&RequestId::Number(1))).is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = McpHttpClient::connect(&format!("http://{}/mcp", addr), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Transport error"));
    }
}
