//! Streamable HTTP transport
//!
//! Each JSON-RPC message is POSTed to `/mcp` and answered with a single JSON
//! body. Notifications get `202 Accepted`. No server-initiated stream is offered.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::error::Result;
use crate::mcp::server::McpServer;
use crate::mcp::types::{methods, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, SESSION_HEADER};

/// Path the MCP endpoint is mounted on
pub const MCP_PATH: &str = "/mcp";

/// Build the router for the MCP endpoint
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_post))
        .with_state(server)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(server: Arc<McpServer>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP server listening on http://{}{}", listener.local_addr()?, MCP_PATH);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn handle_post(State(server): State<Arc<McpServer>>, body: String) -> Response {
    let request: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            let response =
                JsonRpcResponse::error(RequestId::Number(0), JsonRpcError::parse_error(e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let is_initialize = request.method == methods::INITIALIZE;

    match server.handle_request(request).await {
        Ok(Some(response)) => {
            let mut http_response = Json(response).into_response();
            if is_initialize {
                let session_id = uuid::Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&session_id) {
                    http_response.headers_mut().insert(SESSION_HEADER, value);
                }
            }
            http_response
        }
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!("Error handling message: {}", e);
            let response = JsonRpcResponse::error(
                RequestId::Number(0),
                JsonRpcError::invalid_request(e.to_string()),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}
