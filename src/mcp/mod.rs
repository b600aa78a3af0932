//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation, its HTTP and stdio
//! transports, and the HTTP client used by the agent.

pub mod client;
pub mod http;
pub mod server;
pub mod tools;
pub mod types;
