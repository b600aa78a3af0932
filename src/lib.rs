//! Weather and Document MCP Library
//!
//! A Model Context Protocol (MCP) tool server for weather lookups and
//! document generation, plus the agent client that drives it from a chat model.

pub mod agent;
pub mod config;
pub mod documents;
pub mod error;
pub mod mcp;
pub mod weather;

pub use config::{AgentConfig, ServerConfig};
pub use error::{Result, WeatherMcpError};
