//! Error types for the weather and document MCP server and agent
//!
//! This module defines the error hierarchy for all operations in the crate.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum WeatherMcpError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Argument validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Weather API errors
    #[error("{0}")]
    Weather(#[from] WeatherApiError),

    /// Document generation errors
    #[error("{0}")]
    Document(#[from] DocumentError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// Agent errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse error classification used for logging and diagnosis.
///
/// Callers across the protocol boundary only ever see the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationError,
    ValidationError,
    NetworkError,
    UpstreamHttpError,
    UpstreamLogicalError,
    IoFailure,
    RenderError,
    UnexpectedError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::UpstreamHttpError => "UpstreamHTTPError",
            ErrorKind::UpstreamLogicalError => "UpstreamLogicalError",
            ErrorKind::IoFailure => "IOFailure",
            ErrorKind::RenderError => "RenderError",
            ErrorKind::UnexpectedError => "UnexpectedError",
        };
        f.write_str(name)
    }
}

impl WeatherMcpError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherMcpError::Config(_) => ErrorKind::ConfigurationError,
            WeatherMcpError::Validation(_) => ErrorKind::ValidationError,
            WeatherMcpError::Weather(e) => match e {
                WeatherApiError::Network { .. } => ErrorKind::NetworkError,
                WeatherApiError::UpstreamHttp { .. } => ErrorKind::UpstreamHttpError,
                WeatherApiError::UpstreamLogical { .. } => ErrorKind::UpstreamLogicalError,
                WeatherApiError::Unexpected { .. } => ErrorKind::UnexpectedError,
            },
            WeatherMcpError::Document(e) => match e {
                DocumentError::Io { .. } => ErrorKind::IoFailure,
                DocumentError::Render { .. } => ErrorKind::RenderError,
            },
            WeatherMcpError::Io(_) => ErrorKind::IoFailure,
            WeatherMcpError::Http(e) if e.is_connect() || e.is_timeout() => ErrorKind::NetworkError,
            WeatherMcpError::Mcp(McpError::InvalidArguments { .. }) => ErrorKind::ValidationError,
            _ => ErrorKind::UnexpectedError,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Weather API key is not configured. Please set the WEATHER_API_TOKEN environment variable.")]
    MissingApiKey,

    #[error("Missing required environment variables: {}", vars.join(", "))]
    MissingEnvVars { vars: Vec<String> },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Validation errors, raised before any I/O happens
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid forecast days: {days}. Must be between 1 and 14.")]
    ForecastDays { days: i64 },

    #[error("Invalid date format: '{value}'. Must be in YYYY-MM-DD format.")]
    HistoryDate { value: String },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },
}

/// Weather API errors
#[derive(Error, Debug)]
pub enum WeatherApiError {
    #[error("Network Error: Could not connect to weather API: {message}")]
    Network { message: String },

    #[error("HTTP Error {status}: Could not reach weather API.")]
    UpstreamHttp { status: u16 },

    #[error("Weather API Error: {message}")]
    UpstreamLogical { message: String },

    #[error("An unexpected error occurred during API call: {message}")]
    Unexpected { message: String },
}

/// Document generation errors
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to generate {format}: {message}")]
    Render { format: String, message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Tool {name} failed: {message}")]
    ToolFailed { name: String, message: String },
}

/// Agent client errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model request failed: {message}")]
    Model { message: String },

    #[error("Failed to load tools: {message}")]
    ToolLoading { message: String },

    #[error("Max iterations ({max}) reached in agent loop")]
    MaxIterations { max: usize },
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, WeatherMcpError>;
