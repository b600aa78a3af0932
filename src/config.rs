//! Configuration management
//!
//! Both components take an explicit configuration value at construction.
//! `from_env` reads the process environment; tests build the structs directly.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Configuration for the Tool Server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Weather API credential (`None` when unset)
    pub weather_api_key: Option<String>,

    /// Base URL of the weather API
    pub weather_base_url: String,

    /// Timeout for each upstream request
    pub request_timeout: Duration,

    /// Directory generated documents are written to
    pub output_dir: PathBuf,

    /// Host the HTTP transport binds to
    pub bind_host: String,

    /// Port the HTTP transport binds to
    pub bind_port: u16,

    /// Truetype fonts tried in order when rendering PNG images
    pub font_paths: Vec<PathBuf>,
}

impl ServerConfig {
    /// Load the server configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the server configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let weather_api_key = lookup("WEATHER_API_TOKEN");

        let weather_base_url = lookup("WEATHER_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.weather_base_url);

        let output_dir = lookup("WEATHER_MCP_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let bind_host = lookup("WEATHER_MCP_HOST").unwrap_or(defaults.bind_host);

        let bind_port = lookup("WEATHER_MCP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.bind_port);

        let mut font_paths = defaults.font_paths;
        if let Some(font) = lookup("WEATHER_MCP_FONT") {
            font_paths.insert(0, PathBuf::from(font));
        }

        Self {
            weather_api_key,
            weather_base_url,
            request_timeout: defaults.request_timeout,
            output_dir,
            bind_host,
            bind_port,
            font_paths,
        }
    }

    /// The configured API key, if it is usable.
    ///
    /// Empty keys and the documentation placeholder count as unset.
    pub fn api_key(&self) -> Result<&str> {
        match self.weather_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != weather::PLACEHOLDER_API_KEY => Ok(key),
            _ => Err(ConfigError::MissingApiKey.into()),
        }
    }

    /// Socket address string for the HTTP transport
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            weather_base_url: weather::API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(weather::REQUEST_TIMEOUT_SECS),
            output_dir: PathBuf::from("."),
            bind_host: "127.0.0.1".to_string(),
            bind_port: 8000,
            font_paths: documents::DEFAULT_FONT_PATHS
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// Configuration for the Agent Client
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// URL of the Tool Server's MCP endpoint
    pub server_url: String,

    /// Azure OpenAI resource endpoint
    pub azure_endpoint: String,

    /// Azure OpenAI API key
    pub azure_api_key: String,

    /// Azure OpenAI deployment name
    pub azure_deployment: String,

    /// Azure OpenAI API version
    pub azure_api_version: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum model round trips per turn
    pub max_iterations: usize,

    /// Timeout for requests to the model and the Tool Server
    pub request_timeout: Duration,
}

impl AgentConfig {
    /// Variables that must be set before the agent starts
    pub const REQUIRED_VARS: [&'static str; 3] = [
        "AZURE_OPENAI_API_KEY",
        "AZURE_OPENAI_ENDPOINT",
        "AZURE_OPENAI_DEPLOYMENT_NAME",
    ];

    /// Load the agent configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the agent configuration through an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = Self::REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| get(*name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars { vars: missing }.into());
        }

        let required = |name: &str| {
            get(name).ok_or_else(|| ConfigError::MissingEnvVars {
                vars: vec![name.to_string()],
            })
        };

        Ok(Self {
            server_url: get("WEATHER_MCP_URL").unwrap_or_else(|| agent::DEFAULT_SERVER_URL.to_string()),
            azure_endpoint: required("AZURE_OPENAI_ENDPOINT")?,
            azure_api_key: required("AZURE_OPENAI_API_KEY")?,
            azure_deployment: required("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            azure_api_version: get("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| agent::DEFAULT_API_VERSION.to_string()),
            temperature: 0.0,
            max_iterations: agent::DEFAULT_MAX_ITERATIONS,
            request_timeout: Duration::from_secs(agent::REQUEST_TIMEOUT_SECS),
        })
    }
}

/// Weather API constants
pub mod weather {
    /// Base URL for the weather API
    pub const API_BASE_URL: &str = "http://api.weatherapi.com/v1";

    /// Value shipped in sample configuration, never a real key
    pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_TOKEN";

    /// Upstream request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}

/// Document rendering constants
pub mod documents {
    /// Truetype fonts tried for PNG rendering before the bitmap fallback
    pub const DEFAULT_FONT_PATHS: &[&str] = &[
        "arial.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
}

/// Agent client constants
pub mod agent {
    pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/mcp";
    pub const DEFAULT_API_VERSION: &str = "2025-03-01-preview";
    pub const DEFAULT_MAX_ITERATIONS: usize = 10;
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
}
