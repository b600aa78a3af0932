//! MCP Tool definitions and handlers
//!
//! Defines all available tools and their implementations.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::config::ServerConfig;
use crate::documents::{DocumentFormat, DocumentGenerator, ToolOutput};
use crate::error::{McpError, Result, ValidationError};
use crate::mcp::types::{CallToolResult, Tool};
use crate::weather::client::WeatherClient;
use crate::weather::types::{ForecastDays, HistoryDate};

/// Operations reported by the catalog tool, in catalog order
pub const OPERATION_NAMES: [&str; 7] = [
    "get_current_weather",
    "get_forecast_weather",
    "get_history_weather",
    "generate_pdf_report",
    "generate_docx_report",
    "generate_png_image",
    "generate_md_report",
];

/// Name of the catalog tool itself
pub const LIST_TOOLS: &str = "list_tools";

/// Static catalog of operation names
pub fn catalog() -> Value {
    json!({ "tools": OPERATION_NAMES })
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CurrentWeatherArgs {
    /// The query string. Can be a city name (e.g., 'London'), US Zipcode, UK Postcode, or Latitude/Longitude (e.g., '30.3,-97.7').
    q: String,
}

#[derive(Debug, Deserialize, JsonSchema, Validate)]
struct ForecastWeatherArgs {
    /// The query string. Can be a city name, postal code, or Lat/Lon.
    q: String,

    /// The number of days for the forecast (1 to 14).
    #[validate(range(min = 1, max = 14))]
    days: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct HistoryWeatherArgs {
    /// The query string. Can be a city name, postal code, or Lat/Lon.
    q: String,

    /// The date in 'YYYY-MM-DD' format (e.g., '2025-10-28').
    dt: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DocumentArgs {
    /// The text content to be written into the document.
    content: String,

    /// Optional filename for the report. Defaults to 'report_<timestamp>.<extension>'.
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct NoArgs {}

/// Tool handler
#[derive(Debug, Clone)]
pub struct ToolHandler {
    weather_client: WeatherClient,
    documents: DocumentGenerator,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(config: ServerConfig) -> Result<Self> {
        let documents = DocumentGenerator::new(&config);
        let weather_client = WeatherClient::new(config)?;

        Ok(Self {
            weather_client,
            documents,
        })
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            tool_def::<CurrentWeatherArgs>(
                "get_current_weather",
                "Retrieves the current/real-time weather for a given location.",
            ),
            tool_def::<ForecastWeatherArgs>(
                "get_forecast_weather",
                "Retrieves the weather forecast for a location for up to 14 days.",
            ),
            tool_def::<HistoryWeatherArgs>(
                "get_history_weather",
                "Retrieves historical weather for a specific date on or after 2015-01-01.",
            ),
            tool_def::<DocumentArgs>(
                "generate_pdf_report",
                "Generates a PDF document from the provided text content.",
            ),
            tool_def::<DocumentArgs>(
                "generate_docx_report",
                "Generates a Microsoft Word (.docx) document from the provided text content.",
            ),
            tool_def::<DocumentArgs>(
                "generate_png_image",
                "Generates a PNG image containing the provided text content.",
            ),
            tool_def::<DocumentArgs>(
                "generate_md_report",
                "Generates a Markdown (.md) file containing the provided text content.",
            ),
            tool_def::<NoArgs>(
                LIST_TOOLS,
                "Lists the names of all weather and document operations.",
            ),
        ]
    }

    /// Call a tool by name.
    ///
    /// Every failure becomes an error result carrying the error message.
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        match self.dispatch(name, args).await {
            Ok(output) => {
                tracing::info!(tool = name, "Tool call succeeded");
                CallToolResult::text(output.to_text())
            }
            Err(e) => {
                tracing::warn!(tool = name, kind = %e.kind(), "Tool call failed: {}", e);
                CallToolResult::error(e.to_string())
            }
        }
    }

    /// Run a tool and return its unpackaged output
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<ToolOutput> {
        match name {
            "get_current_weather" => self.handle_current_weather(args).await,
            "get_forecast_weather" => self.handle_forecast_weather(args).await,
            "get_history_weather" => self.handle_history_weather(args).await,
            "generate_pdf_report" => self.handle_document(name, DocumentFormat::Pdf, args).await,
            "generate_docx_report" => self.handle_document(name, DocumentFormat::Docx, args).await,
            "generate_png_image" => self.handle_document(name, DocumentFormat::Png, args).await,
            "generate_md_report" => self.handle_document(name, DocumentFormat::Markdown, args).await,
            LIST_TOOLS => {
                let NoArgs {} = parse_args(args)?;
                Ok(ToolOutput::Plain(catalog()))
            }
            _ => Err(McpError::UnknownTool {
                name: name.to_string(),
            }
            .into()),
        }
    }

    // ==================== Tool Handlers ====================

    async fn handle_current_weather(&self, args: Value) -> Result<ToolOutput> {
        let args: CurrentWeatherArgs = parse_args(args)?;
        let data = self.weather_client.current(&args.q).await?;
        Ok(ToolOutput::Plain(data))
    }

    async fn handle_forecast_weather(&self, args: Value) -> Result<ToolOutput> {
        let args: ForecastWeatherArgs = parse_args(args)?;
        args.validate()
            .map_err(|_| ValidationError::ForecastDays { days: args.days })?;
        let days = ForecastDays::new(args.days)?;

        let data = self.weather_client.forecast(&args.q, days).await?;
        Ok(ToolOutput::Plain(data))
    }

    async fn handle_history_weather(&self, args: Value) -> Result<ToolOutput> {
        let args: HistoryWeatherArgs = parse_args(args)?;
        let dt = HistoryDate::parse(&args.dt)?;

        let data = self.weather_client.history(&args.q, dt).await?;
        Ok(ToolOutput::Plain(data))
    }

    async fn handle_document(
        &self,
        tool: &str,
        format: DocumentFormat,
        args: Value,
    ) -> Result<ToolOutput> {
        let args: DocumentArgs = parse_args(args)?;
        let documents = self.documents.clone();

        tokio::task::spawn_blocking(move || {
            documents.generate(format, &args.content, args.file_name.as_deref())
        })
        .await
        .map_err(|e| render_task_failed(tool, e))?
    }
}

/// Error for a rendering task that panicked or was cancelled
fn render_task_failed(tool: &str, err: tokio::task::JoinError) -> McpError {
    McpError::ToolFailed {
        name: tool.to_string(),
        message: err.to_string(),
    }
}

/// Deserialize tool arguments, treating missing arguments as an empty object
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| {
        McpError::InvalidArguments {
            message: e.to_string(),
        }
        .into()
    })
}

/// Build a tool definition with a schema derived from its argument type
fn tool_def<T: JsonSchema>(name: &str, description: &str) -> Tool {
    let mut input_schema =
        serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({}));

    if let Some(schema) = input_schema.as_object_mut() {
        schema.remove("$schema");
        schema.remove("title");
        schema
            .entry("properties")
            .or_insert_with(|| json!({}));
    }

    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}
