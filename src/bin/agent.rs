//! Weather Agent
//!
//! Interactive chat client that answers questions using the tools of a
//! running Weather and Document MCP server.

use clap::Parser;
use tokio::io::BufReader;

use weather_docs_mcp::agent::model::AzureChatModel;
use weather_docs_mcp::agent::ChatSession;
use weather_docs_mcp::config::AgentConfig;
use weather_docs_mcp::error::{ConfigError, WeatherMcpError};

/// Weather Agent
#[derive(Parser)]
#[command(name = "weather-agent")]
#[command(author, version, about = "Weather Agent - chat with a model that can use the weather and document tools")]
struct Cli {
    /// URL of the MCP server endpoint
    #[arg(long)]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(WeatherMcpError::Config(ConfigError::MissingEnvVars { vars })) => {
            eprintln!("--- SETUP ERROR ---");
            eprintln!("Please set the following environment variables to your Azure OpenAI credentials:");
            for var in vars {
                eprintln!("- {}", var);
            }
            eprintln!("---------------------");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = cli.server_url {
        config.server_url = url;
    }

    println!("--- Initializing Weather Agent ---");

    let model = match AzureChatModel::new(&config) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Failed to initialize Azure model: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = match ChatSession::connect(&config, model).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = ?e, "Setup failed");
            eprintln!("Error: could not load tools from {}: {}", config.server_url, e);
            eprintln!("Ensure the MCP server is running at the specified URL.");
            std::process::exit(1);
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    if let Err(e) = session.run(stdin, &mut stdout).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
