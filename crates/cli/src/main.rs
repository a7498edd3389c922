mod config;
mod error;
mod observability;

use std::path::PathBuf;
use std::sync::Arc;

use asgardeo::ManagementClient;
use clap::{Parser, Subcommand};
use tools::{AsgardeoTools, ClientAccessor, ConfigurationError};
use tracing::info;

use config::{FileConfig, LogFormat, Settings};
use error::Result;

#[derive(Parser)]
#[command(name = "asgardeo-mcp")]
#[command(about = "Asgardeo and WSO2 Identity Server management over MCP", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./asgardeo-mcp.toml when present)
    #[arg(short, long, global = true, env = "ASGARDEO_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format, overriding the configuration
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over stdio
    Serve,
    /// Print the tool catalogue
    Tools {
        /// Print the full catalogue as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let file = FileConfig::locate(cli.config.as_deref())?;
    let mut settings = Settings::resolve(file, |key| std::env::var(key).ok())?;
    if let Some(format) = cli.log_format {
        settings.log_format = format;
    }
    observability::init_tracing(settings.log_format, &settings.log_level);

    let tools = build_tools(&settings);
    match cli.command {
        Some(Commands::Serve) | None => cmd_serve(tools, &settings).await,
        Some(Commands::Tools { json }) => cmd_tools(&tools, json),
    }
}

fn build_tools(settings: &Settings) -> AsgardeoTools<ManagementClient> {
    let client_config = settings.client_config();
    let accessor = Arc::new(ClientAccessor::new(move || {
        ManagementClient::new(&client_config).map_err(ConfigurationError::from)
    }));
    AsgardeoTools::new(accessor, settings.product, settings.poll)
}

async fn cmd_serve(tools: AsgardeoTools<ManagementClient>, settings: &Settings) -> Result<()> {
    info!(
        product = settings.product.product_name(),
        base_url = %settings.base_url,
        "starting stdio server"
    );
    mcp::Server::new(tools).serve_stdio().await?;
    info!("stdin closed, shutting down");
    Ok(())
}

fn cmd_tools(tools: &AsgardeoTools<ManagementClient>, json: bool) -> Result<()> {
    let catalogue = tools.catalogue();
    if json {
        println!("{}", serde_json::to_string_pretty(&catalogue)?);
        return Ok(());
    }

    for tool in &catalogue {
        println!("{:<34} {}", tool.name, tool.description.as_deref().unwrap_or(""));
    }
    println!("\n{} tools", catalogue.len());
    Ok(())
}
