mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mcp_registry_api::{Client, ClientConfig};

use crate::output::{print_rate, OutputFormat};

#[derive(Parser)]
#[command(name = "mcp-registry")]
#[command(about = "Query the MCP server registry")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Registry base URL (overrides MCP_REGISTRY_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List servers, one page or all of them
    List(commands::list::ListArgs),
    /// Get a server by name
    Get(commands::get::GetArgs),
    /// List every published version of a server
    Versions(commands::versions::VersionsArgs),
    /// Show the latest version of a server
    Latest(commands::latest::LatestArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mcp_registry=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    let client = Client::with_config(config)?;

    let result = match &cli.command {
        Commands::List(args) => commands::list::run(args, &client, &format).await,
        Commands::Get(args) => commands::get::run(args, &client, &format).await,
        Commands::Versions(args) => commands::versions::run(args, &client, &format).await,
        Commands::Latest(args) => commands::latest::run(args, &client, &format).await,
    };

    if let Some(rate) = client.last_rate() {
        print_rate(&rate);
    }

    result
}
