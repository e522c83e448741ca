use anyhow::Result;
use clap::Args;
use mcp_registry_api::Client;

use crate::output::{print_json, print_servers_table, OutputFormat};

#[derive(Args)]
pub struct VersionsArgs {
    /// Server name, e.g. io.github.owner/server
    pub name: String,
}

pub async fn run(args: &VersionsArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let (servers, _) = client.servers().list_versions_by_name(&args.name).await?;

    eprintln!("{} versions of {}", servers.len(), args.name);

    match format {
        OutputFormat::Table => print_servers_table(&servers),
        OutputFormat::Json => print_json(&servers),
    }

    Ok(())
}
