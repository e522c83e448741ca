use anyhow::{bail, Result};
use clap::Args;
use mcp_registry_api::Client;

use crate::output::{print_json, print_servers_table, OutputFormat};

#[derive(Args)]
pub struct LatestArgs {
    /// Server name, e.g. io.github.owner/server
    pub name: String,

    /// Highest semantic version with active status, instead of the
    /// registry's latest flag
    #[arg(long)]
    pub active: bool,
}

pub async fn run(args: &LatestArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let servers = client.servers();
    let (server, _) = if args.active {
        servers.get_by_name_latest_active_version(&args.name).await?
    } else {
        servers.get_by_name_latest(&args.name).await?
    };

    let Some(server) = server else {
        bail!("no matching version of {}", args.name);
    };

    match format {
        OutputFormat::Table => print_servers_table(std::slice::from_ref(&server)),
        OutputFormat::Json => print_json(&server),
    }

    Ok(())
}
