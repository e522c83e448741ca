use anyhow::{bail, Result};
use clap::Args;
use mcp_registry_api::{Client, ServerGetOptions};

use crate::output::{print_json, print_servers_table, OutputFormat};

#[derive(Args)]
pub struct GetArgs {
    /// Server name, e.g. io.github.owner/server
    pub name: String,

    /// A specific version instead of the latest
    #[arg(long)]
    pub version: Option<String>,
}

pub async fn run(args: &GetArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let opts = args
        .version
        .as_deref()
        .map(|v| ServerGetOptions::default().with_version(v));

    let server = match client.servers().get(&args.name, opts.as_ref()).await {
        Ok((server, _)) => server,
        Err(e) if e.is_not_found() => {
            // Not every registry serves direct lookups by name.
            let (servers, _) = client.servers().list_by_name(&args.name).await?;
            let found = match &args.version {
                Some(version) => servers.into_iter().find(|s| &s.version == version),
                None => servers.into_iter().next(),
            };
            match found {
                Some(server) => server,
                None => bail!("server not found: {}", args.name),
            }
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Table => print_servers_table(std::slice::from_ref(&server)),
        OutputFormat::Json => print_json(&server),
    }

    Ok(())
}
