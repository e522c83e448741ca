use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use mcp_registry_api::{Client, Query, ServerListOptions};

use crate::output::{print_json, print_servers_table, OutputFormat};

#[derive(Args)]
pub struct ListArgs {
    /// Substring match on server names
    #[arg(long)]
    pub search: Option<String>,

    /// Results per page
    #[arg(long)]
    pub limit: Option<u32>,

    /// Continue from a cursor printed by a previous call
    #[arg(long)]
    pub cursor: Option<String>,

    /// Only the latest version of each server
    #[arg(long)]
    pub latest: bool,

    /// Only servers updated after this time (RFC3339, e.g. 2024-01-01T00:00:00Z)
    #[arg(long)]
    pub updated_since: Option<String>,

    /// Follow cursors and fetch every page
    #[arg(long)]
    pub all: bool,
}

pub async fn run(args: &ListArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let opts = build_options(args)?;

    if args.all {
        let servers = match client.servers().list_all(&opts).await {
            Ok((servers, _)) => servers,
            Err(partial) => {
                if !partial.servers.is_empty() {
                    eprintln!(
                        "Listing stopped early, showing {} servers fetched so far",
                        partial.servers.len()
                    );
                    print_servers(&partial.servers, format);
                }
                return Err(partial.into_error().into());
            }
        };
        eprintln!("{} servers", servers.len());
        print_servers(&servers, format);
        return Ok(());
    }

    let (page, resp) = client.servers().list(&opts).await?;
    let servers = page.into_servers();
    print_servers(&servers, format);
    if let Some(cursor) = &resp.next_cursor {
        eprintln!("More results available: --cursor {}", cursor);
    }

    Ok(())
}

fn print_servers(servers: &[mcp_registry_api::types::Server], format: &OutputFormat) {
    match format {
        OutputFormat::Table => print_servers_table(servers),
        OutputFormat::Json => print_json(&servers),
    }
}

fn build_options(args: &ListArgs) -> Result<ServerListOptions> {
    let mut opts = ServerListOptions::default();

    if let Some(search) = &args.search {
        opts = opts.with_search(search);
    }
    if let Some(limit) = args.limit {
        opts = opts.with_limit(limit);
    }
    if let Some(cursor) = &args.cursor {
        opts = opts.with_cursor(cursor);
    }
    if args.latest {
        opts = opts.with_latest_only();
    }
    if let Some(since) = &args.updated_since {
        let since = DateTime::parse_from_rfc3339(since)
            .with_context(|| format!("invalid --updated-since value: {}", since))?;
        opts = opts.with_updated_since(since.with_timezone(&Utc));
    }

    Ok(opts)
}
