use mcp_registry_api::types::Server;
use mcp_registry_api::Rate;
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct ServerRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    #[serde(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Description")]
    #[serde(rename = "Description")]
    description: String,
}

const DESCRIPTION_WIDTH: usize = 60;

fn build_server_rows(servers: &[Server]) -> Vec<ServerRow> {
    servers
        .iter()
        .map(|s| ServerRow {
            name: s.name.clone(),
            version: s.version.clone(),
            status: s
                .current_status()
                .map(|st| st.to_string())
                .unwrap_or_default(),
            updated: s
                .official()
                .and_then(|o| o.updated_at)
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            description: truncate(s.description.as_deref().unwrap_or_default(), DESCRIPTION_WIDTH),
        })
        .collect()
}

pub fn print_servers_table(servers: &[Server]) {
    println!("{}", Table::new(build_server_rows(servers)));
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

pub fn print_rate(rate: &Rate) {
    eprintln!("{}", format_rate(rate));
}

fn format_rate(rate: &Rate) -> String {
    match rate.reset {
        Some(reset) => format!(
            "Rate limit: {}/{} remaining, resets at {}",
            rate.remaining,
            rate.limit,
            reset.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => format!("Rate limit: {}/{} remaining", rate.remaining, rate.limit),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
