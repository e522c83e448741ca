//! CLI subcommand implementations.

pub mod get;
pub mod latest;
pub mod list;
pub mod versions;
