mod common;
pub use self::common::{ListOptions, Query};

mod server;
pub use self::server::{ServerGetOptions, ServerListOptions, LATEST};
