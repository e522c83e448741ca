mod meta;
pub use self::meta::{ListMetadata, ServerListResponse, ServerResponse};

mod server;
pub use self::server::{
    Package, RegistryExtensions, Remote, Repository, Server, ServerMeta, ServerStatus,
};
