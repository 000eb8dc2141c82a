//! # Replicant Server
//! The authority of a replicant session. Owns the canonical [`World`],
//! accepts handshakes from clients, and replicates every replicable with a
//! remote role to each of them.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replicant_shared::{
        ConnectionConfig, ConnectionEvent, ConnectionState, Field, HostType, KindBuilder,
        Protocol, ReplicableKey, Role, Roles, Rpc, RpcOutcome, TypeFlag, Value, World,
    };
}

mod error;
mod server;
mod server_config;

pub use error::ServerError;
pub use server::{Server, ServerEvent};
pub use server_config::ServerConfig;
