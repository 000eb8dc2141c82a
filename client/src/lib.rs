//! # Replicant Client
//! Connects to a replicant server, mirrors the replicables it is given a
//! role in, and sends the RPC calls made on them.

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

mod client;
mod client_config;
mod error;

pub use client::Client;
pub use client_config::ClientConfig;
pub use error::ClientError;
