use std::net::SocketAddr;

use thiserror::Error;

use replicant_shared::{ReplicableError, ReplicableKey, SceneError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    #[error("No replicable kind named '{name}' is registered with the Protocol")]
    UnknownKind { name: String },

    #[error("No replicable with key {key} exists on the Server")]
    UnknownReplicable { key: ReplicableKey },

    #[error("No connection with address {address}")]
    UnknownConnection { address: SocketAddr },

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Replicable(#[from] ReplicableError),
}
