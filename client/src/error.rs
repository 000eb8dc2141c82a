use thiserror::Error;

use replicant_shared::{ReplicableError, ReplicableKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("No replicable with key {key} has been received from the Server")]
    UnknownReplicable { key: ReplicableKey },

    #[error("Cannot call RPCs before the Client is connected")]
    NotConnected,

    #[error(transparent)]
    Replicable(#[from] ReplicableError),
}
