use thiserror::Error;

use crate::{handler::HandlerError, world::KindError};

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// Unique ids need at least one value
    #[error("max_replicables must be at least 1")]
    NoReplicables,

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Kind(#[from] KindError),
}
