use thiserror::Error;

use replicant_serde::SerdeErr;

use crate::{
    handler::HandlerError,
    types::ReplicableKey,
    world::{ReplicableError, SceneError},
};

use super::PacketProtocol;

/// Errors that can occur while decoding a datagram's framing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Malformed or malicious packets may carry any protocol byte
    #[error("Unknown packet protocol id {id}")]
    UnknownProtocol { id: u8 },

    #[error("Reliable flag must be 0 or 1, got {value}")]
    InvalidReliableFlag { value: u8 },

    /// A segment payload was longer than its declared contents
    #[error("{protocol:?} segment has {remaining} unread trailing bytes")]
    TrailingData {
        protocol: PacketProtocol,
        remaining: usize,
    },

    #[error(transparent)]
    Serde(#[from] SerdeErr),
}

/// Errors that end a connection or refuse one of its operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The remote host sent something it should never send
    #[error("Protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    #[error("Handshake rejected: expected protocol id {expected}, received {received}")]
    HandshakeRejected { expected: u32, received: u32 },

    #[error("A {protocol:?} segment of {size} bytes cannot fit in a datagram of at most {max_packet_size} bytes")]
    SegmentTooLarge {
        protocol: PacketProtocol,
        size: usize,
        max_packet_size: usize,
    },

    #[error("No kind named '{name}' is registered")]
    UnknownKind { name: String },

    #[error("RPC call for {key} has no RPC at index {index}")]
    UnknownRpc { key: ReplicableKey, index: u8 },

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Replicable(#[from] ReplicableError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl From<SerdeErr> for ConnectionError {
    fn from(error: SerdeErr) -> Self {
        ConnectionError::Packet(PacketError::Serde(error))
    }
}
