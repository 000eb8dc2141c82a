use crate::types::ReplicableKey;

use super::{ConnectionError, PacketProtocol};

/// Something a connection observed, queued for the host to inspect
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    /// Closed locally or by the remote host
    Disconnected,
    TimedOut,
    HandshakeRejected { expected: u32, received: u32 },
    /// A remote write or call was refused by the role check
    PermissionDenied { key: ReplicableKey },
    /// A value could not be packed; the segment was not sent
    PackFailed { key: ReplicableKey, error: ConnectionError },
    /// A single segment is larger than a datagram and was dropped
    SegmentTooLarge { protocol: PacketProtocol, size: usize },
    /// Malformed input; the connection has failed
    ProtocolViolation { error: ConnectionError },
    ReplicableCreated { key: ReplicableKey },
    ReplicableDestroyed { key: ReplicableKey },
}
