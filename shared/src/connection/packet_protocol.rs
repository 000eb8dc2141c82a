// The segment types a datagram can carry. Discriminants are the wire ids.

use super::PacketError;

#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash)]
pub enum PacketProtocol {
    // Sent when a connection has nothing else to say, to prevent a timeout
    Heartbeat,
    // Sent by either end before closing the connection
    RequestDisconnect,
    // Server acknowledges a client's handshake request
    InvokeHandshake,
    // Client asks to connect, carrying its protocol id
    RequestHandshake,
    HandshakeSuccess,
    HandshakeFailed,
    CreateScene,
    DeleteScene,
    CreateReplicable,
    DeleteReplicable,
    UpdateAttributes,
    InvokeMethod,
}

impl PacketProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            PacketProtocol::Heartbeat => 0,
            PacketProtocol::RequestDisconnect => 1,
            PacketProtocol::InvokeHandshake => 2,
            PacketProtocol::RequestHandshake => 3,
            PacketProtocol::HandshakeSuccess => 4,
            PacketProtocol::HandshakeFailed => 5,
            PacketProtocol::CreateScene => 6,
            PacketProtocol::DeleteScene => 7,
            PacketProtocol::CreateReplicable => 8,
            PacketProtocol::DeleteReplicable => 9,
            PacketProtocol::UpdateAttributes => 10,
            PacketProtocol::InvokeMethod => 11,
        }
    }
}

impl TryFrom<u8> for PacketProtocol {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PacketProtocol::Heartbeat),
            1 => Ok(PacketProtocol::RequestDisconnect),
            2 => Ok(PacketProtocol::InvokeHandshake),
            3 => Ok(PacketProtocol::RequestHandshake),
            4 => Ok(PacketProtocol::HandshakeSuccess),
            5 => Ok(PacketProtocol::HandshakeFailed),
            6 => Ok(PacketProtocol::CreateScene),
            7 => Ok(PacketProtocol::DeleteScene),
            8 => Ok(PacketProtocol::CreateReplicable),
            9 => Ok(PacketProtocol::DeleteReplicable),
            10 => Ok(PacketProtocol::UpdateAttributes),
            11 => Ok(PacketProtocol::InvokeMethod),
            // Malformed or malicious packets may carry any byte here
            _ => Err(PacketError::UnknownProtocol { id: value }),
        }
    }
}
