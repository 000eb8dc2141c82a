use replicant_serde::{ByteReader, ByteWriter, IntegerWidth, SerdeErr};

use crate::types::{MessageIndex, PacketIndex};

use super::{PacketError, PacketProtocol};

/// Fixed header at the start of every datagram
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub sequence: PacketIndex,
    /// Newest sequence received from the remote host, 0 if none yet
    pub ack: PacketIndex,
    /// Bit `i` set: sequence `ack - 1 - i` was received too
    pub ack_bits: u32,
}

impl PacketHeader {
    pub const SIZE: usize = 8;

    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.sequence.to_be_bytes());
        writer.write_bytes(&self.ack.to_be_bytes());
        writer.write_bytes(&self.ack_bits.to_be_bytes());
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self, PacketError> {
        let sequence = read_u16(reader)?;
        let ack = read_u16(reader)?;
        let ack_bits = IntegerWidth::W32.read_unsigned(reader)?;
        Ok(Self {
            sequence,
            ack,
            ack_bits: u32::try_from(ack_bits).unwrap_or(u32::MAX),
        })
    }
}

fn read_u16(reader: &mut ByteReader) -> Result<u16, SerdeErr> {
    let bytes = reader.read_bytes(2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// One protocol message inside a datagram
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub protocol: PacketProtocol,
    /// Present on reliable segments
    pub message_index: Option<MessageIndex>,
    pub payload: Vec<u8>,
}

impl Segment {
    pub fn unreliable(protocol: PacketProtocol, payload: Vec<u8>) -> Self {
        Self {
            protocol,
            message_index: None,
            payload,
        }
    }

    pub fn reliable(protocol: PacketProtocol, message_index: MessageIndex, payload: Vec<u8>) -> Self {
        Self {
            protocol,
            message_index: Some(message_index),
            payload,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.message_index.is_some()
    }

    /// Bytes a segment adds around its payload: protocol, reliable flag,
    /// message index when reliable, payload length
    pub fn overhead(reliable: bool) -> usize {
        if reliable {
            6
        } else {
            4
        }
    }

    /// Bytes this segment occupies in a datagram
    pub fn encoded_len(&self) -> usize {
        Self::overhead(self.is_reliable()) + self.payload.len()
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        writer.write_byte(self.protocol.to_u8());
        match self.message_index {
            Some(index) => {
                writer.write_byte(1);
                writer.write_bytes(&index.to_be_bytes());
            }
            None => writer.write_byte(0),
        }
        IntegerWidth::W16.write_unsigned(self.payload.len() as u64, writer)?;
        writer.write_bytes(&self.payload);
        Ok(())
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self, PacketError> {
        let protocol = PacketProtocol::try_from(reader.read_byte()?)?;
        let message_index = match reader.read_byte()? {
            0 => None,
            1 => Some(read_u16(reader)?),
            value => return Err(PacketError::InvalidReliableFlag { value }),
        };
        let length = usize::from(read_u16(reader)?);
        let payload = reader.read_bytes(length)?.to_vec();
        Ok(Self {
            protocol,
            message_index,
            payload,
        })
    }
}
