use std::collections::HashMap;

use crate::{
    types::{MessageIndex, PacketIndex},
    wrapping_number::{sequence_greater_than, wrapping_diff},
};

use super::PacketHeader;

/// Sent packets remembered for acknowledgement, measured back from the
/// newest one. Anything older is left to the resend timer.
const TRACKED_PACKETS: i16 = 1024;

/// How an incoming sequence relates to what was received before
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Received {
    /// Newer than anything seen so far
    Newest,
    /// Arrived after a newer packet
    Stale,
    /// Seen before
    Duplicate,
}

/// Numbers outgoing packets and tracks which of them the remote host has
/// acknowledged, along with the reliable segments each one carried.
///
/// Sequence 0 is never sent, so an `ack` of 0 means nothing was received.
pub struct AckManager {
    next_sequence: PacketIndex,
    newest_received: Option<PacketIndex>,
    received_bits: u32,
    sent_packets: HashMap<PacketIndex, Vec<MessageIndex>>,
}

impl AckManager {
    pub fn new() -> Self {
        Self {
            next_sequence: 1,
            newest_received: None,
            received_bits: 0,
            sent_packets: HashMap::new(),
        }
    }

    /// Header for the next outgoing packet, consuming its sequence number
    pub fn next_outgoing_packet_header(&mut self) -> PacketHeader {
        let sequence = self.next_sequence;
        self.next_sequence = match self.next_sequence.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        PacketHeader {
            sequence,
            ack: self.newest_received.unwrap_or(0),
            ack_bits: self.received_bits,
        }
    }

    /// Remembers the reliable segments a sent packet carried
    pub fn track_sent(&mut self, sequence: PacketIndex, messages: Vec<MessageIndex>) {
        if !messages.is_empty() {
            self.sent_packets.insert(sequence, messages);
        }
        self.sent_packets
            .retain(|tracked, _| wrapping_diff(*tracked, sequence) < TRACKED_PACKETS);
    }

    /// Records an incoming sequence number
    pub fn record_received(&mut self, sequence: PacketIndex) -> Received {
        let Some(newest) = self.newest_received else {
            self.newest_received = Some(sequence);
            return Received::Newest;
        };

        if sequence_greater_than(sequence, newest) {
            let shift = u32::from(wrapping_diff(newest, sequence).unsigned_abs());
            self.received_bits = if shift > 32 {
                0
            } else {
                let shifted = (u64::from(self.received_bits) << shift) | (1u64 << (shift - 1));
                // keeps the low 32 bits
                (shifted & u64::from(u32::MAX)) as u32
            };
            self.newest_received = Some(sequence);
            return Received::Newest;
        }
        if sequence == newest {
            return Received::Duplicate;
        }

        let distance = u32::from(wrapping_diff(sequence, newest).unsigned_abs());
        if distance > 32 {
            return Received::Stale;
        }
        let bit = 1u32 << (distance - 1);
        if self.received_bits & bit != 0 {
            return Received::Duplicate;
        }
        self.received_bits |= bit;
        Received::Stale
    }

    /// Reliable message indices confirmed by the remote host's header
    pub fn process_incoming_header(&mut self, header: &PacketHeader) -> Vec<MessageIndex> {
        if header.ack == 0 {
            return Vec::new();
        }
        let mut acknowledged = Vec::new();
        if let Some(messages) = self.sent_packets.remove(&header.ack) {
            acknowledged.extend(messages);
        }
        for offset in 0..32u16 {
            if header.ack_bits & (1 << offset) == 0 {
                continue;
            }
            let sequence = header.ack.wrapping_sub(offset + 1);
            if let Some(messages) = self.sent_packets.remove(&sequence) {
                acknowledged.extend(messages);
            }
        }
        acknowledged
    }
}

impl Default for AckManager {
    fn default() -> Self {
        Self::new()
    }
}
