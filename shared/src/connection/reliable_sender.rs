use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::types::{MessageIndex, ReplicableKey};

use super::{PacketProtocol, Segment};

struct PendingMessage {
    segment: Segment,
    last_sent: Option<Instant>,
    /// Set on `create_replicable` messages
    creates: Option<ReplicableKey>,
}

/// Reliable segments waiting for acknowledgement, resent on an interval
pub struct ReliableSender {
    next_index: MessageIndex,
    pending: VecDeque<(MessageIndex, PendingMessage)>,
}

impl ReliableSender {
    pub fn new() -> Self {
        Self {
            next_index: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn push(
        &mut self,
        protocol: PacketProtocol,
        payload: Vec<u8>,
        creates: Option<ReplicableKey>,
    ) -> MessageIndex {
        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);
        self.pending.push_back((
            index,
            PendingMessage {
                segment: Segment::reliable(protocol, index, payload),
                last_sent: None,
                creates,
            },
        ));
        index
    }

    /// Segments never sent, or not acknowledged within `resend_interval`
    pub fn collect_due(&mut self, now: Instant, resend_interval: Duration) -> Vec<Segment> {
        let mut due = Vec::new();
        for (_, message) in self.pending.iter_mut() {
            let ready = match message.last_sent {
                None => true,
                Some(last_sent) => now.saturating_duration_since(last_sent) >= resend_interval,
            };
            if ready {
                message.last_sent = Some(now);
                due.push(message.segment.clone());
            }
        }
        due
    }

    /// Forgets acknowledged messages, returning the replicables whose
    /// creation was confirmed
    pub fn acknowledge(&mut self, indices: &[MessageIndex]) -> Vec<ReplicableKey> {
        let mut created = Vec::new();
        self.pending.retain(|(index, message)| {
            if !indices.contains(index) {
                return true;
            }
            created.extend(message.creates);
            false
        });
        created
    }

    /// Abandons a message that can never be sent
    pub fn discard(&mut self, index: MessageIndex) {
        self.pending.retain(|(pending, _)| *pending != index);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for ReliableSender {
    fn default() -> Self {
        Self::new()
    }
}
