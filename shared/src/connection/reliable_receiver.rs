use std::collections::HashMap;

use log::trace;

use crate::{
    types::MessageIndex,
    wrapping_number::{sequence_greater_than, wrapping_diff},
};

use super::Segment;

/// How far ahead of the next expected index a message may be buffered
const MAX_BUFFERED_AHEAD: i16 = 1024;

/// Delivers reliable segments exactly once, in the order they were sent
pub struct ReliableReceiver {
    next_index: MessageIndex,
    buffered: HashMap<MessageIndex, Segment>,
}

impl ReliableReceiver {
    pub fn new() -> Self {
        Self {
            next_index: 0,
            buffered: HashMap::new(),
        }
    }

    /// Accepts a reliable segment, returning every segment now deliverable
    pub fn receive(&mut self, segment: Segment) -> Vec<Segment> {
        let Some(index) = segment.message_index else {
            return vec![segment];
        };

        if index == self.next_index {
            let mut ready = vec![segment];
            self.next_index = self.next_index.wrapping_add(1);
            while let Some(next) = self.buffered.remove(&self.next_index) {
                ready.push(next);
                self.next_index = self.next_index.wrapping_add(1);
            }
            return ready;
        }

        if sequence_greater_than(index, self.next_index)
            && wrapping_diff(self.next_index, index) < MAX_BUFFERED_AHEAD
        {
            self.buffered.entry(index).or_insert(segment);
        } else {
            trace!("ReliableReceiver: dropping duplicate message {index}");
        }
        Vec::new()
    }
}

impl Default for ReliableReceiver {
    fn default() -> Self {
        Self::new()
    }
}
