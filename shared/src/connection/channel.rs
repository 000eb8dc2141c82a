use std::time::{Duration, Instant};

use log::trace;

use replicant_serde::{Bitfield, ByteReader, ByteWriter};

use crate::{
    handler::Description,
    protocol::Protocol,
    roles::Role,
    types::ReplicableKey,
    value::Value,
    world::{Replicable, ReplicationContext, RpcCall},
};

use super::{ConnectionError, PacketError, PacketProtocol};

/// What became of a received attribute update
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Decoded but from an older packet than one already applied
    Stale,
    /// The sender is not this replicable's authority
    Refused,
}

/// The attribute update segments one replicable produced in a send
#[derive(Debug, Default)]
pub struct UpdateBatch {
    /// Payloads of `UpdateAttributes` segments, each within the size limit
    pub payloads: Vec<Vec<u8>>,
    /// Fields whose value alone would not fit a segment, with the payload
    /// size they would have needed
    pub oversized: Vec<(&'static str, usize)>,
}

/// Fields gathered into one update segment
struct Chunk {
    mask: Bitfield,
    present: Vec<bool>,
    values: ByteWriter,
    written: Vec<(usize, Description)>,
}

impl Chunk {
    fn new(offered: usize) -> Self {
        Self {
            mask: Bitfield::new(offered),
            present: Vec::new(),
            values: ByteWriter::new(),
            written: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

/// Replication state of one replicable on one connection.
///
/// Remembers the description of every field value last sent, so only
/// changed fields go out. Updates stay initial, carrying every offered
/// field, until the remote host acknowledges the replicable's creation
/// and at least one initial update has been written.
pub struct Channel {
    key: ReplicableKey,
    sent_descriptions: Vec<Option<Description>>,
    /// Values reported as too large to send, not offered again until they change
    oversized_descriptions: Vec<Option<Description>>,
    creation_confirmed: bool,
    initial_written: bool,
    last_replicated: Option<Instant>,
}

impl Channel {
    pub fn new(key: ReplicableKey, field_count: usize) -> Self {
        Self {
            key,
            sent_descriptions: vec![None; field_count],
            oversized_descriptions: vec![None; field_count],
            creation_confirmed: false,
            initial_written: false,
            last_replicated: None,
        }
    }

    pub fn key(&self) -> ReplicableKey {
        self.key
    }

    pub fn is_initial(&self) -> bool {
        !(self.creation_confirmed && self.initial_written)
    }

    pub fn confirm_creation(&mut self) {
        self.creation_confirmed = true;
    }

    pub fn sent_description(&self, index: usize) -> Option<Description> {
        self.sent_descriptions.get(index).copied().flatten()
    }

    pub fn last_replicated(&self) -> Option<Instant> {
        self.last_replicated
    }

    /// Whether `period` has passed since the last replication pass
    pub fn is_due(&self, now: Instant, period: Duration) -> bool {
        match self.last_replicated {
            Some(last) => now.saturating_duration_since(last) >= period,
            None => true,
        }
    }

    pub fn mark_replicated(&mut self, now: Instant) {
        self.last_replicated = Some(now);
    }

    /// Packs the fields that changed since they were last sent, evaluated
    /// under the connection's ownership context, into payloads of at most
    /// `max_payload` bytes. A field that cannot fit even alone is left
    /// unsent and listed in [`UpdateBatch::oversized`].
    ///
    /// Descriptions are recorded as sent straight away; an update lost in
    /// transit is not repeated until the field changes again.
    pub fn write_update(
        &mut self,
        protocol: &Protocol,
        replicable: &mut Replicable,
        is_owner: bool,
        max_payload: usize,
    ) -> Result<UpdateBatch, ConnectionError> {
        let is_initial = self.is_initial();
        let context = ReplicationContext {
            is_owner,
            is_initial,
        };
        let kind = replicable.kind().clone();
        let scoped = replicable.ownership_context(is_owner);
        let sequence = scoped.replication_sequence(context);

        let mut key_bytes = ByteWriter::new();
        protocol.write_key(self.key, &mut key_bytes)?;
        // key, context flags, changed mask, and a presence bit per offered field at most
        let overhead = key_bytes.bytes_written()
            + Bitfield::footprint(2)
            + 2 * Bitfield::footprint(sequence.len());

        let mut batch = UpdateBatch::default();
        let mut chunks = Vec::new();
        let mut chunk = Chunk::new(sequence.len());
        for (position, index) in sequence.iter().copied().enumerate() {
            let (Some(descriptor), Some(value)) = (kind.field(index), scoped.get_index(index)) else {
                continue;
            };
            let description = descriptor.describe(value);
            if !is_initial && self.sent_description(index) == Some(description) {
                continue;
            }
            if self.oversized_descriptions[index] == Some(description) {
                continue;
            }

            let mut encoded = ByteWriter::new();
            if !value.is_none() {
                descriptor.handler().write(value, &mut encoded)?;
            }
            let size = encoded.bytes_written();
            if overhead + size > max_payload {
                batch.oversized.push((descriptor.name(), overhead + size));
                self.oversized_descriptions[index] = Some(description);
                continue;
            }
            if overhead + chunk.values.bytes_written() + size > max_payload {
                chunks.push(std::mem::replace(&mut chunk, Chunk::new(sequence.len())));
            }
            chunk.mask.set(position, true);
            chunk.present.push(!value.is_none());
            chunk.values.write_bytes(encoded.as_slice());
            chunk.written.push((index, description));
        }
        drop(scoped);
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        for chunk in chunks {
            let mut writer = ByteWriter::with_capacity(overhead + chunk.values.bytes_written());
            writer.write_bytes(key_bytes.as_slice());
            Bitfield::from_bools(&[is_owner, is_initial]).pack(&mut writer);
            chunk.mask.pack(&mut writer);
            Bitfield::from_bools(&chunk.present).pack(&mut writer);
            writer.write_bytes(chunk.values.as_slice());

            for (index, description) in chunk.written {
                self.sent_descriptions[index] = Some(description);
                self.oversized_descriptions[index] = None;
            }
            trace!("Channel: {} wrote update of {} bytes", self.key, writer.bytes_written());
            batch.payloads.push(writer.to_bytes());
        }
        if is_initial && !batch.payloads.is_empty() {
            self.initial_written = true;
        }
        Ok(batch)
    }

    /// Applies an update whose key has already been read from `reader`.
    ///
    /// The offered sequence is replayed locally for the transmitted
    /// context. Fields flagged absent are set to `None`. Notify hooks run
    /// once every value has been assigned.
    pub fn read_update(
        &self,
        replicable: &mut Replicable,
        reader: &mut ByteReader,
        apply: bool,
    ) -> Result<UpdateOutcome, ConnectionError> {
        let flags = Bitfield::unpack(reader, 2)?;
        let context = ReplicationContext {
            is_owner: flags.get(0).unwrap_or(false),
            is_initial: flags.get(1).unwrap_or(false),
        };
        let sequence = replicable.replication_sequence(context);
        let mask = Bitfield::unpack(reader, sequence.len())?;
        let present = Bitfield::unpack(reader, mask.count_ones())?;

        let kind = replicable.kind().clone();
        let mut updates = Vec::new();
        let changed = sequence
            .into_iter()
            .enumerate()
            .filter(|(position, _)| mask.get(*position) == Some(true));
        for (order, (_, index)) in changed.enumerate() {
            let Some(descriptor) = kind.field(index) else {
                continue;
            };
            let value = if present.get(order) == Some(true) {
                descriptor.handler().read(reader)?
            } else {
                Value::None
            };
            updates.push((index, value));
        }
        expect_end(reader, PacketProtocol::UpdateAttributes)?;

        if replicable.roles().remote != Role::Authority {
            return Ok(UpdateOutcome::Refused);
        }
        if !apply {
            return Ok(UpdateOutcome::Stale);
        }

        let mut notify = Vec::new();
        for (index, value) in updates {
            replicable.set_index(index, value)?;
            if let Some(descriptor) = kind.field(index) {
                if descriptor.field().notify_on_replicated() {
                    notify.push(descriptor.name());
                }
            }
        }
        for name in notify {
            replicable.on_replicated(name);
        }
        Ok(UpdateOutcome::Applied)
    }

    /// Packs a queued call: key, RPC index, then each argument
    pub fn write_call(
        protocol: &Protocol,
        replicable: &Replicable,
        call: &RpcCall,
    ) -> Result<(Vec<u8>, bool), ConnectionError> {
        let key = replicable.key();
        let descriptor = replicable
            .kind()
            .rpc(call.index)
            .ok_or(ConnectionError::UnknownRpc {
                key,
                index: call.index,
            })?;

        let mut writer = ByteWriter::new();
        protocol.write_key(key, &mut writer)?;
        writer.write_byte(call.index);
        for (handler, argument) in descriptor.handlers().iter().zip(&call.arguments) {
            handler.write(argument, &mut writer)?;
        }
        Ok((writer.to_bytes(), descriptor.rpc().is_reliable()))
    }

    /// Reads a call whose key has already been read from `reader`
    pub fn read_call(replicable: &Replicable, reader: &mut ByteReader) -> Result<RpcCall, ConnectionError> {
        let index = reader.read_byte()?;
        let descriptor = replicable
            .kind()
            .rpc(index)
            .ok_or(ConnectionError::UnknownRpc {
                key: replicable.key(),
                index,
            })?;
        let arguments = descriptor
            .handlers()
            .iter()
            .map(|handler| handler.read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        expect_end(reader, PacketProtocol::InvokeMethod)?;
        Ok(RpcCall { index, arguments })
    }
}

pub(crate) fn expect_end(reader: &ByteReader, protocol: PacketProtocol) -> Result<(), PacketError> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(PacketError::TrailingData {
            protocol,
            remaining: reader.remaining(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_after_period_since_last_pass() {
        let mut channel = Channel::new(ReplicableKey::new(0, 1), 2);
        let start = Instant::now();
        let period = Duration::from_millis(100);
        assert!(channel.is_due(start, period));

        channel.mark_replicated(start);
        assert!(!channel.is_due(start + Duration::from_millis(99), period));
        assert!(channel.is_due(start + period, period));
    }

    #[test]
    fn stays_initial_until_confirmed_and_written() {
        let mut channel = Channel::new(ReplicableKey::new(0, 1), 2);
        channel.confirm_creation();
        assert!(channel.is_initial());
    }
}
