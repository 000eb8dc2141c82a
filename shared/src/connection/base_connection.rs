use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::Arc,
    time::Instant,
};

use log::{debug, info, trace, warn};

use replicant_serde::{ByteReader, ByteWriter, IntegerWidth};

use crate::{
    handler::TypeFlag,
    protocol::Protocol,
    roles::Role,
    timer::Timer,
    types::{HostType, MessageIndex, ReplicableKey, SceneId},
    value::Value,
    world::{Replicable, RpcOutcome, SceneError, World},
};

use super::{
    channel::expect_end, AckManager, Channel, ConnectionConfig, ConnectionError, ConnectionEvent,
    ConnectionState, PacketHeader, PacketProtocol, Received, ReliableReceiver, ReliableSender,
    Segment, UpdateOutcome,
};

const PROTOCOL_ID_WIDTH: IntegerWidth = IntegerWidth::W32;

/// Represents a connection to a remote host: handshake, liveness,
/// acknowledgement, and the replication of a [`World`] to or from it.
///
/// The server side replicates every replicable whose remote role is not
/// `None`; the client side applies what it receives and sends the RPC calls
/// queued on its replicables.
pub struct Connection {
    host_type: HostType,
    config: ConnectionConfig,
    protocol: Arc<Protocol>,
    state: ConnectionState,
    require_protocol_match: bool,
    channels: BTreeMap<ReplicableKey, Channel>,
    known_scenes: BTreeSet<SceneId>,
    owned: Option<ReplicableKey>,
    ack_manager: AckManager,
    reliable_sender: ReliableSender,
    reliable_receiver: ReliableReceiver,
    outgoing: Vec<Segment>,
    /// Received packets carried data the remote host awaits an ack for
    should_send_empty_ack: bool,
    heartbeat_timer: Timer,
    timeout_timer: Timer,
    handshake_timer: Timer,
    events: VecDeque<ConnectionEvent>,
}

impl Connection {
    pub fn new(
        host_type: HostType,
        config: ConnectionConfig,
        protocol: Arc<Protocol>,
        now: Instant,
    ) -> Self {
        Self {
            host_type,
            heartbeat_timer: Timer::new(config.heartbeat_interval, now),
            timeout_timer: Timer::new(config.disconnection_timeout_duration, now),
            handshake_timer: Timer::new(config.handshake_resend_interval, now),
            config,
            protocol,
            state: ConnectionState::Init,
            require_protocol_match: true,
            channels: BTreeMap::new(),
            known_scenes: BTreeSet::new(),
            owned: None,
            ack_manager: AckManager::new(),
            reliable_sender: ReliableSender::new(),
            reliable_receiver: ReliableReceiver::new(),
            outgoing: Vec::new(),
            should_send_empty_ack: false,
            events: VecDeque::new(),
        }
    }

    /// Accept handshakes whatever protocol id they carry
    pub fn set_require_protocol_match(&mut self, require: bool) {
        self.require_protocol_match = require;
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The replicable this connection's peer owns, e.g. its controller.
    /// Replicables rooted at it are replicated with `is_owner` set.
    pub fn owned(&self) -> Option<ReplicableKey> {
        self.owned
    }

    pub fn set_owned(&mut self, owned: Option<ReplicableKey>) {
        self.owned = owned;
    }

    pub fn has_channel(&self, key: ReplicableKey) -> bool {
        self.channels.contains_key(&key)
    }

    pub fn channel(&self, key: ReplicableKey) -> Option<&Channel> {
        self.channels.get(&key)
    }

    pub fn take_events(&mut self) -> Vec<ConnectionEvent> {
        self.events.drain(..).collect()
    }

    /// Whether the replicable at `key` belongs to this connection's peer
    pub fn is_owner(&self, world: &World, key: ReplicableKey) -> bool {
        let Some(owned) = self.owned else {
            return false;
        };
        match world.root(key) {
            Ok(root) => root == owned,
            Err(error) => {
                warn!("Connection: cannot resolve owner of {key}: {error}");
                false
            }
        }
    }

    // Lifecycle

    /// Closes the connection, telling the remote host on the next `send`
    pub fn disconnect(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        info!("Connection: disconnecting");
        self.outgoing
            .push(Segment::unreliable(PacketProtocol::RequestDisconnect, Vec::new()));
        self.close(ConnectionState::Disconnected);
        self.events.push_back(ConnectionEvent::Disconnected);
    }

    fn close(&mut self, state: ConnectionState) {
        info!("Connection: {:?} -> {state:?}", self.state);
        self.state = state;
        self.channels.clear();
        self.known_scenes.clear();
        self.reliable_sender.clear();
    }

    fn fail(&mut self, error: ConnectionError) {
        warn!("Connection: failed: {error}");
        self.events
            .push_back(ConnectionEvent::ProtocolViolation { error });
        self.close(ConnectionState::Failed);
    }

    fn become_connected(&mut self) {
        if self.state == ConnectionState::Connected {
            return;
        }
        info!("Connection: {:?} -> Connected", self.state);
        self.state = ConnectionState::Connected;
        self.events.push_back(ConnectionEvent::Connected);
    }

    /// Drops the channel of a replicable and tells the remote host to
    /// destroy its copy
    pub fn release_replicable(&mut self, key: ReplicableKey) {
        if self.channels.remove(&key).is_none() {
            return;
        }
        debug!("Connection: releasing {key}");
        let mut writer = ByteWriter::new();
        match self.protocol.write_key(key, &mut writer) {
            Ok(()) => {
                self.reliable_sender
                    .push(PacketProtocol::DeleteReplicable, writer.to_bytes(), None);
            }
            Err(error) => self.pack_failed(key, error.into()),
        }
    }

    fn pack_failed(&mut self, key: ReplicableKey, error: ConnectionError) {
        warn!("Connection: failed to pack data for {key}: {error}");
        self.events
            .push_back(ConnectionEvent::PackFailed { key, error });
    }

    // Outgoing

    /// Builds this tick's datagrams, each at most `max_packet_size` bytes
    pub fn send(&mut self, world: &mut World, now: Instant) -> Vec<Vec<u8>> {
        if !self.state.is_terminal() && self.timeout_timer.ringing(now) {
            info!("Connection: timed out");
            self.close(ConnectionState::Timeout);
            self.events.push_back(ConnectionEvent::TimedOut);
        }

        if !self.state.is_terminal() {
            if self.host_type == HostType::Client {
                self.write_handshake(now);
            }
            if self.state == ConnectionState::Connected {
                if self.host_type == HostType::Server {
                    self.write_scenes(world);
                    self.write_channels(world);
                }
                self.write_replicables(world, now);
            }
        }

        let mut segments = Vec::new();
        if !self.state.is_terminal() {
            segments.extend(
                self.reliable_sender
                    .collect_due(now, self.config.reliable_resend_interval),
            );
        }
        segments.append(&mut self.outgoing);

        if segments.is_empty()
            && self.state == ConnectionState::Connected
            && self.heartbeat_timer.ringing(now)
        {
            trace!("Connection: sending heartbeat");
            segments.push(Segment::unreliable(PacketProtocol::Heartbeat, Vec::new()));
        }

        let mut datagrams = self.pack_datagrams(segments);
        if datagrams.is_empty() && self.should_send_empty_ack && !self.state.is_terminal() {
            trace!("Connection: sending empty ack");
            let empty = self.start_datagram();
            datagrams.push(self.finish_datagram(empty));
        }
        if !datagrams.is_empty() {
            self.should_send_empty_ack = false;
            self.heartbeat_timer.reset(now);
        }
        datagrams
    }

    fn write_handshake(&mut self, now: Instant) {
        let resend = match self.state {
            ConnectionState::Init => true,
            ConnectionState::AwaitingHandshake | ConnectionState::ReceivedHandshake => {
                self.handshake_timer.ringing(now)
            }
            _ => false,
        };
        if !resend {
            return;
        }
        let mut writer = ByteWriter::new();
        if let Err(error) =
            PROTOCOL_ID_WIDTH.write_unsigned(u64::from(self.config.protocol_id), &mut writer)
        {
            self.fail(error.into());
            return;
        }
        debug!("Connection: requesting handshake");
        self.outgoing.push(Segment::unreliable(
            PacketProtocol::RequestHandshake,
            writer.to_bytes(),
        ));
        if self.state == ConnectionState::Init {
            self.state = ConnectionState::AwaitingHandshake;
        }
        self.handshake_timer.reset(now);
    }

    /// Announces new scenes and retires removed ones
    fn write_scenes(&mut self, world: &World) {
        let current: BTreeSet<SceneId> = world.scene_ids().into_iter().collect();

        let removed: Vec<SceneId> = self.known_scenes.difference(&current).copied().collect();
        for scene in removed {
            self.known_scenes.remove(&scene);
            self.channels.retain(|key, _| key.scene != scene);
            let mut writer = ByteWriter::new();
            match self.protocol.write_scene(scene, &mut writer) {
                Ok(()) => {
                    self.reliable_sender
                        .push(PacketProtocol::DeleteScene, writer.to_bytes(), None);
                }
                Err(error) => warn!("Connection: cannot pack removal of scene {scene}: {error}"),
            }
        }

        for scene in world.scenes() {
            if self.known_scenes.contains(&scene.id()) {
                continue;
            }
            let mut writer = ByteWriter::new();
            let packed = self
                .protocol
                .write_scene(scene.id(), &mut writer)
                .map_err(ConnectionError::from)
                .and_then(|()| {
                    let text = self.protocol.resolve(&TypeFlag::text())?;
                    text.write(&Value::Text(scene.name().to_string()), &mut writer)?;
                    Ok(())
                });
            match packed {
                Ok(()) => {
                    self.known_scenes.insert(scene.id());
                    self.reliable_sender
                        .push(PacketProtocol::CreateScene, writer.to_bytes(), None);
                }
                Err(error) => warn!("Connection: cannot pack scene {}: {error}", scene.id()),
            }
        }
    }

    /// Opens channels for newly replicated replicables and closes those
    /// no longer replicated
    fn write_channels(&mut self, world: &World) {
        let retired: Vec<ReplicableKey> = self
            .channels
            .keys()
            .copied()
            .filter(|key| !world.get(*key).is_some_and(should_replicate))
            .collect();
        for key in retired {
            self.release_replicable(key);
        }

        for scene in world.scenes() {
            if !self.known_scenes.contains(&scene.id()) {
                continue;
            }
            for replicable in scene.iter() {
                let key = replicable.key();
                if self.channels.contains_key(&key) || !should_replicate(replicable) {
                    continue;
                }
                let mut writer = ByteWriter::new();
                let packed = self
                    .protocol
                    .write_key(key, &mut writer)
                    .map_err(ConnectionError::from)
                    .and_then(|()| {
                        let kind = self.protocol.resolve(&TypeFlag::kind())?;
                        kind.write(&Value::Kind(replicable.kind().name().to_string()), &mut writer)?;
                        Ok(())
                    });
                match packed {
                    Ok(()) => {
                        debug!("Connection: replicating {key} as '{}'", replicable.kind().name());
                        self.channels
                            .insert(key, Channel::new(key, replicable.kind().fields().len()));
                        self.reliable_sender.push(
                            PacketProtocol::CreateReplicable,
                            writer.to_bytes(),
                            Some(key),
                        );
                    }
                    Err(error) => self.pack_failed(key, error),
                }
            }
        }
    }

    /// Attribute updates (server only) and queued RPC calls. Replicables
    /// are visited by priority, then by how long they have waited.
    fn write_replicables(&mut self, world: &mut World, now: Instant) {
        let mut order: Vec<(ReplicableKey, f32, Option<Instant>)> = self
            .channels
            .iter()
            .filter_map(|(key, channel)| {
                let priority = world.get(*key)?.kind().priority();
                Some((*key, priority, channel.last_replicated()))
            })
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

        let mut budget = self.config.max_update_bytes;
        for (key, _, _) in order {
            let is_owner = self.is_owner(world, key);
            let Some(replicable) = world.get_mut(key) else {
                continue;
            };

            if self.host_type == HostType::Server {
                self.write_update(key, replicable, is_owner, now, &mut budget);
            }

            // Server-side calls go to the owner's connection only
            if self.host_type == HostType::Client || is_owner {
                self.write_calls(replicable);
            }
        }
    }

    fn write_update(
        &mut self,
        key: ReplicableKey,
        replicable: &mut Replicable,
        is_owner: bool,
        now: Instant,
        budget: &mut Option<usize>,
    ) {
        let max_payload = self
            .config
            .max_packet_size
            .saturating_sub(PacketHeader::SIZE + Segment::overhead(false))
            .min(usize::from(u16::MAX));
        let kind = replicable.kind().clone();
        let Some(channel) = self.channels.get_mut(&key) else {
            return;
        };
        if !channel.is_due(now, kind.update_period()) {
            return;
        }
        if is_owner && !kind.replicates_to_owner() && !channel.is_initial() {
            return;
        }
        if *budget == Some(0) {
            trace!("Connection: update budget spent, deferring {key}");
            return;
        }

        match channel.write_update(&self.protocol, replicable, is_owner, max_payload) {
            Ok(batch) => {
                channel.mark_replicated(now);
                for (field, size) in batch.oversized {
                    warn!(
                        "Connection: field '{field}' of {key} needs {size} bytes, more than a datagram holds"
                    );
                    self.events.push_back(ConnectionEvent::SegmentTooLarge {
                        protocol: PacketProtocol::UpdateAttributes,
                        size: size + Segment::overhead(false),
                    });
                }
                for payload in batch.payloads {
                    if let Some(remaining) = budget.as_mut() {
                        *remaining = remaining.saturating_sub(payload.len());
                    }
                    self.outgoing
                        .push(Segment::unreliable(PacketProtocol::UpdateAttributes, payload));
                }
            }
            Err(error) => self.pack_failed(key, error),
        }
    }

    fn write_calls(&mut self, replicable: &mut Replicable) {
        for call in replicable.take_outgoing_calls() {
            match Channel::write_call(&self.protocol, replicable, &call) {
                Ok((payload, true)) => {
                    self.reliable_sender
                        .push(PacketProtocol::InvokeMethod, payload, None);
                }
                Ok((payload, false)) => self
                    .outgoing
                    .push(Segment::unreliable(PacketProtocol::InvokeMethod, payload)),
                Err(error) => self.pack_failed(replicable.key(), error),
            }
        }
    }

    /// Packs segments in order, starting a new datagram whenever the next
    /// segment would not fit
    fn pack_datagrams(&mut self, segments: Vec<Segment>) -> Vec<Vec<u8>> {
        let max_packet_size = self.config.max_packet_size;
        let mut datagrams = Vec::new();
        let mut current: Option<(PacketHeader, ByteWriter, Vec<MessageIndex>)> = None;

        for segment in segments {
            let size = segment.encoded_len();
            if PacketHeader::SIZE + size > max_packet_size || segment.payload.len() > usize::from(u16::MAX) {
                warn!(
                    "Connection: dropping {:?} segment of {size} bytes, larger than a datagram",
                    segment.protocol
                );
                if let Some(index) = segment.message_index {
                    self.reliable_sender.discard(index);
                }
                self.events.push_back(ConnectionEvent::SegmentTooLarge {
                    protocol: segment.protocol,
                    size,
                });
                continue;
            }

            let full = current
                .as_ref()
                .is_some_and(|(_, writer, _)| writer.bytes_written() + size > max_packet_size);
            if full {
                if let Some(finished) = current.take() {
                    datagrams.push(self.finish_datagram(finished));
                }
            }

            if current.is_none() {
                current = Some(self.start_datagram());
            }
            let Some((_, writer, carried)) = current.as_mut() else {
                continue;
            };
            // length was checked against u16 above
            if segment.write(writer).is_ok() {
                carried.extend(segment.message_index);
            }
        }

        if let Some(finished) = current.take() {
            datagrams.push(self.finish_datagram(finished));
        }
        datagrams
    }

    fn start_datagram(&mut self) -> (PacketHeader, ByteWriter, Vec<MessageIndex>) {
        let header = self.ack_manager.next_outgoing_packet_header();
        let mut writer = ByteWriter::with_capacity(self.config.max_packet_size);
        header.write(&mut writer);
        (header, writer, Vec::new())
    }

    fn finish_datagram(&mut self, (header, writer, carried): (PacketHeader, ByteWriter, Vec<MessageIndex>)) -> Vec<u8> {
        self.ack_manager.track_sent(header.sequence, carried);
        writer.to_bytes()
    }

    // Incoming

    /// Processes one datagram. Never fails: malformed input marks the
    /// connection failed and the rest of the datagram is discarded.
    pub fn receive(&mut self, world: &mut World, bytes: &[u8], now: Instant) {
        if self.state.is_terminal() {
            trace!("Connection: ignoring packet in state {:?}", self.state);
            return;
        }
        if let Err(error) = self.read_packet(world, bytes, now) {
            self.fail(error);
        }
    }

    fn read_packet(&mut self, world: &mut World, bytes: &[u8], now: Instant) -> Result<(), ConnectionError> {
        let mut reader = ByteReader::new(bytes);
        let header = PacketHeader::read(&mut reader)?;
        self.timeout_timer.reset(now);

        let acknowledged = self.ack_manager.process_incoming_header(&header);
        for key in self.reliable_sender.acknowledge(&acknowledged) {
            if let Some(channel) = self.channels.get_mut(&key) {
                channel.confirm_creation();
            }
        }

        let fresh = match self.ack_manager.record_received(header.sequence) {
            Received::Newest => true,
            Received::Stale => false,
            Received::Duplicate => {
                trace!("Connection: duplicate packet {}", header.sequence);
                return Ok(());
            }
        };

        while !reader.is_empty() {
            let segment = Segment::read(&mut reader)?;
            if segment.protocol != PacketProtocol::Heartbeat {
                self.should_send_empty_ack = true;
            }
            if segment.is_reliable() {
                for ready in self.reliable_receiver.receive(segment) {
                    self.read_segment(world, ready, true)?;
                }
            } else {
                self.read_segment(world, segment, fresh)?;
            }
            if self.state.is_terminal() {
                break;
            }
        }
        Ok(())
    }

    fn read_segment(&mut self, world: &mut World, segment: Segment, fresh: bool) -> Result<(), ConnectionError> {
        let protocol = segment.protocol;
        let mut reader = ByteReader::new(&segment.payload);

        match (self.host_type, protocol) {
            (_, PacketProtocol::Heartbeat) => {}
            (_, PacketProtocol::RequestDisconnect) => {
                info!("Connection: remote host disconnected");
                self.close(ConnectionState::Disconnected);
                self.events.push_back(ConnectionEvent::Disconnected);
            }
            (HostType::Server, PacketProtocol::RequestHandshake) => {
                let received = PROTOCOL_ID_WIDTH.read_unsigned(&mut reader)?;
                expect_end(&reader, protocol)?;
                self.accept_handshake(u32::try_from(received).unwrap_or(u32::MAX))?;
            }
            (HostType::Client, PacketProtocol::InvokeHandshake) => {
                if self.state == ConnectionState::AwaitingHandshake {
                    info!("Connection: AwaitingHandshake -> ReceivedHandshake");
                    self.state = ConnectionState::ReceivedHandshake;
                }
            }
            (HostType::Client, PacketProtocol::HandshakeSuccess) => {
                if self.state.is_handshaking() {
                    self.become_connected();
                }
            }
            (HostType::Client, PacketProtocol::HandshakeFailed) => {
                let expected = PROTOCOL_ID_WIDTH.read_unsigned(&mut reader)?;
                expect_end(&reader, protocol)?;
                let expected = u32::try_from(expected).unwrap_or(u32::MAX);
                warn!("Connection: handshake rejected, server expects protocol id {expected}");
                self.events.push_back(ConnectionEvent::HandshakeRejected {
                    expected,
                    received: self.config.protocol_id,
                });
                self.close(ConnectionState::Failed);
            }
            (HostType::Client, _) if protocol_is_replication(protocol) => {
                // The server only replicates after accepting the handshake,
                // so replication implies a lost or reordered success message
                if self.state.is_handshaking() {
                    self.become_connected();
                }
                self.read_replication(world, protocol, &mut reader, fresh)?;
            }
            (HostType::Server, PacketProtocol::InvokeMethod) => {
                if self.state != ConnectionState::Connected {
                    trace!("Connection: ignoring call before handshake");
                    return Ok(());
                }
                self.read_call(world, &mut reader)?;
            }
            (host_type, protocol) => {
                return Err(ConnectionError::ProtocolViolation {
                    reason: format!("{host_type:?} received unexpected {protocol:?} segment"),
                });
            }
        }
        Ok(())
    }

    fn accept_handshake(&mut self, received: u32) -> Result<(), ConnectionError> {
        let expected = self.config.protocol_id;
        if self.require_protocol_match && received != expected {
            warn!("Connection: rejecting handshake with protocol id {received}, expected {expected}");
            let mut writer = ByteWriter::new();
            PROTOCOL_ID_WIDTH.write_unsigned(u64::from(expected), &mut writer)?;
            self.outgoing
                .push(Segment::unreliable(PacketProtocol::HandshakeFailed, writer.to_bytes()));
            self.events
                .push_back(ConnectionEvent::HandshakeRejected { expected, received });
            self.close(ConnectionState::Failed);
            return Ok(());
        }

        if self.state == ConnectionState::Init {
            info!("Connection: Init -> ReceivedHandshake");
            self.state = ConnectionState::ReceivedHandshake;
        }
        // repeated requests mean our answer was lost; answer again
        self.outgoing
            .push(Segment::unreliable(PacketProtocol::InvokeHandshake, Vec::new()));
        self.outgoing
            .push(Segment::unreliable(PacketProtocol::HandshakeSuccess, Vec::new()));
        self.become_connected();
        Ok(())
    }

    fn read_replication(
        &mut self,
        world: &mut World,
        protocol: PacketProtocol,
        reader: &mut ByteReader,
        fresh: bool,
    ) -> Result<(), ConnectionError> {
        match protocol {
            PacketProtocol::CreateScene => {
                let scene = self.protocol.read_scene(reader)?;
                let name = self.protocol.resolve(&TypeFlag::text())?.read(reader)?;
                expect_end(reader, protocol)?;
                world.insert_scene(scene, name.as_str().unwrap_or_default())?;
            }
            PacketProtocol::DeleteScene => {
                let scene = self.protocol.read_scene(reader)?;
                expect_end(reader, protocol)?;
                let keys: Vec<ReplicableKey> =
                    self.channels.keys().copied().filter(|key| key.scene == scene).collect();
                for key in keys {
                    self.channels.remove(&key);
                    self.events
                        .push_back(ConnectionEvent::ReplicableDestroyed { key });
                }
                world.remove_scene(scene);
            }
            PacketProtocol::CreateReplicable => {
                let key = self.protocol.read_key(reader)?;
                let name = self.protocol.resolve(&TypeFlag::kind())?.read(reader)?;
                expect_end(reader, protocol)?;
                let name = name.as_str().unwrap_or_default();
                let kind = self
                    .protocol
                    .kind(name)
                    .cloned()
                    .ok_or_else(|| ConnectionError::UnknownKind {
                        name: name.to_string(),
                    })?;
                let scene = world
                    .scene_mut(key.scene)
                    .ok_or(SceneError::UnknownScene { scene: key.scene })?;
                scene.insert_remote(key.id, &kind)?;
                self.channels
                    .insert(key, Channel::new(key, kind.fields().len()));
                self.events
                    .push_back(ConnectionEvent::ReplicableCreated { key });
            }
            PacketProtocol::DeleteReplicable => {
                let key = self.protocol.read_key(reader)?;
                expect_end(reader, protocol)?;
                self.channels.remove(&key);
                if world.destroy(key).is_some() {
                    self.events
                        .push_back(ConnectionEvent::ReplicableDestroyed { key });
                }
            }
            PacketProtocol::UpdateAttributes => {
                let key = self.protocol.read_key(reader)?;
                let (Some(channel), Some(replicable)) = (self.channels.get(&key), world.get_mut(key)) else {
                    // creation not received yet; the update is resent as initial
                    trace!("Connection: update for unknown replicable {key}");
                    return Ok(());
                };
                match channel.read_update(replicable, reader, fresh)? {
                    UpdateOutcome::Applied => {}
                    UpdateOutcome::Stale => trace!("Connection: stale update for {key} ignored"),
                    UpdateOutcome::Refused => {
                        warn!("Connection: refused update for {key}: sender is not its authority");
                        self.events
                            .push_back(ConnectionEvent::PermissionDenied { key });
                    }
                }
            }
            PacketProtocol::InvokeMethod => self.read_call(world, reader)?,
            _ => {}
        }
        Ok(())
    }

    fn read_call(&mut self, world: &mut World, reader: &mut ByteReader) -> Result<(), ConnectionError> {
        let key = self.protocol.read_key(reader)?;
        if !self.channels.contains_key(&key) {
            trace!("Connection: call for unknown replicable {key}");
            return Ok(());
        }
        let is_owner = self.host_type == HostType::Server && self.is_owner(world, key);
        let Some(replicable) = world.get_mut(key) else {
            return Ok(());
        };
        let call = Channel::read_call(replicable, reader)?;

        let sender_role = match self.host_type {
            HostType::Server => replicable.ownership_context(is_owner).roles().remote,
            HostType::Client => replicable.roles().remote,
        };
        if replicable.invoke_remote(call.index, &call.arguments, sender_role, self.host_type)?
            == RpcOutcome::Refused
        {
            self.events
                .push_back(ConnectionEvent::PermissionDenied { key });
        }
        Ok(())
    }
}

/// Replicated while the remote host has a role in it
fn should_replicate(replicable: &Replicable) -> bool {
    replicable.roles().remote != Role::None
}

fn protocol_is_replication(protocol: PacketProtocol) -> bool {
    matches!(
        protocol,
        PacketProtocol::CreateScene
            | PacketProtocol::DeleteScene
            | PacketProtocol::CreateReplicable
            | PacketProtocol::DeleteReplicable
            | PacketProtocol::UpdateAttributes
            | PacketProtocol::InvokeMethod
    )
}
