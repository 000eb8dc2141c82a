use std::{sync::Arc, time::Instant};

use log::info;

use replicant_shared::{
    Connection, ConnectionEvent, ConnectionState, HostType, Protocol, ReplicableKey, RpcOutcome,
    Value, World,
};

use crate::{ClientConfig, ClientError};

/// Client can send/receive datagrams from/to a server, and holds the
/// replicables the server shares with it
pub struct Client {
    protocol: Arc<Protocol>,
    world: World,
    connection: Connection,
}

impl Client {
    /// Create a new Client. The handshake starts with the first `send`.
    pub fn new(client_config: ClientConfig, protocol: Arc<Protocol>, now: Instant) -> Self {
        info!(
            "Client: created with protocol id {}",
            client_config.connection.protocol_id
        );
        let world = World::new(protocol.max_id());
        let connection = Connection::new(
            HostType::Client,
            client_config.connection,
            protocol.clone(),
            now,
        );
        Self {
            protocol,
            world,
            connection,
        }
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Local changes are not sent back; the server is the authority
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Calls an RPC as this client. Server-targeted calls are sent with
    /// the next `send`, provided the local role permits them.
    pub fn call(
        &mut self,
        key: ReplicableKey,
        rpc: &str,
        arguments: Vec<Value>,
    ) -> Result<RpcOutcome, ClientError> {
        if !self.connection.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let replicable = self
            .world
            .get_mut(key)
            .ok_or(ClientError::UnknownReplicable { key })?;
        Ok(replicable.call(rpc, arguments, HostType::Client)?)
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// Processes a datagram received from the server
    pub fn receive(&mut self, bytes: &[u8], now: Instant) {
        self.connection.receive(&mut self.world, bytes, now);
    }

    /// Builds this tick's datagrams for the server
    pub fn send(&mut self, now: Instant) -> Vec<Vec<u8>> {
        self.connection.send(&mut self.world, now)
    }

    pub fn take_events(&mut self) -> Vec<ConnectionEvent> {
        self.connection.take_events()
    }
}
