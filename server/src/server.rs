use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Instant};

use log::{debug, info};

use replicant_shared::{
    Connection, ConnectionEvent, HostType, Protocol, ReplicableKey, RpcOutcome,
    SceneId, Value, World,
};

use crate::{ServerConfig, ServerError};

/// Something observed on the connection to one client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEvent {
    pub address: SocketAddr,
    pub event: ConnectionEvent,
}

/// A server that owns the canonical world and replicates it to every
/// client. Datagrams are handed in and out by the caller, who owns the
/// socket and the tick.
pub struct Server {
    server_config: ServerConfig,
    protocol: Arc<Protocol>,
    world: World,
    connections: HashMap<SocketAddr, Connection>,
}

impl Server {
    /// Create a new Server
    pub fn new(server_config: ServerConfig, protocol: Arc<Protocol>) -> Self {
        let world = World::new(protocol.max_id());
        Self {
            server_config,
            protocol,
            world,
            connections: HashMap::new(),
        }
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // Scenes & Replicables

    pub fn create_scene(&mut self, name: &str) -> Result<SceneId, ServerError> {
        Ok(self.world.create_scene(name)?)
    }

    /// Spawns an instance of the kind registered as `kind_name`. It is
    /// replicated to clients once its remote role is not `None`.
    pub fn spawn(&mut self, scene: SceneId, kind_name: &str) -> Result<ReplicableKey, ServerError> {
        let kind = self
            .protocol
            .kind(kind_name)
            .ok_or_else(|| ServerError::UnknownKind {
                name: kind_name.to_string(),
            })?;
        Ok(self.world.spawn(scene, kind)?)
    }

    /// Destroys a replicable and tells every client holding a copy
    pub fn destroy_replicable(&mut self, key: ReplicableKey) -> Result<(), ServerError> {
        if self.world.destroy(key).is_none() {
            return Err(ServerError::UnknownReplicable { key });
        }
        for connection in self.connections.values_mut() {
            connection.release_replicable(key);
        }
        Ok(())
    }

    /// Calls an RPC as the server. Client-targeted calls are delivered to
    /// the connection owning the replicable.
    pub fn call(
        &mut self,
        key: ReplicableKey,
        rpc: &str,
        arguments: Vec<Value>,
    ) -> Result<RpcOutcome, ServerError> {
        let replicable = self
            .world
            .get_mut(key)
            .ok_or(ServerError::UnknownReplicable { key })?;
        Ok(replicable.call(rpc, arguments, HostType::Server)?)
    }

    // Connections

    /// Makes the client at `address` the owner of `key` and of every
    /// replicable whose owner chain leads to it
    pub fn set_owner(
        &mut self,
        address: &SocketAddr,
        key: Option<ReplicableKey>,
    ) -> Result<(), ServerError> {
        if let Some(key) = key {
            if !self.world.contains(key) {
                return Err(ServerError::UnknownReplicable { key });
            }
        }
        let connection = self
            .connections
            .get_mut(address)
            .ok_or(ServerError::UnknownConnection { address: *address })?;
        connection.set_owned(key);
        Ok(())
    }

    pub fn connection(&self, address: &SocketAddr) -> Option<&Connection> {
        self.connections.get(address)
    }

    pub fn addresses(&self) -> Vec<SocketAddr> {
        self.connections.keys().copied().collect()
    }

    pub fn connected_addresses(&self) -> Vec<SocketAddr> {
        self.connections
            .iter()
            .filter(|(_, connection)| connection.is_connected())
            .map(|(address, _)| *address)
            .collect()
    }

    pub fn disconnect(&mut self, address: &SocketAddr) -> Result<(), ServerError> {
        let connection = self
            .connections
            .get_mut(address)
            .ok_or(ServerError::UnknownConnection { address: *address })?;
        connection.disconnect();
        Ok(())
    }

    /// Forgets connections in a terminal state, returning their addresses.
    /// Call after the final `send` so disconnect notices go out.
    pub fn remove_closed_connections(&mut self) -> Vec<SocketAddr> {
        let closed: Vec<SocketAddr> = self
            .connections
            .iter()
            .filter(|(_, connection)| connection.state().is_terminal())
            .map(|(address, _)| *address)
            .collect();
        for address in &closed {
            self.connections.remove(address);
            info!("Server: removed connection with {address}");
        }
        closed
    }

    // Packets

    /// Processes a datagram from `address`, opening a connection for an
    /// unknown address
    pub fn receive(&mut self, address: SocketAddr, bytes: &[u8], now: Instant) {
        let connection = self.connections.entry(address).or_insert_with(|| {
            info!("Server: new connection from {address}");
            let mut connection = Connection::new(
                HostType::Server,
                self.server_config.connection.clone(),
                self.protocol.clone(),
                now,
            );
            connection.set_require_protocol_match(
                self.server_config.require_handshake_protocol_match,
            );
            connection
        });
        connection.receive(&mut self.world, bytes, now);
    }

    /// Builds this tick's datagrams for every connection
    pub fn send(&mut self, now: Instant) -> Vec<(SocketAddr, Vec<u8>)> {
        let mut outgoing = Vec::new();
        for (address, connection) in self.connections.iter_mut() {
            for datagram in connection.send(&mut self.world, now) {
                outgoing.push((*address, datagram));
            }
        }

        // calls left over had no owning connection to deliver them
        for key in self.world.keys() {
            let Some(replicable) = self.world.get_mut(key) else {
                continue;
            };
            let dropped = replicable.take_outgoing_calls();
            if !dropped.is_empty() {
                debug!("Server: dropped {} undeliverable calls on {key}", dropped.len());
            }
        }
        outgoing
    }

    pub fn take_events(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        for (address, connection) in self.connections.iter_mut() {
            for event in connection.take_events() {
                events.push(ServerEvent {
                    address: *address,
                    event,
                });
            }
        }
        events
    }
}
