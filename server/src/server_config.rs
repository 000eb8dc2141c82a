use std::default::Default;

use replicant_shared::ConnectionConfig;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Used to configure the connections with Clients
    pub connection: ConnectionConfig,
    /// Determines whether a Client's handshake must carry the same protocol
    /// id as `connection.protocol_id` in order to connect
    pub require_handshake_protocol_match: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            require_handshake_protocol_match: true,
        }
    }
}
