use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a Server or Client
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// The duration to wait for communication from a remote host before
    /// initiating a disconnect
    pub disconnection_timeout_duration: Duration,
    /// The duration to wait before sending a heartbeat message to a remote
    /// host, if the host has not already sent another message within that time
    pub heartbeat_interval: Duration,
    /// How often a client repeats its handshake request until answered
    pub handshake_resend_interval: Duration,
    /// How long a reliable segment waits for acknowledgement before it is
    /// sent again
    pub reliable_resend_interval: Duration,
    /// Upper bound on the size of a datagram, header included
    pub max_packet_size: usize,
    /// Both ends must agree on this during the handshake
    pub protocol_id: u32,
    /// Bytes of attribute updates written per send. Once spent, the
    /// remaining replicables wait for a later send, lowest priority first.
    /// `None` leaves updates bounded by datagram size only.
    pub max_update_bytes: Option<usize>,
}

impl ConnectionConfig {
    /// Creates a new ConnectionConfig, used to initialize a Connection
    pub fn new(
        disconnection_timeout_duration: Duration,
        heartbeat_interval: Duration,
        protocol_id: u32,
    ) -> Self {
        Self {
            disconnection_timeout_duration,
            heartbeat_interval,
            protocol_id,
            ..Self::default()
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            disconnection_timeout_duration: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(4),
            handshake_resend_interval: Duration::from_millis(250),
            reliable_resend_interval: Duration::from_millis(200),
            max_packet_size: 508,
            protocol_id: 0,
            max_update_bytes: None,
        }
    }
}
