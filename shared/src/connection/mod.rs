mod ack_manager;
mod base_connection;
mod channel;
mod connection_config;
mod connection_state;
mod error;
mod event;
mod packet;
mod packet_protocol;
mod reliable_receiver;
mod reliable_sender;

pub use ack_manager::{AckManager, Received};
pub use base_connection::Connection;
pub use channel::{Channel, UpdateBatch, UpdateOutcome};
pub use connection_config::ConnectionConfig;
pub use connection_state::ConnectionState;
pub use error::{ConnectionError, PacketError};
pub use event::ConnectionEvent;
pub use packet::{PacketHeader, Segment};
pub use packet_protocol::PacketProtocol;
pub use reliable_receiver::ReliableReceiver;
pub use reliable_sender::ReliableSender;
