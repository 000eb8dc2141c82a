/// Lifecycle of a connection. `Disconnected`, `Timeout` and `Failed` are
/// terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Init,
    AwaitingHandshake,
    ReceivedHandshake,
    Connected,
    Disconnected,
    Timeout,
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Timeout | ConnectionState::Failed
        )
    }

    pub fn is_handshaking(self) -> bool {
        matches!(
            self,
            ConnectionState::Init
                | ConnectionState::AwaitingHandshake
                | ConnectionState::ReceivedHandshake
        )
    }
}
