/// In-memory datagram routing for E2E testing
/// Routes packets between a server and its clients without network I/O,
/// optionally dropping a share of them
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;

use log::trace;

pub struct LocalTransport {
    to_server: VecDeque<(SocketAddr, Vec<u8>)>,
    to_clients: HashMap<SocketAddr, VecDeque<Vec<u8>>>,
    drop_every: Option<usize>,
    routed: usize,
    dropped: usize,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            to_server: VecDeque::new(),
            to_clients: HashMap::new(),
            drop_every: None,
            routed: 0,
            dropped: 0,
        }
    }

    /// Drops every `n`th datagram, in either direction
    pub fn lossy(n: usize) -> Self {
        let mut transport = Self::new();
        transport.drop_every = Some(n.max(1));
        transport
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn lose(&mut self) -> bool {
        self.routed += 1;
        let lost = self
            .drop_every
            .is_some_and(|n| self.routed % n == 0);
        if lost {
            self.dropped += 1;
            trace!("LocalTransport: dropped datagram #{}", self.routed);
        }
        lost
    }

    pub fn send_to_server(&mut self, from: SocketAddr, datagram: Vec<u8>) {
        if !self.lose() {
            self.to_server.push_back((from, datagram));
        }
    }

    pub fn send_to_client(&mut self, to: SocketAddr, datagram: Vec<u8>) {
        if !self.lose() {
            self.to_clients.entry(to).or_default().push_back(datagram);
        }
    }

    pub fn drain_server_inbox(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.to_server.drain(..).collect()
    }

    pub fn drain_client_inbox(&mut self, address: &SocketAddr) -> Vec<Vec<u8>> {
        self.to_clients
            .get_mut(address)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}
