use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::{Duration, Instant},
};

use replicant_client::{Client, ClientConfig};
use replicant_server::{Server, ServerConfig};

use crate::{protocol, LocalTransport};

/// Simulated time between two ticks
pub const TICK: Duration = Duration::from_millis(50);

/// Installs env_logger once; later calls are no-ops
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct TestClient {
    pub address: SocketAddr,
    pub client: Client,
}

/// A server, its clients, and the transport between them, driven tick by
/// tick on a simulated clock
pub struct TestSession {
    pub server: Server,
    pub clients: Vec<TestClient>,
    pub transport: LocalTransport,
    pub now: Instant,
}

impl TestSession {
    pub fn new(client_count: usize) -> Self {
        Self::with_transport(LocalTransport::new(), client_count)
    }

    pub fn with_transport(transport: LocalTransport, client_count: usize) -> Self {
        init_logger();
        let protocol = protocol();
        let now = Instant::now();
        let clients = (0..client_count)
            .map(|index| TestClient {
                address: client_address(index),
                client: Client::new(ClientConfig::default(), protocol.clone(), now),
            })
            .collect();
        Self {
            server: Server::new(ServerConfig::default(), protocol),
            clients,
            transport,
            now,
        }
    }

    pub fn client(&self, index: usize) -> &Client {
        &self.clients[index].client
    }

    pub fn client_mut(&mut self, index: usize) -> &mut Client {
        &mut self.clients[index].client
    }

    pub fn address(&self, index: usize) -> SocketAddr {
        self.clients[index].address
    }

    pub fn tick(&mut self) {
        exchange_packets(
            &mut self.server,
            &mut self.clients,
            &mut self.transport,
            self.now,
        );
        self.now += TICK;
    }

    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Ticks until every client is connected, up to `max_ticks`
    pub fn connect(&mut self, max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            if self.clients.iter().all(|test| test.client.is_connected()) {
                return true;
            }
            self.tick();
        }
        self.clients.iter().all(|test| test.client.is_connected())
    }
}

pub fn client_address(index: usize) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000 + index as u16)
}

/// One round trip: clients send, the server receives and answers, the
/// clients receive
pub fn exchange_packets(
    server: &mut Server,
    clients: &mut [TestClient],
    transport: &mut LocalTransport,
    now: Instant,
) {
    for test in clients.iter_mut() {
        for datagram in test.client.send(now) {
            transport.send_to_server(test.address, datagram);
        }
    }
    for (address, datagram) in transport.drain_server_inbox() {
        server.receive(address, &datagram, now);
    }
    for (address, datagram) in server.send(now) {
        transport.send_to_client(address, datagram);
    }
    for test in clients.iter_mut() {
        for datagram in transport.drain_client_inbox(&test.address) {
            test.client.receive(&datagram, now);
        }
    }
}
