use std::sync::mpsc::{channel, Receiver};

use parlor_client::{Client, ClientConfig, ClientEvents, ConnectEvent};
use parlor_server::{ConnectionId, Server, ServerConfig};
use parlor_shared::{BootstrapData, Credentials};

/// One server and one client joined by an in-memory packet pipe.
/// Everything is pumped by hand, so scenarios control exactly when
/// packets move and in what interleaving.
pub struct TestPair {
    pub server: Server,
    pub client: Client,
    pub connection: ConnectionId,
    server_to_client: Receiver<Box<[u8]>>,
}

impl Default for TestPair {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPair {
    pub fn new() -> Self {
        Self::with_server(Server::new(ServerConfig::default()))
    }

    pub fn with_server(mut server: Server) -> Self {
        let (sender, receiver) = channel();
        let connection = server.open_connection(sender);
        Self {
            server,
            client: Client::new(ClientConfig::default()),
            connection,
            server_to_client: receiver,
        }
    }

    /// Moves packets both ways until neither side has anything queued.
    /// Returns everything the client observed along the way.
    pub fn pump(&mut self) -> ClientEvents {
        loop {
            let mut moved = false;
            for (_transport, packet) in self.client.outgoing_packets() {
                self.server.receive_packet(self.connection, &packet);
                moved = true;
            }
            self.server.process();
            while let Ok(packet) = self.server_to_client.try_recv() {
                self.client
                    .receive(&packet)
                    .expect("client rejected a server packet");
                moved = true;
            }
            if !moved {
                break;
            }
        }
        self.client.take_events()
    }

    /// Delivers the client's queued packets to the server without
    /// carrying anything back; lets scenarios hold the return leg.
    pub fn pump_upstream(&mut self) {
        for (_transport, packet) in self.client.outgoing_packets() {
            self.server.receive_packet(self.connection, &packet);
        }
        self.server.process();
    }

    /// Carries queued server packets down to the client.
    pub fn pump_downstream(&mut self) -> ClientEvents {
        self.server.process();
        while let Ok(packet) = self.server_to_client.try_recv() {
            self.client
                .receive(&packet)
                .expect("client rejected a server packet");
        }
        self.client.take_events()
    }

    /// Runs the full handshake and returns the bootstrap the client
    /// received.
    pub fn connect(&mut self, username: &str) -> BootstrapData {
        self.client.connect(Credentials::new(username));
        let mut events = self.pump();
        let bootstrap = events
            .read::<ConnectEvent>()
            .next()
            .expect("handshake did not complete");
        assert!(self.client.is_connected());
        bootstrap
    }
}
