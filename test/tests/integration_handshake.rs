//! Handshake scenarios: auth, bootstrap, protocol policing, keepalive.

use std::time::Duration;

use parlor_client::{Client, ClientConfig, PongEvent, RejectEvent};
use parlor_server::{AllowAll, Authenticator, Server, ServerConfig};
use parlor_shared::{
    AuthResult, Credentials, Downstream, DownstreamBody, Upstream, UpstreamBody,
};
use parlor_test::{CalculatorService, TestPair};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn granted_session_gets_bootstrap() {
    init();
    let mut server = Server::new(ServerConfig::default());
    server.register_service("calculator", Box::new(CalculatorService), true);
    let mut pair = TestPair::with_server(server);

    let bootstrap = pair.connect("ada");
    assert_eq!(bootstrap.services.len(), 1);
    assert_eq!(bootstrap.services[0].name, "calculator");
    assert_eq!(pair.client.client_oid(), Some(bootstrap.client_oid));
    assert_eq!(
        pair.server.client_oid(pair.connection),
        Some(bootstrap.client_oid)
    );
}

struct Bouncer;
impl Authenticator for Bouncer {
    fn authenticate(&self, credentials: &Credentials) -> AuthResult {
        AuthResult::Refused {
            reason: format!("{} is barred", credentials.username),
        }
    }
}

#[test]
fn refused_credentials_reject_the_session() {
    init();
    let server =
        Server::with_collaborators(ServerConfig::default(), Box::new(Bouncer), Box::new(AllowAll));
    let mut pair = TestPair::with_server(server);

    pair.client.connect(Credentials::new("mallory"));
    let mut events = pair.pump();
    let reason = events.read::<RejectEvent>().next().expect("no rejection");
    assert_eq!(reason, "mallory is barred");
    assert!(!pair.client.is_connected());
    assert!(pair.server.client_oid(pair.connection).is_none());
}

#[test]
fn stale_auth_response_does_not_spoil_the_handshake() {
    init();
    let mut pair = TestPair::new();
    pair.client.connect(Credentials::new("ada"));

    // A leftover grant from a previous connection arrives first; the
    // genuine response must still be honored.
    let stale = Downstream::response(99, DownstreamBody::AuthResponse(AuthResult::Granted));
    pair.client.receive(&stale.encode()).unwrap();
    pair.pump();
    assert!(pair.client.is_connected());
}

#[test]
fn traffic_before_auth_is_fatal() {
    init();
    let mut pair = TestPair::new();

    // Hand-built subscribe, sent before any handshake.
    let rogue = Upstream::new(0, UpstreamBody::Subscribe { oid: 1 }).encode();
    pair.server.receive_packet(pair.connection, &rogue);
    pair.server.process();

    // The session is gone; a later handshake gets no answer.
    pair.client.connect(Credentials::new("ada"));
    pair.pump();
    assert!(!pair.client.is_connected());
}

#[test]
fn idle_client_pings_and_measures_latency() {
    init();
    let mut server = Server::new(ServerConfig::default());
    let (sender, receiver) = std::sync::mpsc::channel();
    let connection = server.open_connection(sender);

    let mut client = Client::new(ClientConfig {
        ping_interval: Duration::ZERO,
    });
    client.connect(Credentials::new("ada"));
    for (_transport, packet) in client.outgoing_packets() {
        server.receive_packet(connection, &packet);
    }
    server.process();
    while let Ok(packet) = receiver.try_recv() {
        client.receive(&packet).unwrap();
    }
    client.take_events();
    assert!(client.is_connected());

    client.poll();
    for (_transport, packet) in client.outgoing_packets() {
        server.receive_packet(connection, &packet);
    }
    server.process();
    while let Ok(packet) = receiver.try_recv() {
        client.receive(&packet).unwrap();
    }
    let mut events = client.take_events();
    let latency = events.read::<PongEvent>().next().expect("no pong");
    assert!(latency < Duration::from_secs(5));
}

#[test]
fn overstated_process_delay_clamps_to_zero() {
    init();
    let mut client = Client::new(ClientConfig {
        ping_interval: Duration::ZERO,
    });
    let mut pair_server = Server::new(ServerConfig::default());
    let (sender, receiver) = std::sync::mpsc::channel();
    let connection = pair_server.open_connection(sender);
    client.connect(Credentials::new("ada"));
    for (_transport, packet) in client.outgoing_packets() {
        pair_server.receive_packet(connection, &packet);
    }
    pair_server.process();
    while let Ok(packet) = receiver.try_recv() {
        client.receive(&packet).unwrap();
    }
    client.take_events();

    // Intercept the ping and answer it with an impossible delay.
    client.poll();
    let packets = client.outgoing_packets();
    let ping = Upstream::decode(&packets[0].1).unwrap();
    let UpstreamBody::Ping { stamp } = ping.body else {
        panic!("expected a ping");
    };
    let pong = Downstream::response(
        ping.message_id,
        DownstreamBody::Pong {
            ping_stamp: stamp,
            process_delay_millis: u64::from(u32::MAX),
        },
    );
    client.receive(&pong.encode()).unwrap();
    let mut events = client.take_events();
    assert_eq!(events.read::<PongEvent>().next(), Some(Duration::ZERO));
}

#[test]
fn logoff_destroys_the_client_object() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    pair.client.logoff();
    pair.pump();
    assert!(pair.server.client_oid(pair.connection).is_none());
    assert!(!pair.client.is_connected());
}
