use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use log::{info, warn};

use parlor_shared::ServiceId;

use crate::access::{AccessController, AllowAll};
use crate::invocation::{InvocationProvider, ServiceRegistry};
use crate::session::{AcceptAll, Authenticator, Session};
use crate::store::ObjectStore;
use crate::work_queue::{EventContext, ServerHandle, WorkItem};

/// Contains Config properties which will be used by the Server.
#[derive(Clone)]
pub struct ServerConfig {
    /// A connection silent for this long is presumed dead and torn
    /// down on the next `process()` sweep. Clients ping after 60
    /// seconds of silence, so the default leaves two pings of slack.
    pub connection_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(180),
        }
    }
}

/// Identifies one open connection to this server.
pub type ConnectionId = u64;

/// The server facade: owns the processing sequence and every piece of
/// object state behind it. All methods take `&mut self`, which puts
/// their callers on the sequence; other threads go through
/// [`ServerHandle`].
///
/// Byte transport is the caller's concern: packets come in through
/// `receive_packet` and go out through the per-connection outbox
/// channel given to `open_connection`.
pub struct Server {
    config: ServerConfig,
    ctx: EventContext,
    receiver: Receiver<WorkItem>,
    sessions: HashMap<ConnectionId, Session>,
    next_connection: ConnectionId,
    authenticator: Box<dyn Authenticator>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_collaborators(config, Box::new(AcceptAll), Box::new(AllowAll))
    }

    pub fn with_collaborators(
        config: ServerConfig,
        authenticator: Box<dyn Authenticator>,
        access: Box<dyn AccessController>,
    ) -> Self {
        let (sender, receiver) = channel();
        let handle = ServerHandle::new(sender);
        let ctx = EventContext::new(ObjectStore::new(access), ServiceRegistry::new(), handle);
        Self {
            config,
            ctx,
            receiver,
            sessions: HashMap::new(),
            next_connection: 0,
            authenticator,
        }
    }

    /// A cloneable, `Send` handle for posting work from other threads.
    pub fn handle(&self) -> ServerHandle {
        self.ctx.handle()
    }

    /// Direct access to server state; the caller holds `&mut Server`
    /// and is therefore on the processing sequence.
    pub fn context(&mut self) -> &mut EventContext {
        &mut self.ctx
    }

    /// Registers an invocation service. Call before opening
    /// connections so every bootstrap directory agrees.
    pub fn register_service(
        &mut self,
        name: &str,
        provider: Box<dyn InvocationProvider>,
        bootstrap: bool,
    ) -> ServiceId {
        self.ctx.services_mut().register(name, provider, bootstrap)
    }

    /// Opens a connection whose outbound packets land on `outbox`.
    pub fn open_connection(&mut self, outbox: Sender<Box<[u8]>>) -> ConnectionId {
        let connection = self.next_connection;
        self.next_connection += 1;
        let key = self.ctx.allocate_subscriber_key();
        self.sessions.insert(connection, Session::new(key, outbox));
        info!("Connection {} open", connection);
        connection
    }

    /// Feeds one inbound packet to its session. Protocol violations
    /// tear the connection down; the reason stays in the server log.
    pub fn receive_packet(&mut self, connection: ConnectionId, packet: &[u8]) {
        let Some(session) = self.sessions.get_mut(&connection) else {
            warn!("Packet for unknown connection {}", connection);
            return;
        };
        match session.handle_packet(&mut self.ctx, self.authenticator.as_ref(), packet) {
            Ok(()) => {
                if session.is_closed() {
                    self.drop_connection(connection);
                }
            }
            Err(violation) => {
                warn!("Connection {} violated protocol: {}", connection, violation);
                self.close_connection(connection);
            }
        }
    }

    /// Forcibly closes a connection, releasing its subscriptions and
    /// destroying its client object.
    pub fn close_connection(&mut self, connection: ConnectionId) {
        if let Some(mut session) = self.sessions.remove(&connection) {
            session.teardown(&mut self.ctx);
            info!("Connection {} closed", connection);
        }
    }

    fn drop_connection(&mut self, connection: ConnectionId) {
        self.sessions.remove(&connection);
        info!("Connection {} closed", connection);
    }

    /// The client object backing a connection, once it is past the
    /// handshake.
    pub fn client_oid(&self, connection: ConnectionId) -> Option<parlor_shared::Oid> {
        self.sessions
            .get(&connection)
            .and_then(|session| session.client_oid())
    }

    /// Runs the processing sequence: drains every queued work item,
    /// then sweeps out timed-out connections. Call this from the
    /// owning loop; nothing here blocks.
    pub fn process(&mut self) {
        while let Ok(item) = self.receiver.try_recv() {
            item(&mut self.ctx);
        }
        let timeout = self.config.connection_timeout;
        let expired: Vec<ConnectionId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.last_heard.elapsed() > timeout)
            .map(|(connection, _)| *connection)
            .collect();
        for connection in expired {
            warn!("Connection {} timed out", connection);
            self.close_connection(connection);
        }
    }
}
