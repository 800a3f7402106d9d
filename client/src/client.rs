use std::collections::HashMap;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use log::{info, trace, warn};

use parlor_shared::{
    Arg, Attributes, BootstrapData, Credentials, Downstream, DownstreamBody, ListenerKind,
    ListenerSlot, MessageId, MessageIdAllocator, MethodId, ObjectEvent, Oid, RequestId,
    ServiceHandle, ServiceId, Transport, Upstream, UpstreamBody, Value, PING_INTERVAL,
    REQUEST_FAILED_ID,
};

use crate::error::ClientError;
use crate::events::ClientEvents;
use crate::invocation::{InvocationResult, ResponseHandle};

/// Contains Config properties which will be used by the Client.
#[derive(Clone)]
pub struct ClientConfig {
    /// How long the outbound side may sit idle before `poll` sends a
    /// keepalive ping.
    pub ping_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ping_interval: PING_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    Disconnected,
    AwaitingAuth,
    Ready,
}

/// A subscribe awaiting its snapshot. `cancelled` records an
/// unsubscribe issued while the request was still in flight; the
/// arriving snapshot is discarded and the unsubscribe goes out then.
struct PendingSubscribe {
    oid: Oid,
    cancelled: bool,
}

/// The client half of a parlor connection. Poll-driven and transport
/// agnostic: `send_*` style methods queue encoded frames into
/// [`Client::outgoing_packets`], inbound packets are fed one at a time
/// to [`Client::receive`], and everything that happened is drained
/// through [`Client::take_events`].
pub struct Client {
    config: ClientConfig,
    state: ClientState,
    message_ids: MessageIdAllocator,
    next_request: RequestId,
    epoch: Instant,
    last_outbound: Instant,
    outbox: Vec<(Transport, Box<[u8]>)>,
    events: ClientEvents,
    client_oid: Option<Oid>,
    services: Vec<ServiceHandle>,
    mirrors: HashMap<Oid, Attributes>,
    dead_pool: HashMap<Oid, Attributes>,
    pending_auth: Option<MessageId>,
    pending_subscribes: HashMap<MessageId, PendingSubscribe>,
    pending_unsubscribes: HashMap<MessageId, Oid>,
    pending_ping: Option<MessageId>,
    pending_calls: HashMap<RequestId, std::sync::mpsc::Sender<InvocationResult>>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let now = Instant::now();
        Self {
            config,
            state: ClientState::Disconnected,
            message_ids: MessageIdAllocator::default(),
            next_request: 0,
            epoch: now,
            last_outbound: now,
            outbox: Vec::new(),
            events: ClientEvents::new(),
            client_oid: None,
            services: Vec::new(),
            mirrors: HashMap::new(),
            dead_pool: HashMap::new(),
            pending_auth: None,
            pending_subscribes: HashMap::new(),
            pending_unsubscribes: HashMap::new(),
            pending_ping: None,
            pending_calls: HashMap::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Ready
    }

    /// The oid of this connection's client object, once connected.
    pub fn client_oid(&self) -> Option<Oid> {
        self.client_oid
    }

    /// The service directory from the handshake, in registration
    /// order.
    pub fn services(&self) -> &[ServiceHandle] {
        &self.services
    }

    /// The local mirror of a subscribed object.
    pub fn object(&self, oid: Oid) -> Option<&Attributes> {
        self.mirrors.get(&oid)
    }

    /// Queued outbound frames with their transport tags, oldest first.
    pub fn outgoing_packets(&mut self) -> Vec<(Transport, Box<[u8]>)> {
        std::mem::take(&mut self.outbox)
    }

    /// Everything that happened since the last drain.
    pub fn take_events(&mut self) -> ClientEvents {
        std::mem::take(&mut self.events)
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn send(&mut self, body: UpstreamBody, transport: Transport) -> MessageId {
        let message_id = self.message_ids.next();
        let frame = Upstream::new(message_id, body);
        self.outbox.push((transport, frame.encode()));
        self.last_outbound = Instant::now();
        message_id
    }

    fn reset(&mut self) {
        self.state = ClientState::Disconnected;
        self.client_oid = None;
        self.services.clear();
        self.mirrors.clear();
        self.dead_pool.clear();
        self.pending_auth = None;
        self.pending_subscribes.clear();
        self.pending_unsubscribes.clear();
        self.pending_ping = None;
        self.pending_calls.clear();
    }

    /// Begins the handshake. Any previous connection state is
    /// discarded first.
    pub fn connect(&mut self, credentials: Credentials) {
        self.reset();
        let id = self.send(
            UpstreamBody::AuthRequest(credentials),
            Transport::DEFAULT,
        );
        self.pending_auth = Some(id);
        self.state = ClientState::AwaitingAuth;
    }

    /// Says goodbye and forgets the connection.
    pub fn logoff(&mut self) {
        if self.state == ClientState::Ready {
            self.send(UpstreamBody::Logoff, Transport::DEFAULT);
        }
        self.reset();
    }

    /// Requests a subscription. A second subscribe to an oid that is
    /// already mirrored or already in flight joins the existing
    /// subscription instead of re-requesting.
    pub fn subscribe(&mut self, oid: Oid) -> Result<(), ClientError> {
        if self.state != ClientState::Ready {
            return Err(ClientError::NotConnected);
        }
        if self.mirrors.contains_key(&oid) {
            trace!("Joining existing subscription to {}", oid);
            return Ok(());
        }
        if let Some(pending) = self
            .pending_subscribes
            .values_mut()
            .find(|pending| pending.oid == oid)
        {
            // Re-subscribing revives a request cancelled in flight.
            pending.cancelled = false;
            trace!("Joining existing subscription to {}", oid);
            return Ok(());
        }
        let id = self.send(UpstreamBody::Subscribe { oid }, Transport::DEFAULT);
        self.pending_subscribes
            .insert(id, PendingSubscribe { oid, cancelled: false });
        Ok(())
    }

    /// Drops a subscription. The mirror moves to a dead pool until the
    /// server acknowledges, so late events cannot resurrect it. An
    /// unsubscribe while the subscribe is still in flight cancels it:
    /// the snapshot is discarded on arrival and the unsubscribe goes
    /// out in its place.
    pub fn unsubscribe(&mut self, oid: Oid) -> Result<(), ClientError> {
        if self.state != ClientState::Ready {
            return Err(ClientError::NotConnected);
        }
        if let Some(pending) = self
            .pending_subscribes
            .values_mut()
            .find(|pending| pending.oid == oid)
        {
            pending.cancelled = true;
            return Ok(());
        }
        let Some(attrs) = self.mirrors.remove(&oid) else {
            return Ok(());
        };
        self.dead_pool.insert(oid, attrs);
        let id = self.send(UpstreamBody::Unsubscribe { oid }, Transport::DEFAULT);
        self.pending_unsubscribes.insert(id, oid);
        Ok(())
    }

    /// Invokes a service method. The returned handle yields the single
    /// result when it arrives.
    ///
    /// There is no request timeout: if the server never answers, the
    /// handle stays pending until the connection is reset. Liveness is
    /// the keepalive ping's job.
    pub fn call(
        &mut self,
        service_id: ServiceId,
        method_id: MethodId,
        args: Vec<Value>,
        kind: ListenerKind,
    ) -> Result<ResponseHandle, ClientError> {
        if self.state != ClientState::Ready {
            return Err(ClientError::NotConnected);
        }
        let Some(client_oid) = self.client_oid else {
            return Err(ClientError::NotConnected);
        };
        let request_id = self.next_request;
        self.next_request = self.next_request.wrapping_add(1);
        let (sender, receiver) = channel();
        self.pending_calls.insert(request_id, sender);

        let mut wire_args: Vec<Arg> = args.into_iter().map(Arg::Value).collect();
        wire_args.push(Arg::Listener(ListenerSlot { kind, request_id }));
        self.send(
            UpstreamBody::ForwardEvent(ObjectEvent::InvocationRequest {
                oid: client_oid,
                service_id,
                method_id,
                args: wire_args,
            }),
            Transport::DEFAULT,
        );
        Ok(ResponseHandle::new(receiver))
    }

    /// Posts a transient message on an object's event stream.
    pub fn post_message(
        &mut self,
        oid: Oid,
        name: &str,
        args: Vec<Value>,
        transport: Transport,
    ) -> Result<(), ClientError> {
        if self.state != ClientState::Ready {
            return Err(ClientError::NotConnected);
        }
        self.send(
            UpstreamBody::ForwardEvent(ObjectEvent::MessagePosted {
                oid,
                name: name.to_string(),
                args,
            }),
            transport,
        );
        Ok(())
    }

    /// Housekeeping: sends a keepalive ping once the outbound side has
    /// been idle past the configured interval. Call regularly.
    pub fn poll(&mut self) {
        if self.state == ClientState::Ready
            && self.pending_ping.is_none()
            && self.last_outbound.elapsed() >= self.config.ping_interval
        {
            let stamp = self.now_millis();
            let id = self.send(UpstreamBody::Ping { stamp }, Transport::DEFAULT);
            self.pending_ping = Some(id);
        }
    }

    /// Processes one inbound packet. A decode failure is
    /// connection-fatal and the caller should disconnect.
    pub fn receive(&mut self, packet: &[u8]) -> Result<(), ClientError> {
        let frame = Downstream::decode(packet)?;
        match frame.body {
            DownstreamBody::AuthResponse(result) => {
                if self.pending_auth != Some(frame.responding_to) {
                    info!("Stale auth response, discarded");
                    return Ok(());
                }
                self.pending_auth = None;
                match result {
                    parlor_shared::AuthResult::Granted => {
                        // Ready is declared when the bootstrap lands.
                    }
                    parlor_shared::AuthResult::Refused { reason } => {
                        self.events.push_reject(reason);
                        self.state = ClientState::Disconnected;
                    }
                }
            }
            DownstreamBody::Bootstrap(data) => self.handle_bootstrap(data),
            DownstreamBody::ObjectResponse(snapshot) => {
                match self.pending_subscribes.remove(&frame.responding_to) {
                    Some(pending) if pending.oid == snapshot.oid => {
                        if pending.cancelled {
                            trace!(
                                "Subscription to {} cancelled in flight, unsubscribing",
                                snapshot.oid
                            );
                            let oid = snapshot.oid;
                            let id =
                                self.send(UpstreamBody::Unsubscribe { oid }, Transport::DEFAULT);
                            self.pending_unsubscribes.insert(id, oid);
                        } else {
                            self.mirrors
                                .insert(pending.oid, Attributes::from_snapshot(&snapshot));
                            self.events.push_subscribe(snapshot);
                        }
                    }
                    Some(pending) => warn!(
                        "Snapshot for {} answered a subscribe to {}, discarded",
                        snapshot.oid, pending.oid
                    ),
                    None => info!("Stale object response for {}, discarded", snapshot.oid),
                }
            }
            DownstreamBody::FailureResponse { oid, reason } => {
                match self.pending_subscribes.remove(&frame.responding_to) {
                    Some(pending) if pending.cancelled => {
                        trace!("Cancelled subscribe to {} failed anyway: {}", oid, reason);
                    }
                    Some(_) => self.events.push_subscribe_failure(oid, reason),
                    None => info!("Stale failure response for {}: {}", oid, reason),
                }
            }
            DownstreamBody::UnsubscribeResponse { oid } => {
                self.pending_unsubscribes.remove(&frame.responding_to);
                self.dead_pool.remove(&oid);
                self.events.push_unsubscribe(oid);
            }
            DownstreamBody::EventNotification(batch) => self.handle_batch(batch),
            DownstreamBody::Pong {
                ping_stamp,
                process_delay_millis,
            } => {
                if self.pending_ping != Some(frame.responding_to) {
                    info!("Stale pong, discarded");
                    return Ok(());
                }
                self.pending_ping = None;
                self.handle_pong(ping_stamp, process_delay_millis);
            }
        }
        Ok(())
    }

    fn handle_bootstrap(&mut self, data: BootstrapData) {
        if self.state != ClientState::AwaitingAuth {
            warn!("Bootstrap outside handshake, discarded");
            return;
        }
        self.client_oid = Some(data.client_oid);
        self.services = data.services.clone();
        self.state = ClientState::Ready;
        self.events.push_connect(data);
    }

    /// One committed batch: invocation responses route to their
    /// pending calls, everything else mutates the mirrors, and the
    /// whole batch lands in the event drain as a unit.
    fn handle_batch(&mut self, batch: Vec<ObjectEvent>) {
        for event in &batch {
            match event {
                ObjectEvent::InvocationResponse {
                    request_id,
                    method_id,
                    args,
                    ..
                } => self.route_response(*request_id, *method_id, args),
                ObjectEvent::ObjectDestroyed { oid } => {
                    self.mirrors.remove(oid);
                    self.dead_pool.remove(oid);
                    self.events.push_destroy(*oid);
                }
                other => {
                    let oid = other.oid();
                    if let Some(attrs) = self.mirrors.get_mut(&oid) {
                        if let Err(fault) = other.apply(attrs) {
                            warn!("Mirror of {} rejected an event: {}", oid, fault);
                        }
                    } else if self.dead_pool.contains_key(&oid) {
                        trace!("Event for unsubscribed {}, dropped", oid);
                    } else if Some(oid) != self.client_oid {
                        trace!("Event for unmirrored {}, dropped", oid);
                    }
                }
            }
        }
        self.events.push_batch(batch);
    }

    fn route_response(&mut self, request_id: RequestId, method_id: MethodId, args: &[Value]) {
        let Some(sender) = self.pending_calls.remove(&request_id) else {
            info!("Response for unknown request {}, dropped", request_id);
            return;
        };
        let result = if method_id == REQUEST_FAILED_ID {
            let reason = match args.first() {
                Some(Value::Str(reason)) => reason.clone(),
                _ => String::new(),
            };
            InvocationResult::Failed(reason)
        } else {
            match args.first() {
                Some(value) => InvocationResult::Value(value.clone()),
                None => InvocationResult::Confirmed,
            }
        };
        let _ = sender.send(result);
    }

    fn handle_pong(&mut self, ping_stamp: u64, process_delay_millis: u64) {
        let now = self.now_millis();
        let travel = now as i128 - ping_stamp as i128 - process_delay_millis as i128;
        let latency = if travel < 0 {
            warn!("Negative computed latency ({} ms), clamped", travel);
            Duration::ZERO
        } else {
            Duration::from_millis(travel as u64)
        };
        self.events.push_pong(latency);
    }
}
