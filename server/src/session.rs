use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

use log::{info, trace};

use parlor_shared::{
    AuthResult, BootstrapData, Credentials, Downstream, DownstreamBody, FieldDescriptor,
    MessageId, ObjectEvent, ObjectSchema, Oid, Upstream, UpstreamBody, Value,
};

use crate::access::AccessOp;
use crate::error::{ObjectAccessError, ProtocolError};
use crate::invocation;
use crate::subscriber::{ConnectionSink, SubscriberKey};
use crate::work_queue::EventContext;

/// Validates presented credentials. Runs synchronously on the
/// processing sequence; slow validation belongs on the background
/// bridge, feeding a pre-warmed account table this trait reads.
pub trait Authenticator: Send {
    fn authenticate(&self, credentials: &Credentials) -> AuthResult;
}

/// Grants any credentials. The default for tests and open servers.
pub struct AcceptAll;

impl Authenticator for AcceptAll {
    fn authenticate(&self, _credentials: &Credentials) -> AuthResult {
        AuthResult::Granted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    AwaitingCredentials,
    Ready,
    Closed,
}

/// Per-connection protocol state. The first message must be an
/// AuthRequest; a granted session gets a client object, is
/// auto-subscribed to it (invocation responses ride its event stream),
/// and receives exactly one Bootstrap before anything else.
pub(crate) struct Session {
    state: SessionState,
    username: Option<String>,
    client_oid: Option<Oid>,
    key: SubscriberKey,
    outbox: Sender<Box<[u8]>>,
    pub(crate) last_heard: Instant,
}

impl Session {
    pub(crate) fn new(key: SubscriberKey, outbox: Sender<Box<[u8]>>) -> Self {
        Self {
            state: SessionState::AwaitingCredentials,
            username: None,
            client_oid: None,
            key,
            outbox,
            last_heard: Instant::now(),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub(crate) fn client_oid(&self) -> Option<Oid> {
        self.client_oid
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            SessionState::AwaitingCredentials => "awaiting-credentials",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        }
    }

    fn send(&self, frame: Downstream) {
        let _ = self.outbox.send(frame.encode());
    }

    /// Handles one inbound packet. An `Err` is a protocol violation;
    /// the server tears the connection down and logs the reason, the
    /// peer just sees a disconnect.
    pub(crate) fn handle_packet(
        &mut self,
        ctx: &mut EventContext,
        authenticator: &dyn Authenticator,
        packet: &[u8],
    ) -> Result<(), ProtocolError> {
        let unpacked_at = Instant::now();
        self.last_heard = unpacked_at;
        let message = Upstream::decode(packet)?;
        match self.state {
            SessionState::AwaitingCredentials => match message.body {
                UpstreamBody::AuthRequest(credentials) => {
                    self.handle_auth(ctx, authenticator, message.message_id, credentials);
                    Ok(())
                }
                _ => Err(ProtocolError::OutOfSequence {
                    state: self.state_name(),
                }),
            },
            SessionState::Ready => match message.body {
                UpstreamBody::Subscribe { oid } => {
                    self.handle_subscribe(ctx, message.message_id, oid);
                    Ok(())
                }
                UpstreamBody::Unsubscribe { oid } => {
                    ctx.store_mut().unsubscribe(oid, self.key);
                    self.send(Downstream::response(
                        message.message_id,
                        DownstreamBody::UnsubscribeResponse { oid },
                    ));
                    Ok(())
                }
                UpstreamBody::ForwardEvent(event) => {
                    self.handle_forward(ctx, message.message_id, event)
                }
                UpstreamBody::Ping { stamp } => {
                    let process_delay_millis = unpacked_at.elapsed().as_millis() as u64;
                    self.send(Downstream::response(
                        message.message_id,
                        DownstreamBody::Pong {
                            ping_stamp: stamp,
                            process_delay_millis,
                        },
                    ));
                    Ok(())
                }
                UpstreamBody::Logoff => {
                    info!("Session logoff: {:?}", self.username);
                    self.teardown(ctx);
                    Ok(())
                }
                UpstreamBody::AuthRequest(_) => Err(ProtocolError::OutOfSequence {
                    state: self.state_name(),
                }),
            },
            SessionState::Closed => Err(ProtocolError::OutOfSequence {
                state: self.state_name(),
            }),
        }
    }

    fn handle_auth(
        &mut self,
        ctx: &mut EventContext,
        authenticator: &dyn Authenticator,
        message_id: MessageId,
        credentials: Credentials,
    ) {
        match authenticator.authenticate(&credentials) {
            AuthResult::Granted => {
                let schema = ObjectSchema::new(vec![FieldDescriptor::scalar(
                    "username",
                    Value::Str(credentials.username.clone()),
                )]);
                let Ok(client_oid) = ctx.create_object(&schema) else {
                    self.send(Downstream::response(
                        message_id,
                        DownstreamBody::AuthResponse(AuthResult::Refused {
                            reason: "Server full".into(),
                        }),
                    ));
                    self.state = SessionState::Closed;
                    return;
                };
                let sink = Arc::new(ConnectionSink::new(self.outbox.clone()));
                // Cannot fail: the object was just created and the
                // access controller is not consulted for the client
                // object's own connection.
                let _ = ctx.store_mut().subscribe(client_oid, self.key, None, sink);
                self.username = Some(credentials.username.clone());
                self.client_oid = Some(client_oid);
                self.send(Downstream::response(
                    message_id,
                    DownstreamBody::AuthResponse(AuthResult::Granted),
                ));
                self.send(Downstream::notification(DownstreamBody::Bootstrap(
                    BootstrapData {
                        client_oid,
                        services: ctx.services().bootstrap_handles(),
                    },
                )));
                self.state = SessionState::Ready;
                info!("Session ready: {}", credentials.username);
            }
            AuthResult::Refused { reason } => {
                info!("Auth refused for {}: {}", credentials.username, reason);
                self.send(Downstream::response(
                    message_id,
                    DownstreamBody::AuthResponse(AuthResult::Refused { reason }),
                ));
                self.state = SessionState::Closed;
            }
        }
    }

    fn handle_subscribe(&mut self, ctx: &mut EventContext, message_id: MessageId, oid: Oid) {
        let sink = Arc::new(ConnectionSink::new(self.outbox.clone()));
        let identity = self.username.as_deref();
        match ctx.store_mut().subscribe(oid, self.key, identity, sink) {
            Ok(snapshot) => self.send(Downstream::response(
                message_id,
                DownstreamBody::ObjectResponse(snapshot),
            )),
            Err(fault) => {
                trace!("Subscribe refused for {:?}: {}", self.username, fault);
                let reason = match fault {
                    ObjectAccessError::NoSuchObject { .. } => "No such object",
                    ObjectAccessError::AccessDenied { .. } => "Access denied",
                };
                self.send(Downstream::response(
                    message_id,
                    DownstreamBody::FailureResponse {
                        oid,
                        reason: reason.into(),
                    },
                ));
            }
        }
    }

    /// Clients may originate invocation requests and posted messages,
    /// nothing else; state mutation only happens through services.
    fn handle_forward(
        &mut self,
        ctx: &mut EventContext,
        message_id: MessageId,
        event: ObjectEvent,
    ) -> Result<(), ProtocolError> {
        match event {
            ObjectEvent::InvocationRequest {
                service_id,
                method_id,
                args,
                ..
            } => {
                let Some(caller) = self.client_oid else {
                    return Err(ProtocolError::OutOfSequence {
                        state: self.state_name(),
                    });
                };
                invocation::dispatch(ctx, caller, service_id, method_id, args)
            }
            ObjectEvent::MessagePosted { oid, .. } => {
                let identity = self.username.as_deref();
                if !ctx.store().allows(identity, oid, AccessOp::Mutate) {
                    self.send(Downstream::response(
                        message_id,
                        DownstreamBody::FailureResponse {
                            oid,
                            reason: "Access denied".into(),
                        },
                    ));
                    return Ok(());
                }
                ctx.post_event(event);
                Ok(())
            }
            _ => Err(ProtocolError::ForbiddenEvent),
        }
    }

    /// Graceful or forced teardown: every subscription goes, the
    /// client object is destroyed, the session will accept nothing
    /// further.
    pub(crate) fn teardown(&mut self, ctx: &mut EventContext) {
        ctx.store_mut().unsubscribe_all(self.key);
        if let Some(oid) = self.client_oid.take() {
            ctx.destroy_object(oid);
        }
        self.state = SessionState::Closed;
    }
}
