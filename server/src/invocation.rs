use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{info, warn};

use parlor_shared::{
    Arg, ListenerSlot, MethodId, ObjectEvent, Oid, RequestId, ServiceHandle, ServiceId, Value,
    REQUEST_FAILED_ID, REQUEST_PROCESSED_ID,
};

use crate::error::{ProtocolError, ServiceError};
use crate::work_queue::{EventContext, ServerHandle};

/// Server-side half of a pending invocation. Answers travel as an
/// InvocationResponse event on the caller's client object, inheriting
/// the ordering of everything else on that object's stream.
///
/// The responder is `Send` and may be carried into background work;
/// whichever thread holds it, the response itself runs on the
/// processing sequence. Each responder answers at most once (the
/// answering methods consume it).
pub struct Responder {
    caller: Oid,
    request_id: RequestId,
    handle: ServerHandle,
}

impl Responder {
    fn new(caller: Oid, slot: &ListenerSlot, handle: ServerHandle) -> Self {
        Self {
            caller,
            request_id: slot.request_id,
            handle,
        }
    }

    /// The request succeeded with nothing to report.
    pub fn confirm(self) {
        self.respond(REQUEST_PROCESSED_ID, Vec::new());
    }

    /// The request succeeded and produced a value.
    pub fn result(self, value: Value) {
        self.respond(REQUEST_PROCESSED_ID, vec![value]);
    }

    /// The request was refused; the reason travels to the caller
    /// verbatim.
    pub fn fail(self, reason: &str) {
        self.respond(REQUEST_FAILED_ID, vec![Value::Str(reason.to_string())]);
    }

    fn respond(self, method_id: MethodId, args: Vec<Value>) {
        let event = ObjectEvent::InvocationResponse {
            oid: self.caller,
            request_id: self.request_id,
            method_id,
            args,
        };
        if self.handle.post(move |ctx| ctx.post_event(event)).is_err() {
            info!("Invocation response after server shutdown, dropped");
        }
    }
}

/// Implements one named service. `dispatch` runs on the processing
/// sequence with full access to server state.
///
/// Contract: a provider that returns `Err` must not have used its
/// responder; the dispatcher converts the error into the failure
/// response itself.
pub trait InvocationProvider: Send {
    fn dispatch(
        &mut self,
        ctx: &mut EventContext,
        caller: Oid,
        method_id: MethodId,
        args: &[Value],
        responder: Option<Responder>,
    ) -> Result<(), ServiceError>;
}

/// Assigns sequential service ids and keeps the bootstrap directory
/// clients receive at handshake.
pub struct ServiceRegistry {
    next_id: ServiceId,
    providers: HashMap<ServiceId, Option<Box<dyn InvocationProvider>>>,
    bootstrap: Vec<ServiceHandle>,
}

impl ServiceRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            providers: HashMap::new(),
            bootstrap: Vec::new(),
        }
    }

    /// Registers a provider under the next sequential id. Services
    /// registered with `bootstrap` appear, in registration order, in
    /// every client's handshake directory.
    pub(crate) fn register(
        &mut self,
        name: &str,
        provider: Box<dyn InvocationProvider>,
        bootstrap: bool,
    ) -> ServiceId {
        let service_id = self.next_id;
        self.next_id += 1;
        self.providers.insert(service_id, Some(provider));
        if bootstrap {
            self.bootstrap.push(ServiceHandle {
                service_id,
                name: name.to_string(),
            });
        }
        info!("Registered service {} as {}", name, service_id);
        service_id
    }

    pub(crate) fn bootstrap_handles(&self) -> Vec<ServiceHandle> {
        self.bootstrap.clone()
    }

    fn take(&mut self, service_id: ServiceId) -> Option<Box<dyn InvocationProvider>> {
        self.providers.get_mut(&service_id).and_then(Option::take)
    }

    fn put_back(&mut self, service_id: ServiceId, provider: Box<dyn InvocationProvider>) {
        self.providers.insert(service_id, Some(provider));
    }
}

/// Dispatches one upstream invocation request. Unknown services and
/// rejected method ids bubble up as protocol errors (version mismatch,
/// connection-fatal); everything else, including a panicking provider,
/// is absorbed here and becomes at worst a failure response.
pub(crate) fn dispatch(
    ctx: &mut EventContext,
    caller: Oid,
    service_id: ServiceId,
    method_id: MethodId,
    args: Vec<Arg>,
) -> Result<(), ProtocolError> {
    let mut values = Vec::with_capacity(args.len());
    let mut slot = None;
    for arg in args {
        match arg {
            Arg::Value(value) => values.push(value),
            Arg::Listener(listener) => slot = Some(listener),
        }
    }
    let responder = slot
        .as_ref()
        .map(|slot| Responder::new(caller, slot, ctx.handle()));

    let Some(mut provider) = ctx.services_mut().take(service_id) else {
        return Err(ProtocolError::UnknownService { service_id });
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        provider.dispatch(ctx, caller, method_id, &values, responder)
    }));
    ctx.services_mut().put_back(service_id, provider);

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(ServiceError::UnknownMethod { method_id })) => Err(ProtocolError::UnknownMethod {
            service_id,
            method_id,
        }),
        Ok(Err(ServiceError::Refused(reason))) => {
            if let Some(slot) = &slot {
                Responder::new(caller, slot, ctx.handle()).fail(&reason);
            }
            Ok(())
        }
        Err(_) => {
            warn!(
                "Service dispatcher choked on {}#{} from caller {}",
                service_id, method_id, caller
            );
            if let Some(slot) = &slot {
                Responder::new(caller, slot, ctx.handle()).fail("Internal error");
            }
            Ok(())
        }
    }
}
