use std::sync::{Arc, Mutex};

use parlor_server::{EventContext, InvocationProvider, Responder, ServiceError};
use parlor_shared::{MethodId, Oid, Value};

/// A small arithmetic service exercising every dispatch path.
///
/// Methods: 1 adds its integer arguments and returns the sum, 2
/// confirms without a result, 3 refuses, 4 panics.
pub struct CalculatorService;

impl InvocationProvider for CalculatorService {
    fn dispatch(
        &mut self,
        _ctx: &mut EventContext,
        _caller: Oid,
        method_id: MethodId,
        args: &[Value],
        responder: Option<Responder>,
    ) -> Result<(), ServiceError> {
        match method_id {
            1 => {
                let sum: i64 = args
                    .iter()
                    .map(|arg| match arg {
                        Value::Int(n) => *n,
                        _ => 0,
                    })
                    .sum();
                if let Some(responder) = responder {
                    responder.result(Value::Int(sum));
                }
                Ok(())
            }
            2 => {
                if let Some(responder) = responder {
                    responder.confirm();
                }
                Ok(())
            }
            3 => Err(ServiceError::Refused("arithmetic declined".into())),
            4 => panic!("calculator exploded"),
            _ => Err(ServiceError::UnknownMethod { method_id }),
        }
    }
}

/// One call held by the [`ParkingService`], answerable later and in
/// any order.
pub struct ParkedCall {
    pub tag: i64,
    pub responder: Responder,
}

/// Parks every call instead of answering, so scenarios can complete
/// requests out of arrival order.
pub struct ParkingService {
    pub parked: Arc<Mutex<Vec<ParkedCall>>>,
}

impl ParkingService {
    pub fn new() -> (Self, Arc<Mutex<Vec<ParkedCall>>>) {
        let parked = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                parked: parked.clone(),
            },
            parked,
        )
    }
}

impl InvocationProvider for ParkingService {
    fn dispatch(
        &mut self,
        _ctx: &mut EventContext,
        _caller: Oid,
        _method_id: MethodId,
        args: &[Value],
        responder: Option<Responder>,
    ) -> Result<(), ServiceError> {
        let tag = match args.first() {
            Some(Value::Int(tag)) => *tag,
            _ => 0,
        };
        if let Some(responder) = responder {
            self.parked
                .lock()
                .expect("parked list poisoned")
                .push(ParkedCall { tag, responder });
        }
        Ok(())
    }
}
