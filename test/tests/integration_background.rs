//! The background bridge: off-thread work completing on the
//! processing sequence, discard, and panic containment.

use std::time::{Duration, Instant};

use parlor_client::BatchEvent;
use parlor_server::{BackgroundRunner, EventContext, Outcome, WorkUnit};
use parlor_shared::{ObjectEvent, Oid, Value};
use parlor_test::{game_schema, TestPair};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct SlowSum {
    oid: Oid,
    terms: Vec<i64>,
    sum: i64,
    discard: bool,
}

impl WorkUnit for SlowSum {
    fn perform(&mut self) -> Outcome {
        self.sum = self.terms.iter().sum();
        if self.discard {
            Outcome::Discard
        } else {
            Outcome::Complete
        }
    }

    fn complete(self: Box<Self>, ctx: &mut EventContext) {
        ctx.post_event(ObjectEvent::AttributeChanged {
            oid: self.oid,
            field: "score".into(),
            old: Value::Int(0),
            new: Value::Int(self.sum),
        });
    }
}

struct Exploding;

impl WorkUnit for Exploding {
    fn perform(&mut self) -> Outcome {
        panic!("background unit exploded");
    }

    fn complete(self: Box<Self>, _ctx: &mut EventContext) {
        unreachable!("a panicked unit must never complete");
    }
}

/// Pumps until the client sees a batch or the deadline passes.
fn pump_until_batch(pair: &mut TestPair, deadline: Duration) -> Option<Vec<ObjectEvent>> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        let mut events = pair.pump();
        if let Some(batch) = events.read::<BatchEvent>().next() {
            return Some(batch);
        }
        std::thread::yield_now();
    }
    None
}

#[test]
fn completion_runs_on_the_processing_sequence() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    let runner = BackgroundRunner::start(pair.server.handle());
    runner
        .post(Box::new(SlowSum {
            oid,
            terms: vec![40, 2],
            sum: 0,
            discard: false,
        }))
        .unwrap();
    let batch = pump_until_batch(&mut pair, Duration::from_secs(5)).expect("no completion");
    assert_eq!(
        batch,
        vec![ObjectEvent::AttributeChanged {
            oid,
            field: "score".into(),
            old: Value::Int(0),
            new: Value::Int(42),
        }]
    );
    runner.shutdown();
}

#[test]
fn discarded_units_never_complete() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    let runner = BackgroundRunner::start(pair.server.handle());
    runner
        .post(Box::new(SlowSum {
            oid,
            terms: vec![1],
            sum: 0,
            discard: true,
        }))
        .unwrap();
    // Shutdown drains the worker, so the unit has definitely run.
    runner.shutdown();
    let mut events = pair.pump();
    assert!(!events.has::<BatchEvent>());
}

#[test]
fn a_panicking_unit_does_not_kill_the_worker() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    let runner = BackgroundRunner::start(pair.server.handle());
    runner.post(Box::new(Exploding)).unwrap();
    runner
        .post(Box::new(SlowSum {
            oid,
            terms: vec![7],
            sum: 0,
            discard: false,
        }))
        .unwrap();
    let batch = pump_until_batch(&mut pair, Duration::from_secs(5)).expect("worker died");
    assert!(matches!(
        &batch[0],
        ObjectEvent::AttributeChanged { new: Value::Int(7), .. }
    ));
    runner.shutdown();
}
