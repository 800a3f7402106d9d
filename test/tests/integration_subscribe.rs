//! Subscription lifecycle: snapshots, idempotence, dead pool, destroy
//! finality, access control.

use parlor_client::{BatchEvent, DestroyEvent, SubscribeEvent, SubscribeFailEvent, UnsubscribeEvent};
use parlor_server::{AccessController, AccessOp, AllowAll, Server, ServerConfig};
use parlor_shared::{Attr, ObjectEvent, Oid, Value};
use parlor_test::{game_schema, TestPair};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn snapshot_reflects_state_at_subscribe_time() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.server.context().post_event(ObjectEvent::AttributeChanged {
        oid,
        field: "score".into(),
        old: Value::Int(0),
        new: Value::Int(5),
    });

    pair.client.subscribe(oid).unwrap();
    let mut events = pair.pump();
    let snapshot = events.read::<SubscribeEvent>().next().expect("no snapshot");
    assert_eq!(snapshot.oid, oid);
    assert_eq!(snapshot.attributes[0].1, Attr::Scalar(Value::Int(5)));

    // Scenario A: the next change arrives as an ordered event carrying
    // the displaced value.
    pair.server.context().post_event(ObjectEvent::AttributeChanged {
        oid,
        field: "score".into(),
        old: Value::Int(5),
        new: Value::Int(7),
    });
    let mut events = pair.pump();
    let batch = events.read::<BatchEvent>().next().expect("no batch");
    assert_eq!(
        batch,
        vec![ObjectEvent::AttributeChanged {
            oid,
            field: "score".into(),
            old: Value::Int(5),
            new: Value::Int(7),
        }]
    );
    assert_eq!(
        pair.client.object(oid).unwrap().scalar("score"),
        Some(&Value::Int(7))
    );
}

#[test]
fn second_subscribe_joins_without_a_round_trip() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    pair.client.subscribe(oid).unwrap();
    assert!(pair.client.outgoing_packets().is_empty());
}

#[test]
fn missing_object_fails_the_subscribe() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    pair.client.subscribe(4242).unwrap();
    let mut events = pair.pump();
    let (oid, reason) = events
        .read::<SubscribeFailEvent>()
        .next()
        .expect("no failure");
    assert_eq!(oid, 4242);
    assert_eq!(reason, "No such object");
}

struct ClientObjectsOnly;
impl AccessController for ClientObjectsOnly {
    fn allows(&self, identity: Option<&str>, _oid: Oid, op: AccessOp) -> bool {
        // Server-internal operations pass; clients are read-only and
        // may not subscribe at all here.
        identity.is_none() || op == AccessOp::Mutate
    }
}

#[test]
fn denied_subscribe_reports_access_not_absence() {
    init();
    let server = Server::with_collaborators(
        ServerConfig::default(),
        Box::new(parlor_server::AcceptAll),
        Box::new(ClientObjectsOnly),
    );
    let mut pair = TestPair::with_server(server);
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    let mut events = pair.pump();
    let (_oid, reason) = events
        .read::<SubscribeFailEvent>()
        .next()
        .expect("no failure");
    assert_eq!(reason, "Access denied");
}

#[test]
fn unsubscribed_mirror_parks_until_the_ack() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    // The server posts an event before it sees the unsubscribe; the
    // client must swallow it without resurrecting the mirror.
    pair.client.unsubscribe(oid).unwrap();
    pair.server.context().post_event(ObjectEvent::AttributeChanged {
        oid,
        field: "score".into(),
        old: Value::Int(0),
        new: Value::Int(1),
    });
    let mut events = pair.pump();
    assert!(pair.client.object(oid).is_none());
    assert_eq!(events.read::<UnsubscribeEvent>().next(), Some(oid));

    // Events after the ack no longer reach this client.
    pair.server.context().post_event(ObjectEvent::AttributeChanged {
        oid,
        field: "score".into(),
        old: Value::Int(1),
        new: Value::Int(2),
    });
    let mut events = pair.pump();
    assert!(!events.has::<BatchEvent>());
}

#[test]
fn unsubscribe_cancels_a_subscribe_still_in_flight() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();

    // The unsubscribe lands before the subscribe round trip has
    // completed; the arriving snapshot must not create a mirror.
    pair.client.subscribe(oid).unwrap();
    pair.client.unsubscribe(oid).unwrap();
    let mut events = pair.pump();
    assert!(pair.client.object(oid).is_none());
    assert!(!events.has::<SubscribeEvent>());
    assert_eq!(events.read::<UnsubscribeEvent>().next(), Some(oid));

    // Delivery never starts.
    pair.server.context().post_event(ObjectEvent::AttributeChanged {
        oid,
        field: "score".into(),
        old: Value::Int(0),
        new: Value::Int(1),
    });
    let mut events = pair.pump();
    assert!(!events.has::<BatchEvent>());
}

#[test]
fn resubscribe_revives_a_cancelled_request() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();

    pair.client.subscribe(oid).unwrap();
    pair.client.unsubscribe(oid).unwrap();
    pair.client.subscribe(oid).unwrap();
    let mut events = pair.pump();
    assert!(events.read::<SubscribeEvent>().next().is_some());
    assert!(pair.client.object(oid).is_some());
}

#[test]
fn destroyed_oid_stays_dead() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    pair.server.context().destroy_object(oid);
    let mut events = pair.pump();
    assert_eq!(events.read::<DestroyEvent>().next(), Some(oid));
    assert!(pair.client.object(oid).is_none());

    // The oid is never reassigned and never comes back.
    let successor = pair.server.context().create_object(&game_schema()).unwrap();
    assert_ne!(successor, oid);
    pair.client.subscribe(oid).unwrap();
    let mut events = pair.pump();
    let (_oid, reason) = events
        .read::<SubscribeFailEvent>()
        .next()
        .expect("no failure");
    assert_eq!(reason, "No such object");
}

#[test]
fn allow_all_is_the_default_policy() {
    init();
    let server = Server::with_collaborators(
        ServerConfig::default(),
        Box::new(parlor_server::AcceptAll),
        Box::new(AllowAll),
    );
    let mut pair = TestPair::with_server(server);
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    let mut events = pair.pump();
    assert!(events.read::<SubscribeEvent>().next().is_some());
}
