//! Per-object delivery order: subscribers observe exactly the
//! processing order, with no gaps and no reordering.

use parlor_client::BatchEvent;
use parlor_shared::{ObjectEvent, Value};
use parlor_test::{game_schema, TestPair};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn a_long_run_of_events_arrives_in_post_order() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    for step in 0..50i64 {
        pair.server.context().post_event(ObjectEvent::AttributeChanged {
            oid,
            field: "score".into(),
            old: Value::Int(step),
            new: Value::Int(step + 1),
        });
    }
    let mut events = pair.pump();
    let observed: Vec<i64> = events
        .read::<BatchEvent>()
        .flatten()
        .map(|event| match event {
            ObjectEvent::AttributeChanged {
                new: Value::Int(n), ..
            } => n,
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(observed, (1..=50).collect::<Vec<i64>>());
    assert_eq!(
        pair.client.object(oid).unwrap().scalar("score"),
        Some(&Value::Int(50))
    );
}

#[test]
fn interleaved_objects_each_keep_their_own_order() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let first = pair.server.context().create_object(&game_schema()).unwrap();
    let second = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(first).unwrap();
    pair.client.subscribe(second).unwrap();
    pair.pump();

    for step in 0..10i64 {
        let target = if step % 2 == 0 { first } else { second };
        pair.server.context().post_event(ObjectEvent::AttributeChanged {
            oid: target,
            field: "score".into(),
            old: Value::Int(step / 2),
            new: Value::Int(step / 2 + 1),
        });
    }
    let mut events = pair.pump();
    let mut per_object: std::collections::HashMap<_, Vec<i64>> = Default::default();
    for event in events.read::<BatchEvent>().flatten() {
        if let ObjectEvent::AttributeChanged {
            oid,
            new: Value::Int(n),
            ..
        } = event
        {
            per_object.entry(oid).or_default().push(n);
        }
    }
    assert_eq!(per_object[&first], vec![1, 2, 3, 4, 5]);
    assert_eq!(per_object[&second], vec![1, 2, 3, 4, 5]);
}

#[test]
fn set_and_list_events_carry_displaced_values() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    use parlor_shared::Key;
    pair.server.context().post_event(ObjectEvent::EntryAdded {
        oid,
        field: "players".into(),
        key: Key::Str("ada".into()),
        value: Value::Int(1),
    });
    pair.server.context().post_event(ObjectEvent::EntryUpdated {
        oid,
        field: "players".into(),
        key: Key::Str("ada".into()),
        old: Value::Int(1),
        new: Value::Int(2),
    });
    pair.server.context().post_event(ObjectEvent::EntryRemoved {
        oid,
        field: "players".into(),
        key: Key::Str("ada".into()),
        old: Value::Int(2),
    });
    let mut events = pair.pump();
    let flattened: Vec<ObjectEvent> = events.read::<BatchEvent>().flatten().collect();
    assert!(matches!(
        &flattened[1],
        ObjectEvent::EntryUpdated { old: Value::Int(1), new: Value::Int(2), .. }
    ));
    assert!(matches!(
        &flattened[2],
        ObjectEvent::EntryRemoved { old: Value::Int(2), .. }
    ));
    assert!(pair
        .client
        .object(oid)
        .unwrap()
        .set_entries("players")
        .unwrap()
        .is_empty());
}
