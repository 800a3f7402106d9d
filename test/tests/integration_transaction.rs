//! Transaction semantics over the wire: atomic batches, pure-discard
//! rollback, misuse errors.

use parlor_client::BatchEvent;
use parlor_server::TransactionError;
use parlor_shared::{ObjectEvent, Value};
use parlor_test::{game_schema, TestPair};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn set_score(oid: parlor_shared::Oid, old: i64, new: i64) -> ObjectEvent {
    ObjectEvent::AttributeChanged {
        oid,
        field: "score".into(),
        old: Value::Int(old),
        new: Value::Int(new),
    }
}

#[test]
fn a_committed_transaction_is_one_batch() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    pair.server.context().begin_transaction(oid).unwrap();
    pair.server.context().post_event(set_score(oid, 0, 1));
    pair.server.context().post_event(set_score(oid, 1, 2));
    pair.server.context().post_event(set_score(oid, 2, 3));

    // Nothing escapes while the transaction is open.
    let mut events = pair.pump();
    assert!(!events.has::<BatchEvent>());
    assert_eq!(
        pair.client.object(oid).unwrap().scalar("score"),
        Some(&Value::Int(0))
    );

    pair.server.context().commit_transaction(oid).unwrap();
    let mut events = pair.pump();
    let batches: Vec<Vec<ObjectEvent>> = events.read::<BatchEvent>().collect();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
    assert_eq!(
        pair.client.object(oid).unwrap().scalar("score"),
        Some(&Value::Int(3))
    );
}

#[test]
fn rollback_leaves_no_trace() {
    init();
    let mut pair = TestPair::new();
    pair.connect("ada");
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.client.subscribe(oid).unwrap();
    pair.pump();

    pair.server.context().begin_transaction(oid).unwrap();
    pair.server.context().post_event(set_score(oid, 0, 9));
    pair.server.context().rollback_transaction(oid).unwrap();

    let mut events = pair.pump();
    assert!(!events.has::<BatchEvent>());
    assert_eq!(
        pair.server.context().attributes(oid).unwrap().scalar("score"),
        Some(&Value::Int(0))
    );
}

#[test]
fn staged_reads_see_each_other_but_not_canon() {
    init();
    let mut pair = TestPair::new();
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.server.context().begin_transaction(oid).unwrap();
    pair.server.context().post_event(set_score(oid, 0, 4));
    assert_eq!(
        pair.server.context().attributes(oid).unwrap().scalar("score"),
        Some(&Value::Int(4))
    );
    pair.server.context().rollback_transaction(oid).unwrap();
    assert_eq!(
        pair.server.context().attributes(oid).unwrap().scalar("score"),
        Some(&Value::Int(0))
    );
}

#[test]
fn misuse_is_reported_not_tolerated() {
    init();
    let mut pair = TestPair::new();
    let oid = pair.server.context().create_object(&game_schema()).unwrap();

    assert_eq!(
        pair.server.context().commit_transaction(oid),
        Err(TransactionError::NotBuffering { oid })
    );
    pair.server.context().begin_transaction(oid).unwrap();
    assert_eq!(
        pair.server.context().begin_transaction(oid),
        Err(TransactionError::AlreadyBuffering { oid })
    );
    pair.server.context().rollback_transaction(oid).unwrap();

    assert_eq!(
        pair.server.context().begin_transaction(4242),
        Err(TransactionError::NoSuchObject { oid: 4242 })
    );
}

#[test]
fn destruction_abandons_the_open_transaction() {
    init();
    let mut pair = TestPair::new();
    let oid = pair.server.context().create_object(&game_schema()).unwrap();
    pair.server.context().begin_transaction(oid).unwrap();
    pair.server.context().post_event(set_score(oid, 0, 1));
    pair.server.context().destroy_object(oid);
    assert_eq!(
        pair.server.context().commit_transaction(oid),
        Err(TransactionError::NotBuffering { oid })
    );
}
