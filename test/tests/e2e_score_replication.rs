/// END-TO-END: a client-owned pawn whose score is replicated down and set
/// back up through a reliable RPC
use replicant_shared::{ConnectionEvent, ReplicableKey, Role, Roles, RpcOutcome, Value};
use replicant_test::{LocalTransport, TestSession, PAWN, SCORE, SCOREBOARD, SET_SCORE, TAUNT};

fn owned_pawn(session: &mut TestSession) -> ReplicableKey {
    let scene = session.server.create_scene("arena").unwrap();
    let pawn = session.server.spawn(scene, PAWN).unwrap();
    let owner = session.address(0);
    session.server.set_owner(&owner, Some(pawn)).unwrap();
    pawn
}

#[test]
fn score_set_on_server_reaches_owner() {
    let mut session = TestSession::new(1);
    assert!(session.connect(10));
    let pawn = owned_pawn(&mut session);
    session
        .server
        .world_mut()
        .get_mut(pawn)
        .unwrap()
        .set(SCORE, 42u64)
        .unwrap();

    session.tick_n(2);

    let copy = session.client(0).world().get(pawn).unwrap();
    assert_eq!(copy.get(SCORE).unwrap(), &Value::UInt(42));
    assert_eq!(copy.roles(), Roles::new(Role::AutonomousProxy, Role::Authority));
    // notify hook ran once for the one replicated write
    assert_eq!(copy.get("replicated_count").unwrap(), &Value::UInt(1));
    assert!(session
        .client_mut(0)
        .take_events()
        .contains(&ConnectionEvent::ReplicableCreated { key: pawn }));
}

#[test]
fn score_set_by_owner_rpc_comes_back() {
    let mut session = TestSession::new(1);
    assert!(session.connect(10));
    let pawn = owned_pawn(&mut session);
    session.tick_n(2);

    let outcome = session
        .client_mut(0)
        .call(pawn, SET_SCORE, vec![Value::UInt(42)])
        .unwrap();
    assert_eq!(outcome, RpcOutcome::Queued);
    session.tick_n(3);

    let original = session.server.world().get(pawn).unwrap();
    assert_eq!(original.get(SCORE).unwrap(), &Value::UInt(42));
    assert_eq!(original.get("set_count").unwrap(), &Value::UInt(1));

    let copy = session.client(0).world().get(pawn).unwrap();
    assert_eq!(copy.get(SCORE).unwrap(), &Value::UInt(42));
    assert_eq!(copy.get("set_count").unwrap(), &Value::UInt(1));
}

#[test]
fn reliable_call_runs_exactly_once_over_lossy_transport() {
    let mut session = TestSession::with_transport(LocalTransport::lossy(3), 1);
    assert!(session.connect(60));
    let pawn = owned_pawn(&mut session);

    for _ in 0..60 {
        let roles = session
            .client(0)
            .world()
            .get(pawn)
            .map(|copy| copy.roles());
        if roles == Some(Roles::new(Role::AutonomousProxy, Role::Authority)) {
            break;
        }
        session.tick();
    }

    let outcome = session
        .client_mut(0)
        .call(pawn, SET_SCORE, vec![Value::UInt(42)])
        .unwrap();
    assert_eq!(outcome, RpcOutcome::Queued);
    session.tick_n(60);

    assert!(session.transport.dropped() > 0);
    let original = session.server.world().get(pawn).unwrap();
    assert_eq!(original.get(SCORE).unwrap(), &Value::UInt(42));
    assert_eq!(original.get("set_count").unwrap(), &Value::UInt(1));
}

#[test]
fn server_call_runs_on_owning_client() {
    let mut session = TestSession::new(1);
    assert!(session.connect(10));
    let pawn = owned_pawn(&mut session);
    session.tick_n(2);

    let outcome = session
        .server
        .call(pawn, TAUNT, vec![Value::from("gg")])
        .unwrap();
    assert_eq!(outcome, RpcOutcome::Queued);
    session.tick();

    let copy = session.client(0).world().get(pawn).unwrap();
    assert_eq!(copy.get("last_taunt").unwrap().as_str(), Some("gg"));
}

#[test]
fn destroyed_pawn_disappears_from_client() {
    let mut session = TestSession::new(1);
    assert!(session.connect(10));
    let pawn = owned_pawn(&mut session);
    session.tick_n(2);
    assert!(session.client(0).world().contains(pawn));

    session.server.destroy_replicable(pawn).unwrap();
    session.tick_n(2);

    assert!(!session.client(0).world().contains(pawn));
}

#[test]
fn field_and_reliable_call_arrive_together_once() {
    let mut session = TestSession::new(1);
    assert!(session.connect(10));
    let scene = session.server.create_scene("arena").unwrap();
    let board = session.server.spawn(scene, SCOREBOARD).unwrap();
    let owner = session.address(0);
    session.server.set_owner(&owner, Some(board)).unwrap();
    session.tick_n(2);

    session
        .server
        .world_mut()
        .get_mut(board)
        .unwrap()
        .set(SCORE, 42u64)
        .unwrap();
    let outcome = session
        .server
        .call(board, SET_SCORE, vec![Value::UInt(42)])
        .unwrap();
    assert_eq!(outcome, RpcOutcome::Queued);
    session.tick_n(2);

    let copy = session.client(0).world().get(board).unwrap();
    assert_eq!(copy.get(SCORE).unwrap(), &Value::UInt(42));
    assert_eq!(copy.get("invocations").unwrap(), &Value::UInt(1));
    assert_eq!(copy.get("last_argument").unwrap(), &Value::UInt(42));

    // acknowledged, so never delivered again
    session.tick_n(10);
    let copy = session.client(0).world().get(board).unwrap();
    assert_eq!(copy.get("invocations").unwrap(), &Value::UInt(1));
}
