/// END-TO-END: what non-owning clients may and may not do
use replicant_server::ServerEvent;
use replicant_shared::{ConnectionEvent, Role, Roles, RpcOutcome, Value};
use replicant_test::{TestSession, PAWN, RELIC, SCORE, SET_SCORE, TAUNT};

const POLISH: &str = "polish";

#[test]
fn non_owner_sees_simulated_proxy() {
    let mut session = TestSession::new(2);
    assert!(session.connect(10));
    let scene = session.server.create_scene("arena").unwrap();
    let pawn = session.server.spawn(scene, PAWN).unwrap();
    let owner = session.address(0);
    session.server.set_owner(&owner, Some(pawn)).unwrap();
    session.tick_n(2);

    let owned = session.client(0).world().get(pawn).unwrap();
    assert_eq!(owned.roles().local, Role::AutonomousProxy);
    let observed = session.client(1).world().get(pawn).unwrap();
    assert_eq!(observed.roles().local, Role::SimulatedProxy);
}

#[test]
fn non_owner_may_call_simulated_rpcs() {
    let mut session = TestSession::new(2);
    assert!(session.connect(10));
    let scene = session.server.create_scene("arena").unwrap();
    let pawn = session.server.spawn(scene, PAWN).unwrap();
    let owner = session.address(0);
    session.server.set_owner(&owner, Some(pawn)).unwrap();
    session.tick_n(3);

    let outcome = session
        .client_mut(1)
        .call(pawn, SET_SCORE, vec![Value::UInt(13)])
        .unwrap();
    assert_eq!(outcome, RpcOutcome::Queued);
    session.tick_n(2);

    let original = session.server.world().get(pawn).unwrap();
    assert_eq!(original.get(SCORE).unwrap(), &Value::UInt(13));
    assert_eq!(original.get("set_count").unwrap(), &Value::UInt(1));
}

#[test]
fn unsimulated_call_needs_authority_locally_and_remotely() {
    let mut session = TestSession::new(2);
    assert!(session.connect(10));
    let scene = session.server.create_scene("arena").unwrap();
    let relic = session.server.spawn(scene, RELIC).unwrap();
    let owner = session.address(0);
    session.server.set_owner(&owner, Some(relic)).unwrap();
    session.tick_n(3);
    session.server.take_events();

    // owning it is not enough
    assert_eq!(
        session.client_mut(0).call(relic, POLISH, Vec::new()).unwrap(),
        RpcOutcome::Refused
    );
    assert_eq!(
        session.client_mut(1).call(relic, POLISH, Vec::new()).unwrap(),
        RpcOutcome::Refused
    );

    // a client lying about its role is caught by the server
    session
        .client_mut(1)
        .world_mut()
        .get_mut(relic)
        .unwrap()
        .set_roles(Roles::new(Role::Authority, Role::Authority));
    assert_eq!(
        session.client_mut(1).call(relic, POLISH, Vec::new()).unwrap(),
        RpcOutcome::Queued
    );
    session.tick();

    assert_eq!(
        session.server.take_events(),
        vec![ServerEvent {
            address: session.address(1),
            event: ConnectionEvent::PermissionDenied { key: relic },
        }]
    );
    assert_eq!(
        session.server.world().get(relic).unwrap().get("shine").unwrap(),
        &Value::from(0.0f32)
    );
}

#[test]
fn server_calls_reach_only_the_owner() {
    let mut session = TestSession::new(2);
    assert!(session.connect(10));
    let scene = session.server.create_scene("arena").unwrap();
    let pawn = session.server.spawn(scene, PAWN).unwrap();
    let owner = session.address(0);
    session.server.set_owner(&owner, Some(pawn)).unwrap();
    session.tick_n(2);

    session
        .server
        .call(pawn, TAUNT, vec![Value::from("mine")])
        .unwrap();
    session.tick();

    let owned = session.client(0).world().get(pawn).unwrap();
    assert_eq!(owned.get("last_taunt").unwrap().as_str(), Some("mine"));
    let observed = session.client(1).world().get(pawn).unwrap();
    assert_eq!(observed.get("last_taunt").unwrap().as_str(), Some(""));
}

#[test]
fn dumb_proxy_may_call_nothing() {
    let mut session = TestSession::new(1);
    assert!(session.connect(10));
    let scene = session.server.create_scene("arena").unwrap();
    let pawn = session.server.spawn(scene, PAWN).unwrap();
    session
        .server
        .world_mut()
        .get_mut(pawn)
        .unwrap()
        .set_roles(Roles::new(Role::Authority, Role::DumbProxy));
    session.tick_n(2);

    assert_eq!(
        session.client(0).world().get(pawn).unwrap().roles().local,
        Role::DumbProxy
    );
    assert_eq!(
        session
            .client_mut(0)
            .call(pawn, SET_SCORE, vec![Value::UInt(1)])
            .unwrap(),
        RpcOutcome::Refused
    );
}
