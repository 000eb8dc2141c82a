/// INTEGRATION: kinds extending other kinds keep inherited indices stable
use replicant_shared::{HostType, RpcOutcome, Value, World};
use replicant_test::{protocol, PAWN, RELIC, SCORE, SET_SCORE, TAUNT};

#[test]
fn rpc_indices_merge_parent_first() {
    let protocol = protocol();
    let relic = protocol.kind(RELIC).unwrap();

    let indices: Vec<u8> = relic.rpcs().iter().map(|rpc| rpc.index()).collect();
    let names: Vec<&str> = relic.rpcs().iter().map(|rpc| rpc.name()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(names, vec![SET_SCORE, TAUNT, "polish"]);

    let pawn = protocol.kind(PAWN).unwrap();
    assert_eq!(pawn.rpc_by_name(SET_SCORE).unwrap().index(), 0);
    assert_eq!(pawn.rpc_by_name(TAUNT).unwrap().index(), 1);
}

#[test]
fn field_indices_merge_parent_first() {
    let protocol = protocol();
    let relic = protocol.kind(RELIC).unwrap();

    let names: Vec<&str> = relic.fields().iter().map(|field| field.name()).collect();
    assert_eq!(
        names,
        vec![
            "roles",
            "owner",
            "torn_off",
            SCORE,
            "set_count",
            "replicated_count",
            "last_taunt",
            "shine"
        ]
    );
}

#[test]
fn redeclared_rpc_replaces_parent_body() {
    let protocol = protocol();
    let mut world = World::new(protocol.max_id());
    let scene = world.create_scene("vault").unwrap();
    let relic = world.spawn(scene, protocol.kind(RELIC).unwrap()).unwrap();
    let pawn = world.spawn(scene, protocol.kind(PAWN).unwrap()).unwrap();

    for key in [relic, pawn] {
        let outcome = world
            .get_mut(key)
            .unwrap()
            .call(SET_SCORE, vec![Value::UInt(30)], HostType::Server)
            .unwrap();
        assert_eq!(outcome, RpcOutcome::Executed);
    }

    assert_eq!(world.get(relic).unwrap().get(SCORE).unwrap(), &Value::UInt(60));
    assert_eq!(world.get(pawn).unwrap().get(SCORE).unwrap(), &Value::UInt(30));
}

#[test]
fn replication_offers_base_fields_then_kind_fields() {
    let protocol = protocol();
    let mut world = World::new(protocol.max_id());
    let scene = world.create_scene("vault").unwrap();
    let relic = world.spawn(scene, protocol.kind(RELIC).unwrap()).unwrap();
    let relic = world.get(relic).unwrap();

    assert_eq!(
        relic.can_replicate(false, true),
        vec!["roles", "owner", "torn_off", SCORE, "set_count"]
    );
    assert_eq!(
        relic.can_replicate(true, false),
        vec!["owner", "torn_off", SCORE, "set_count"]
    );
}
