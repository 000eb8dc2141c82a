/// INTEGRATION: ownership contexts always restore the roles they change
use std::panic::{catch_unwind, AssertUnwindSafe};

use replicant_shared::{Role, Roles, World};
use replicant_test::{protocol, PAWN};

#[test]
fn context_substitutes_for_non_owner_only() {
    let mut roles = Roles::new(Role::Authority, Role::AutonomousProxy);
    {
        let scoped = roles.set_context(false);
        assert_eq!(scoped.remote, Role::SimulatedProxy);
        assert_eq!(scoped.context(), Some(false));
    }
    {
        let scoped = roles.set_context(true);
        assert_eq!(scoped.remote, Role::AutonomousProxy);
    }
    assert_eq!(roles, Roles::new(Role::Authority, Role::AutonomousProxy));
}

#[test]
fn context_restores_roles_on_panic() {
    let mut roles = Roles::new(Role::Authority, Role::AutonomousProxy);

    let result = catch_unwind(AssertUnwindSafe(|| {
        let scoped = roles.set_context(false);
        assert_eq!(scoped.remote, Role::SimulatedProxy);
        panic!("replication hook failed");
    }));

    assert!(result.is_err());
    assert_eq!(roles, Roles::new(Role::Authority, Role::AutonomousProxy));
    assert_eq!(roles.context(), None);
}

#[test]
fn replicable_context_restores_on_panic() {
    let protocol = protocol();
    let mut world = World::new(protocol.max_id());
    let scene = world.create_scene("arena").unwrap();
    let key = world.spawn(scene, protocol.kind(PAWN).unwrap()).unwrap();
    let pawn = world.get_mut(key).unwrap();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let scoped = pawn.ownership_context(false);
        assert_eq!(scoped.roles().remote, Role::SimulatedProxy);
        panic!("condition failed");
    }));

    assert!(result.is_err());
    assert_eq!(
        world.get(key).unwrap().roles(),
        Roles::new(Role::Authority, Role::AutonomousProxy)
    );
}

#[test]
fn description_changes_with_context() {
    let mut roles = Roles::new(Role::Authority, Role::AutonomousProxy);
    let plain = roles.description();
    let owner = roles.set_context(true).description();
    let other = roles.set_context(false).description();

    assert_ne!(plain, owner);
    assert_ne!(owner, other);
    assert_eq!(roles.description(), plain);
}
