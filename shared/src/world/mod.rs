mod error;
mod field;
mod kind;
mod kinds;
mod replicable;
mod rpc;
mod scene;
mod world;

pub use error::{KindError, ReplicableError, SceneError};
pub use field::{Field, FieldDescriptor};
pub use kind::{
    ConditionFn, KindBuilder, NotifyFn, ReplicableKind, ReplicationContext, DEFAULT_PRIORITY,
    DEFAULT_UPDATE_PERIOD, OWNER_FIELD, ROLES_FIELD, ROOT_KIND, TORN_OFF_FIELD,
};
pub use kinds::ReplicableKinds;
pub use replicable::{OwnershipContext, Replicable};
pub use rpc::{Rpc, RpcBody, RpcCall, RpcDescriptor, RpcOutcome};
pub use scene::{IdAllocator, Scene};
pub use world::World;
