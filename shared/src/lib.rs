//! # Replicant Shared
//! Common functionality shared between replicant-server & replicant-client
//! crates: the value handlers, the replicable world model, and the
//! connection that replicates one to the other.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use replicant_serde::{
    Bitfield, ByteReader, ByteWriter, FloatWidth, IntegerWidth, SerdeErr,
};

mod connection;
mod handler;
mod protocol;
mod roles;
mod timer;
mod types;
mod value;
mod world;
mod wrapping_number;

pub use connection::{
    AckManager, Channel, Connection, ConnectionConfig, ConnectionError, ConnectionEvent,
    ConnectionState, PacketError, PacketHeader, PacketProtocol, Received, ReliableReceiver,
    ReliableSender, Segment, UpdateBatch, UpdateOutcome,
};
pub use handler::{
    default_description, BitfieldHandler, BoolHandler, DataType, Description, DescriptionFn,
    DescriptionRegistry, FloatHandler, Handler, HandlerError, HandlerFactory, HandlerRegistry,
    KindHandler, LengthPrefixedHandler, ListHandler, Payload, ReplicableRefHandler, RolesHandler,
    SignedHandler, StructHandler, TypeFlag, UnsignedHandler, DEFAULT_INTEGER_BITS,
    DEFAULT_MAX_LENGTH,
};
pub use protocol::{Protocol, ProtocolError, DEFAULT_MAX_REPLICABLES};
pub use roles::{Role, Roles, RolesContext};
pub use timer::Timer;
pub use types::{
    HostType, MessageIndex, PacketIndex, ReplicableId, ReplicableKey, RpcIndex, SceneId,
};
pub use value::Value;
pub use world::{
    ConditionFn, Field, FieldDescriptor, IdAllocator, KindBuilder, KindError, NotifyFn,
    OwnershipContext, Replicable, ReplicableError, ReplicableKind, ReplicableKinds,
    ReplicationContext, Rpc, RpcBody, RpcCall, RpcDescriptor, RpcOutcome, Scene, SceneError,
    World, DEFAULT_PRIORITY, DEFAULT_UPDATE_PERIOD, OWNER_FIELD, ROLES_FIELD, ROOT_KIND,
    TORN_OFF_FIELD,
};
pub use wrapping_number::{sequence_greater_than, sequence_less_than, wrapping_diff};
