use thiserror::Error;

use crate::{
    handler::{DataType, HandlerError},
    types::{ReplicableId, ReplicableKey, SceneId},
};

/// Errors raised while defining replicable kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KindError {
    #[error("Kind '{kind}' declares field '{field}' more than once, or redeclares an inherited field")]
    DuplicateField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Kind '{kind}' declares RPC '{rpc}' more than once")]
    DuplicateRpc {
        kind: &'static str,
        rpc: &'static str,
    },

    #[error("Kind '{name}' is already registered")]
    DuplicateKind { name: &'static str },

    /// Parents must be added to the protocol before their children
    #[error("Kind '{name}' is not registered. Parents must be added before the kinds extending them")]
    UnknownKind { name: String },

    #[error("Kind '{kind}' overrides the initial value of unknown field '{field}'")]
    UnknownField {
        kind: &'static str,
        field: &'static str,
    },

    /// A field was declared by an example value whose type can't be inferred
    #[error("Field '{field}' must be given a data type or a typed initial value")]
    UntypedField { field: &'static str },

    #[error("Initial value of field '{field}' in kind '{kind}' is a {found}, which '{expected}' does not accept")]
    InvalidInitialValue {
        kind: &'static str,
        field: &'static str,
        expected: DataType,
        found: &'static str,
    },

    #[error("Kind '{kind}' has {count} RPCs, more than the 256 an RPC index can address")]
    TooManyRpcs { kind: &'static str, count: usize },

    /// Handler lookup failed for a field or RPC parameter
    #[error("Kind '{kind}' member '{member}' has no usable handler: {source}")]
    Handler {
        kind: &'static str,
        member: &'static str,
        #[source]
        source: HandlerError,
    },
}

/// Errors raised by operations on a replicable instance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicableError {
    #[error("Kind '{kind}' has no field named '{field}'")]
    UnknownField { kind: &'static str, field: String },

    #[error("Kind '{kind}' has no field at index {index}")]
    UnknownFieldIndex { kind: &'static str, index: usize },

    #[error("Kind '{kind}' has no RPC named '{rpc}'")]
    UnknownRpc { kind: &'static str, rpc: String },

    #[error("Kind '{kind}' has no RPC at index {index}")]
    UnknownRpcIndex { kind: &'static str, index: u8 },

    /// Assignment of a value the field's type does not accept
    #[error("Field '{field}' of type '{expected}' cannot hold a {found} value")]
    TypeMismatch {
        field: &'static str,
        expected: DataType,
        found: &'static str,
    },

    #[error("RPC '{rpc}' takes {expected} arguments, {actual} were given")]
    WrongArgumentCount {
        rpc: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Argument {position} of RPC '{rpc}' cannot be a {found} value")]
    ArgumentMismatch {
        rpc: &'static str,
        position: usize,
        found: &'static str,
    },

    /// Remote attribute writes are only accepted from the authority
    #[error("Replicable {key} refused a remote write: the sender is not its authority")]
    PermissionDenied { key: ReplicableKey },

    #[error("Owner chain starting at replicable {id} does not terminate")]
    OwnerCycle { id: ReplicableId },
}

/// Errors raised by scene and world bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("No scene with id {scene}")]
    UnknownScene { scene: SceneId },

    #[error("Scene id {scene} is already in use")]
    DuplicateScene { scene: SceneId },

    #[error("No replicable with key {key}")]
    UnknownReplicable { key: ReplicableKey },

    #[error("Unique id {key} is already taken by a live replicable")]
    DuplicateId { key: ReplicableKey },

    #[error("Scene {scene} has no free unique ids left (maximum {max_id})")]
    IdsExhausted { scene: SceneId, max_id: ReplicableId },

    #[error("Unique id {id} exceeds the maximum of {max_id}")]
    IdOutOfRange { id: ReplicableId, max_id: ReplicableId },

    #[error("Scene ids are exhausted")]
    SceneIdsExhausted,

    #[error(transparent)]
    Replicable(#[from] ReplicableError),
}
