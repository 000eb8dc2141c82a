use std::{
    collections::HashSet,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use log::{trace, warn};

use crate::{
    roles::{ContextRestore, Role, Roles},
    types::{HostType, ReplicableId, ReplicableKey, RpcIndex, SceneId},
    value::Value,
};

use super::{
    kind::{OWNER_INDEX, ROLES_INDEX, TORN_OFF_INDEX},
    ReplicableError, ReplicableKind, ReplicationContext, RpcCall, RpcOutcome,
};

/// A live instance of a replicable kind.
///
/// Holds one value per field of its kind, indexed as the kind's fields are,
/// and the RPC calls queued for the remote host.
#[derive(Debug)]
pub struct Replicable {
    key: ReplicableKey,
    kind: Arc<ReplicableKind>,
    data: Vec<Value>,
    outgoing_calls: Vec<RpcCall>,
}

impl Replicable {
    pub(crate) fn new(key: ReplicableKey, kind: Arc<ReplicableKind>) -> Self {
        let data = kind.initial_values();
        Self {
            key,
            kind,
            data,
            outgoing_calls: Vec::new(),
        }
    }

    pub fn key(&self) -> ReplicableKey {
        self.key
    }

    pub fn id(&self) -> ReplicableId {
        self.key.id
    }

    pub fn scene(&self) -> SceneId {
        self.key.scene
    }

    pub fn kind(&self) -> &Arc<ReplicableKind> {
        &self.kind
    }

    // Fields

    pub fn get(&self, name: &str) -> Result<&Value, ReplicableError> {
        let index = self.field_index(name)?;
        Ok(&self.data[index])
    }

    /// Assigns a field. Values the field's type does not accept are
    /// rejected and the field keeps its value.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ReplicableError> {
        let index = self.field_index(name)?;
        self.set_index(index, value.into())
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.data.get(index)
    }

    pub fn set_index(&mut self, index: usize, value: Value) -> Result<(), ReplicableError> {
        let Some(descriptor) = self.kind.field(index) else {
            return Err(ReplicableError::UnknownFieldIndex {
                kind: self.kind.name(),
                index,
            });
        };
        if !descriptor.accepts(&value) {
            return Err(ReplicableError::TypeMismatch {
                field: descriptor.name(),
                expected: descriptor.field().flag().data_type(),
                found: value.type_name(),
            });
        }
        self.data[index] = value;
        Ok(())
    }

    fn field_index(&self, name: &str) -> Result<usize, ReplicableError> {
        self.kind
            .field_index(name)
            .ok_or_else(|| ReplicableError::UnknownField {
                kind: self.kind.name(),
                field: name.to_string(),
            })
    }

    // Base fields

    /// Current roles; an unset roles field reads as no roles at all
    pub fn roles(&self) -> Roles {
        match &self.data[ROLES_INDEX] {
            Value::Roles(roles) => *roles,
            _ => Roles::new(Role::None, Role::None),
        }
    }

    pub fn set_roles(&mut self, roles: Roles) {
        self.data[ROLES_INDEX] = Value::Roles(roles);
    }

    pub fn owner(&self) -> Option<ReplicableId> {
        match &self.data[OWNER_INDEX] {
            Value::Replicable(owner) => *owner,
            _ => None,
        }
    }

    pub fn set_owner(&mut self, owner: Option<ReplicableId>) {
        self.data[OWNER_INDEX] = Value::Replicable(owner);
    }

    pub fn torn_off(&self) -> bool {
        matches!(self.data[TORN_OFF_INDEX], Value::Bool(true))
    }

    /// Detaches the replicable from its authority: the next update tells
    /// remote copies to take authority over themselves
    pub fn tear_off(&mut self) {
        self.data[TORN_OFF_INDEX] = Value::Bool(true);
    }

    /// Presents the roles as a connection with the given ownership sees
    /// them, until the guard drops
    pub fn ownership_context(&mut self, is_owner: bool) -> OwnershipContext<'_> {
        let mut roles = self.roles();
        let restore = roles.enter_context(is_owner);
        self.set_roles(roles);
        OwnershipContext {
            replicable: self,
            restore,
        }
    }

    // Replication

    /// Names of the fields offered for replication in `context`: the base
    /// fields first, then each kind's conditions from the root down.
    /// Unknown names are skipped with a warning, repeats are dropped.
    pub fn can_replicate(&self, is_owner: bool, is_initial: bool) -> Vec<&'static str> {
        self.replication_sequence(ReplicationContext {
            is_owner,
            is_initial,
        })
        .into_iter()
        .filter_map(|index| self.kind.field(index).map(|descriptor| descriptor.name()))
        .collect()
    }

    /// Field indices offered for replication, in order
    pub fn replication_sequence(&self, context: ReplicationContext) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut sequence = Vec::new();
        for condition in self.kind.conditions() {
            for name in condition(self, context) {
                match self.kind.field_index(name) {
                    Some(index) => {
                        if seen.insert(index) {
                            sequence.push(index);
                        }
                    }
                    None => warn!(
                        "Replicable: kind '{}' offered unknown field '{name}' for replication",
                        self.kind.name()
                    ),
                }
            }
        }
        sequence
    }

    /// Runs the kind's hooks for a committed remote write to `name`
    pub fn on_replicated(&mut self, name: &str) {
        let kind = self.kind.clone();
        for notify in kind.notifiers() {
            notify(self, name);
        }
    }

    // RPCs

    /// Calls an RPC from this host.
    ///
    /// Runs the body when `host` is the RPC's target, otherwise queues it
    /// for sending. Either way the local role must permit the call; refused
    /// calls have no effect.
    pub fn call(
        &mut self,
        name: &str,
        arguments: Vec<Value>,
        host: HostType,
    ) -> Result<RpcOutcome, ReplicableError> {
        let Some(descriptor) = self.kind.rpc_by_name(name) else {
            return Err(ReplicableError::UnknownRpc {
                kind: self.kind.name(),
                rpc: name.to_string(),
            });
        };
        let rpc = descriptor.rpc().clone();
        let index = descriptor.index();
        check_arguments(descriptor, &arguments)?;

        let role = self.roles().local;
        if !role.permits(rpc.is_simulated()) {
            warn!(
                "Replicable: {} refused call to '{name}': local role {role:?} is not permitted",
                self.key
            );
            return Ok(RpcOutcome::Refused);
        }

        if rpc.target() == host {
            let body = rpc.body();
            body(self, &arguments);
            Ok(RpcOutcome::Executed)
        } else {
            trace!("Replicable: {} queued call to '{name}'", self.key);
            self.outgoing_calls.push(RpcCall { index, arguments });
            Ok(RpcOutcome::Queued)
        }
    }

    /// Runs an RPC received from the remote host, provided the sender's
    /// role permits it and this host is its target
    pub fn invoke_remote(
        &mut self,
        index: RpcIndex,
        arguments: &[Value],
        sender_role: Role,
        host: HostType,
    ) -> Result<RpcOutcome, ReplicableError> {
        let Some(descriptor) = self.kind.rpc(index) else {
            return Err(ReplicableError::UnknownRpcIndex {
                kind: self.kind.name(),
                index,
            });
        };
        let rpc = descriptor.rpc().clone();
        check_arguments(descriptor, arguments)?;

        if rpc.target() != host || !sender_role.permits(rpc.is_simulated()) {
            warn!(
                "Replicable: {} refused remote call to '{}' from role {sender_role:?}",
                self.key,
                rpc.name()
            );
            return Ok(RpcOutcome::Refused);
        }
        let body = rpc.body();
        body(self, arguments);
        Ok(RpcOutcome::Executed)
    }

    pub fn has_outgoing_calls(&self) -> bool {
        !self.outgoing_calls.is_empty()
    }

    pub fn take_outgoing_calls(&mut self) -> Vec<RpcCall> {
        std::mem::take(&mut self.outgoing_calls)
    }
}

fn check_arguments(
    descriptor: &super::RpcDescriptor,
    arguments: &[Value],
) -> Result<(), ReplicableError> {
    let handlers = descriptor.handlers();
    if handlers.len() != arguments.len() {
        return Err(ReplicableError::WrongArgumentCount {
            rpc: descriptor.name(),
            expected: handlers.len(),
            actual: arguments.len(),
        });
    }
    for (position, (handler, argument)) in handlers.iter().zip(arguments).enumerate() {
        if !handler.accepts(argument) {
            return Err(ReplicableError::ArgumentMismatch {
                rpc: descriptor.name(),
                position,
                found: argument.type_name(),
            });
        }
    }
    Ok(())
}

/// Guard returned by [`Replicable::ownership_context`]; restores the roles
/// when dropped
pub struct OwnershipContext<'a> {
    replicable: &'a mut Replicable,
    restore: ContextRestore,
}

impl Deref for OwnershipContext<'_> {
    type Target = Replicable;

    fn deref(&self) -> &Self::Target {
        self.replicable
    }
}

impl DerefMut for OwnershipContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.replicable
    }
}

impl Drop for OwnershipContext<'_> {
    fn drop(&mut self) {
        let mut roles = self.replicable.roles();
        roles.exit_context(self.restore);
        self.replicable.set_roles(roles);
    }
}
