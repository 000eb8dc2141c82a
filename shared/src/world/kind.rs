use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use log::info;

use crate::{
    handler::{DataType, DescriptionRegistry, HandlerRegistry, TypeFlag},
    roles::{Role, Roles},
    types::RpcIndex,
    value::Value,
};

use super::{Field, FieldDescriptor, KindError, Replicable, Rpc, RpcDescriptor};

/// Name of the kind every other kind descends from
pub const ROOT_KIND: &str = "replicable";

pub const ROLES_FIELD: &str = "roles";
pub const OWNER_FIELD: &str = "owner";
pub const TORN_OFF_FIELD: &str = "torn_off";

pub(crate) const ROLES_INDEX: usize = 0;
pub(crate) const OWNER_INDEX: usize = 1;
pub(crate) const TORN_OFF_INDEX: usize = 2;

/// Minimum time between two attribute updates of one replicable on one
/// connection, unless a kind sets its own
pub const DEFAULT_UPDATE_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Relative share of each send's update budget, unless a kind sets its own
pub const DEFAULT_PRIORITY: f32 = 1.0;

/// The circumstances a replication pass runs under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReplicationContext {
    /// The receiving connection owns the replicable (through its owner chain)
    pub is_owner: bool,
    /// First replication of the replicable to this connection
    pub is_initial: bool,
}

/// Names the fields a kind offers for replication in a given context.
/// Must be deterministic: the receiver replays it to decode updates.
pub type ConditionFn = Arc<dyn Fn(&Replicable, ReplicationContext) -> Vec<&'static str> + Send + Sync>;

/// Called with the field name after a remote write to a notify field
pub type NotifyFn = Arc<dyn Fn(&mut Replicable, &str) + Send + Sync>;

/// Declares a replicable kind; turned into a frozen [`ReplicableKind`] when
/// added to a protocol
pub struct KindBuilder {
    name: &'static str,
    parent: &'static str,
    fields: Vec<Field>,
    initial_overrides: Vec<(&'static str, Value)>,
    rpcs: Vec<Rpc>,
    condition: Option<ConditionFn>,
    notify: Option<NotifyFn>,
    update_period: Option<Duration>,
    priority: Option<f32>,
    replicate_to_owner: Option<bool>,
}

impl KindBuilder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: ROOT_KIND,
            fields: Vec::new(),
            initial_overrides: Vec::new(),
            rpcs: Vec::new(),
            condition: None,
            notify: None,
            update_period: None,
            priority: None,
            replicate_to_owner: None,
        }
    }

    pub fn extends(mut self, parent: &'static str) -> Self {
        self.parent = parent;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces the initial value of an inherited field
    pub fn initial(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.initial_overrides.push((field, value.into()));
        self
    }

    /// Sets the default roles of new instances
    pub fn roles(self, local: Role, remote: Role) -> Self {
        self.initial(ROLES_FIELD, Roles::new(local, remote))
    }

    pub fn rpc(mut self, rpc: Rpc) -> Self {
        self.rpcs.push(rpc);
        self
    }

    /// Adds this kind's replication conditions, evaluated after its parent's
    pub fn replicate_when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Replicable, ReplicationContext) -> Vec<&'static str> + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Adds a hook run after remote writes to notify fields, after the
    /// parent's hooks
    pub fn on_replicated<F>(mut self, notify: F) -> Self
    where
        F: Fn(&mut Replicable, &str) + Send + Sync + 'static,
    {
        self.notify = Some(Arc::new(notify));
        self
    }

    /// Minimum time between attribute updates to one connection.
    /// Inherited when not set.
    pub fn update_period(mut self, period: Duration) -> Self {
        self.update_period = Some(period);
        self
    }

    /// Orders replicables when a send's update budget runs out: higher
    /// priorities are written first, the rest wait for a later send.
    /// Inherited when not set.
    pub fn priority(mut self, priority: f32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Whether attribute updates after the initial one go to the owning
    /// connection. Inherited when not set.
    pub fn replicate_to_owner(mut self, replicate: bool) -> Self {
        self.replicate_to_owner = Some(replicate);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> &'static str {
        self.parent
    }

    /// The base kind: roles, owner and torn_off
    pub(crate) fn root() -> Self {
        Self {
            name: ROOT_KIND,
            parent: ROOT_KIND,
            fields: vec![
                Field::new(ROLES_FIELD, TypeFlag::roles()).initial(Roles::default()),
                Field::new(OWNER_FIELD, TypeFlag::replicable()).initial(Value::Replicable(None)),
                Field::new(TORN_OFF_FIELD, TypeFlag::boolean())
                    .initial(false)
                    .notify(),
            ],
            initial_overrides: Vec::new(),
            rpcs: Vec::new(),
            condition: Some(Arc::new(|_: &Replicable, context: ReplicationContext| {
                let mut names = Vec::with_capacity(3);
                if context.is_initial {
                    names.push(ROLES_FIELD);
                }
                names.push(OWNER_FIELD);
                names.push(TORN_OFF_FIELD);
                names
            })),
            notify: Some(Arc::new(|replicable: &mut Replicable, name: &str| {
                if name == TORN_OFF_FIELD && replicable.torn_off() {
                    let mut roles = replicable.roles();
                    roles.local = Role::Authority;
                    replicable.set_roles(roles);
                }
            })),
            update_period: Some(DEFAULT_UPDATE_PERIOD),
            priority: Some(DEFAULT_PRIORITY),
            replicate_to_owner: Some(true),
        }
    }

    /// Freezes the declaration on top of `parent`, resolving every handler
    pub(crate) fn build(
        self,
        parent: Option<&ReplicableKind>,
        handlers: &HandlerRegistry,
        descriptions: &DescriptionRegistry,
    ) -> Result<ReplicableKind, KindError> {
        let kind = self.name;
        let data_type = DataType::new(kind);

        let mut ancestors = Vec::new();
        let mut fields = Vec::new();
        let mut rpcs = Vec::new();
        let mut conditions = Vec::new();
        let mut notifiers = Vec::new();
        let mut update_period = DEFAULT_UPDATE_PERIOD;
        let mut priority = DEFAULT_PRIORITY;
        let mut replicate_to_owner = true;
        if let Some(parent) = parent {
            update_period = parent.update_period;
            priority = parent.priority;
            replicate_to_owner = parent.replicate_to_owner;
            ancestors.push(parent.name);
            ancestors.extend(parent.ancestors.iter().copied());
            fields = parent.fields.clone();
            rpcs = parent.rpcs.clone();
            conditions = parent.conditions.clone();
            notifiers = parent.notifiers.clone();
        }
        let ancestor_types: Vec<DataType> = ancestors.iter().copied().map(DataType::new).collect();
        handlers.declare_type(data_type, &ancestor_types);

        // fields: inherited ones keep their indices, new ones append
        let mut field_lookup: HashMap<&'static str, usize> = fields
            .iter()
            .map(|descriptor: &FieldDescriptor| (descriptor.name(), descriptor.index()))
            .collect();
        for field in self.fields {
            let name = field.name();
            if field_lookup.contains_key(name) {
                return Err(KindError::DuplicateField { kind, field: name });
            }
            let field_type = field.flag().data_type();
            let handler = handlers
                .resolve(field.flag())
                .map_err(|source| KindError::Handler {
                    kind,
                    member: name,
                    source,
                })?;
            let describe = descriptions.resolve(field_type, &handlers.ancestors_of(field_type));
            let index = fields.len();
            let descriptor = FieldDescriptor::new(index, field, handler, describe);
            check_initial(kind, &descriptor, descriptor.field().initial_value())?;
            field_lookup.insert(name, index);
            fields.push(descriptor);
        }
        for (name, value) in self.initial_overrides {
            let index = *field_lookup
                .get(name)
                .ok_or(KindError::UnknownField { kind, field: name })?;
            check_initial(kind, &fields[index], &value)?;
            fields[index].set_initial(value);
        }

        // RPCs: a redeclared name replaces the body at the inherited index
        let mut rpc_lookup: HashMap<&'static str, usize> = rpcs
            .iter()
            .map(|descriptor: &RpcDescriptor| (descriptor.name(), usize::from(descriptor.index())))
            .collect();
        let mut declared_here = Vec::new();
        for rpc in self.rpcs {
            let name = rpc.name();
            if declared_here.contains(&name) {
                return Err(KindError::DuplicateRpc { kind, rpc: name });
            }
            declared_here.push(name);

            let parameter_handlers = rpc
                .parameters()
                .iter()
                .map(|flag| handlers.resolve(flag))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| KindError::Handler {
                    kind,
                    member: name,
                    source,
                })?;

            let position = match rpc_lookup.get(name) {
                Some(position) => *position,
                None => rpcs.len(),
            };
            let Ok(index) = RpcIndex::try_from(position) else {
                return Err(KindError::TooManyRpcs {
                    kind,
                    count: position + 1,
                });
            };
            let descriptor = RpcDescriptor::new(index, rpc, parameter_handlers);
            if position == rpcs.len() {
                rpc_lookup.insert(name, position);
                rpcs.push(descriptor);
            } else {
                rpcs[position] = descriptor;
            }
        }

        conditions.extend(self.condition);
        notifiers.extend(self.notify);
        let update_period = self.update_period.unwrap_or(update_period);
        let priority = self.priority.unwrap_or(priority);
        let replicate_to_owner = self.replicate_to_owner.unwrap_or(replicate_to_owner);

        info!(
            "ReplicableKind: Built '{kind}' with {} fields and {} RPCs",
            fields.len(),
            rpcs.len()
        );

        Ok(ReplicableKind {
            name: kind,
            ancestors,
            fields,
            field_lookup,
            rpcs,
            rpc_lookup,
            conditions,
            notifiers,
            update_period,
            priority,
            replicate_to_owner,
        })
    }
}

fn check_initial(kind: &'static str, descriptor: &FieldDescriptor, value: &Value) -> Result<(), KindError> {
    if descriptor.accepts(value) {
        return Ok(());
    }
    Err(KindError::InvalidInitialValue {
        kind,
        field: descriptor.name(),
        expected: descriptor.field().flag().data_type(),
        found: value.type_name(),
    })
}

/// The frozen schema of a replicable kind, shared by all its instances
pub struct ReplicableKind {
    name: &'static str,
    /// Nearest first, ending with the root kind
    ancestors: Vec<&'static str>,
    fields: Vec<FieldDescriptor>,
    field_lookup: HashMap<&'static str, usize>,
    rpcs: Vec<RpcDescriptor>,
    rpc_lookup: HashMap<&'static str, usize>,
    conditions: Vec<ConditionFn>,
    notifiers: Vec<NotifyFn>,
    update_period: Duration,
    priority: f32,
    replicate_to_owner: bool,
}

impl ReplicableKind {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn data_type(&self) -> DataType {
        DataType::new(self.name)
    }

    pub fn ancestors(&self) -> &[&'static str] {
        &self.ancestors
    }

    /// Whether this kind is `name` or descends from it
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|ancestor| *ancestor == name)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_lookup.get(name).copied()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index(name).and_then(|index| self.fields.get(index))
    }

    pub fn rpcs(&self) -> &[RpcDescriptor] {
        &self.rpcs
    }

    pub fn rpc(&self, index: RpcIndex) -> Option<&RpcDescriptor> {
        self.rpcs.get(usize::from(index))
    }

    pub fn rpc_by_name(&self, name: &str) -> Option<&RpcDescriptor> {
        self.rpc_lookup
            .get(name)
            .and_then(|position| self.rpcs.get(*position))
    }

    pub fn update_period(&self) -> Duration {
        self.update_period
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn replicates_to_owner(&self) -> bool {
        self.replicate_to_owner
    }

    pub(crate) fn conditions(&self) -> &[ConditionFn] {
        &self.conditions
    }

    pub(crate) fn notifiers(&self) -> &[NotifyFn] {
        &self.notifiers
    }

    pub(crate) fn initial_values(&self) -> Vec<Value> {
        self.fields
            .iter()
            .map(|descriptor| descriptor.field().initial_value().clone())
            .collect()
    }
}

impl fmt::Debug for ReplicableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicableKind")
            .field("name", &self.name)
            .field("ancestors", &self.ancestors)
            .field("fields", &self.fields)
            .field("rpcs", &self.rpcs)
            .field("update_period", &self.update_period)
            .field("priority", &self.priority)
            .finish()
    }
}
