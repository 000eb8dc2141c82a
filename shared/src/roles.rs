use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    ops::{Deref, DerefMut},
};

use log::trace;

/// Authority level a host holds over a replicable, ordered from least to most
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    None,
    DumbProxy,
    SimulatedProxy,
    AutonomousProxy,
    Authority,
}

impl Role {
    pub fn to_u8(self) -> u8 {
        match self {
            Role::None => 0,
            Role::DumbProxy => 1,
            Role::SimulatedProxy => 2,
            Role::AutonomousProxy => 3,
            Role::Authority => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Role::None),
            1 => Some(Role::DumbProxy),
            2 => Some(Role::SimulatedProxy),
            3 => Some(Role::AutonomousProxy),
            4 => Some(Role::Authority),
            _ => None,
        }
    }

    /// Whether a host holding this role may invoke an RPC.
    ///
    /// Simulated RPCs are open to simulated and autonomous proxies; every
    /// other RPC requires authority.
    pub fn permits(self, simulated: bool) -> bool {
        self == Role::Authority || (simulated && self >= Role::SimulatedProxy)
    }
}

/// The local and remote roles of a replicable, as seen from one host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Roles {
    pub local: Role,
    pub remote: Role,
    context: Option<bool>,
}

/// State needed to undo an ownership context
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContextRestore {
    substituted: bool,
    previous_context: Option<bool>,
}

impl Roles {
    pub fn new(local: Role, remote: Role) -> Self {
        Self {
            local,
            remote,
            context: None,
        }
    }

    /// The active ownership context, if any
    pub fn context(&self) -> Option<bool> {
        self.context
    }

    /// The same roles seen from the other end of the connection
    pub fn switched(&self) -> Self {
        Self::new(self.remote, self.local)
    }

    /// Fingerprint over context, local and remote roles
    pub fn description(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        (self.context, self.local, self.remote).hash(&mut hasher);
        hasher.finish()
    }

    /// Enters an ownership context for the lifetime of the returned guard.
    ///
    /// An autonomous proxy is presented to non-owners as a simulated proxy.
    /// The guard restores the previous state on drop, including when
    /// unwinding.
    pub fn set_context(&mut self, is_owner: bool) -> RolesContext<'_> {
        let restore = self.enter_context(is_owner);
        RolesContext {
            roles: self,
            restore,
        }
    }

    pub(crate) fn enter_context(&mut self, is_owner: bool) -> ContextRestore {
        let substituted = !is_owner && self.remote == Role::AutonomousProxy;
        if substituted {
            self.remote = Role::SimulatedProxy;
        }
        let previous_context = self.context.replace(is_owner);
        trace!("Roles: entered context is_owner={is_owner}, substituted={substituted}");
        ContextRestore {
            substituted,
            previous_context,
        }
    }

    pub(crate) fn exit_context(&mut self, restore: ContextRestore) {
        if restore.substituted {
            self.remote = Role::AutonomousProxy;
        }
        self.context = restore.previous_context;
    }
}

impl Default for Roles {
    fn default() -> Self {
        Self::new(Role::Authority, Role::None)
    }
}

/// Scope guard returned by [`Roles::set_context`]
pub struct RolesContext<'a> {
    roles: &'a mut Roles,
    restore: ContextRestore,
}

impl Deref for RolesContext<'_> {
    type Target = Roles;

    fn deref(&self) -> &Self::Target {
        self.roles
    }
}

impl DerefMut for RolesContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.roles
    }
}

impl Drop for RolesContext<'_> {
    fn drop(&mut self) {
        self.roles.exit_context(self.restore);
    }
}
