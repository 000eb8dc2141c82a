use std::{fmt, sync::Arc};

use crate::{
    handler::{Handler, TypeFlag},
    types::{HostType, RpcIndex},
    value::Value,
};

use super::Replicable;

pub type RpcBody = Arc<dyn Fn(&mut Replicable, &[Value]) + Send + Sync>;

/// Declaration of a remote procedure.
///
/// Calling it on its `target` host runs the body; calling it on the other
/// host queues it for the connection to send.
#[derive(Clone)]
pub struct Rpc {
    name: &'static str,
    target: HostType,
    parameters: Vec<TypeFlag>,
    reliable: bool,
    simulated: bool,
    body: RpcBody,
}

impl Rpc {
    pub fn new<F>(name: &'static str, target: HostType, body: F) -> Self
    where
        F: Fn(&mut Replicable, &[Value]) + Send + Sync + 'static,
    {
        Self {
            name,
            target,
            parameters: Vec::new(),
            reliable: false,
            simulated: false,
            body: Arc::new(body),
        }
    }

    pub fn parameter(mut self, flag: TypeFlag) -> Self {
        self.parameters.push(flag);
        self
    }

    /// Resend until acknowledged
    pub fn reliable(mut self) -> Self {
        self.reliable = true;
        self
    }

    /// Simulated proxies may invoke it too
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn target(&self) -> HostType {
        self.target
    }

    pub fn parameters(&self) -> &[TypeFlag] {
        &self.parameters
    }

    pub fn is_reliable(&self) -> bool {
        self.reliable
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    pub(crate) fn body(&self) -> RpcBody {
        self.body.clone()
    }
}

impl fmt::Debug for Rpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rpc")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("parameters", &self.parameters)
            .field("reliable", &self.reliable)
            .field("simulated", &self.simulated)
            .finish()
    }
}

/// An RPC bound into a kind at a stable wire index
#[derive(Clone, Debug)]
pub struct RpcDescriptor {
    index: RpcIndex,
    rpc: Rpc,
    handlers: Vec<Arc<dyn Handler>>,
}

impl RpcDescriptor {
    pub(crate) fn new(index: RpcIndex, rpc: Rpc, handlers: Vec<Arc<dyn Handler>>) -> Self {
        Self {
            index,
            rpc,
            handlers,
        }
    }

    pub fn index(&self) -> RpcIndex {
        self.index
    }

    pub fn rpc(&self) -> &Rpc {
        &self.rpc
    }

    pub fn name(&self) -> &'static str {
        self.rpc.name
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }
}

/// A queued invocation waiting to be sent
#[derive(Clone, Debug, PartialEq)]
pub struct RpcCall {
    pub index: RpcIndex,
    pub arguments: Vec<Value>,
}

/// What became of a call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcOutcome {
    /// The body ran on this host
    Executed,
    /// Queued for the remote host
    Queued,
    /// The caller's role does not permit the call; nothing happened
    Refused,
}
