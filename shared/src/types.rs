use std::fmt;

pub type PacketIndex = u16;
pub type MessageIndex = u16;
pub type SceneId = u16;
pub type ReplicableId = u64;
pub type RpcIndex = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }
}

/// Identity of a replicable: unique id within its scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicableKey {
    pub scene: SceneId,
    pub id: ReplicableId,
}

impl ReplicableKey {
    pub fn new(scene: SceneId, id: ReplicableId) -> Self {
        Self { scene, id }
    }
}

impl fmt::Display for ReplicableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scene, self.id)
    }
}
