use std::sync::Arc;

use log::info;

use replicant_serde::{ByteReader, ByteWriter, IntegerWidth, SerdeErr};

use crate::{
    handler::{
        DataType, Description, DescriptionRegistry, Handler, HandlerError, HandlerRegistry,
        KindHandler, ReplicableRefHandler, RolesHandler, TypeFlag,
    },
    types::{ReplicableId, ReplicableKey, SceneId},
    value::Value,
    world::{KindBuilder, ReplicableKind, ReplicableKinds},
};

pub mod error;
pub use error::ProtocolError;

/// Default bound on live replicables per scene
pub const DEFAULT_MAX_REPLICABLES: u64 = 255;

const SCENE_WIDTH: IntegerWidth = IntegerWidth::W16;

// Protocol
pub struct Protocol {
    pub handlers: HandlerRegistry,
    pub descriptions: DescriptionRegistry,
    kinds: Option<ReplicableKinds>,
    pending_kinds: Vec<KindBuilder>,
    /// Fixes the wire width of replicable unique ids
    max_replicables: u64,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        let handlers = HandlerRegistry::new();
        handlers.insert_factory(DataType::ROLES, Arc::new(|_, _| Ok(Arc::new(RolesHandler))));
        handlers.insert_factory(
            DataType::KIND,
            Arc::new(|_, _| Ok(Arc::new(KindHandler::default()))),
        );

        Self {
            handlers,
            descriptions: DescriptionRegistry::new(),
            kinds: None,
            pending_kinds: Vec::new(),
            max_replicables: DEFAULT_MAX_REPLICABLES,
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn max_replicables(&mut self, max_replicables: u64) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        if max_replicables == 0 {
            return Err(ProtocolError::NoReplicables);
        }
        self.max_replicables = max_replicables;
        Ok(self)
    }

    pub fn add_handler<F>(&mut self, data_type: DataType, factory: F) -> Result<&mut Self, ProtocolError>
    where
        F: Fn(&TypeFlag, &HandlerRegistry) -> Result<Arc<dyn Handler>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.try_check_lock()?;
        self.handlers.register(data_type, factory)?;
        Ok(self)
    }

    pub fn add_description<F>(&mut self, data_type: DataType, function: F) -> Result<&mut Self, ProtocolError>
    where
        F: Fn(&Value) -> Description + Send + Sync + 'static,
    {
        self.try_check_lock()?;
        self.descriptions.register(data_type, function)?;
        Ok(self)
    }

    pub fn declare_type(&mut self, data_type: DataType, ancestors: &[DataType]) -> &mut Self {
        self.handlers.declare_type(data_type, ancestors);
        self
    }

    /// Queues a kind; kinds are built in the order added when the protocol
    /// locks, so parents must come before their children
    pub fn add_kind(&mut self, kind: KindBuilder) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        info!("Protocol: Adding kind '{}'", kind.name());
        self.pending_kinds.push(kind);
        Ok(self)
    }

    /// Freezes the protocol, resolving every kind's handlers
    pub fn lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;

        let id_width = self.id_width();
        self.handlers.register(DataType::REPLICABLE, move |_, _| {
            Ok(Arc::new(ReplicableRefHandler::new(id_width)))
        })?;

        let mut kinds = ReplicableKinds::new(&self.handlers, &self.descriptions)?;
        for builder in std::mem::take(&mut self.pending_kinds) {
            kinds.add(builder, &self.handlers, &self.descriptions)?;
        }
        info!("Protocol: Locked with {} kinds", kinds.len());

        self.kinds = Some(kinds);
        self.locked = true;
        Ok(())
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Locks if needed and takes the finished protocol
    pub fn build(&mut self) -> Result<Self, ProtocolError> {
        if !self.locked {
            self.lock()?;
        }
        Ok(std::mem::take(self))
    }

    // Queries

    pub fn kind(&self, name: &str) -> Option<&Arc<ReplicableKind>> {
        self.kinds.as_ref()?.get(name)
    }

    pub fn kinds(&self) -> Option<&ReplicableKinds> {
        self.kinds.as_ref()
    }

    pub fn get_max_replicables(&self) -> u64 {
        self.max_replicables
    }

    /// Largest unique id a scene may hand out
    pub fn max_id(&self) -> ReplicableId {
        self.max_replicables.saturating_sub(1)
    }

    pub fn id_width(&self) -> IntegerWidth {
        IntegerWidth::for_unsigned(self.max_id())
    }

    pub fn resolve(&self, flag: &TypeFlag) -> Result<Arc<dyn Handler>, HandlerError> {
        self.handlers.resolve(flag)
    }

    pub fn describe(&self, flag: &TypeFlag, value: &Value) -> Description {
        let data_type = flag.data_type();
        self.descriptions
            .describe(data_type, &self.handlers.ancestors_of(data_type), value)
    }

    // Wire identity of replicables

    pub fn write_scene(&self, scene: SceneId, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        SCENE_WIDTH.write_unsigned(u64::from(scene), writer)
    }

    pub fn read_scene(&self, reader: &mut ByteReader) -> Result<SceneId, SerdeErr> {
        let scene = SCENE_WIDTH.read_unsigned(reader)?;
        SceneId::try_from(scene).map_err(|_| SerdeErr::ValueTooLarge {
            value: i128::from(scene),
            bytes: SCENE_WIDTH.bytes(),
        })
    }

    pub fn write_key(&self, key: ReplicableKey, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        self.write_scene(key.scene, writer)?;
        self.id_width().write_unsigned(key.id, writer)
    }

    pub fn read_key(&self, reader: &mut ByteReader) -> Result<ReplicableKey, SerdeErr> {
        let scene = self.read_scene(reader)?;
        let id = self.id_width().read_unsigned(reader)?;
        Ok(ReplicableKey::new(scene, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Field, KindError};

    #[test]
    fn locked_protocol_rejects_changes() {
        let mut protocol = Protocol::builder();
        protocol.lock().unwrap();

        assert_eq!(
            protocol.add_kind(KindBuilder::new("Late")).err(),
            Some(ProtocolError::AlreadyLocked)
        );
        assert_eq!(
            protocol.max_replicables(10).err(),
            Some(ProtocolError::AlreadyLocked)
        );
    }

    #[test]
    fn id_width_follows_max_replicables() {
        let mut protocol = Protocol::builder();
        assert_eq!(protocol.id_width(), IntegerWidth::W8);
        protocol.max_replicables(256).unwrap();
        assert_eq!(protocol.id_width(), IntegerWidth::W8);
        protocol.max_replicables(257).unwrap();
        assert_eq!(protocol.id_width(), IntegerWidth::W16);
        assert_eq!(protocol.max_replicables(0).err(), Some(ProtocolError::NoReplicables));
    }

    #[test]
    fn build_creates_root_and_user_kinds() {
        let protocol = Protocol::builder()
            .add_kind(KindBuilder::new("Pawn").field(Field::new("health", TypeFlag::integer())))
            .unwrap()
            .build()
            .unwrap();

        assert!(protocol.kind("replicable").is_some());
        let pawn = protocol.kind("Pawn").unwrap();
        assert!(pawn.is_a("replicable"));
        assert_eq!(pawn.field_index("health"), Some(3));
    }

    #[test]
    fn child_before_parent_is_rejected() {
        let result = Protocol::builder()
            .add_kind(KindBuilder::new("Child").extends("Parent"))
            .unwrap()
            .add_kind(KindBuilder::new("Parent"))
            .unwrap()
            .build();

        assert_eq!(
            result.err(),
            Some(ProtocolError::Kind(KindError::UnknownKind {
                name: "Parent".to_string()
            }))
        );
    }

    #[test]
    fn keys_round_trip_at_id_width() {
        let mut protocol = Protocol::builder();
        protocol.max_replicables(1000).unwrap();
        let protocol = protocol.build().unwrap();

        let key = ReplicableKey::new(3, 999);
        let mut writer = ByteWriter::new();
        protocol.write_key(key, &mut writer).unwrap();
        let bytes = writer.to_bytes();
        assert_eq!(bytes.len(), 4);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(protocol.read_key(&mut reader).unwrap(), key);
    }
}
