use std::{collections::HashMap, sync::Arc};

use crate::handler::{DescriptionRegistry, HandlerRegistry};

use super::{kind::ROOT_KIND, KindBuilder, KindError, ReplicableKind};

/// Every kind known to a protocol, by name, so remote peers can instantiate
/// them from a `create_replicable` message
pub struct ReplicableKinds {
    kinds: HashMap<&'static str, Arc<ReplicableKind>>,
    order: Vec<&'static str>,
}

impl ReplicableKinds {
    /// A registry holding only the root kind
    pub(crate) fn new(
        handlers: &HandlerRegistry,
        descriptions: &DescriptionRegistry,
    ) -> Result<Self, KindError> {
        let root = KindBuilder::root().build(None, handlers, descriptions)?;
        let mut kinds = HashMap::new();
        kinds.insert(ROOT_KIND, Arc::new(root));
        Ok(Self {
            kinds,
            order: vec![ROOT_KIND],
        })
    }

    pub(crate) fn add(
        &mut self,
        builder: KindBuilder,
        handlers: &HandlerRegistry,
        descriptions: &DescriptionRegistry,
    ) -> Result<Arc<ReplicableKind>, KindError> {
        let name = builder.name();
        if self.kinds.contains_key(name) {
            return Err(KindError::DuplicateKind { name });
        }
        let parent = self
            .kinds
            .get(builder.parent())
            .cloned()
            .ok_or(KindError::UnknownKind {
                name: builder.parent().to_string(),
            })?;
        let kind = Arc::new(builder.build(Some(&parent), handlers, descriptions)?);
        self.kinds.insert(name, kind.clone());
        self.order.push(name);
        Ok(kind)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ReplicableKind>> {
        self.kinds.get(name)
    }

    pub fn root(&self) -> Option<&Arc<ReplicableKind>> {
        self.kinds.get(ROOT_KIND)
    }

    /// Kinds in registration order, root first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ReplicableKind>> {
        self.order.iter().filter_map(|name| self.kinds.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
