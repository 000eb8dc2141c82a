use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    sync::Arc,
};

use log::{debug, info};

use crate::{
    roles::{Role, Roles},
    types::{ReplicableId, ReplicableKey, SceneId},
};

use super::{Replicable, ReplicableError, ReplicableKind, SceneError};

/// Hands out unique ids, recycling freed ones once the fresh range is used up
pub struct IdAllocator {
    next: ReplicableId,
    max_id: ReplicableId,
    exhausted: bool,
    freed: VecDeque<ReplicableId>,
}

impl IdAllocator {
    pub fn new(max_id: ReplicableId) -> Self {
        Self {
            next: 0,
            max_id,
            exhausted: false,
            freed: VecDeque::new(),
        }
    }

    pub fn allocate(&mut self) -> Option<ReplicableId> {
        if !self.exhausted {
            let id = self.next;
            if id == self.max_id {
                self.exhausted = true;
            } else {
                self.next += 1;
            }
            return Some(id);
        }
        self.freed.pop_front()
    }

    /// Returns an id to the pool. Ids above the fresh range counter are
    /// never handed out by `allocate` and need no recycling.
    pub fn free(&mut self, id: ReplicableId) {
        if self.exhausted || id < self.next {
            self.freed.push_back(id);
        }
    }

    /// Marks an id chosen elsewhere as taken
    pub fn reserve(&mut self, id: ReplicableId) {
        if let Some(position) = self.freed.iter().position(|freed| *freed == id) {
            self.freed.remove(position);
            return;
        }
        if !self.exhausted && id >= self.next {
            // skip the fresh ids below it, keeping them for later reuse
            for skipped in self.next..id {
                self.freed.push_back(skipped);
            }
            if id == self.max_id {
                self.exhausted = true;
            } else {
                self.next = id + 1;
            }
        }
    }
}

/// A named group of replicables with its own unique id space
pub struct Scene {
    id: SceneId,
    name: String,
    replicables: BTreeMap<ReplicableId, Replicable>,
    ids: IdAllocator,
    max_id: ReplicableId,
}

impl Scene {
    pub fn new(id: SceneId, name: impl Into<String>, max_id: ReplicableId) -> Self {
        Self {
            id,
            name: name.into(),
            replicables: BTreeMap::new(),
            ids: IdAllocator::new(max_id),
            max_id,
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instantiates `kind` under a freshly allocated unique id
    pub fn spawn(&mut self, kind: &Arc<ReplicableKind>) -> Result<ReplicableKey, SceneError> {
        let id = self.ids.allocate().ok_or(SceneError::IdsExhausted {
            scene: self.id,
            max_id: self.max_id,
        })?;
        let key = ReplicableKey::new(self.id, id);
        info!("Scene: spawned '{}' as {key}", kind.name());
        self.replicables
            .insert(id, Replicable::new(key, kind.clone()));
        Ok(key)
    }

    /// Instantiates `kind` under an id chosen by the remote authority. The
    /// copy starts with no local role and the authority as its remote role.
    pub fn insert_remote(
        &mut self,
        id: ReplicableId,
        kind: &Arc<ReplicableKind>,
    ) -> Result<ReplicableKey, SceneError> {
        let key = ReplicableKey::new(self.id, id);
        if id > self.max_id {
            return Err(SceneError::IdOutOfRange {
                id,
                max_id: self.max_id,
            });
        }
        if self.replicables.contains_key(&id) {
            return Err(SceneError::DuplicateId { key });
        }
        self.ids.reserve(id);
        let mut replicable = Replicable::new(key, kind.clone());
        replicable.set_roles(Roles::new(Role::None, Role::Authority));
        debug!("Scene: created remote '{}' as {key}", kind.name());
        self.replicables.insert(id, replicable);
        Ok(key)
    }

    pub fn destroy(&mut self, id: ReplicableId) -> Option<Replicable> {
        let replicable = self.replicables.remove(&id)?;
        self.ids.free(id);
        info!("Scene: destroyed {}", replicable.key());
        Some(replicable)
    }

    pub fn get(&self, id: ReplicableId) -> Option<&Replicable> {
        self.replicables.get(&id)
    }

    pub fn get_mut(&mut self, id: ReplicableId) -> Option<&mut Replicable> {
        self.replicables.get_mut(&id)
    }

    pub fn contains(&self, id: ReplicableId) -> bool {
        self.replicables.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ReplicableId> {
        self.replicables.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Replicable> {
        self.replicables.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Replicable> {
        self.replicables.values_mut()
    }

    pub fn len(&self) -> usize {
        self.replicables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicables.is_empty()
    }

    /// Follows owner links from `id` to the topmost owner still alive in
    /// this scene
    pub fn root(&self, id: ReplicableId) -> Result<ReplicableId, ReplicableError> {
        let mut visited = HashSet::new();
        let mut current = id;
        loop {
            if !visited.insert(current) {
                return Err(ReplicableError::OwnerCycle { id });
            }
            match self.replicables.get(&current).and_then(Replicable::owner) {
                Some(owner) if self.replicables.contains_key(&owner) => current = owner,
                _ => return Ok(current),
            }
        }
    }
}
