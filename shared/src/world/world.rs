use std::{collections::BTreeMap, sync::Arc};

use log::info;

use crate::types::{ReplicableId, ReplicableKey, SceneId};

use super::{Replicable, ReplicableKind, Scene, SceneError};

/// All scenes a host knows about
pub struct World {
    scenes: BTreeMap<SceneId, Scene>,
    next_scene: SceneId,
    max_id: ReplicableId,
}

impl World {
    /// `max_id` bounds the unique ids of every scene
    pub fn new(max_id: ReplicableId) -> Self {
        Self {
            scenes: BTreeMap::new(),
            next_scene: 0,
            max_id,
        }
    }

    pub fn create_scene(&mut self, name: impl Into<String>) -> Result<SceneId, SceneError> {
        let start = self.next_scene;
        while self.scenes.contains_key(&self.next_scene) {
            self.next_scene = self.next_scene.wrapping_add(1);
            if self.next_scene == start {
                return Err(SceneError::SceneIdsExhausted);
            }
        }
        let id = self.next_scene;
        self.next_scene = self.next_scene.wrapping_add(1);
        self.insert_scene(id, name)?;
        Ok(id)
    }

    /// Adds a scene under an id chosen elsewhere
    pub fn insert_scene(&mut self, id: SceneId, name: impl Into<String>) -> Result<(), SceneError> {
        if self.scenes.contains_key(&id) {
            return Err(SceneError::DuplicateScene { scene: id });
        }
        let scene = Scene::new(id, name, self.max_id);
        info!("World: created scene {id} '{}'", scene.name());
        self.scenes.insert(id, scene);
        Ok(())
    }

    pub fn remove_scene(&mut self, id: SceneId) -> Option<Scene> {
        let scene = self.scenes.remove(&id)?;
        info!("World: removed scene {id} '{}'", scene.name());
        Some(scene)
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(&id)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn scene_ids(&self) -> Vec<SceneId> {
        self.scenes.keys().copied().collect()
    }

    pub fn spawn(&mut self, scene: SceneId, kind: &Arc<ReplicableKind>) -> Result<ReplicableKey, SceneError> {
        self.scenes
            .get_mut(&scene)
            .ok_or(SceneError::UnknownScene { scene })?
            .spawn(kind)
    }

    pub fn destroy(&mut self, key: ReplicableKey) -> Option<Replicable> {
        self.scenes.get_mut(&key.scene)?.destroy(key.id)
    }

    pub fn get(&self, key: ReplicableKey) -> Option<&Replicable> {
        self.scenes.get(&key.scene)?.get(key.id)
    }

    pub fn get_mut(&mut self, key: ReplicableKey) -> Option<&mut Replicable> {
        self.scenes.get_mut(&key.scene)?.get_mut(key.id)
    }

    pub fn contains(&self, key: ReplicableKey) -> bool {
        self.get(key).is_some()
    }

    /// Every live replicable, ordered by scene then id
    pub fn keys(&self) -> Vec<ReplicableKey> {
        self.scenes
            .values()
            .flat_map(|scene| scene.iter().map(Replicable::key))
            .collect()
    }

    /// Topmost owner of `key`, within its scene
    pub fn root(&self, key: ReplicableKey) -> Result<ReplicableKey, SceneError> {
        let scene = self
            .scenes
            .get(&key.scene)
            .ok_or(SceneError::UnknownScene { scene: key.scene })?;
        if !scene.contains(key.id) {
            return Err(SceneError::UnknownReplicable { key });
        }
        let id = scene.root(key.id)?;
        Ok(ReplicableKey::new(key.scene, id))
    }
}
