//! Bidirectional entity ↔ rigid-body registry.
//!
//! The entity, its physics body and its visual node form a potential
//! reference cycle; this registry keeps the entity↔body edge as two integer
//! maps that are always inserted and erased together, so destruction is an
//! O(1) erase in each direction, never a graph traversal.

use rapier3d::prelude::RigidBodyHandle;
use rustc_hash::FxHashMap;
use wreckbox_ecs::Entity;

/// Two-way map between entities and Rapier body handles.
///
/// Invariant: `entity_of(body_of(e)) == e` for every registered entity — a
/// mapping exists in both directions or in neither.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    entity_to_body: FxHashMap<Entity, RigidBodyHandle>,
    body_to_entity: FxHashMap<RigidBodyHandle, Entity>,
}

impl BodyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pair. An entity may hold at most one body; re-inserting
    /// replaces the old mapping in both directions.
    pub fn insert(&mut self, entity: Entity, handle: RigidBodyHandle) {
        if let Some(old) = self.entity_to_body.insert(entity, handle) {
            self.body_to_entity.remove(&old);
        }
        self.body_to_entity.insert(handle, entity);
    }

    /// The body handle for `entity`, if registered.
    pub fn body_of(&self, entity: Entity) -> Option<RigidBodyHandle> {
        self.entity_to_body.get(&entity).copied()
    }

    /// The entity owning `handle`, if registered.
    pub fn entity_of(&self, handle: RigidBodyHandle) -> Option<Entity> {
        self.body_to_entity.get(&handle).copied()
    }

    /// Erases the mapping by entity, returning the body handle that must now
    /// be removed from the physics engine.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<RigidBodyHandle> {
        let handle = self.entity_to_body.remove(&entity)?;
        self.body_to_entity.remove(&handle);
        Some(handle)
    }

    /// Erases the mapping by body handle, returning the orphaned entity.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> Option<Entity> {
        let entity = self.body_to_entity.remove(&handle)?;
        self.entity_to_body.remove(&entity);
        Some(entity)
    }

    /// Iterates registered `(entity, handle)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, RigidBodyHandle)> + '_ {
        self.entity_to_body.iter().map(|(e, h)| (*e, *h))
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.entity_to_body.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entity_to_body.is_empty()
    }

    /// Erases every mapping.
    pub fn clear(&mut self) {
        self.entity_to_body.clear();
        self.body_to_entity.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::{RigidBodyBuilder, RigidBodySet};
    use wreckbox_ecs::World;

    fn handle(set: &mut RigidBodySet) -> RigidBodyHandle {
        set.insert(RigidBodyBuilder::dynamic().build())
    }

    #[test]
    fn test_both_directions_erased_together() {
        let mut world = World::new();
        let mut set = RigidBodySet::new();
        let mut registry = BodyRegistry::new();
        let e = world.spawn_entity();
        let h = handle(&mut set);

        registry.insert(e, h);
        assert_eq!(registry.body_of(e), Some(h));
        assert_eq!(registry.entity_of(h), Some(e));

        assert_eq!(registry.remove_entity(e), Some(h));
        assert_eq!(registry.body_of(e), None);
        assert_eq!(registry.entity_of(h), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_by_body_erases_entity_side() {
        let mut world = World::new();
        let mut set = RigidBodySet::new();
        let mut registry = BodyRegistry::new();
        let e = world.spawn_entity();
        let h = handle(&mut set);
        registry.insert(e, h);

        assert_eq!(registry.remove_body(h), Some(e));
        assert_eq!(registry.body_of(e), None);
    }

    #[test]
    fn test_reinsert_replaces_old_mapping() {
        let mut world = World::new();
        let mut set = RigidBodySet::new();
        let mut registry = BodyRegistry::new();
        let e = world.spawn_entity();
        let h1 = handle(&mut set);
        let h2 = handle(&mut set);

        registry.insert(e, h1);
        registry.insert(e, h2);

        assert_eq!(registry.body_of(e), Some(h2));
        assert_eq!(registry.entity_of(h1), None, "stale reverse mapping");
        assert_eq!(registry.entity_of(h2), Some(e));
        assert_eq!(registry.len(), 1);
    }
}
