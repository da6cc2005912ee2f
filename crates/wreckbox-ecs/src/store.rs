//! Sparse per-kind component storage.

use rustc_hash::FxHashMap;

use crate::entity::Entity;

/// Sparse map from entity to one kind of component data.
///
/// Stores hold pure data and no logic. Each store is written by the systems
/// documented for it and only ever on the single simulation thread, so no
/// interior locking is needed.
#[derive(Debug)]
pub struct ComponentStore<T> {
    map: FxHashMap<Entity, T>,
}

impl<T> ComponentStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Installs or replaces the component for `entity`.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.map.insert(entity, value)
    }

    /// Returns the component for `entity`, if present.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.map.get(&entity)
    }

    /// Returns the component for `entity` mutably, if present.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.map.get_mut(&entity)
    }

    /// Removes and returns the component for `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.map.remove(&entity)
    }

    /// Whether `entity` has this component.
    pub fn contains(&self, entity: Entity) -> bool {
        self.map.contains_key(&entity)
    }

    /// Number of entities with this component.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over `(entity, component)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.map.iter().map(|(e, v)| (*e, v))
    }

    /// Iterates mutably over `(entity, component)` pairs in arbitrary order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.map.iter_mut().map(|(e, v)| (*e, v))
    }

    /// Calls `f` for every `(entity, component)` pair.
    pub fn for_each(&self, mut f: impl FnMut(Entity, &T)) {
        for (e, v) in self.map.iter() {
            f(*e, v);
        }
    }

    /// Snapshot of the entities currently in the store.
    ///
    /// Use this when the loop body may remove entries from the store it is
    /// walking (destruction during iteration).
    pub fn entities(&self) -> Vec<Entity> {
        self.map.keys().copied().collect()
    }

    /// Removes every component.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityAllocator;

    #[test]
    fn test_insert_get_remove_roundtrip() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        let mut store = ComponentStore::new();

        assert!(store.insert(e, 42u32).is_none());
        assert_eq!(store.get(e), Some(&42));
        assert_eq!(store.remove(e), Some(42));
        assert_eq!(store.get(e), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        let mut store = ComponentStore::new();
        store.insert(e, 1.0f32);

        *store.get_mut(e).unwrap() = 2.0;
        assert_eq!(store.get(e), Some(&2.0));
    }

    #[test]
    fn test_absent_entity_reads_as_none() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let mut store = ComponentStore::new();
        store.insert(a, "hull");

        assert!(!store.contains(b));
        assert_eq!(store.get(b), None);
        assert_eq!(store.remove(b), None);
    }

    #[test]
    fn test_entities_snapshot_allows_removal_during_walk() {
        let mut alloc = EntityAllocator::new();
        let mut store = ComponentStore::new();
        for _ in 0..8 {
            store.insert(alloc.allocate(), ());
        }

        for e in store.entities() {
            store.remove(e);
        }
        assert!(store.is_empty());
    }
}
