//! Fixed-capacity GPU instance pools.
//!
//! Many logical entities of one visual archetype share a single instanced
//! mesh; each gets a stable slot index into that mesh's matrix buffer. Slots
//! come from a LIFO free list, the active list stays dense via swap-and-pop,
//! and a freed slot's matrix is overwritten with a zero-scale matrix so it
//! never rasterizes.

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;
use wreckbox_ecs::{Entity, EntityEvent};

/// Matrix written into retired slots; zero scale collapses the instance to
/// nothing without touching the pool's count.
fn retired_matrix() -> Mat4 {
    Mat4::from_scale(Vec3::ZERO)
}

/// One per-archetype pool of instance slots.
///
/// Mirrors the renderer's instanced-mesh object: `set_matrix_at(slot, m)`
/// plus a live count; everything else is slot bookkeeping.
#[derive(Debug)]
pub struct InstancedGroup {
    archetype: String,
    matrices: Vec<Mat4>,
    free: Vec<u32>,
    active: Vec<u32>,
    active_index: FxHashMap<u32, usize>,
}

impl InstancedGroup {
    /// Creates a pool with `capacity` slots, all free and retired.
    pub fn new(archetype: impl Into<String>, capacity: usize) -> Self {
        Self {
            archetype: archetype.into(),
            matrices: vec![retired_matrix(); capacity],
            // Reverse so the first allocations hand out slot 0, 1, 2, …
            free: (0..capacity as u32).rev().collect(),
            active: Vec::with_capacity(capacity),
            active_index: FxHashMap::default(),
        }
    }

    /// Visual archetype this pool renders.
    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Total slot capacity.
    pub fn capacity(&self) -> usize {
        self.matrices.len()
    }

    /// Number of live (allocated) slots.
    pub fn live(&self) -> usize {
        self.active.len()
    }

    /// Allocates a slot from the free list (LIFO: the most recently freed
    /// slot is handed out first). Returns `None` when the pool is full.
    pub fn allocate(&mut self) -> Option<u32> {
        let slot = self.free.pop()?;
        self.active_index.insert(slot, self.active.len());
        self.active.push(slot);
        Some(slot)
    }

    /// Returns `slot` to the free list and retires its matrix. The dense
    /// active list is kept contiguous by swapping the last entry into the
    /// vacated position.
    pub fn release(&mut self, slot: u32) {
        let Some(position) = self.active_index.remove(&slot) else {
            return;
        };
        let last = self.active.len() - 1;
        self.active.swap(position, last);
        self.active.pop();
        if position < self.active.len() {
            self.active_index.insert(self.active[position], position);
        }
        self.matrices[slot as usize] = retired_matrix();
        self.free.push(slot);
    }

    /// Writes the instance matrix for `slot`.
    pub fn set_matrix_at(&mut self, slot: u32, matrix: Mat4) {
        if let Some(m) = self.matrices.get_mut(slot as usize) {
            *m = matrix;
        }
    }

    /// The matrix currently stored for `slot`.
    pub fn matrix_at(&self, slot: u32) -> Option<Mat4> {
        self.matrices.get(slot as usize).copied()
    }

    /// The dense list of live slots, for buffer upload.
    pub fn active_slots(&self) -> &[u32] {
        &self.active
    }

    /// Frees every slot and retires every matrix.
    pub fn clear(&mut self) {
        let capacity = self.matrices.len();
        self.matrices.fill(retired_matrix());
        self.free = (0..capacity as u32).rev().collect();
        self.active.clear();
        self.active_index.clear();
    }
}

#[derive(Debug, Clone)]
struct SlotRef {
    archetype: String,
    slot: u32,
    dynamic: bool,
}

/// All instance pools plus the entity → slot registry.
#[derive(Debug, Default)]
pub struct InstancePools {
    groups: FxHashMap<String, InstancedGroup>,
    slots: FxHashMap<Entity, SlotRef>,
}

impl InstancePools {
    /// Creates an empty pool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pool for `archetype` with the given capacity.
    pub fn add_group(&mut self, archetype: impl Into<String>, capacity: usize) {
        let archetype = archetype.into();
        self.groups
            .insert(archetype.clone(), InstancedGroup::new(archetype, capacity));
    }

    /// Whether a pool exists for `archetype`.
    pub fn has_group(&self, archetype: &str) -> bool {
        self.groups.contains_key(archetype)
    }

    /// The pool for `archetype`, if any.
    pub fn group(&self, archetype: &str) -> Option<&InstancedGroup> {
        self.groups.get(archetype)
    }

    /// Allocates a slot for `entity` in its archetype's pool. Dynamic
    /// entities have their slot rewritten every tick; statics only when
    /// their visibility flips. Returns `None` (with a warning) when the
    /// archetype is unknown or the pool is exhausted.
    pub fn register(&mut self, entity: Entity, archetype: &str, dynamic: bool) -> Option<u32> {
        let Some(group) = self.groups.get_mut(archetype) else {
            tracing::warn!(archetype, "no instance pool for archetype");
            return None;
        };
        let Some(slot) = group.allocate() else {
            tracing::warn!(
                archetype,
                capacity = group.capacity(),
                "instance pool exhausted"
            );
            return None;
        };
        self.slots.insert(
            entity,
            SlotRef {
                archetype: archetype.to_string(),
                slot,
                dynamic,
            },
        );
        Some(slot)
    }

    /// Frees `entity`'s slot, if it has one.
    pub fn release(&mut self, entity: Entity) {
        if let Some(slot_ref) = self.slots.remove(&entity)
            && let Some(group) = self.groups.get_mut(&slot_ref.archetype)
        {
            group.release(slot_ref.slot);
        }
    }

    /// The slot index held by `entity`, if any.
    pub fn slot_of(&self, entity: Entity) -> Option<u32> {
        self.slots.get(&entity).map(|s| s.slot)
    }

    /// Writes `entity`'s instance matrix.
    pub fn write(&mut self, entity: Entity, matrix: Mat4) {
        if let Some(slot_ref) = self.slots.get(&entity)
            && let Some(group) = self.groups.get_mut(&slot_ref.archetype)
        {
            group.set_matrix_at(slot_ref.slot, matrix);
        }
    }

    /// Retires `entity`'s matrix without freeing the slot (hidden, not
    /// destroyed).
    pub fn write_retired(&mut self, entity: Entity) {
        self.write(entity, retired_matrix());
    }

    /// Entities registered with dynamic slots, for the per-tick rewrite.
    pub fn dynamic_entities(&self) -> Vec<Entity> {
        self.slots
            .iter()
            .filter(|(_, s)| s.dynamic)
            .map(|(e, _)| *e)
            .collect()
    }

    /// Total live slots across all pools.
    pub fn live(&self) -> usize {
        self.groups.values().map(|g| g.live()).sum()
    }

    /// Lifecycle hook: destroyed entities release their slot.
    pub fn on_event(&mut self, event: &EntityEvent) {
        if let EntityEvent::Destroyed { entity } = event {
            self.release(*entity);
        }
    }

    /// Frees every slot in every pool.
    pub fn clear(&mut self) {
        for group in self.groups.values_mut() {
            group.clear();
        }
        self.slots.clear();
    }
}

#[cfg(test)]
#[path = "instancing_tests.rs"]
mod tests;
