//! Spatial partitioning for proximity queries without scanning all entities.
//!
//! Static geometry goes into a uniform (x,z) grid sized for the culling
//! pass; dynamic entities live in a flat set plus a 3D hash for general
//! proximity queries. Both structures are maintained from entity lifecycle
//! events, so nothing else in the engine has to remember to unindex.

pub mod grid;
pub mod hash;

use glam::Vec3;
use rustc_hash::FxHashSet;
use wreckbox_ecs::{BodyClass, Entity, EntityEvent};

pub use grid::StaticGrid;
pub use hash::SpatialHash;

/// Default edge length of a static-grid cell, in meters.
pub const DEFAULT_CELL_SIZE: f32 = 16.0;

/// Combined spatial index fed by the lifecycle bus.
#[derive(Debug)]
pub struct SpatialIndex {
    grid: StaticGrid,
    dynamics: FxHashSet<Entity>,
    hash: SpatialHash,
}

impl SpatialIndex {
    /// Creates an index with the given grid cell size.
    pub fn new(cell_size: f32) -> Self {
        Self {
            grid: StaticGrid::new(cell_size),
            dynamics: FxHashSet::default(),
            hash: SpatialHash::new(cell_size),
        }
    }

    /// Routes a lifecycle event: statics are gridded at their spawn
    /// position, dynamics join the flat set and the hash.
    pub fn on_event(&mut self, event: &EntityEvent) {
        match *event {
            EntityEvent::Created {
                entity,
                class,
                position,
            } => match class {
                BodyClass::Static => self.grid.insert(entity, position),
                BodyClass::Dynamic => {
                    self.dynamics.insert(entity);
                    self.hash.update(entity, position);
                }
            },
            EntityEvent::Destroyed { entity } => {
                self.grid.remove(entity);
                self.dynamics.remove(&entity);
                self.hash.remove(entity);
            }
        }
    }

    /// The static grid, for the culling pass.
    pub fn grid(&self) -> &StaticGrid {
        &self.grid
    }

    /// The flat set of dynamic entities, re-evaluated every tick by culling.
    pub fn dynamics(&self) -> &FxHashSet<Entity> {
        &self.dynamics
    }

    /// Refreshes a dynamic entity's cell in the proximity hash. Called by
    /// the sync pass with post-step positions; statics never move so the
    /// grid needs no equivalent.
    pub fn update_dynamic(&mut self, entity: Entity, position: Vec3) {
        if self.dynamics.contains(&entity) {
            self.hash.update(entity, position);
        }
    }

    /// Entities within `radius` of `center`: statics from the grid plus
    /// dynamics from the hash.
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let mut out = self.grid.query_circle(center, radius);
        out.extend(self.hash.query_radius(center, radius));
        out
    }

    /// Drops every indexed entity.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.dynamics.clear();
        self.hash.clear();
    }

    /// Count of indexed static entities.
    pub fn static_count(&self) -> usize {
        self.grid.len()
    }

    /// Count of indexed dynamic entities.
    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wreckbox_ecs::World;

    fn created(world: &mut World, class: BodyClass, position: Vec3) -> EntityEvent {
        EntityEvent::Created {
            entity: world.spawn_entity(),
            class,
            position,
        }
    }

    #[test]
    fn test_events_route_statics_and_dynamics() {
        let mut world = World::new();
        let mut index = SpatialIndex::default();

        index.on_event(&created(&mut world, BodyClass::Static, Vec3::ZERO));
        index.on_event(&created(
            &mut world,
            BodyClass::Dynamic,
            Vec3::new(5.0, 0.0, 5.0),
        ));

        assert_eq!(index.static_count(), 1);
        assert_eq!(index.dynamic_count(), 1);
    }

    #[test]
    fn test_destroyed_unindexes_everywhere() {
        let mut world = World::new();
        let mut index = SpatialIndex::default();
        let e = world.spawn_entity();
        index.on_event(&EntityEvent::Created {
            entity: e,
            class: BodyClass::Dynamic,
            position: Vec3::ZERO,
        });

        index.on_event(&EntityEvent::Destroyed { entity: e });
        assert_eq!(index.dynamic_count(), 0);
        assert!(index.query_radius(Vec3::ZERO, 10.0).is_empty());
    }

    #[test]
    fn test_query_radius_merges_both_structures() {
        let mut world = World::new();
        let mut index = SpatialIndex::default();
        index.on_event(&created(
            &mut world,
            BodyClass::Static,
            Vec3::new(1.0, 0.0, 1.0),
        ));
        index.on_event(&created(
            &mut world,
            BodyClass::Dynamic,
            Vec3::new(-1.0, 0.0, -1.0),
        ));
        index.on_event(&created(
            &mut world,
            BodyClass::Dynamic,
            Vec3::new(500.0, 0.0, 500.0),
        ));

        let near = index.query_radius(Vec3::ZERO, 10.0);
        assert_eq!(near.len(), 2, "far dynamic entity must not appear");
    }
}
