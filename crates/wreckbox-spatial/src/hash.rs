//! 3D spatial hash for moving entities.

use glam::Vec3;
use rustc_hash::FxHashMap;
use wreckbox_ecs::Entity;

type Cell3 = (i32, i32, i32);

/// Hash of 3D cells for general proximity queries over entities that move.
///
/// Unlike [`StaticGrid`](crate::StaticGrid) this is re-keyed as entities
/// move: [`update`](SpatialHash::update) migrates an entity between cells
/// when its position crosses a boundary.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: FxHashMap<Cell3, Vec<Entity>>,
    positions: FxHashMap<Entity, Vec3>,
}

impl SpatialHash {
    /// Creates a hash with the given cell edge length (> 0).
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: FxHashMap::default(),
            positions: FxHashMap::default(),
        }
    }

    fn cell_of(&self, position: Vec3) -> Cell3 {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    /// Inserts or moves `entity` to `position`.
    pub fn update(&mut self, entity: Entity, position: Vec3) {
        if let Some(old) = self.positions.get(&entity).copied() {
            let old_cell = self.cell_of(old);
            let new_cell = self.cell_of(position);
            if old_cell == new_cell {
                self.positions.insert(entity, position);
                return;
            }
            self.detach(entity, old_cell);
        }
        self.cells.entry(self.cell_of(position)).or_default().push(entity);
        self.positions.insert(entity, position);
    }

    /// Removes `entity`. Unknown entities are a no-op.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(position) = self.positions.remove(&entity) {
            let cell = self.cell_of(position);
            self.detach(entity, cell);
        }
    }

    fn detach(&mut self, entity: Entity, cell: Cell3) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|e| *e != entity);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Entities within `radius` of `center` (full 3D distance).
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let r2 = radius * radius;
        let min = self.cell_of(center - Vec3::splat(radius));
        let max = self.cell_of(center + Vec3::splat(radius));

        let mut out = Vec::new();
        for cx in min.0..=max.0 {
            for cy in min.1..=max.1 {
                for cz in min.2..=max.2 {
                    let Some(bucket) = self.cells.get(&(cx, cy, cz)) else {
                        continue;
                    };
                    for &entity in bucket {
                        if let Some(p) = self.positions.get(&entity)
                            && p.distance_squared(center) <= r2
                        {
                            out.push(entity);
                        }
                    }
                }
            }
        }
        out
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the hash is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wreckbox_ecs::World;

    #[test]
    fn test_update_moves_entity_between_cells() {
        let mut world = World::new();
        let mut hash = SpatialHash::new(8.0);
        let e = world.spawn_entity();

        hash.update(e, Vec3::ZERO);
        assert_eq!(hash.query_radius(Vec3::ZERO, 1.0), vec![e]);

        hash.update(e, Vec3::new(100.0, 0.0, 0.0));
        assert!(hash.query_radius(Vec3::ZERO, 1.0).is_empty());
        assert_eq!(hash.query_radius(Vec3::new(100.0, 0.0, 0.0), 1.0), vec![e]);
        assert_eq!(hash.len(), 1, "moving must not duplicate the entry");
    }

    #[test]
    fn test_query_uses_full_3d_distance() {
        let mut world = World::new();
        let mut hash = SpatialHash::new(8.0);
        let above = world.spawn_entity();
        hash.update(above, Vec3::new(0.0, 50.0, 0.0));

        assert!(hash.query_radius(Vec3::ZERO, 10.0).is_empty());
        assert_eq!(hash.query_radius(Vec3::ZERO, 60.0), vec![above]);
    }

    #[test]
    fn test_remove_unknown_entity_is_noop() {
        let mut world = World::new();
        let mut hash = SpatialHash::new(8.0);
        let e = world.spawn_entity();
        hash.remove(e);
        assert!(hash.is_empty());
    }
}
