//! Uniform (x,z) grid for static geometry.

use glam::Vec3;
use rustc_hash::FxHashMap;
use wreckbox_ecs::Entity;

/// Grid cell coordinate.
pub type Cell = (i32, i32);

/// Uniform spatial grid keyed by (x,z) cell.
///
/// Statics never move, so each entity is inserted once at spawn and removed
/// once at destruction; queries walk only the cells a circle overlaps.
#[derive(Debug)]
pub struct StaticGrid {
    cell_size: f32,
    cells: FxHashMap<Cell, Vec<Entity>>,
    positions: FxHashMap<Entity, Vec3>,
}

impl StaticGrid {
    /// Creates a grid with the given cell edge length (> 0).
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: FxHashMap::default(),
            positions: FxHashMap::default(),
        }
    }

    fn cell_of(&self, position: Vec3) -> Cell {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    /// Indexes `entity` at `position`. Re-inserting moves it.
    pub fn insert(&mut self, entity: Entity, position: Vec3) {
        self.remove(entity);
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(entity);
        self.positions.insert(entity, position);
    }

    /// Unindexes `entity`. Unknown entities are a no-op.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(position) = self.positions.remove(&entity) {
            let cell = self.cell_of(position);
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.retain(|e| *e != entity);
                if bucket.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// The indexed position of `entity`, if present.
    pub fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.positions.get(&entity).copied()
    }

    /// Entities whose indexed position lies within `radius` of `center`,
    /// measured in the horizontal (x,z) plane. Visits only overlapping
    /// cells, never the whole table.
    pub fn query_circle(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        let r2 = radius * radius;
        let min = self.cell_of(center - Vec3::splat(radius));
        let max = self.cell_of(center + Vec3::splat(radius));

        let mut out = Vec::new();
        for cx in min.0..=max.0 {
            for cz in min.1..=max.1 {
                let Some(bucket) = self.cells.get(&(cx, cz)) else {
                    continue;
                };
                for &entity in bucket {
                    if let Some(p) = self.positions.get(&entity) {
                        let dx = p.x - center.x;
                        let dz = p.z - center.z;
                        if dx * dx + dz * dz <= r2 {
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

    /// Whether the grid is empty.
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
    fn test_query_finds_only_entities_in_radius() {
        let mut world = World::new();
        let mut grid = StaticGrid::new(16.0);
        let near = world.spawn_entity();
        let far = world.spawn_entity();
        grid.insert(near, Vec3::new(3.0, 0.0, 4.0));
        grid.insert(far, Vec3::new(300.0, 0.0, 0.0));

        let hits = grid.query_circle(Vec3::ZERO, 10.0);
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn test_query_ignores_y_axis() {
        let mut world = World::new();
        let mut grid = StaticGrid::new(16.0);
        let tall = world.spawn_entity();
        grid.insert(tall, Vec3::new(1.0, 500.0, 1.0));

        assert_eq!(grid.query_circle(Vec3::ZERO, 5.0), vec![tall]);
    }

    #[test]
    fn test_remove_empties_cell() {
        let mut world = World::new();
        let mut grid = StaticGrid::new(16.0);
        let e = world.spawn_entity();
        grid.insert(e, Vec3::ZERO);
        grid.remove(e);

        assert!(grid.is_empty());
        assert!(grid.query_circle(Vec3::ZERO, 100.0).is_empty());
    }

    #[test]
    fn test_query_spanning_many_cells() {
        let mut world = World::new();
        let mut grid = StaticGrid::new(4.0);
        let mut expected = 0;
        for i in -5..=5 {
            let e = world.spawn_entity();
            grid.insert(e, Vec3::new(i as f32 * 4.0, 0.0, 0.0));
            if (i as f32 * 4.0).abs() <= 12.0 {
                expected += 1;
            }
        }
        assert_eq!(grid.query_circle(Vec3::ZERO, 12.0).len(), expected);
    }
}
