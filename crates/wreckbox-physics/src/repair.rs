//! The repair pass: post-sync consistency enforcement.
//!
//! Runs immediately after physics sync every tick and recovers from three
//! classes of silent failure — numeric corruption (NaN positions/scales),
//! boundary violations (entities that drifted out of the world), and
//! runaway velocities. Separately it sweeps ghost bodies: physics bodies
//! whose entity is gone, left behind by an ordering bug elsewhere.

use glam::Vec3;
use wreckbox_ecs::World;
use wreckbox_render::SceneGraph;

use crate::PhysicsWorld;
use crate::convert::{to_vec3, to_vector};

/// Half-extent of the playable world on the x and z axes, in meters.
pub const WORLD_EXTENT: f32 = 600.0;
/// Entities below this height are considered lost and destroyed.
pub const KILL_PLANE_Y: f32 = -100.0;
/// Where corrupted entities are respawned.
pub const SAFE_SPAWN: Vec3 = Vec3::new(0.0, 5.0, 0.0);
/// Linear speed cap in m/s. Anything above is zeroed, not scaled: runaway
/// velocity indicates simulation failure, not legitimate motion.
pub const MAX_LINVEL: f32 = 150.0;
/// Angular speed cap in rad/s; same hard-stop policy as [`MAX_LINVEL`].
pub const MAX_ANGVEL: f32 = 64.0;

/// Counts of what one repair pass fixed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Entities reset to the safe spawn after numeric corruption.
    pub corrupt_reset: usize,
    /// Entities queued for destruction after leaving world bounds.
    pub out_of_bounds: usize,
    /// Bodies whose linear velocity was hard-stopped.
    pub linvel_zeroed: usize,
    /// Bodies whose angular velocity was hard-stopped.
    pub angvel_zeroed: usize,
    /// Ghost bodies removed from the physics engine.
    pub ghost_bodies_removed: usize,
}

/// Runs one repair pass. Out-of-bounds entities land in the world's
/// destruction queue; the caller flushes it.
pub fn repair_pass(
    physics: &mut PhysicsWorld,
    world: &mut World,
    graph: &mut SceneGraph,
) -> RepairReport {
    let mut report = RepairReport::default();
    let mut doomed = Vec::new();

    for (entity, transform) in world.transforms.iter_mut() {
        // Numeric corruption: reset to a known-good pose, zero motion.
        if !transform.is_finite() {
            tracing::debug!(entity = entity.id(), "resetting corrupted transform");
            transform.position = SAFE_SPAWN;
            transform.rotation = glam::Quat::IDENTITY;
            if !transform.scale.is_finite() {
                transform.scale = Vec3::ONE;
            }
            if let Some(handle) = physics.registry.body_of(entity)
                && let Some(body) = physics.rigid_body_set.get_mut(handle)
            {
                body.set_translation(to_vector(SAFE_SPAWN), true);
                body.set_linvel(to_vector(Vec3::ZERO), true);
                body.set_angvel(to_vector(Vec3::ZERO), true);
            }
            graph.set_transform(entity, transform.matrix());
            report.corrupt_reset += 1;
        }
        // Scale must stay positive even when finite.
        if transform.scale.min_element() <= 0.0 {
            transform.scale = transform.scale.max(Vec3::splat(1e-3));
        }

        // Boundary violation: the entity is unrecoverable, destroy it.
        let p = transform.position;
        if p.x.abs() > WORLD_EXTENT || p.z.abs() > WORLD_EXTENT || p.y < KILL_PLANE_Y {
            doomed.push(entity);
        }
    }

    for entity in doomed {
        tracing::debug!(entity = entity.id(), "entity out of bounds, queueing destruction");
        world.queue_destroy(entity);
        report.out_of_bounds += 1;
    }

    // Hard velocity caps.
    for (_, handle) in physics.registry.iter() {
        let Some(body) = physics.rigid_body_set.get_mut(handle) else {
            continue;
        };
        if body.linvel().length() > MAX_LINVEL {
            body.set_linvel(to_vector(Vec3::ZERO), true);
            report.linvel_zeroed += 1;
        }
        if body.angvel().length() > MAX_ANGVEL {
            body.set_angvel(to_vector(Vec3::ZERO), true);
            report.angvel_zeroed += 1;
        }
    }

    report.ghost_bodies_removed = physics.sweep_ghost_bodies();
    report
}

/// Convenience for tests and diagnostics: the stored position of an entity
/// as seen by the physics engine, if it has a body.
pub fn body_position(physics: &PhysicsWorld, entity: wreckbox_ecs::Entity) -> Option<Vec3> {
    let handle = physics.registry.body_of(entity)?;
    physics
        .rigid_body_set
        .get(handle)
        .map(|b| to_vec3(&b.translation()))
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
